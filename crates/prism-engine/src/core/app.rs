use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the layer above the engine.
///
/// Window events reach the app already folded into `FrameCtx::input` and
/// `FrameCtx::input_frame`.
pub trait App {
    /// Called once per redraw. Returning [`AppControl::Exit`] ends the loop.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
