//! Renderer-facing handles.
//!
//! Everything that records GPU work takes a [`RenderCtx`] for device access
//! and a [`SurfaceTarget`] for the frame's encoder and presentable view.

mod ctx;

pub use ctx::{RenderCtx, SurfaceTarget};
