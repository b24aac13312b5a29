use crate::render::RenderCtx;
use crate::scene::SceneView;

use super::pass::{Pass, PassIo, PassKind};
use super::target::{create_render_target, RenderTarget, COLOR_FORMAT};

/// Holds at most one active pass.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ActivePassSlot {
    active: Option<PassKind>,
}

impl ActivePassSlot {
    pub fn get(&self) -> Option<PassKind> {
        self.active
    }

    /// Puts `kind` in the slot and returns what it evicted.
    pub fn replace(&mut self, kind: PassKind) -> Option<PassKind> {
        self.active.replace(kind)
    }

    pub fn clear(&mut self) -> Option<PassKind> {
        self.active.take()
    }
}

/// Outcome of [`PassChain::activate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Switch {
    /// The slot now holds the requested pass; `evicted` was detached.
    Replaced { evicted: Option<PassKind> },
    /// The requested pass was already active.
    Unchanged,
    /// Nothing is registered under that kind; the slot is untouched.
    Unregistered,
}

/// Passes keyed by kind, plus the single active slot over them.
///
/// Activation never drops or disposes a registered pass.
#[derive(Debug)]
pub struct PassChain<P> {
    passes: Vec<(PassKind, P)>,
    slot: ActivePassSlot,
}

impl<P> Default for PassChain<P> {
    fn default() -> Self {
        Self {
            passes: Vec::new(),
            slot: ActivePassSlot::default(),
        }
    }
}

impl<P> PassChain<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pass` under `kind`, returning any pass it replaces.
    pub fn register(&mut self, kind: PassKind, pass: P) -> Option<P> {
        match self.passes.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, slot)) => Some(std::mem::replace(slot, pass)),
            None => {
                self.passes.push((kind, pass));
                None
            }
        }
    }

    pub fn activate(&mut self, kind: PassKind) -> Switch {
        if !self.contains(kind) {
            return Switch::Unregistered;
        }
        if self.slot.get() == Some(kind) {
            return Switch::Unchanged;
        }
        Switch::Replaced {
            evicted: self.slot.replace(kind),
        }
    }

    pub fn active_kind(&self) -> Option<PassKind> {
        self.slot.get()
    }

    pub fn active(&self) -> Option<&P> {
        self.slot.get().and_then(|k| self.get(k))
    }

    pub fn active_mut(&mut self) -> Option<&mut P> {
        let kind = self.slot.get()?;
        self.get_mut(kind)
    }

    pub fn contains(&self, kind: PassKind) -> bool {
        self.passes.iter().any(|(k, _)| *k == kind)
    }

    pub fn get(&self, kind: PassKind) -> Option<&P> {
        self.passes.iter().find(|(k, _)| *k == kind).map(|(_, p)| p)
    }

    pub fn get_mut(&mut self, kind: PassKind) -> Option<&mut P> {
        self.passes
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PassKind, &mut P)> {
        self.passes.iter_mut().map(|(k, p)| (*k, p))
    }

    pub fn into_passes(self) -> impl Iterator<Item = (PassKind, P)> {
        self.passes.into_iter()
    }
}

/// Runs the active pass each frame.
///
/// Owns every registered pass and the hand-off buffer that passes not
/// rendering to screen write into.
pub struct Composer {
    chain: PassChain<Pass>,
    write_buffer: RenderTarget,
}

impl Composer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            chain: PassChain::new(),
            write_buffer: create_render_target(device, width, height, COLOR_FORMAT, false),
        }
    }

    pub fn add_pass(&mut self, pass: Pass) {
        let kind = pass.kind();
        if let Some(old) = self.chain.register(kind, pass) {
            log::debug!("replacing registered {kind} pass");
            old.dispose();
        }
    }

    /// Swaps the active pass. The evicted pass stays registered.
    pub fn set_active(&mut self, kind: PassKind) -> Switch {
        let switch = self.chain.activate(kind);
        match switch {
            Switch::Replaced { evicted } => match evicted {
                Some(prev) => log::info!("active pass: {prev} -> {kind}"),
                None => log::info!("active pass: {kind}"),
            },
            Switch::Unchanged => {}
            Switch::Unregistered => log::warn!("no {kind} pass registered"),
        }
        switch
    }

    pub fn active(&self) -> Option<PassKind> {
        self.chain.active_kind()
    }

    pub fn pass(&self, kind: PassKind) -> Option<&Pass> {
        self.chain.get(kind)
    }

    pub fn pass_mut(&mut self, kind: PassKind) -> Option<&mut Pass> {
        self.chain.get_mut(kind)
    }

    pub fn write_buffer(&self) -> &RenderTarget {
        &self.write_buffer
    }

    /// Resizes every pass, active or not, and the hand-off buffer.
    pub fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        for (_, pass) in self.chain.iter_mut() {
            pass.set_size(device, width, height);
        }
        self.write_buffer.set_size(device, width, height);
    }

    /// Records the active pass into `encoder`. Does nothing when the slot is
    /// empty.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        view: SceneView<'_>,
        screen: &wgpu::TextureView,
    ) {
        let Some(pass) = self.chain.active_mut() else { return };

        pass.render(
            ctx,
            encoder,
            view,
            PassIo {
                screen,
                screen_format: ctx.surface_format,
                write_buffer: &self.write_buffer,
            },
        );
    }

    pub fn dispose(self) {
        for (_, pass) in self.chain.into_passes() {
            pass.dispose();
        }
        self.write_buffer.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::noop_device;
    use crate::scene::PerspectiveCamera;

    #[derive(Debug, PartialEq)]
    struct Dummy {
        id: u32,
        renders: u32,
    }

    fn chain() -> PassChain<Dummy> {
        let mut chain = PassChain::new();
        for (id, kind) in PassKind::ALL.into_iter().enumerate() {
            chain.register(kind, Dummy { id: id as u32, renders: 0 });
        }
        chain
    }

    // ── slot ─────────────────────────────────────────────────────────────

    #[test]
    fn slot_replace_returns_evicted() {
        let mut slot = ActivePassSlot::default();
        assert_eq!(slot.replace(PassKind::Color), None);
        assert_eq!(slot.replace(PassKind::Depth), Some(PassKind::Color));
        assert_eq!(slot.get(), Some(PassKind::Depth));
        assert_eq!(slot.clear(), Some(PassKind::Depth));
        assert_eq!(slot.get(), None);
    }

    // ── chain ────────────────────────────────────────────────────────────

    #[test]
    fn starts_with_nothing_active() {
        let chain = chain();
        assert_eq!(chain.len(), 3);
        assert!(chain.active().is_none());
    }

    #[test]
    fn n_switches_leave_one_active_and_evicted_intact() {
        let mut chain = chain();
        let sequence = [
            PassKind::Color,
            PassKind::Depth,
            PassKind::Pixelation,
            PassKind::Depth,
            PassKind::Color,
            PassKind::Pixelation,
        ];

        for kind in sequence {
            chain.activate(kind);
            if let Some(p) = chain.active_mut() {
                p.renders += 1;
            }
        }

        assert_eq!(chain.active_kind(), Some(PassKind::Pixelation));
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.get(PassKind::Color), Some(&Dummy { id: 0, renders: 2 }));
        assert_eq!(chain.get(PassKind::Depth), Some(&Dummy { id: 1, renders: 2 }));
        assert_eq!(chain.get(PassKind::Pixelation), Some(&Dummy { id: 2, renders: 2 }));
    }

    #[test]
    fn activate_reports_transitions() {
        let mut chain = chain();
        assert_eq!(
            chain.activate(PassKind::Color),
            Switch::Replaced { evicted: None }
        );
        assert_eq!(chain.activate(PassKind::Color), Switch::Unchanged);
        assert_eq!(
            chain.activate(PassKind::Depth),
            Switch::Replaced {
                evicted: Some(PassKind::Color)
            }
        );
    }

    #[test]
    fn unregistered_kind_leaves_slot_alone() {
        let mut chain = PassChain::new();
        chain.register(PassKind::Color, Dummy { id: 0, renders: 0 });
        chain.activate(PassKind::Color);

        assert_eq!(chain.activate(PassKind::Depth), Switch::Unregistered);
        assert_eq!(chain.active_kind(), Some(PassKind::Color));
    }

    #[test]
    fn register_same_kind_hands_back_previous() {
        let mut chain = PassChain::new();
        assert!(chain.register(PassKind::Depth, Dummy { id: 1, renders: 0 }).is_none());
        let old = chain.register(PassKind::Depth, Dummy { id: 9, renders: 0 });
        assert_eq!(old, Some(Dummy { id: 1, renders: 0 }));
        assert_eq!(chain.len(), 1);
    }

    // ── composer ─────────────────────────────────────────────────────────

    fn composer(device: &wgpu::Device) -> Composer {
        let camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 8.0);
        let mut composer = Composer::new(device, 640, 480);
        composer.add_pass(Pass::color(device, 640, 480));
        composer.add_pass(Pass::depth(device, 640, 480, &camera));
        composer.add_pass(Pass::pixelation(device, 640, 480, 6));
        composer
    }

    fn target_size(pass: &Pass) -> (u32, u32) {
        (pass.target().width(), pass.target().height())
    }

    #[test]
    fn set_size_reaches_inactive_passes() {
        let (device, _queue) = noop_device();
        let mut composer = composer(&device);
        composer.set_active(PassKind::Color);

        composer.set_size(&device, 1001, 999);

        for kind in PassKind::ALL {
            let pass = composer.pass(kind).expect("registered");
            assert_eq!(pass.resolution().resolution(), (1001, 999), "{kind}");
        }
        let depth = composer.pass(PassKind::Depth).expect("registered");
        assert_eq!(target_size(depth), (1001, 999));
        let pixelate = composer.pass(PassKind::Pixelation).expect("registered");
        assert_eq!(target_size(pixelate), (166, 166));
        assert_eq!(
            (composer.write_buffer().width(), composer.write_buffer().height()),
            (1001, 999)
        );

        composer.dispose();
    }

    #[test]
    fn repeated_set_size_does_not_reallocate() {
        let (device, _queue) = noop_device();
        let mut composer = composer(&device);

        composer.set_size(&device, 1001, 999);
        let before: Vec<u32> = PassKind::ALL
            .iter()
            .filter_map(|k| composer.pass(*k))
            .map(|p| p.target().allocations())
            .collect();
        let buffer_before = composer.write_buffer().allocations();

        composer.set_size(&device, 1001, 999);
        let after: Vec<u32> = PassKind::ALL
            .iter()
            .filter_map(|k| composer.pass(*k))
            .map(|p| p.target().allocations())
            .collect();

        assert_eq!(before, vec![2, 2, 2]);
        assert_eq!(before, after);
        assert_eq!(composer.write_buffer().allocations(), buffer_before);

        composer.dispose();
    }

    #[test]
    fn switching_keeps_evicted_passes_intact() {
        let (device, _queue) = noop_device();
        let mut composer = composer(&device);

        let sizes: Vec<(u32, u32)> = PassKind::ALL
            .iter()
            .filter_map(|k| composer.pass(*k))
            .map(target_size)
            .collect();

        for kind in [
            PassKind::Depth,
            PassKind::Pixelation,
            PassKind::Depth,
            PassKind::Color,
        ] {
            assert!(matches!(composer.set_active(kind), Switch::Replaced { .. }));
        }

        assert_eq!(composer.active(), Some(PassKind::Color));
        for (kind, size) in PassKind::ALL.into_iter().zip(sizes) {
            let pass = composer.pass(kind).expect("evicted pass still registered");
            assert_eq!(pass.kind(), kind);
            assert_eq!(target_size(pass), size);
            assert_eq!(pass.target().allocations(), 1);
        }

        composer.dispose();
    }
}
