//! Capability traits of map layers.
//!
//! A concrete layer implements the subset it supports. A renderer only needs
//! [`RenderPassProducer`]; a map controller uses [`Layer`] for visibility and
//! [`Pausable`] to stop background loading while the map is not shown.

use super::pass::{ComputePass, RenderPass};

/// Identity and visibility.
pub trait Layer: Send + Sync {
    fn name(&self) -> &str;

    fn show(&self);

    fn hide(&self);

    fn is_hidden(&self) -> bool;

    /// Per-frame bookkeeping before passes are built.
    fn update(&self) {}
}

/// Produces the passes of one frame. Called once per frame; the result is
/// consumed immediately and not retained.
pub trait RenderPassProducer {
    fn build_render_passes(&self) -> Vec<RenderPass>;

    fn build_compute_passes(&self) -> Vec<ComputePass> {
        Vec::new()
    }
}

/// Suspends and resumes background work.
pub trait Pausable {
    fn pause(&self);

    fn resume(&self);

    fn is_paused(&self) -> bool;
}
