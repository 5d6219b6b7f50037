//! Render and compute pass composition.
//!
//! Layers turn their drawable objects into [`RenderPass`]es and
//! [`ComputePass`]es once per frame. Passes keep object order exactly and do
//! not own the objects; an external renderer consumes them immediately.

mod composer;
mod layer;
mod object;
mod pass;

pub use composer::{Frame, PassComposer};
pub use layer::{Layer, Pausable, RenderPassProducer};
pub use object::{ComputeObject, MaskingObject, RenderConfig, RenderObject, RenderTarget, ScissorRect};
pub use pass::{BlendMode, ComputePass, RenderPass, RenderPassConfig};
