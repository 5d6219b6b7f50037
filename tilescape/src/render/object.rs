//! Interfaces of the objects a renderer consumes.
//!
//! Rasterization, shaders and GPU resources live outside this crate. Passes
//! only hold shared references to these trait objects and hand them to the
//! renderer in order.

use std::fmt::Debug;
use std::sync::Arc;

use crate::coord::RectCoord;

/// Something the renderer can draw.
pub trait RenderObject: Debug + Send + Sync {
    /// Whether GPU resources are set up and the object can be drawn.
    fn is_ready(&self) -> bool;
}

/// Something the renderer runs as a compute dispatch.
pub trait ComputeObject: Debug + Send + Sync {
    fn is_ready(&self) -> bool;
}

/// Geometry used to mask a pass; only fragments inside it are kept.
pub trait MaskingObject: Debug + Send + Sync {
    fn is_ready(&self) -> bool;

    /// Extent of the mask, if it is a simple rectangle.
    fn bounds(&self) -> Option<RectCoord> {
        None
    }
}

/// Off-screen target a pass can be redirected to.
pub trait RenderTarget: Debug + Send + Sync {
    fn name(&self) -> &str;
}

/// A render object together with the pass index it should be drawn in.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub render_index: i32,
    pub object: Arc<dyn RenderObject>,
}

impl RenderConfig {
    pub fn new(render_index: i32, object: Arc<dyn RenderObject>) -> Self {
        Self {
            render_index,
            object,
        }
    }
}

/// Pixel rectangle limiting where a pass may draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}
