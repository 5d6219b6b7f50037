//! Render and compute passes.
//!
//! A pass is a short-lived, frame-scoped list of object references plus
//! compositing settings. Object order is draw order; nothing here sorts or
//! batches. After construction only the scissor rectangle can change, and
//! objects can be appended.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::object::{ComputeObject, MaskingObject, RenderObject, RenderTarget, ScissorRect};

/// How a pass is blended onto what is already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
}

/// Per-pass settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RenderPassConfig {
    /// Passes are drawn in ascending index order across all layers.
    pub render_pass_index: i32,
    pub is_pass_masked: bool,
    pub blend_mode: BlendMode,
}

impl RenderPassConfig {
    pub fn new(render_pass_index: i32) -> Self {
        Self {
            render_pass_index,
            ..Self::default()
        }
    }

    pub fn masked(mut self, is_pass_masked: bool) -> Self {
        self.is_pass_masked = is_pass_masked;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }
}

/// Ordered render objects plus compositing settings.
#[derive(Debug, Clone)]
pub struct RenderPass {
    config: RenderPassConfig,
    objects: Vec<Arc<dyn RenderObject>>,
    mask: Option<Arc<dyn MaskingObject>>,
    scissoring_rect: Option<ScissorRect>,
    render_target: Option<Arc<dyn RenderTarget>>,
}

impl RenderPass {
    /// Create a pass drawing `objects` in the given order.
    pub fn new(
        config: RenderPassConfig,
        objects: Vec<Arc<dyn RenderObject>>,
        mask: Option<Arc<dyn MaskingObject>>,
    ) -> Self {
        Self {
            config,
            objects,
            mask,
            scissoring_rect: None,
            render_target: None,
        }
    }

    /// Create a pass with a single object.
    pub fn with_object(config: RenderPassConfig, object: Arc<dyn RenderObject>) -> Self {
        Self::new(config, vec![object], None)
    }

    pub fn with_mask(mut self, mask: Arc<dyn MaskingObject>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_render_target(mut self, target: Arc<dyn RenderTarget>) -> Self {
        self.render_target = Some(target);
        self
    }

    pub fn with_scissoring_rect(mut self, rect: ScissorRect) -> Self {
        self.scissoring_rect = Some(rect);
        self
    }

    pub fn config(&self) -> &RenderPassConfig {
        &self.config
    }

    /// Objects in draw order.
    pub fn render_objects(&self) -> &[Arc<dyn RenderObject>] {
        &self.objects
    }

    /// Append an object; it is drawn after all existing ones.
    pub fn add_render_object(&mut self, object: Arc<dyn RenderObject>) {
        self.objects.push(object);
    }

    pub fn mask(&self) -> Option<&Arc<dyn MaskingObject>> {
        self.mask.as_ref()
    }

    pub fn scissoring_rect(&self) -> Option<ScissorRect> {
        self.scissoring_rect
    }

    /// Change or clear the scissor rectangle without rebuilding the pass.
    pub fn set_scissoring_rect(&mut self, rect: Option<ScissorRect>) {
        self.scissoring_rect = rect;
    }

    pub fn render_target(&self) -> Option<&Arc<dyn RenderTarget>> {
        self.render_target.as_ref()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Ordered compute objects.
#[derive(Debug, Clone, Default)]
pub struct ComputePass {
    objects: Vec<Arc<dyn ComputeObject>>,
}

impl ComputePass {
    pub fn new(objects: Vec<Arc<dyn ComputeObject>>) -> Self {
        Self { objects }
    }

    pub fn with_object(object: Arc<dyn ComputeObject>) -> Self {
        Self::new(vec![object])
    }

    /// Objects in dispatch order.
    pub fn compute_objects(&self) -> &[Arc<dyn ComputeObject>] {
        &self.objects
    }

    pub fn add_compute_object(&mut self, object: Arc<dyn ComputeObject>) {
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{Named, NamedCompute, NamedMask, NamedTarget};

    fn names(pass: &RenderPass) -> Vec<String> {
        pass.render_objects().iter().map(|o| format!("{:?}", o)).collect()
    }

    #[test]
    fn test_objects_keep_construction_order() {
        let pass = RenderPass::new(
            RenderPassConfig::new(0),
            vec![Named::arc("c"), Named::arc("a"), Named::arc("b")],
            None,
        );
        assert_eq!(names(&pass), vec!["Named(\"c\")", "Named(\"a\")", "Named(\"b\")"]);
    }

    #[test]
    fn test_add_render_object_appends() {
        let mut pass = RenderPass::with_object(RenderPassConfig::new(1), Named::arc("first"));
        pass.add_render_object(Named::arc("second"));
        assert_eq!(pass.len(), 2);
        assert_eq!(names(&pass)[1], "Named(\"second\")");
    }

    #[test]
    fn test_scissor_is_mutable() {
        let mut pass = RenderPass::with_object(RenderPassConfig::new(0), Named::arc("a"))
            .with_scissoring_rect(ScissorRect::new(0, 0, 10, 10));
        assert_eq!(pass.scissoring_rect(), Some(ScissorRect::new(0, 0, 10, 10)));

        pass.set_scissoring_rect(Some(ScissorRect::new(5, 5, 20, 20)));
        assert_eq!(pass.scissoring_rect(), Some(ScissorRect::new(5, 5, 20, 20)));
        pass.set_scissoring_rect(None);
        assert_eq!(pass.scissoring_rect(), None);
        assert_eq!(pass.len(), 1, "objects are untouched");
    }

    #[test]
    fn test_mask_and_target() {
        let pass = RenderPass::new(RenderPassConfig::new(2).masked(true), vec![], None)
            .with_mask(NamedMask::arc("clip"))
            .with_render_target(NamedTarget::arc("offscreen"));
        assert!(pass.config().is_pass_masked);
        assert!(pass.mask().is_some());
        assert_eq!(pass.render_target().map(|t| t.name()), Some("offscreen"));
        assert!(pass.is_empty());
    }

    #[test]
    fn test_pass_shares_objects() {
        let object = Named::arc("shared");
        let pass = RenderPass::with_object(RenderPassConfig::new(0), Arc::clone(&object));
        assert_eq!(Arc::strong_count(&object), 2);
        drop(pass);
        assert_eq!(Arc::strong_count(&object), 1);
    }

    #[test]
    fn test_compute_pass_order() {
        let mut pass = ComputePass::with_object(NamedCompute::arc("blur"));
        pass.add_compute_object(NamedCompute::arc("sharpen"));
        let order: Vec<String> = pass.compute_objects().iter().map(|o| format!("{:?}", o)).collect();
        assert_eq!(order, vec!["NamedCompute(\"blur\")", "NamedCompute(\"sharpen\")"]);
    }

    #[test]
    fn test_config_builder() {
        let config = RenderPassConfig::new(3).masked(true).with_blend_mode(BlendMode::Multiply);
        assert_eq!(config.render_pass_index, 3);
        assert!(config.is_pass_masked);
        assert_eq!(config.blend_mode, BlendMode::Multiply);
        assert_eq!(RenderPassConfig::default().blend_mode, BlendMode::Normal);
    }
}
