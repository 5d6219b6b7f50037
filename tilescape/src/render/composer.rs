//! Grouping of render objects into passes.
//!
//! Layers hand their objects to a [`PassComposer`] tagged with a render
//! index. The composer emits one pass per index, in ascending index order,
//! with objects in the order they were added. [`Frame`] gathers the passes of
//! several layers for one frame.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::layer::RenderPassProducer;
use super::object::{ComputeObject, MaskingObject, RenderConfig, RenderObject, RenderTarget, ScissorRect};
use super::pass::{BlendMode, ComputePass, RenderPass, RenderPassConfig};

/// Builds the passes of one layer for one frame.
#[derive(Debug, Default)]
pub struct PassComposer {
    render: BTreeMap<i32, Vec<Arc<dyn RenderObject>>>,
    compute: Vec<Arc<dyn ComputeObject>>,
    mask: Option<Arc<dyn MaskingObject>>,
    render_target: Option<Arc<dyn RenderTarget>>,
    scissoring_rect: Option<ScissorRect>,
    blend_mode: BlendMode,
}

impl PassComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask every emitted render pass with `mask`.
    pub fn with_mask(mut self, mask: Arc<dyn MaskingObject>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Redirect every emitted render pass to `target`.
    pub fn with_render_target(mut self, target: Arc<dyn RenderTarget>) -> Self {
        self.render_target = Some(target);
        self
    }

    pub fn with_scissoring_rect(mut self, rect: ScissorRect) -> Self {
        self.scissoring_rect = Some(rect);
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Queue `object` for the pass with `render_index`.
    pub fn push(&mut self, render_index: i32, object: Arc<dyn RenderObject>) {
        self.render.entry(render_index).or_default().push(object);
    }

    pub fn push_config(&mut self, config: &RenderConfig) {
        self.push(config.render_index, Arc::clone(&config.object));
    }

    pub fn push_compute(&mut self, object: Arc<dyn ComputeObject>) {
        self.compute.push(object);
    }

    pub fn is_empty(&self) -> bool {
        self.render.is_empty() && self.compute.is_empty()
    }

    /// One render pass per queued index, ascending.
    pub fn build_render_passes(&self) -> Vec<RenderPass> {
        let masked = self.mask.is_some();
        self.render
            .iter()
            .map(|(&index, objects)| {
                let config = RenderPassConfig::new(index)
                    .masked(masked)
                    .with_blend_mode(self.blend_mode);
                let mut pass = RenderPass::new(config, objects.clone(), self.mask.clone());
                if let Some(target) = &self.render_target {
                    pass = pass.with_render_target(Arc::clone(target));
                }
                if let Some(rect) = self.scissoring_rect {
                    pass = pass.with_scissoring_rect(rect);
                }
                pass
            })
            .collect()
    }

    /// A single compute pass with every queued compute object, or nothing.
    pub fn build_compute_passes(&self) -> Vec<ComputePass> {
        if self.compute.is_empty() {
            Vec::new()
        } else {
            vec![ComputePass::new(self.compute.clone())]
        }
    }
}

/// Passes collected from all active layers for one frame.
#[derive(Debug, Default)]
pub struct Frame {
    pub render_passes: Vec<RenderPass>,
    pub compute_passes: Vec<ComputePass>,
}

impl Frame {
    /// Ask each producer for its passes exactly once.
    ///
    /// Render passes are ordered by render index; passes sharing an index
    /// keep the order of `producers`.
    pub fn collect<'a, I>(producers: I) -> Self
    where
        I: IntoIterator<Item = &'a dyn RenderPassProducer>,
    {
        let mut frame = Frame::default();
        for producer in producers {
            frame.render_passes.extend(producer.build_render_passes());
            frame.compute_passes.extend(producer.build_compute_passes());
        }
        // Stable sort keeps layer order within an index.
        frame
            .render_passes
            .sort_by_key(|pass| pass.config().render_pass_index);
        frame
    }

    pub fn object_count(&self) -> usize {
        self.render_passes.iter().map(RenderPass::len).sum()
    }
}
