//! Raster layer built on a [`TileSource`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::coord::RectCoord;
use crate::log::{default_logger, Logger};
use crate::log_debug;
use crate::render::{
    BlendMode, Layer, MaskingObject, PassComposer, Pausable, RenderObject, RenderPass, RenderPassProducer, RenderTarget,
    ScissorRect,
};
use crate::source::{SourceError, TileAddress, TileSource};

use super::quad::{TileMask, TileQuad};

/// Render index used when none is configured.
pub const DEFAULT_RENDER_PASS_INDEX: i32 = 0;

#[derive(Debug, Default)]
struct Drawables {
    /// Source generation the quads were built from; `None` forces a rebuild.
    generation: Option<u64>,
    /// Coarsest level first.
    quads: Vec<Arc<TileQuad>>,
}

#[derive(Default)]
struct Compositing {
    mask: Option<Arc<dyn MaskingObject>>,
    render_target: Option<Arc<dyn RenderTarget>>,
    scissoring_rect: Option<ScissorRect>,
    blend_mode: BlendMode,
}

/// Draws the ready tiles of a [`TileSource`] as [`TileQuad`]s.
///
/// Quads are rebuilt in [`Layer::update`] only when the source's ready set
/// changed, and a quad keeps its identity as long as its tile stays ready.
/// All quads go into one render pass, coarser levels first so finer tiles
/// paint over them. With `mask_tile` set in the layer's zoom info and no
/// layer-wide mask, every quad gets its own pass masked to its tile bounds,
/// in the same order. A hidden layer produces no passes; a paused layer drops
/// its quads and stops handing out loads until resumed.
pub struct TiledRasterLayer {
    source: Arc<TileSource>,
    render_pass_index: i32,
    hidden: AtomicBool,
    drawables: Mutex<Drawables>,
    compositing: Mutex<Compositing>,
    logger: Arc<dyn Logger>,
}

impl fmt::Debug for TiledRasterLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiledRasterLayer")
            .field("name", &self.name())
            .field("render_pass_index", &self.render_pass_index)
            .field("hidden", &self.is_hidden())
            .field("quads", &self.drawables.lock().quads.len())
            .finish()
    }
}

impl TiledRasterLayer {
    pub fn new(source: Arc<TileSource>) -> Self {
        Self {
            source,
            render_pass_index: DEFAULT_RENDER_PASS_INDEX,
            hidden: AtomicBool::new(false),
            drawables: Mutex::new(Drawables::default()),
            compositing: Mutex::new(Compositing::default()),
            logger: default_logger(),
        }
    }

    pub fn with_render_pass_index(mut self, index: i32) -> Self {
        self.render_pass_index = index;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn source(&self) -> &Arc<TileSource> {
        &self.source
    }

    /// Mask all passes of this layer. `None` removes the mask.
    pub fn set_mask(&self, mask: Option<Arc<dyn MaskingObject>>) {
        self.compositing.lock().mask = mask;
    }

    pub fn set_render_target(&self, target: Option<Arc<dyn RenderTarget>>) {
        self.compositing.lock().render_target = target;
    }

    pub fn set_scissoring_rect(&self, rect: Option<ScissorRect>) {
        self.compositing.lock().scissoring_rect = rect;
    }

    pub fn set_blend_mode(&self, blend_mode: BlendMode) {
        self.compositing.lock().blend_mode = blend_mode;
    }

    /// Forward a camera change to the source.
    ///
    /// # Errors
    ///
    /// See [`TileSource::on_visible_bounds_changed`].
    pub fn on_visible_bounds_changed(&self, visible_bounds: &RectCoord, camera_zoom: f64) -> Result<usize, SourceError> {
        if self.source.is_paused() {
            return Ok(0);
        }
        self.source.on_visible_bounds_changed(visible_bounds, camera_zoom)
    }

    /// Current quads, coarsest first.
    pub fn quads(&self) -> Vec<Arc<TileQuad>> {
        self.drawables.lock().quads.clone()
    }

    fn sync_quads(&self) {
        let generation = self.source.generation();
        let mut drawables = self.drawables.lock();
        if drawables.generation == Some(generation) {
            return;
        }

        let mut previous: HashMap<TileAddress, Arc<TileQuad>> =
            drawables.quads.drain(..).map(|quad| (quad.address(), quad)).collect();
        drawables.quads = self
            .source
            .ready_tiles()
            .into_iter()
            .map(|loaded| match previous.remove(&loaded.tile.address()) {
                Some(quad) if quad.data() == &loaded.data => quad,
                _ => Arc::new(TileQuad::from(loaded)),
            })
            .collect();
        drawables.generation = Some(generation);
        log_debug!(
            self.logger,
            "layer {} now draws {} tiles",
            self.name(),
            drawables.quads.len()
        );
    }
}

impl Layer for TiledRasterLayer {
    fn name(&self) -> &str {
        self.source.layer_name()
    }

    fn show(&self) {
        self.hidden.store(false, Ordering::Release);
    }

    fn hide(&self) {
        self.hidden.store(true, Ordering::Release);
    }

    fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::Acquire)
    }

    fn update(&self) {
        if !self.source.is_paused() {
            self.sync_quads();
        }
    }
}

impl RenderPassProducer for TiledRasterLayer {
    fn build_render_passes(&self) -> Vec<RenderPass> {
        if self.is_hidden() {
            return Vec::new();
        }
        let quads = self.quads();
        if quads.is_empty() {
            return Vec::new();
        }

        let compositing = self.compositing.lock();
        let layer_mask = compositing.mask.clone();
        let composer_with = |mask: Option<Arc<dyn MaskingObject>>| {
            let mut composer = PassComposer::new().with_blend_mode(compositing.blend_mode);
            if let Some(mask) = mask {
                composer = composer.with_mask(mask);
            }
            if let Some(target) = &compositing.render_target {
                composer = composer.with_render_target(Arc::clone(target));
            }
            if let Some(rect) = compositing.scissoring_rect {
                composer = composer.with_scissoring_rect(rect);
            }
            composer
        };

        if layer_mask.is_none() && self.source.config().zoom_info().mask_tile {
            return quads
                .into_iter()
                .flat_map(|quad| {
                    let mask: Arc<dyn MaskingObject> = Arc::new(TileMask::new(quad.tile().bounds));
                    let mut composer = composer_with(Some(mask));
                    composer.push(self.render_pass_index, quad);
                    composer.build_render_passes()
                })
                .collect();
        }

        let mut composer = composer_with(layer_mask);
        for quad in quads {
            let object: Arc<dyn RenderObject> = quad;
            composer.push(self.render_pass_index, object);
        }
        composer.build_render_passes()
    }
}

impl Pausable for TiledRasterLayer {
    /// Stop loading and release the quads.
    fn pause(&self) {
        self.source.pause();
        let mut drawables = self.drawables.lock();
        drawables.quads.clear();
        drawables.generation = None;
    }

    fn resume(&self) {
        self.source.resume();
        self.sync_quads();
    }

    fn is_paused(&self) -> bool {
        self.source.is_paused()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::CoordinateSystem;
    use crate::render::testing::{NamedMask, NamedTarget};
    use crate::source::{LoaderResult, TileCache, TileLoader};
    use crate::tiling::{LayerTilingConfig, ZoomInfo, WEB_MERCATOR_BASE_ZOOM};

    fn layer() -> TiledRasterLayer {
        let loader: Arc<dyn TileLoader> = Arc::new(|url: &str, _: Option<&str>| LoaderResult::ok(url.as_bytes().to_vec()));
        let cache = Arc::new(TileCache::new(64).unwrap());
        let config = Arc::new(LayerTilingConfig::web_mercator("osm", "https://x/{z}/{x}/{y}.png"));
        TiledRasterLayer::new(Arc::new(TileSource::new(config, loader, cache)))
    }

    fn show_level(layer: &TiledRasterLayer, level: i32) {
        let camera = WEB_MERCATOR_BASE_ZOOM / 2f64.powi(level) * 1.01;
        layer
            .on_visible_bounds_changed(&CoordinateSystem::epsg3857().bounds, camera)
            .unwrap();
        layer.source().load_due();
        layer.update();
    }

    #[test]
    fn test_no_passes_before_tiles_are_ready() {
        let layer = layer();
        assert!(layer.build_render_passes().is_empty());
        assert!(layer.build_compute_passes().is_empty());
    }

    #[test]
    fn test_ready_tiles_become_one_pass() {
        let layer = layer().with_render_pass_index(3);
        show_level(&layer, 1);

        let passes = layer.build_render_passes();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].config().render_pass_index, 3);
        assert_eq!(passes[0].len(), 4);
        assert!(!passes[0].config().is_pass_masked);
        assert!(passes[0].render_objects().iter().all(|o| o.is_ready()));
    }

    #[test]
    fn test_coarse_levels_draw_first() {
        let layer = layer();
        let mut info = *layer.source().config().zoom_info();
        info.num_draw_previous_layers = 1;
        let config = Arc::new(layer.source().config().clone().with_zoom_info(info));
        let loader: Arc<dyn TileLoader> = Arc::new(|_: &str, _: Option<&str>| LoaderResult::ok(vec![1u8]));
        let source = Arc::new(TileSource::new(config, loader, Arc::new(TileCache::new(64).unwrap())));
        let layer = TiledRasterLayer::new(source);
        show_level(&layer, 1);

        let levels: Vec<i32> = layer.quads().iter().map(|q| q.tile().level_identifier).collect();
        assert_eq!(levels, vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_quads_keep_identity_across_updates() {
        let layer = layer();
        show_level(&layer, 1);
        let before = layer.quads();
        show_level(&layer, 1);
        let after = layer.quads();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert!(Arc::ptr_eq(a, b));
        }
    }

    #[test]
    fn test_hidden_layer_has_no_passes() {
        let layer = layer();
        show_level(&layer, 0);
        layer.hide();
        assert!(layer.is_hidden());
        assert!(layer.build_render_passes().is_empty());
        layer.show();
        assert_eq!(layer.build_render_passes().len(), 1);
    }

    #[test]
    fn test_mask_target_and_scissor_apply() {
        let layer = layer();
        show_level(&layer, 0);
        layer.set_mask(Some(NamedMask::arc("outline")));
        layer.set_render_target(Some(NamedTarget::arc("offscreen")));
        layer.set_scissoring_rect(Some(ScissorRect::new(0, 0, 256, 256)));
        layer.set_blend_mode(BlendMode::Multiply);

        let passes = layer.build_render_passes();
        let pass = &passes[0];
        assert!(pass.config().is_pass_masked);
        assert!(pass.mask().is_some());
        assert_eq!(pass.render_target().map(|t| t.name()), Some("offscreen"));
        assert_eq!(pass.scissoring_rect(), Some(ScissorRect::new(0, 0, 256, 256)));
        assert_eq!(pass.config().blend_mode, BlendMode::Multiply);

        layer.set_mask(None);
        assert!(!layer.build_render_passes()[0].config().is_pass_masked);
    }

    fn masked_tiles_layer() -> TiledRasterLayer {
        let info = ZoomInfo {
            mask_tile: true,
            ..ZoomInfo::default()
        };
        let config = Arc::new(LayerTilingConfig::web_mercator("osm", "https://x/{z}/{x}/{y}.png").with_zoom_info(info));
        let loader: Arc<dyn TileLoader> = Arc::new(|url: &str, _: Option<&str>| LoaderResult::ok(url.as_bytes().to_vec()));
        let source = TileSource::new(config, loader, Arc::new(TileCache::new(64).unwrap()));
        TiledRasterLayer::new(Arc::new(source)).with_render_pass_index(2)
    }

    #[test]
    fn test_mask_tile_gives_each_tile_its_own_pass() {
        let layer = masked_tiles_layer();
        show_level(&layer, 1);
        layer.set_blend_mode(BlendMode::Multiply);

        let passes = layer.build_render_passes();
        let quads = layer.quads();
        assert_eq!(passes.len(), 4);
        for (pass, quad) in passes.iter().zip(&quads) {
            assert_eq!(pass.len(), 1);
            assert_eq!(pass.config().render_pass_index, 2);
            assert_eq!(pass.config().blend_mode, BlendMode::Multiply);
            assert!(pass.config().is_pass_masked);
            let mask = pass.mask().unwrap();
            assert_eq!(mask.bounds(), Some(quad.tile().bounds));
        }
    }

    #[test]
    fn test_layer_mask_replaces_tile_masks() {
        let layer = masked_tiles_layer();
        show_level(&layer, 1);
        layer.set_mask(Some(NamedMask::arc("outline")));

        let passes = layer.build_render_passes();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].len(), 4);
        assert_eq!(passes[0].mask().unwrap().bounds(), None);
    }

    #[test]
    fn test_pause_drops_quads_and_resume_restores() {
        let layer = layer();
        show_level(&layer, 1);
        layer.pause();
        assert!(layer.is_paused());
        assert!(layer.build_render_passes().is_empty());
        assert_eq!(layer.on_visible_bounds_changed(&CoordinateSystem::epsg3857().bounds, 1.0).unwrap(), 0);

        layer.resume();
        assert_eq!(layer.quads().len(), 4);
    }
}
