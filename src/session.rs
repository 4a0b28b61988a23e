use crate::config::{ChannelRef, LayerEntry, LayerKind};
use crate::core::{
    AxisBindings, BuiltLayer, ChannelLoader, Composition, GridGeometry, LayerComposer, MaskStore,
    PersistReport,
};
use crate::io::DatasetProvider;
use crate::types::{SwathError, SwathResult};
use crate::viewer::LayerSink;

/// One labelling session over a scene: build layers, hand them to the
/// viewer, run it, then save the labels
pub struct LabellingSession<'a> {
    grid: GridGeometry,
    provider: &'a dyn DatasetProvider,
    masks: MaskStore,
}

impl<'a> LabellingSession<'a> {
    pub fn new(grid: GridGeometry, provider: &'a dyn DatasetProvider) -> Self {
        let masks = MaskStore::new(grid.shape(), grid.dim_names());
        Self { grid, provider, masks }
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    pub fn masks(&self) -> &MaskStore {
        &self.masks
    }

    /// Build all layers without handing them to a viewer
    pub fn compose(&mut self, entries: &[LayerEntry]) -> Composition {
        LayerComposer::new(&self.grid, self.provider, &mut self.masks).compose_all(entries)
    }

    /// Compose, add the layers to `viewer` in order and run the interactive
    /// session when at least one layer was added.
    ///
    /// A layer the viewer rejects is logged and skipped. Returns the number
    /// of layers the viewer accepted.
    pub fn open<V: LayerSink>(&mut self, entries: &[LayerEntry], viewer: &mut V) -> SwathResult<usize> {
        let composition = self.compose(entries);

        let mut added = 0;
        for layer in &composition.layers {
            let result = match layer {
                BuiltLayer::Image(l) => viewer.add_image_layer(&l.name, &l.data, &l.colourmap, l.scale),
                BuiltLayer::Rgb(l) => viewer.add_rgb_layer(&l.name, &l.data),
                BuiltLayer::Label(l) => viewer.add_label_layer(&l.name, &l.colour),
            };
            match result {
                Ok(()) => added += 1,
                Err(e) => log::error!(
                    "Layer {}:{} [Failed] viewer rejected the layer: {}",
                    layer.name(),
                    layer.type_name(),
                    e
                ),
            }
        }

        if added == 0 {
            log::warn!("No layers could be added, not starting the viewer");
            return Ok(0);
        }

        let mut views = self.masks.views_mut();
        viewer.run_interactive_session(&mut views)?;
        Ok(added)
    }

    /// Save every label mask back to its file
    pub fn close(&self) -> PersistReport {
        self.masks.persist_all()
    }
}

/// Grid taking its shape from the first declared variable that projects
/// cleanly onto `axes`.
///
/// Declarations are tried in order; labels carry no data and are passed
/// over. Fails only when no variable can be projected.
pub fn infer_grid(
    axes: AxisBindings,
    provider: &dyn DatasetProvider,
    entries: &[LayerEntry],
) -> SwathResult<GridGeometry> {
    let loader = ChannelLoader::new(&axes);

    for entry in entries {
        let spec = match entry.to_spec() {
            Ok(spec) => spec,
            Err(e) => {
                log::debug!("Skipping {} for the grid shape: {}", entry.name(), e);
                continue;
            }
        };
        let candidates: Vec<(&ChannelRef, bool)> = match &spec.kind {
            LayerKind::Image(image) => vec![(&image.source, image.split_extra_dim)],
            LayerKind::RgbImage(rgb) => rgb.channels().into_iter().map(|c| (c, false)).collect(),
            LayerKind::Label(_) => Vec::new(),
        };

        for (channel, allow_extra_dim) in candidates {
            let shape = provider
                .open(channel.channel.as_deref())
                .and_then(|dataset| loader.load(dataset.as_ref(), &channel.variable, allow_extra_dim));
            match shape.map(|slices| slices.first().map(|s| s.data.dim())) {
                Ok(Some(shape)) => {
                    log::info!("Grid shape {:?} taken from {}", shape, channel.display());
                    return GridGeometry::new(axes.clone(), shape);
                }
                Ok(None) => {}
                Err(e) => log::warn!(
                    "Cannot take the grid shape from {}: {}",
                    channel.display(),
                    e
                ),
            }
        }
    }

    Err(SwathError::Config(
        "No declared variable could be loaded to take the grid shape from".to_string(),
    ))
}
