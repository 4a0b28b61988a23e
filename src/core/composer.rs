use crate::config::{ChannelRef, ImageSpec, LabelSpec, LayerEntry, LayerKind, LayerSpec, RgbSpec};
use crate::core::channel_loader::{ChannelLoader, ChannelSlice};
use crate::core::grid::GridGeometry;
use crate::core::mask_store::MaskStore;
use crate::core::resolution::ResolutionNormalizer;
use crate::core::view_geometry::ViewGeometryAligner;
use crate::io::DatasetProvider;
use crate::types::{AggregateMode, ChannelDescriptor, Raster, RgbRaster, SwathError, SwathResult};
use ndarray::{stack, Axis};

/// A single-channel layer ready for display
#[derive(Debug, Clone)]
pub struct ImageLayer {
    pub name: String,
    pub data: Raster,
    pub colourmap: String,
    pub scale: Option<(f32, f32)>,
}

/// A false-colour composite ready for display
#[derive(Debug, Clone)]
pub struct RgbLayer {
    pub name: String,
    pub data: RgbRaster,
}

/// A label layer; the raster itself stays in the [`MaskStore`]
#[derive(Debug, Clone)]
pub struct LabelLayer {
    pub name: String,
    pub mask: String,
    pub colour: String,
}

#[derive(Debug, Clone)]
pub enum BuiltLayer {
    Image(ImageLayer),
    Rgb(RgbLayer),
    Label(LabelLayer),
}

impl BuiltLayer {
    pub fn name(&self) -> &str {
        match self {
            BuiltLayer::Image(l) => &l.name,
            BuiltLayer::Rgb(l) => &l.name,
            BuiltLayer::Label(l) => &l.name,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            BuiltLayer::Image(_) => "image",
            BuiltLayer::Rgb(_) => "rgb_image",
            BuiltLayer::Label(_) => "label",
        }
    }
}

/// A declared layer that could not be built
#[derive(Debug)]
pub struct LayerFailure {
    pub name: String,
    pub layer_type: String,
    pub error: SwathError,
}

/// Everything built from one pass over the declarations
#[derive(Debug, Default)]
pub struct Composition {
    /// Layers in display stacking order
    pub layers: Vec<BuiltLayer>,
    pub failures: Vec<LayerFailure>,
    /// Declarations that built successfully
    pub succeeded: usize,
    pub skipped: usize,
}

/// Builds co-registered layers on the canonical grid from layer declarations
pub struct LayerComposer<'a> {
    grid: &'a GridGeometry,
    provider: &'a dyn DatasetProvider,
    masks: &'a mut MaskStore,
    aligner: ViewGeometryAligner,
    normalizer: ResolutionNormalizer,
}

impl<'a> LayerComposer<'a> {
    pub fn new(grid: &'a GridGeometry, provider: &'a dyn DatasetProvider, masks: &'a mut MaskStore) -> Self {
        Self {
            grid,
            provider,
            masks,
            aligner: ViewGeometryAligner::new(grid.shape()),
            normalizer: ResolutionNormalizer::new(grid.shape()),
        }
    }

    /// Replace the oblique placement, e.g. with per-scene calibration offsets
    pub fn with_aligner(mut self, aligner: ViewGeometryAligner) -> Self {
        self.aligner = aligner;
        self
    }

    /// Build every enabled declaration in order.
    ///
    /// A failure is logged and recorded against its layer; the remaining
    /// layers are still built.
    pub fn compose_all(&mut self, entries: &[LayerEntry]) -> Composition {
        let mut composition = Composition::default();

        for entry in entries {
            let layer_type = entry.declared_type();
            let built = entry.enabled().and_then(|enabled| {
                if !enabled {
                    return Ok(None);
                }
                log::info!("Adding layer {}:{} ...", entry.name(), layer_type);
                let spec = entry.to_spec()?;
                self.build(&spec).map(Some)
            });

            match built {
                Ok(None) => {
                    log::debug!("Skipping disabled layer {}", entry.name());
                    composition.skipped += 1;
                }
                Ok(Some(layers)) => {
                    log::info!("Layer {}:{} [Done]", entry.name(), layer_type);
                    composition.succeeded += 1;
                    composition.layers.extend(layers);
                }
                Err(error) => {
                    log::error!("Layer {}:{} [Failed] {}", entry.name(), layer_type, error);
                    composition.failures.push(LayerFailure {
                        name: entry.name().to_string(),
                        layer_type,
                        error,
                    });
                }
            }
        }

        log::info!(
            "Built {} of {} layers ({} failed, {} disabled)",
            composition.succeeded,
            entries.len(),
            composition.failures.len(),
            composition.skipped
        );
        composition
    }

    /// Build the layer(s) for one validated spec; disabled specs yield nothing
    pub fn build(&mut self, spec: &LayerSpec) -> SwathResult<Vec<BuiltLayer>> {
        if !spec.enabled {
            return Ok(Vec::new());
        }
        match &spec.kind {
            LayerKind::Image(image) => Ok(self
                .build_image_layer(image)?
                .into_iter()
                .map(BuiltLayer::Image)
                .collect()),
            LayerKind::RgbImage(rgb) => Ok(vec![BuiltLayer::Rgb(self.build_rgb_layer(rgb)?)]),
            LayerKind::Label(label) => Ok(vec![BuiltLayer::Label(self.build_label_layer(label)?)]),
        }
    }

    /// Load, align, coarsen and validate a single channel.
    ///
    /// Produces several layers, one per index, when the spec allows splitting
    /// along an extra dimension.
    pub fn build_image_layer(&self, spec: &ImageSpec) -> SwathResult<Vec<ImageLayer>> {
        let slices = self.load_channel(&spec.source, spec.split_extra_dim)?;
        // an extra dimension left after squeezing always has two or more indices
        let split = slices.len() > 1;

        slices
            .into_iter()
            .map(|slice| {
                let name = if split {
                    slice.label.clone()
                } else {
                    spec.display_name.clone()
                };
                let data = self.to_canonical(&slice.label, slice.data, spec.descriptor, spec.aggregate)?;
                Ok(ImageLayer {
                    name,
                    data,
                    colourmap: spec.colourmap.clone(),
                    scale: spec.scale,
                })
            })
            .collect()
    }

    /// Three channels, each stretched by its own maximum, stacked as rgb
    pub fn build_rgb_layer(&self, spec: &RgbSpec) -> SwathResult<RgbLayer> {
        let mut bands: Vec<Raster> = Vec::with_capacity(3);
        for channel in spec.channels() {
            let slice = self
                .load_channel(channel, false)?
                .pop()
                .ok_or_else(|| SwathError::Shape(format!("{} produced no data", channel.display())))?;
            let data = self.to_canonical(&channel.display(), slice.data, channel.descriptor(), spec.aggregate)?;
            bands.push(stretch_to_max(&channel.display(), data)?);
        }

        let views: Vec<_> = bands.iter().map(|b| b.view()).collect();
        let data = stack(Axis(2), &views)
            .map_err(|e| SwathError::Shape(format!("Cannot stack rgb bands for {}: {}", spec.display_name, e)))?;

        Ok(RgbLayer {
            name: spec.display_name.clone(),
            data,
        })
    }

    /// Load or initialise the mask file next to the data
    pub fn build_label_layer(&mut self, spec: &LabelSpec) -> SwathResult<LabelLayer> {
        let path = self.provider.resource_path(&spec.filename);
        let mask = self.masks.load_or_init(&spec.display_name, &spec.colour, path)?;
        Ok(LabelLayer {
            name: format!("{} ({})", mask.name, mask.colour),
            mask: mask.name.clone(),
            colour: mask.colour.clone(),
        })
    }

    fn load_channel(&self, channel: &ChannelRef, allow_extra_dim: bool) -> SwathResult<Vec<ChannelSlice>> {
        let dataset = self.provider.open(channel.channel.as_deref())?;
        let loader = ChannelLoader::new(&self.grid.axes);
        loader.load(dataset.as_ref(), &channel.variable, allow_extra_dim)
    }

    /// Align before coarsening: averaging must see the padded fine frame
    fn to_canonical(
        &self,
        what: &str,
        data: Raster,
        descriptor: ChannelDescriptor,
        aggregate: AggregateMode,
    ) -> SwathResult<Raster> {
        let fine = descriptor.is_fine();
        let data = self.aligner.align(data, descriptor.view, fine)?;
        let data = if fine {
            self.normalizer.normalize(data, aggregate)?
        } else {
            data
        };
        self.grid.check_shape(what, data.dim())?;
        Ok(data)
    }
}

/// Divide a band by its own maximum, ignoring missing values.
///
/// An entirely missing band is returned as is. A band holding `+inf`, or
/// without a positive maximum, cannot be brought to a maximum of 1.
fn stretch_to_max(what: &str, band: Raster) -> SwathResult<Raster> {
    if band.iter().any(|&v| v == f32::INFINITY) {
        return Err(SwathError::InvalidFormat(format!(
            "{} contains infinite values, cannot stretch",
            what
        )));
    }

    let max = band
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);

    if max == f32::NEG_INFINITY {
        log::warn!("{} has no valid samples, left unstretched", what);
        return Ok(band);
    }
    if max <= 0.0 {
        return Err(SwathError::InvalidFormat(format!(
            "{} has no positive maximum ({}), cannot stretch",
            what, max
        )));
    }
    Ok(band.mapv_into(|v| v / max))
}
