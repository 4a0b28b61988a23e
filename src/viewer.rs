//! The display host layers are handed to.
//!
//! Rendering, painting and the event loop live outside this crate; a
//! [`LayerSink`] receives finished layers and, for the duration of the
//! interactive session, mutable access to the label rasters.

use crate::core::LabelView;
use crate::types::{Raster, RgbRaster, SwathResult};

pub trait LayerSink {
    fn add_image_layer(
        &mut self,
        name: &str,
        data: &Raster,
        colourmap: &str,
        scale: Option<(f32, f32)>,
    ) -> SwathResult<()>;

    fn add_rgb_layer(&mut self, name: &str, data: &RgbRaster) -> SwathResult<()>;

    fn add_label_layer(&mut self, name: &str, colour: &str) -> SwathResult<()>;

    /// Block until the user ends the session; labels may be edited in place
    fn run_interactive_session(&mut self, labels: &mut [LabelView<'_>]) -> SwathResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Image,
    Rgb,
    Label,
}

/// What a headless viewer saw of one layer
#[derive(Debug, Clone)]
pub struct LayerSummary {
    pub name: String,
    pub layer_type: LayerType,
    pub shape: Vec<usize>,
    /// Finite minimum and maximum, `None` when every value is missing
    pub range: Option<(f32, f32)>,
}

/// A viewer without a display: logs and records each layer, and returns
/// from the session immediately
#[derive(Debug, Default)]
pub struct HeadlessViewer {
    pub layers: Vec<LayerSummary>,
    pub sessions: usize,
}

impl HeadlessViewer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn finite_range<'a, I: Iterator<Item = &'a f32>>(values: I) -> Option<(f32, f32)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

impl LayerSink for HeadlessViewer {
    fn add_image_layer(
        &mut self,
        name: &str,
        data: &Raster,
        colourmap: &str,
        scale: Option<(f32, f32)>,
    ) -> SwathResult<()> {
        let range = finite_range(data.iter());
        log::info!(
            "Image layer {} {:?} colourmap={} scale={:?} range={:?}",
            name,
            data.dim(),
            colourmap,
            scale,
            range
        );
        self.layers.push(LayerSummary {
            name: name.to_string(),
            layer_type: LayerType::Image,
            shape: data.shape().to_vec(),
            range,
        });
        Ok(())
    }

    fn add_rgb_layer(&mut self, name: &str, data: &RgbRaster) -> SwathResult<()> {
        let range = finite_range(data.iter());
        log::info!("RGB layer {} {:?} range={:?}", name, data.dim(), range);
        self.layers.push(LayerSummary {
            name: name.to_string(),
            layer_type: LayerType::Rgb,
            shape: data.shape().to_vec(),
            range,
        });
        Ok(())
    }

    fn add_label_layer(&mut self, name: &str, colour: &str) -> SwathResult<()> {
        log::info!("Label layer {} colour={}", name, colour);
        self.layers.push(LayerSummary {
            name: name.to_string(),
            layer_type: LayerType::Label,
            shape: Vec::new(),
            range: None,
        });
        Ok(())
    }

    fn run_interactive_session(&mut self, labels: &mut [LabelView<'_>]) -> SwathResult<()> {
        self.sessions += 1;
        for label in labels.iter() {
            let labeled = label.raster.iter().filter(|&&v| v != 0).count();
            log::info!("Labels {}: {} labeled cells", label.name, labeled);
        }
        log::info!("No display attached, ending session");
        Ok(())
    }
}
