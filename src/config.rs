//! Declarative layer configuration.
//!
//! Layers come either from a TOML file, one table per layer in display
//! order:
//!
//! ```toml
//! [S8]
//! type = "image"
//! filename = "S8_BT_in.nc"
//! colourmap = "magma"
//!
//! [false_colour]
//! type = "rgb_image"
//! red_filename = "S3_radiance_an.nc"
//! green_filename = "S2_radiance_an.nc"
//! blue_filename = "S1_radiance_an.nc"
//!
//! [cloud]
//! type = "label"
//! colour = "red"
//! filename = "cloud_mask.nc"
//! ```
//!
//! or from the compact command line notation `name[:min:max[:colourmap]]`
//! and `rgb(red:green:blue)` for layers over a single dataset.

use crate::types::{AggregateMode, ChannelDescriptor, Granularity, SwathError, SwathResult, ViewGeometry};
use serde::Deserialize;
use std::path::Path;

/// Colour map used when a layer does not name one
pub const DEFAULT_COLOURMAP: &str = "viridis";

/// Which dataset and variable a channel is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    /// Channel file name without extension; `None` for the provider's only dataset
    pub channel: Option<String>,
    pub variable: String,
}

impl ChannelRef {
    /// Reference `variable` inside the file for `channel`
    pub fn in_channel(channel: &str, variable: &str) -> Self {
        Self {
            channel: Some(channel.to_string()),
            variable: variable.to_string(),
        }
    }

    /// Reference `variable` in the single dataset
    pub fn variable(variable: &str) -> Self {
        Self {
            channel: None,
            variable: variable.to_string(),
        }
    }

    /// Descriptor implied by the channel name
    pub fn descriptor(&self) -> ChannelDescriptor {
        self.channel
            .as_deref()
            .map(ChannelDescriptor::from_channel_name)
            .unwrap_or_default()
    }

    pub fn display(&self) -> String {
        match &self.channel {
            Some(c) => format!("{}/{}", c, self.variable),
            None => self.variable.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    pub source: ChannelRef,
    pub display_name: String,
    pub colourmap: String,
    pub aggregate: AggregateMode,
    pub scale: Option<(f32, f32)>,
    pub descriptor: ChannelDescriptor,
    /// Produce one layer per index of a third dimension instead of failing
    pub split_extra_dim: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RgbSpec {
    pub red: ChannelRef,
    pub green: ChannelRef,
    pub blue: ChannelRef,
    pub display_name: String,
    pub aggregate: AggregateMode,
}

impl RgbSpec {
    pub fn channels(&self) -> [&ChannelRef; 3] {
        [&self.red, &self.green, &self.blue]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub display_name: String,
    pub colour: String,
    pub filename: String,
}

/// The closed set of layer kinds
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Image(ImageSpec),
    RgbImage(RgbSpec),
    Label(LabelSpec),
}

impl LayerKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Image(_) => "image",
            LayerKind::RgbImage(_) => "rgb_image",
            LayerKind::Label(_) => "label",
        }
    }
}

/// A fully validated layer declaration
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub name: String,
    pub enabled: bool,
    pub kind: LayerKind,
}

/// One layer as declared, before validation
#[derive(Debug, Clone)]
pub enum LayerEntry {
    Table { name: String, table: toml::Table },
    Notation(String),
    Spec(LayerSpec),
}

impl LayerEntry {
    pub fn name(&self) -> &str {
        match self {
            LayerEntry::Table { name, .. } => name,
            LayerEntry::Notation(text) => text,
            LayerEntry::Spec(spec) => &spec.name,
        }
    }

    /// Declared `type` for reporting, even when the entry is malformed
    pub fn declared_type(&self) -> String {
        match self {
            LayerEntry::Table { table, .. } => match table.get("type") {
                Some(toml::Value::String(t)) => t.clone(),
                Some(other) => other.to_string(),
                None => "<none>".to_string(),
            },
            LayerEntry::Notation(text) if text.starts_with("rgb(") => "rgb_image".to_string(),
            LayerEntry::Notation(_) => "image".to_string(),
            LayerEntry::Spec(spec) => spec.kind.type_name().to_string(),
        }
    }

    /// Whether the layer should be built; a non-boolean `enabled` is an error
    pub fn enabled(&self) -> SwathResult<bool> {
        match self {
            LayerEntry::Table { name, table } => match table.get("enabled") {
                None => Ok(true),
                Some(toml::Value::Boolean(b)) => Ok(*b),
                Some(other) => Err(SwathError::Config(format!(
                    "Layer {}: enabled must be a boolean, got {}",
                    name, other
                ))),
            },
            LayerEntry::Notation(_) => Ok(true),
            LayerEntry::Spec(spec) => Ok(spec.enabled),
        }
    }

    /// Validate the declaration into a typed layer spec
    pub fn to_spec(&self) -> SwathResult<LayerSpec> {
        match self {
            LayerEntry::Table { name, table } => spec_from_table(name, table),
            LayerEntry::Notation(text) => LayerSpec::from_notation(text),
            LayerEntry::Spec(spec) => Ok(spec.clone()),
        }
    }
}

/// Ordered layer declarations loaded from a TOML file
#[derive(Debug, Clone, Default)]
pub struct LayerConfig {
    pub entries: Vec<LayerEntry>,
}

impl LayerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> SwathResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::info!("Loaded layer configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Parse TOML; only syntax errors and non-table layers fail the whole file
    pub fn from_toml_str(text: &str) -> SwathResult<Self> {
        let root: toml::Table = text.parse()?;
        let mut entries = Vec::with_capacity(root.len());
        for (name, value) in root {
            match value {
                toml::Value::Table(table) => entries.push(LayerEntry::Table { name, table }),
                other => {
                    return Err(SwathError::Config(format!(
                        "Layer {} must be a table, got {}",
                        name,
                        other.type_str()
                    )))
                }
            }
        }
        Ok(Self { entries })
    }

    /// Layers from compact notation, e.g. `sst:270:300:magma,rgb(r:g:b)`
    pub fn from_notation_list(list: &str) -> Self {
        let entries = split_notation_list(list)
            .into_iter()
            .map(LayerEntry::Notation)
            .collect();
        Self { entries }
    }
}

fn default_true() -> bool {
    true
}

fn default_colourmap() -> String {
    DEFAULT_COLOURMAP.to_string()
}

fn default_aggregate() -> String {
    "mean".to_string()
}

#[derive(Debug, Deserialize)]
struct ImageTable {
    filename: String,
    variable: Option<String>,
    #[serde(default = "default_colourmap")]
    colourmap: String,
    #[serde(default = "default_aggregate")]
    aggregate: String,
    scale_min: Option<f32>,
    scale_max: Option<f32>,
    #[serde(default)]
    split_extra_dim: bool,
    view: Option<String>,
    resolution: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RgbTable {
    red_filename: String,
    green_filename: String,
    blue_filename: String,
    red_variable: Option<String>,
    green_variable: Option<String>,
    blue_variable: Option<String>,
    #[serde(default = "default_aggregate")]
    aggregate: String,
}

#[derive(Debug, Deserialize)]
struct LabelTable {
    colour: String,
    filename: String,
}

#[derive(Debug, Deserialize)]
struct CommonTable {
    #[serde(rename = "type")]
    layer_type: String,
    #[serde(default = "default_true")]
    enabled: bool,
}

fn decode<T: serde::de::DeserializeOwned>(name: &str, table: &toml::Table) -> SwathResult<T> {
    toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e: toml::de::Error| SwathError::Config(format!("Layer {}: {}", name, e.message())))
}

/// File name without its extension, e.g. `S8_BT_in.nc` -> `S8_BT_in`
fn channel_root(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

fn spec_from_table(name: &str, table: &toml::Table) -> SwathResult<LayerSpec> {
    let common: CommonTable = decode(name, table)?;

    let kind = match common.layer_type.as_str() {
        "image" => {
            let t: ImageTable = decode(name, table)?;
            let channel = channel_root(&t.filename);
            let variable = t.variable.unwrap_or_else(|| channel.clone());
            let source = ChannelRef::in_channel(&channel, &variable);

            let mut descriptor = source.descriptor();
            if let Some(view) = &t.view {
                descriptor.view = view.parse::<ViewGeometry>()?;
            }
            if let Some(resolution) = &t.resolution {
                descriptor.granularity = resolution.parse::<Granularity>()?;
            }

            let scale = match (t.scale_min, t.scale_max) {
                (Some(lo), Some(hi)) => Some((lo, hi)),
                (None, None) => None,
                _ => {
                    return Err(SwathError::Config(format!(
                        "Layer {}: scale_min and scale_max must be given together",
                        name
                    )))
                }
            };

            LayerKind::Image(ImageSpec {
                source,
                display_name: name.to_string(),
                colourmap: t.colourmap,
                aggregate: t.aggregate.parse()?,
                scale,
                descriptor,
                split_extra_dim: t.split_extra_dim,
            })
        }
        "rgb_image" => {
            let t: RgbTable = decode(name, table)?;
            let channel = |filename: &str, variable: Option<String>| {
                let root = channel_root(filename);
                let variable = variable.unwrap_or_else(|| root.clone());
                ChannelRef::in_channel(&root, &variable)
            };
            LayerKind::RgbImage(RgbSpec {
                red: channel(&t.red_filename, t.red_variable),
                green: channel(&t.green_filename, t.green_variable),
                blue: channel(&t.blue_filename, t.blue_variable),
                display_name: name.to_string(),
                aggregate: t.aggregate.parse()?,
            })
        }
        "label" => {
            let t: LabelTable = decode(name, table)?;
            LayerKind::Label(LabelSpec {
                display_name: name.to_string(),
                colour: t.colour,
                filename: t.filename,
            })
        }
        other => {
            return Err(SwathError::Config(format!(
                "Unknown layer type {} for layer {}",
                other, name
            )))
        }
    };

    Ok(LayerSpec {
        name: name.to_string(),
        enabled: common.enabled,
        kind,
    })
}

impl LayerSpec {
    /// Parse `name[:min:max[:colourmap]]` or `rgb(red:green:blue)`
    pub fn from_notation(text: &str) -> SwathResult<Self> {
        let text = text.trim();

        if let Some(inner) = text.strip_prefix("rgb(") {
            let inner = inner.strip_suffix(')').ok_or_else(|| {
                SwathError::Config(format!("Unterminated rgb band specification: {}", text))
            })?;
            let bands: Vec<&str> = inner.split(':').collect();
            if bands.len() != 3 || bands.iter().any(|b| b.is_empty()) {
                return Err(SwathError::Config(format!(
                    "rgb band specification needs exactly three variables: {}",
                    text
                )));
            }
            return Ok(LayerSpec {
                name: text.to_string(),
                enabled: true,
                kind: LayerKind::RgbImage(RgbSpec {
                    red: ChannelRef::variable(bands[0]),
                    green: ChannelRef::variable(bands[1]),
                    blue: ChannelRef::variable(bands[2]),
                    display_name: text.to_string(),
                    aggregate: AggregateMode::Mean,
                }),
            });
        }

        let parts: Vec<&str> = text.split(':').collect();
        let variable = parts[0];
        if variable.is_empty() {
            return Err(SwathError::Config(format!("Missing variable name in '{}'", text)));
        }

        let scale = match parts.len() {
            1 => None,
            2 => {
                return Err(SwathError::Config(format!(
                    "Incomplete scale in '{}', expected name:min:max[:colourmap]",
                    text
                )))
            }
            3 | 4 => Some((parse_bound(text, parts[1])?, parse_bound(text, parts[2])?)),
            _ => {
                return Err(SwathError::Config(format!(
                    "Too many fields in '{}', expected name:min:max[:colourmap]",
                    text
                )))
            }
        };
        let colourmap = parts
            .get(3)
            .map(|c| c.to_string())
            .unwrap_or_else(default_colourmap);

        Ok(LayerSpec {
            name: variable.to_string(),
            enabled: true,
            kind: LayerKind::Image(ImageSpec {
                source: ChannelRef::variable(variable),
                display_name: variable.to_string(),
                colourmap,
                aggregate: AggregateMode::Mean,
                scale,
                descriptor: ChannelDescriptor::default(),
                split_extra_dim: false,
            }),
        })
    }
}

fn parse_bound(text: &str, bound: &str) -> SwathResult<f32> {
    bound
        .parse::<f32>()
        .map_err(|_| SwathError::Config(format!("Invalid scale bound '{}' in '{}'", bound, text)))
}

/// Split a comma separated notation list, keeping commas inside `rgb(...)`
fn split_notation_list(list: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                if !current.trim().is_empty() {
                    items.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        items.push(current.trim().to_string());
    }
    items
}
