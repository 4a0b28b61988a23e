use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use swathlab::config::LayerConfig;
use swathlab::core::{AxisBinding, AxisBindings, GridGeometry};
use swathlab::io::{SceneDirectory, SingleDataset};
use swathlab::session::infer_grid;
use swathlab::{HeadlessViewer, LabellingSession};

/// Label satellite swath imagery on a common grid and view netCDF variables
#[derive(Parser, Debug)]
#[command(name = "swathlab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Label an SLSTR scene using a TOML layer configuration
    Label {
        /// Path to an SLSTR scene directory
        scene_path: PathBuf,
        /// Path to a file configuring the layers
        cfg_path: PathBuf,
        /// Canonical grid shape as ROWSxCOLUMNS
        #[arg(long, value_parser = parse_shape)]
        shape: Option<(usize, usize)>,
    },
    /// Display variables of a single netCDF file
    View {
        /// Path to a netCDF file
        path: PathBuf,
        /// Comma separated layers: name[:min:max[:colourmap]] or rgb(red:green:blue)
        variables: String,
        /// Dimension for the x axis, prefix with - to flip
        #[arg(long, allow_hyphen_values = true)]
        x_dim: Option<String>,
        /// Dimension for the y axis, prefix with - to flip
        #[arg(long, allow_hyphen_values = true)]
        y_dim: Option<String>,
        /// Canonical grid shape as ROWSxCOLUMNS, defaults to the first variable's shape
        #[arg(long, value_parser = parse_shape)]
        shape: Option<(usize, usize)>,
    },
}

fn parse_shape(s: &str) -> Result<(usize, usize), String> {
    let (rows, cols) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected ROWSxCOLUMNS, got '{}'", s))?;
    let rows = rows.trim().parse::<usize>().map_err(|e| e.to_string())?;
    let cols = cols.trim().parse::<usize>().map_err(|e| e.to_string())?;
    Ok((rows, cols))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Label {
            scene_path,
            cfg_path,
            shape,
        } => label(scene_path, cfg_path, shape),
        Command::View {
            path,
            variables,
            x_dim,
            y_dim,
            shape,
        } => view(path, variables, x_dim, y_dim, shape),
    }
}

fn label(scene_path: PathBuf, cfg_path: PathBuf, shape: Option<(usize, usize)>) -> anyhow::Result<()> {
    let config = LayerConfig::from_file(&cfg_path)
        .with_context(|| format!("reading layer configuration {}", cfg_path.display()))?;

    let mut grid = GridGeometry::slstr_1km()?;
    if let Some(shape) = shape {
        grid = GridGeometry::new(grid.axes.clone(), shape)?;
    }

    let scene = SceneDirectory::new(&scene_path);
    let mut session = LabellingSession::new(grid, &scene);
    let mut viewer = HeadlessViewer::new();

    // save whatever labels exist even if the viewer fails
    if let Err(e) = session.open(&config.entries, &mut viewer) {
        log::error!("Error when running the viewer: {}", e);
    }

    let report = session.close();
    if !report.is_complete() {
        bail!("{} label file(s) could not be saved", report.failures.len());
    }
    Ok(())
}

fn view(
    path: PathBuf,
    variables: String,
    x_dim: Option<String>,
    y_dim: Option<String>,
    shape: Option<(usize, usize)>,
) -> anyhow::Result<()> {
    let axes = AxisBindings::new(
        y_dim.as_deref().map(str::parse::<AxisBinding>).transpose()?,
        x_dim.as_deref().map(str::parse::<AxisBinding>).transpose()?,
    )?;
    let config = LayerConfig::from_notation_list(&variables);
    let dataset = SingleDataset::new(&path);

    let grid = match shape {
        Some(shape) => GridGeometry::new(axes, shape)?,
        None => infer_grid(axes, &dataset, &config.entries)?,
    };

    let mut session = LabellingSession::new(grid, &dataset);
    let mut viewer = HeadlessViewer::new();
    let added = session.open(&config.entries, &mut viewer)?;
    log::info!("Added {} layer(s) from {}", added, path.display());
    Ok(())
}
