use ndarray::{Array, Array2, ArrayD, IxDyn};
use swathlab::config::{ChannelRef, ImageSpec, LayerConfig, LayerKind, LayerSpec};
use swathlab::core::{BuiltLayer, GridGeometry, LayerComposer, MaskStore, RawChannel};
use swathlab::types::{AggregateMode, ChannelDescriptor, SwathError};
use swathlab::MemoryScene;

const ROWS: usize = 4;
const COLS: usize = 6;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn grid() -> GridGeometry {
    GridGeometry::new(GridGeometry::slstr_1km().unwrap().axes, (ROWS, COLS)).unwrap()
}

fn channel(name: &str, dims: &[&str], data: ArrayD<f32>) -> RawChannel {
    RawChannel::new(name, dims.iter().map(|d| d.to_string()).collect(), data).unwrap()
}

fn ramp(shape: (usize, usize), scale: f32) -> Array2<f32> {
    Array2::from_shape_fn(shape, |(r, c)| (r * shape.1 + c + 1) as f32 * scale)
}

fn masks() -> MaskStore {
    MaskStore::new((ROWS, COLS), grid().dim_names())
}

#[test]
fn test_compose_all_continues_after_failure() {
    init_logging();
    let mut scene = MemoryScene::new();
    scene.insert(
        Some("S8_BT_in"),
        channel("S8_BT_in", &["rows", "columns"], ramp((ROWS, COLS), 1.0).into_dyn()),
    );
    scene.insert(
        Some("S9_BT_in"),
        channel("S9_BT_in", &["rows", "columns"], ramp((ROWS, COLS), 2.0).into_dyn()),
    );

    let config = LayerConfig::from_toml_str(
        r#"
[first]
type = "image"
filename = "S8_BT_in.nc"

[broken]
type = "contour"
filename = "S8_BT_in.nc"

[third]
type = "image"
filename = "S9_BT_in.nc"
colourmap = "magma"
"#,
    )
    .unwrap();

    let grid = grid();
    let mut store = masks();
    let mut composer = LayerComposer::new(&grid, &scene, &mut store);
    let composition = composer.compose_all(&config.entries);

    assert_eq!(composition.succeeded, 2);
    assert_eq!(composition.failures.len(), 1);
    assert_eq!(composition.failures[0].name, "broken");
    assert_eq!(composition.failures[0].layer_type, "contour");
    assert!(matches!(composition.failures[0].error, SwathError::Config(_)));

    let names: Vec<_> = composition.layers.iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["first", "third"]);
}

#[test]
fn test_disabled_and_missing_channels() {
    init_logging();
    let scene = MemoryScene::new();
    let config = LayerConfig::from_toml_str(
        r#"
[off]
type = "image"
filename = "S1_radiance_an.nc"
enabled = false

[missing]
type = "image"
filename = "S2_radiance_an.nc"
"#,
    )
    .unwrap();

    let grid = grid();
    let mut store = masks();
    let composition = LayerComposer::new(&grid, &scene, &mut store).compose_all(&config.entries);

    assert_eq!(composition.succeeded, 0);
    assert_eq!(composition.skipped, 1);
    assert_eq!(composition.failures.len(), 1);
    assert!(matches!(
        composition.failures[0].error,
        SwathError::MissingResource(_)
    ));
}

#[test]
fn test_nadir_coarse_channel_passes_through() {
    let source = ramp((COLS, ROWS), 1.0);
    let mut scene = MemoryScene::new();
    // stored column-major relative to the grid
    scene.insert(
        Some("S7_BT_in"),
        channel("S7_BT_in", &["columns", "rows"], source.clone().into_dyn()),
    );

    let grid = grid();
    let mut store = masks();
    let composer = LayerComposer::new(&grid, &scene, &mut store);
    let spec = ImageSpec {
        source: ChannelRef::in_channel("S7_BT_in", "S7_BT_in"),
        display_name: "S7".to_string(),
        colourmap: "viridis".to_string(),
        aggregate: AggregateMode::Mean,
        scale: Some((200.0, 300.0)),
        descriptor: ChannelDescriptor::from_channel_name("S7_BT_in"),
        split_extra_dim: false,
    };

    let layers = composer.build_image_layer(&spec).unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].data, source.t());
    assert_eq!(layers[0].scale, Some((200.0, 300.0)));
}

#[test]
fn test_fine_oblique_aligned_then_coarsened() {
    let mut scene = MemoryScene::new();
    // 0.5 km oblique stripe: 8 rows, 4 columns of ones
    scene.insert(
        Some("S5_radiance_ao"),
        channel(
            "S5_radiance_ao",
            &["rows", "columns"],
            Array2::from_elem((2 * ROWS, 4), 1.0f32).into_dyn(),
        ),
    );

    let grid = grid();
    let mut store = masks();
    // fine frame is 8x12, place the stripe at column 3 -> coarse columns 1..=3
    let composer = LayerComposer::new(&grid, &scene, &mut store).with_aligner(
        swathlab::core::ViewGeometryAligner::with_offsets((ROWS, COLS), 3, 1),
    );

    let spec = LayerSpec {
        name: "S5o".to_string(),
        enabled: true,
        kind: LayerKind::Image(ImageSpec {
            source: ChannelRef::in_channel("S5_radiance_ao", "S5_radiance_ao"),
            display_name: "S5o".to_string(),
            colourmap: "gray".to_string(),
            aggregate: AggregateMode::Mean,
            scale: None,
            descriptor: ChannelDescriptor::from_channel_name("S5_radiance_ao"),
            split_extra_dim: false,
        }),
    };

    let layers = match spec.kind {
        LayerKind::Image(ref image) => composer.build_image_layer(image).unwrap(),
        _ => unreachable!(),
    };
    let data = &layers[0].data;
    assert_eq!(data.dim(), (ROWS, COLS));
    for row in data.rows() {
        assert!(row[0].is_nan());
        // block over fine columns 2,3: one padded, one valid -> mean of the valid sample
        assert_eq!(row[1], 1.0);
        assert_eq!(row[2], 1.0);
        assert_eq!(row[3], 1.0);
        assert!(row[4].is_nan());
        assert!(row[5].is_nan());
    }
}

#[test]
fn test_shape_mismatch_names_channel() {
    let mut scene = MemoryScene::new();
    scene.insert(
        Some("S8_BT_in"),
        channel("S8_BT_in", &["rows", "columns"], Array2::<f32>::zeros((ROWS, COLS + 1)).into_dyn()),
    );
    let grid = grid();
    let config = LayerConfig::from_toml_str("[S8]\ntype = \"image\"\nfilename = \"S8_BT_in.nc\"\n").unwrap();
    let mut store = masks();
    let composition = LayerComposer::new(&grid, &scene, &mut store).compose_all(&config.entries);
    match &composition.failures[0].error {
        SwathError::Shape(msg) => {
            assert!(msg.contains("S8_BT_in"), "{}", msg);
            assert!(msg.contains("(4, 7)"), "{}", msg);
            assert!(msg.contains("(4, 6)"), "{}", msg);
        }
        other => panic!("expected a shape error, got {:?}", other),
    }
}

#[test]
fn test_rgb_bands_stretched_independently() {
    let mut scene = MemoryScene::new();
    for (name, scale) in [("S3_radiance_in", 1.0f32), ("S2_radiance_in", 10.0), ("S1_radiance_in", 0.5)] {
        let mut data = ramp((ROWS, COLS), scale);
        data[[0, 0]] = f32::NAN;
        scene.insert(Some(name), channel(name, &["rows", "columns"], data.into_dyn()));
    }

    let config = LayerConfig::from_toml_str(
        r#"
[false_colour]
type = "rgb_image"
red_filename = "S3_radiance_in.nc"
green_filename = "S2_radiance_in.nc"
blue_filename = "S1_radiance_in.nc"
"#,
    )
    .unwrap();

    let grid = grid();
    let mut store = masks();
    let composition = LayerComposer::new(&grid, &scene, &mut store).compose_all(&config.entries);
    assert_eq!(composition.succeeded, 1);

    let rgb = match &composition.layers[0] {
        BuiltLayer::Rgb(rgb) => rgb,
        other => panic!("expected rgb layer, got {:?}", other.name()),
    };
    assert_eq!(rgb.data.dim(), (ROWS, COLS, 3));

    for band in 0..3 {
        let max = rgb
            .data
            .index_axis(ndarray::Axis(2), band)
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f32::NEG_INFINITY, f32::max);
        approx::assert_abs_diff_eq!(max, 1.0, epsilon = 1e-6);
        assert!(rgb.data[[0, 0, band]].is_nan());
        // identical ramps after per-band stretch
        approx::assert_abs_diff_eq!(rgb.data[[1, 2, band]], 9.0 / 24.0, epsilon = 1e-6);
    }
}

#[test]
fn test_rgb_band_shape_mismatch() {
    let mut scene = MemoryScene::new();
    scene.insert(None, channel("r", &["rows", "columns"], ramp((ROWS, COLS), 1.0).into_dyn()));
    scene.insert(None, channel("g", &["rows", "columns"], ramp((ROWS, COLS), 1.0).into_dyn()));
    scene.insert(None, channel("b", &["rows", "columns"], ramp((ROWS, COLS - 1), 1.0).into_dyn()));

    let grid = grid();
    let mut store = masks();
    let composition = LayerComposer::new(&grid, &scene, &mut store)
        .compose_all(&LayerConfig::from_notation_list("rgb(r:g:b)").entries);
    assert_eq!(composition.succeeded, 0);
    assert!(matches!(composition.failures[0].error, SwathError::Shape(_)));
}

#[test]
fn test_extra_dimension_split_into_layers() {
    let data = Array::from_shape_fn(IxDyn(&[ROWS, 3, COLS]), |idx| idx[1] as f32);
    let mut scene = MemoryScene::new();
    scene.insert(Some("cube"), channel("bands", &["rows", "band", "columns"], data));

    let config = LayerConfig::from_toml_str(
        r#"
[bands]
type = "image"
filename = "cube.nc"
variable = "bands"
split_extra_dim = true
"#,
    )
    .unwrap();

    let grid = grid();
    let mut store = masks();
    let composition = LayerComposer::new(&grid, &scene, &mut store).compose_all(&config.entries);
    assert_eq!(composition.succeeded, 1);

    let names: Vec<_> = composition.layers.iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["bands[band=0]", "bands[band=1]", "bands[band=2]"]);
    for (i, layer) in composition.layers.iter().enumerate() {
        match layer {
            BuiltLayer::Image(image) => assert!(image.data.iter().all(|&v| v == i as f32)),
            other => panic!("unexpected layer {}", other.name()),
        }
    }
}

#[test]
fn test_split_flag_without_extra_dimension_keeps_display_name() {
    let mut scene = MemoryScene::new();
    scene.insert(
        Some("S8_BT_in"),
        channel(
            "S8_BT_in",
            &["time", "rows", "columns"],
            ramp((ROWS, COLS), 1.0).insert_axis(ndarray::Axis(0)).into_dyn(),
        ),
    );

    let config = LayerConfig::from_toml_str(
        r#"
[Brightness]
type = "image"
filename = "S8_BT_in.nc"
split_extra_dim = true
"#,
    )
    .unwrap();

    let grid = grid();
    let mut store = masks();
    let composition = LayerComposer::new(&grid, &scene, &mut store).compose_all(&config.entries);
    assert_eq!(composition.succeeded, 1);
    let names: Vec<_> = composition.layers.iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["Brightness"]);
}

#[test]
fn test_rgb_band_without_positive_maximum_fails_layer() {
    let mut scene = MemoryScene::new();
    scene.insert(None, channel("r", &["rows", "columns"], ramp((ROWS, COLS), 1.0).into_dyn()));
    scene.insert(None, channel("g", &["rows", "columns"], Array2::<f32>::zeros((ROWS, COLS)).into_dyn()));
    let mut hot = ramp((ROWS, COLS), 1.0);
    hot[[2, 2]] = f32::INFINITY;
    scene.insert(None, channel("b", &["rows", "columns"], hot.into_dyn()));
    scene.insert(None, channel("sst", &["rows", "columns"], ramp((ROWS, COLS), 1.0).into_dyn()));

    let grid = grid();
    let mut store = masks();
    let composition = LayerComposer::new(&grid, &scene, &mut store)
        .compose_all(&LayerConfig::from_notation_list("rgb(r:g:r),rgb(r:r:b),sst").entries);

    assert_eq!(composition.succeeded, 1);
    assert_eq!(composition.failures.len(), 2);
    for failure in &composition.failures {
        assert_eq!(failure.layer_type, "rgb_image");
        assert_eq!(failure.error.kind(), "format");
    }
    assert_eq!(composition.layers[0].name(), "sst");
}
