use std::path::Path;
use swathlab::core::{BuiltLayer, GridGeometry, LayerComposer, MaskStore};
use swathlab::io::{DatasetProvider, NetCdfDataset};
use swathlab::{LayerConfig, SceneDirectory, SwathError};

const FILL: f32 = -999.0;

/// Write a (time=1, columns=4, rows=3) channel with packing attributes
fn write_channel(path: &Path, name: &str) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time", 1).unwrap();
    file.add_dimension("columns", 4).unwrap();
    file.add_dimension("rows", 3).unwrap();

    let mut var = file
        .add_variable::<f32>(name, &["time", "columns", "rows"])
        .unwrap();
    var.put_attribute("_FillValue", FILL).unwrap();
    var.put_attribute("scale_factor", 0.5f32).unwrap();
    var.put_attribute("add_offset", 100.0f32).unwrap();

    // packed value at [0, col, row] = col * 3 + row
    let mut values: Vec<f32> = (0..12).map(|v| v as f32).collect();
    values[5] = FILL;
    var.put_values(&values, ..).unwrap();
}

#[test]
fn test_read_variable_unpacks_and_masks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S8_BT_in.nc");
    write_channel(&path, "S8_BT_in");

    let dataset = NetCdfDataset::open(&path).unwrap();
    assert!(dataset.variable_names().contains(&"S8_BT_in".to_string()));

    let raw = swathlab::io::Dataset::read_variable(&dataset, "S8_BT_in").unwrap();
    assert_eq!(raw.dims, vec!["time", "columns", "rows"]);
    assert_eq!(raw.data.shape(), &[1, 4, 3]);
    assert_eq!(raw.data[[0, 0, 1]], 100.5);
    assert!(raw.data[[0, 1, 2]].is_nan());
}

#[test]
fn test_scene_directory_layers() {
    let dir = tempfile::tempdir().unwrap();
    write_channel(&dir.path().join("S8_BT_in.nc"), "S8_BT_in");

    let scene = SceneDirectory::new(dir.path());
    assert!(scene.open(Some("S8_BT_in")).is_ok());

    let config = LayerConfig::from_toml_str(
        r#"
[S8]
type = "image"
filename = "S8_BT_in.nc"

[S9]
type = "image"
filename = "S9_BT_in.nc"

[cloud]
type = "label"
colour = "yellow"
filename = "cloud.nc"
"#,
    )
    .unwrap();

    let grid = GridGeometry::new(GridGeometry::slstr_1km().unwrap().axes, (3, 4)).unwrap();
    let mut store = MaskStore::new(grid.shape(), grid.dim_names());
    let composition = LayerComposer::new(&grid, &scene, &mut store).compose_all(&config.entries);

    assert_eq!(composition.succeeded, 2);
    assert_eq!(composition.failures.len(), 1);
    match &composition.failures[0].error {
        SwathError::MissingResource(path) => assert_eq!(path, &dir.path().join("S9_BT_in.nc")),
        other => panic!("expected missing resource, got {:?}", other),
    }

    match &composition.layers[0] {
        BuiltLayer::Image(image) => {
            assert_eq!(image.data.dim(), (3, 4));
            // output [row, col] = 100 + 0.5 * (col * 3 + row)
            assert_eq!(image.data[[2, 3]], 105.5);
            assert!(image.data[[2, 1]].is_nan());
        }
        other => panic!("unexpected layer {}", other.name()),
    }

    assert_eq!(store.masks()[0].file_path, dir.path().join("cloud.nc"));
}
