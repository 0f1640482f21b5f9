//! Integration tests: on-disk documents, import resolution, and full
//! load → navigate → mutate flows.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use paramtree::codec::JsonCodec;
use paramtree::concurrency::Serialized;
use paramtree::config::ConfigLoader;
use paramtree::device::Device;
use paramtree::error::Error;
use paramtree::fetch::FileFetcher;
use paramtree::model::DeviceModel;
use tempfile::TempDir;

const DEVICE_JSON: &str = r#"{
    "params": {
        "x": {
            "oid": "x",
            "type": "INT32",
            "constraint": {"int_range": {"min": 0, "max": 10}},
            "value": {"int32": 5}
        },
        "a": {
            "oid": "a",
            "type": "STRUCT",
            "value": {"struct": {"fields": {
                "b": {"oid": "b", "type": "FLOAT32", "value": {"float32": 1.5}}
            }}}
        },
        "imported": {
            "oid": "imported",
            "type": "INT32",
            "import": {}
        }
    }
}"#;

const IMPORT_JSON: &str = r#"{
    "oid": "imported",
    "type": "INT32",
    "value": {"int32": 42}
}"#;

/// Write the standard fixture document plus its params directory.
fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let device_file = dir.join("device.json");
    fs::write(&device_file, DEVICE_JSON).unwrap();
    let params_dir = dir.join("params");
    fs::create_dir_all(&params_dir).unwrap();
    fs::write(params_dir.join("param.imported.json"), IMPORT_JSON).unwrap();
    device_file
}

fn load_fixture(dir: &Path) -> DeviceModel<Serialized> {
    DeviceModel::load(&write_fixture(dir), &JsonCodec, &FileFetcher).unwrap()
}

#[test]
fn load_resolves_local_imports() {
    let temp = TempDir::new().unwrap();
    let model = load_fixture(temp.path());

    let handle = model.param("/imported").unwrap();
    assert_eq!(handle.get_value::<i32>().unwrap(), 42);

    // the directive is gone from the loaded document
    let doc = model.device();
    assert!(doc.params["imported"].import.is_none());
}

#[test]
fn load_fails_not_found_when_import_resource_missing() {
    let temp = TempDir::new().unwrap();
    let device_file = temp.path().join("device.json");
    fs::write(&device_file, DEVICE_JSON).unwrap();

    let err = DeviceModel::<Serialized>::load(&device_file, &JsonCodec, &FileFetcher).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn load_fails_not_implemented_for_remote_import() {
    let temp = TempDir::new().unwrap();
    let device_file = temp.path().join("device.json");
    fs::write(
        &device_file,
        r#"{"params": {"remote": {
            "oid": "remote",
            "type": "INT32",
            "import": {"url": "https://example.com/remote.json"}
        }}}"#,
    )
    .unwrap();

    let err = DeviceModel::<Serialized>::load(&device_file, &JsonCodec, &FileFetcher).unwrap_err();
    assert!(matches!(err, Error::NotImplemented(_)));
}

#[test]
fn load_fails_parse_on_malformed_document() {
    let temp = TempDir::new().unwrap();
    let device_file = temp.path().join("device.json");
    fs::write(&device_file, "{ definitely not json").unwrap();

    let err = DeviceModel::<Serialized>::load(&device_file, &JsonCodec, &FileFetcher).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn int_range_constraint_clamps_writes() {
    let temp = TempDir::new().unwrap();
    let model = load_fixture(temp.path());
    let handle = model.param("/x").unwrap();

    handle.set_value(15).unwrap();
    assert_eq!(handle.get_value::<i32>().unwrap(), 10);
    handle.set_value(-5).unwrap();
    assert_eq!(handle.get_value::<i32>().unwrap(), 0);
    handle.set_value(5).unwrap();
    assert_eq!(handle.get_value::<i32>().unwrap(), 5);
}

#[test]
fn missing_param_is_not_found() {
    let temp = TempDir::new().unwrap();
    let model = load_fixture(temp.path());
    assert!(matches!(model.param("/missing"), Err(Error::NotFound(_))));
}

#[test]
fn struct_navigation_reaches_nested_field() {
    let temp = TempDir::new().unwrap();
    let model = load_fixture(temp.path());

    let handle = model.param("/a/b").unwrap();
    assert_eq!(handle.oid().unwrap(), "b");
    assert_eq!(handle.get_value::<f32>().unwrap(), 1.5);
}

#[test]
fn get_value_with_wrong_type_is_schema_error() {
    let temp = TempDir::new().unwrap();
    let model = load_fixture(temp.path());

    let handle = model.param("/a/b").unwrap();
    assert!(matches!(handle.get_value::<i32>(), Err(Error::Schema(_))));
}

#[test]
fn encode_round_trips_mutated_document() {
    let temp = TempDir::new().unwrap();
    let model = load_fixture(temp.path());
    model.param("/x").unwrap().set_value(9).unwrap();

    let bytes = model.encode(&JsonCodec).unwrap();
    let decoded: Device = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(decoded, *model.device());
}

#[test]
fn serialized_model_supports_concurrent_mutation() {
    let temp = TempDir::new().unwrap();
    let model = Arc::new(load_fixture(temp.path()));

    let mut handles = vec![];
    for i in 0..8 {
        let model = model.clone();
        handles.push(thread::spawn(move || {
            for j in 0..50 {
                let param = model.param("/x").unwrap();
                param.set_value((i + j) % 20).unwrap();
                let read = param.get_value::<i32>().unwrap();
                // every observed value honors the 0..=10 clamp
                assert!((0..=10).contains(&read));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn from_config_loads_with_params_dir_override() {
    let temp = TempDir::new().unwrap();
    let device_file = temp.path().join("device.json");
    fs::write(&device_file, DEVICE_JSON).unwrap();
    let elsewhere = temp.path().join("resources");
    fs::create_dir_all(&elsewhere).unwrap();
    fs::write(elsewhere.join("param.imported.json"), IMPORT_JSON).unwrap();

    let config_file = temp.path().join("paramtree.toml");
    fs::write(
        &config_file,
        format!(
            "device_file = {:?}\nparams_dir = {:?}\n",
            device_file, elsewhere
        ),
    )
    .unwrap();

    let cfg = ConfigLoader::load_from_file(&config_file).unwrap();
    let model = DeviceModel::<Serialized>::from_config(&cfg, &JsonCodec, &FileFetcher).unwrap();
    assert_eq!(model.param("/imported").unwrap().get_value::<i32>().unwrap(), 42);
}
