// tests/config_errors.rs

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;
use modrun::config::{load_and_validate, load_from_path};
use modrun::errors::ModrunError;
use modrun::exec::options::{DEFAULT_SCHEMA_FLAG, DEFAULT_SCHEMA_TIMEOUT, default_max_concurrent};
use modrun_test_utils::builders::{ManifestBuilder, ParameterBuilder};

fn write_manifest(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn config_error(contents: &str) -> String {
    let file = write_manifest(contents);
    match load_and_validate(file.path()) {
        Err(ModrunError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn demo_manifest_renders_its_command_line() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/blur.toml");
    let manifest = load_and_validate(&path).unwrap();

    assert_eq!(manifest.runner.max_concurrent, 2);
    assert_eq!(manifest.options().pause_poll_interval, Duration::from_millis(50));
    assert_eq!(manifest.options().schema_flag, DEFAULT_SCHEMA_FLAG);

    let task = manifest.task_descriptor();
    assert_eq!(
        task.argv(),
        [
            "--sigma", "2.5", "-v", "--label", "left", "--label", "right", "in.nrrd", "out.nrrd",
        ]
    );
}

#[test]
fn runner_section_defaults_apply() {
    let file = write_manifest(
        r#"
[module]
path = "/bin/true"
"#,
    );
    let manifest = load_and_validate(file.path()).unwrap();
    let options = manifest.options();

    assert_eq!(options.max_concurrent, default_max_concurrent());
    assert_eq!(options.schema_timeout, DEFAULT_SCHEMA_TIMEOUT);
    assert!(manifest.parameters.is_empty());
    assert!(manifest.task_descriptor().argv().is_empty());
}

#[test]
fn unknown_type_tag_returns_structured_error() {
    let file = write_manifest(
        r#"
[module]
path = "/bin/true"

[[module.parameter]]
name = "q"
flag = "q"
type = "quaternion"
"#,
    );

    match load_and_validate(file.path()) {
        Err(ModrunError::UnknownParameterType(msg)) => assert!(msg.contains("quaternion")),
        other => panic!("Expected UnknownParameterType, got: {:?}", other),
    }
}

#[test]
fn index_and_flag_are_exclusive() {
    let msg = config_error(
        r#"
[module]
path = "/bin/true"

[[module.parameter]]
name = "input"
index = 0
flag = "i"
type = "image"
"#,
    );
    assert!(msg.contains("both an index and a flag"));
}

#[test]
fn parameter_needs_index_or_flag() {
    let msg = config_error(
        r#"
[module]
path = "/bin/true"

[[module.parameter]]
name = "input"
type = "image"
"#,
    );
    assert!(msg.contains("needs either an index or a flag"));
}

#[test]
fn duplicate_names_and_indices_are_rejected() {
    let msg = config_error(
        r#"
[module]
path = "/bin/true"

[[module.parameter]]
name = "a"
index = 0
type = "file"

[[module.parameter]]
name = "a"
index = 1
type = "file"
"#,
    );
    assert!(msg.contains("declared more than once"));

    let msg = config_error(
        r#"
[module]
path = "/bin/true"

[[module.parameter]]
name = "a"
index = 0
type = "file"

[[module.parameter]]
name = "b"
index = 0
type = "file"
"#,
    );
    assert!(msg.contains("reuses index 0"));
}

#[test]
fn value_for_undeclared_parameter_is_rejected() {
    let msg = config_error(
        r#"
[module]
path = "/bin/true"

[values]
ghost = "1"
"#,
    );
    assert!(msg.contains("unknown parameter 'ghost'"));
}

#[test]
fn zero_concurrency_is_rejected() {
    let msg = config_error(
        r#"
[runner]
max_concurrent = 0

[module]
path = "/bin/true"
"#,
    );
    assert!(msg.contains("max_concurrent"));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_manifest("[module\npath = ");
    assert!(matches!(
        load_from_path(file.path()),
        Err(ModrunError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/nonexistent/Module.toml"),
        Err(ModrunError::IoError(_))
    ));
}

#[test]
fn builder_produces_the_same_manifest_shape() {
    let manifest = ManifestBuilder::new("/opt/mod/threshold")
        .max_concurrent(1)
        .with_parameter(ParameterBuilder::new("level", "integer").long_flag("level").build())
        .with_parameter(ParameterBuilder::new("input", "file").index(0).build())
        .with_value("level", "128")
        .with_value("input", "scan.png")
        .build();

    assert_eq!(
        manifest.task_descriptor().command_line(),
        "/opt/mod/threshold --level 128 scan.png"
    );

    let raw = ManifestBuilder::new("")
        .with_parameter(ParameterBuilder::new("x", "integer").flag("x").build())
        .build_raw();
    assert!(matches!(
        modrun::config::Manifest::try_from(raw),
        Err(ModrunError::ConfigError(_))
    ));
}
