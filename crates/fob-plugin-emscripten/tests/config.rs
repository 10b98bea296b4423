//! Integration tests for layered configuration loading.

use fob_plugin_emscripten::{ConfigError, EmscriptenConfig, PatchOptions};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const ENV_VARS: [&str; 3] = [
    "FOB_EMSCRIPTEN_HMR__DEBOUNCE_MS",
    "FOB_EMSCRIPTEN_HMR__COMMAND",
    "FOB_EMSCRIPTEN_PATCH__ADD_ELECTRON_SUPPORT",
];

fn clear_env() {
    for var in ENV_VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
#[serial]
fn test_no_file_yields_empty_config() {
    clear_env();
    let temp = TempDir::new().unwrap();

    let config = EmscriptenConfig::load(temp.path(), None).unwrap();
    assert_eq!(config, EmscriptenConfig::default());
}

#[test]
#[serial]
fn test_loads_conventional_file() {
    clear_env();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("fob-emscripten.toml"),
        r#"
[patch]
add_electron_support = true
disable_inline_wasm = true

[hmr]
watch_dirs = ["cpp"]
command = "make -C cpp"
"#,
    )
    .unwrap();

    let config = EmscriptenConfig::load(temp.path(), None).unwrap();
    assert_eq!(
        config.patch,
        Some(
            PatchOptions::new()
                .with_electron_support(true)
                .with_inline_wasm_disabled(true)
        )
    );

    let hmr = config.hmr.unwrap();
    assert_eq!(hmr.watch_dirs, vec![PathBuf::from("cpp")]);
    assert_eq!(hmr.command, "make -C cpp");
    // Unset keys keep their defaults
    assert_eq!(hmr.debounce_ms, 300);
    assert_eq!(hmr.ignore_exts, vec![".o"]);
}

#[test]
#[serial]
fn test_explicit_path_must_exist() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("custom.toml");

    let err = EmscriptenConfig::load(temp.path(), Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(path) if path == missing));
}

#[test]
#[serial]
fn test_explicit_path_wins_over_conventional_file() {
    clear_env();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("fob-emscripten.toml"),
        "[patch]\nadd_electron_support = true\n",
    )
    .unwrap();
    let custom = temp.path().join("custom.toml");
    fs::write(&custom, "[patch]\nhoist_worker_url = true\n").unwrap();

    let config = EmscriptenConfig::load(temp.path(), Some(&custom)).unwrap();
    let patch = config.patch.unwrap();
    assert!(patch.hoist_worker_url);
    assert!(!patch.add_electron_support);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("fob-emscripten.toml"),
        "[hmr]\ndebounce_ms = 500\ncommand = \"make\"\n",
    )
    .unwrap();

    unsafe { std::env::set_var("FOB_EMSCRIPTEN_HMR__DEBOUNCE_MS", "50") };
    let config = EmscriptenConfig::load(temp.path(), None);
    clear_env();

    let hmr = config.unwrap().hmr.unwrap();
    assert_eq!(hmr.debounce_ms, 50);
    assert_eq!(hmr.command, "make");
}

#[test]
#[serial]
fn test_invalid_value_is_reported() {
    clear_env();
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("fob-emscripten.toml"),
        "[hmr]\ndebounce_ms = \"soon\"\n",
    )
    .unwrap();

    let err = EmscriptenConfig::load(temp.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().starts_with("Invalid configuration"));
}
