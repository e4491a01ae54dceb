use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use ragdoc_core::config::{expand_path, resolve_with_base, Config, Settings};
use ragdoc_core::Error;

#[test]
fn defaults_apply_without_config_files() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path(), "dev").expect("load");
    let s = config.settings();
    assert_eq!(s.rag.chunk_words, 500);
    assert_eq!(s.rag.top_k, 3);
    assert_eq!(s.server.port, 9999);
    assert_eq!(s.server.allowed_models, vec!["llama-3.3-70b-versatile", "gpt-4o-mini"]);
}

#[test]
fn env_file_overrides_base_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[rag]\nchunk_words = 200\ntop_k = 4\n").unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[rag]\ntop_k = 6\n").unwrap();

    let config = Config::load_from(tmp.path(), "test").expect("load");
    assert_eq!(config.settings().rag.chunk_words, 200, "base file value kept");
    assert_eq!(config.settings().rag.top_k, 6, "env file wins");
    let top_k: usize = config.get("rag.top_k").expect("get");
    assert_eq!(top_k, 6);

    // Other environments ignore config.test.toml
    let dev = Config::load_from(tmp.path(), "dev").expect("load dev");
    assert_eq!(dev.settings().rag.top_k, 4);
}

#[test]
fn zero_chunk_words_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[rag]\nchunk_words = 0\n").unwrap();
    let err = Config::load_from(tmp.path(), "dev").err().expect("must fail");
    assert!(matches!(err, Error::InvalidConfig(_)), "got {err:?}");
}

#[test]
fn default_settings_validate() {
    Settings::default().validate().expect("defaults are valid");
}

#[test]
fn path_helpers_keep_absolute_and_join_relative() {
    let base = PathBuf::from("/srv/ragdoc");
    assert_eq!(resolve_with_base(&base, "/tmp/uploads"), PathBuf::from("/tmp/uploads"));
    assert_eq!(resolve_with_base(&base, "data/uploads"), base.join("data/uploads"));
    assert_eq!(expand_path("plain/dir"), PathBuf::from("plain/dir"));
}

#[test]
fn extraction_errors_name_the_file() {
    let msg = Error::extraction("/tmp/x.pdf", "bad xref").to_string();
    assert!(msg.contains("/tmp/x.pdf") && msg.contains("bad xref"), "{msg}");
}

#[test]
fn relative_paths_resolve_against_config_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[server]\nupload_dir = \"uploads\"\n[embedding]\nmodel_dir = \"/opt/models/minilm\"\n",
    )
    .unwrap();
    let config = Config::load_from(tmp.path(), "dev").expect("load");
    let s = config.settings();
    assert_eq!(PathBuf::from(&s.server.upload_dir), tmp.path().join("uploads"));
    assert_eq!(s.embedding.model_dir.as_deref(), Some("/opt/models/minilm"));

    let defaults = Config::load_from(tmp.path().join("missing").as_path(), "dev").expect("load defaults");
    assert_eq!(PathBuf::from(&defaults.settings().server.upload_dir), tmp.path().join("missing").join("data/uploads"));
    assert_eq!(defaults.settings().embedding.model_dir, None);
}
