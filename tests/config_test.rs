//! Configuration file loading tests.

use std::io::Write;

use calltrace::config::{self, ConfigError, InstrumentationConfig};
use calltrace::instrument::RenderMode;

#[test]
fn load_file_reads_calltrace_table() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[calltrace]\nenabled = true\nlog_arguments_on_failure = false\nresult_mode = \"serialized\""
    )
    .unwrap();

    let cfg = config::load_file(file.path()).unwrap();
    assert_eq!(
        cfg,
        InstrumentationConfig {
            enabled: true,
            log_arguments_on_failure: false,
            render_mode: RenderMode::Serialized,
        }
    );
}

#[test]
fn load_file_accepts_long_type_tag_name() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[calltrace]\nresult_mode = \"type_tag_only\"").unwrap();

    let cfg = config::load_file(file.path()).unwrap();
    assert_eq!(cfg.render_mode, RenderMode::TypeTag);
}

#[test]
fn load_file_missing_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = config::load_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn load_file_malformed_is_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[calltrace]\nenabled = \"sometimes\"").unwrap();

    let err = config::load_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}
