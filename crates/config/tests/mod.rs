//! Configuration loading tests
//!
//! These tests cover partial TOML files, missing files and the validation
//! rules shared by the provider and the poller.

mod loading_tests {
    use blockview_config::{BlockviewConfig, ConfigError, DEFAULT_DB_PATH};
    use std::io::Write;
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BlockviewConfig::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config, BlockviewConfig::default());
        assert_eq!(config.store.path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[server]
bind_address = "0.0.0.0"
port = 9090

[poller]
interval_ms = 10000
"#
        )
        .expect("write");

        let config = BlockviewConfig::load(file.path()).expect("load");
        assert_eq!(config.server.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.server.port, 9090);
        assert!(config.server.cors_enabled);
        assert_eq!(config.store.max_connections, 10);
        assert_eq!(config.poller.interval_ms, 10_000);
        assert_eq!(config.poller.fetch_timeout().as_millis(), 7_500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_file_reports_parse_error() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[server\nport = ").expect("write");

        let err = BlockviewConfig::load(file.path()).expect_err("must fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_empty_pool_rejected() {
        let config = BlockviewConfig::from_toml("[store]\nmax_connections = 0\n").expect("parse");
        let err = config.validate().expect_err("must fail");
        assert!(err.to_string().contains("max_connections"));
    }
}
