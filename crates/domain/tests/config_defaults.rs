use vc_domain::config::{DialerConfig, ServerConfig};

#[test]
fn default_server_host_is_wildcard() {
    let config = ServerConfig::default();
    assert_eq!(config.host, "0.0.0.0");
}

#[test]
fn explicit_host_parses_from_toml() {
    let toml_str = r#"
host = "127.0.0.1"
port = 3210
"#;
    let config: ServerConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 3210);
}

#[test]
fn dialer_retry_defaults_match_spec() {
    let config = DialerConfig::default();
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.retry_delay_secs, 7200);
}
