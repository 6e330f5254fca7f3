use url::Url;

use crate::config::ConnectionConfig;
use crate::error::ClientError;

/// Build the WebSocket endpoint URL for a connection config.
///
/// Port 80 is always omitted from the result. Literal URLs must start with
/// `ws://` or `wss://`; they are parsed, which also strips a default `:80`.
pub fn create_url(connection: &ConnectionConfig) -> Result<String, ClientError> {
    match connection {
        ConnectionConfig::WebSocket {
            secured,
            host,
            port,
            path,
        } => {
            let scheme = if *secured { "wss" } else { "ws" };
            let mut out = format!("{}://{}", scheme, host);
            match port {
                Some(80) | None => {}
                Some(port) => {
                    out.push(':');
                    out.push_str(&port.to_string());
                }
            }
            if let Some(path) = path {
                let trimmed = path.trim_matches('/');
                if !trimmed.is_empty() {
                    out.push('/');
                    out.push_str(trimmed);
                }
            }
            Ok(out)
        }
        ConnectionConfig::WebSocketUrl { url } => normalize_ws_url(url),
        ConnectionConfig::Worker { .. } => Err(ClientError::configuration(
            "worker connections do not have a WebSocket URL",
        )),
    }
}

/// Validate a literal WebSocket URL and normalize it.
pub fn normalize_ws_url(raw: &str) -> Result<String, ClientError> {
    if !raw.starts_with("ws://") && !raw.starts_with("wss://") {
        return Err(ClientError::configuration(format!(
            "WebSocket URL must start with ws:// or wss://, got '{}'",
            raw
        )));
    }
    let parsed = Url::parse(raw).map_err(|e| {
        ClientError::configuration(format!("invalid WebSocket URL '{}': {}", raw, e))
    })?;
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(secured: bool, host: &str, port: Option<u16>, path: Option<&str>) -> ConnectionConfig {
        ConnectionConfig::WebSocket {
            secured,
            host: host.to_string(),
            port,
            path: path.map(|p| p.to_string()),
        }
    }

    #[test]
    fn builds_url_from_parts() {
        let url = create_url(&parts(false, "localhost", Some(3000), Some("sampleServer"))).unwrap();
        assert_eq!(url, "ws://localhost:3000/sampleServer");
    }

    #[test]
    fn port_80_is_omitted() {
        let url = create_url(&parts(false, "localhost", Some(80), Some("sampleServer"))).unwrap();
        assert_eq!(url, "ws://localhost/sampleServer");
    }

    #[test]
    fn missing_port_and_path_are_omitted() {
        let url = create_url(&parts(false, "127.0.0.1", None, None)).unwrap();
        assert_eq!(url, "ws://127.0.0.1");
    }

    #[test]
    fn secured_uses_wss() {
        let url = create_url(&parts(true, "example.com", Some(8443), Some("/lsp/"))).unwrap();
        assert_eq!(url, "wss://example.com:8443/lsp");
    }

    #[test]
    fn literal_url_passes_through() {
        let config = ConnectionConfig::WebSocketUrl {
            url: "ws://localhost:3000/sampleServer".to_string(),
        };
        assert_eq!(create_url(&config).unwrap(), "ws://localhost:3000/sampleServer");
    }

    #[test]
    fn literal_url_default_port_is_stripped() {
        let config = ConnectionConfig::WebSocketUrl {
            url: "ws://localhost:80/test".to_string(),
        };
        assert_eq!(create_url(&config).unwrap(), "ws://localhost/test");
    }

    #[test]
    fn literal_url_requires_ws_scheme() {
        let config = ConnectionConfig::WebSocketUrl {
            url: "http://localhost:3000/sampleServer".to_string(),
        };
        let err = create_url(&config).unwrap_err();
        assert!(matches!(err, ClientError::Configuration { .. }));
    }

    #[test]
    fn create_url_is_idempotent() {
        let first = create_url(&parts(false, "localhost", Some(3000), Some("sampleServer"))).unwrap();
        assert_eq!(normalize_ws_url(&first).unwrap(), first);
    }

    #[test]
    fn worker_config_has_no_url() {
        let config = ConnectionConfig::Worker {
            command: "clangd".to_string(),
            args: vec![],
        };
        assert!(matches!(
            create_url(&config),
            Err(ClientError::Configuration { .. })
        ));
    }
}
