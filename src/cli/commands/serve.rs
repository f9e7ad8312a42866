//! Web server command.

use crate::cli::icons::{dim_arrow, info, warn};
use crate::config::Settings;
use crate::tools::check_tools;

/// Default port when the bind address names only a host.
const DEFAULT_PORT: u16 = 3030;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    for tool in check_tools().into_iter().filter(|t| !t.available) {
        eprintln!(
            "{} {} not found, {} will fail",
            warn(),
            tool.name,
            tool.purpose
        );
    }

    println!(
        "{} Starting textgrab at http://{}:{}",
        info(),
        host,
        port
    );
    println!("  {} OCR languages: {}", dim_arrow(), settings.languages);
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_only() {
        assert_eq!(
            parse_bind_address("8080").unwrap(),
            ("127.0.0.1".to_string(), 8080)
        );
    }

    #[test]
    fn test_parse_host_only() {
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 3030)
        );
    }

    #[test]
    fn test_parse_host_and_port() {
        assert_eq!(
            parse_bind_address("192.168.1.5:9000").unwrap(),
            ("192.168.1.5".to_string(), 9000)
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_bind_address("  ").is_err());
    }
}
