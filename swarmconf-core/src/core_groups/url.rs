//! Community URL and room token rules
//!
//! Communities are keyed by their base URL with the scheme removed plus the
//! lower-cased room token, so `https://Example.com:443/` + `Room` and
//! `example.com` + `ROOM` name the same record.

use crate::errors::{SyncError, SyncResult};

/// Longest normalized base URL
pub const MAX_BASE_URL_LEN: usize = 267;

/// Longest room token
pub const MAX_ROOM_LEN: usize = 64;

const HTTP: &str = "http://";
const HTTPS: &str = "https://";

/// Normalize a community base URL.
///
/// Lower-cases the URL, defaults the scheme to `http://`, strips the
/// default port (`:80` for http, `:443` for https, either one when no
/// scheme was given) and any trailing `/`.
pub fn normalize_base_url(url: &str) -> SyncResult<String> {
    let lower = url.trim().to_ascii_lowercase();

    let (scheme, rest, explicit) = if let Some(rest) = lower.strip_prefix(HTTPS) {
        (HTTPS, rest, true)
    } else if let Some(rest) = lower.strip_prefix(HTTP) {
        (HTTP, rest, true)
    } else if lower.contains("://") {
        return Err(SyncError::Validation(format!(
            "unsupported URL scheme: {}",
            url
        )));
    } else {
        (HTTP, lower.as_str(), false)
    };

    let rest = rest.trim_end_matches('/');
    let (host, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };

    let host = match (scheme, explicit) {
        (HTTP, true) => host.strip_suffix(":80").unwrap_or(host),
        (HTTPS, true) => host.strip_suffix(":443").unwrap_or(host),
        _ => host
            .strip_suffix(":80")
            .or_else(|| host.strip_suffix(":443"))
            .unwrap_or(host),
    };

    if host.is_empty() || host.starts_with(':') {
        return Err(SyncError::Validation(format!(
            "base URL has no host: {}",
            url
        )));
    }

    let normalized = format!("{}{}{}", scheme, host, path);
    if normalized.len() > MAX_BASE_URL_LEN {
        return Err(SyncError::Capacity {
            field: "base_url",
            actual: normalized.len(),
            max: MAX_BASE_URL_LEN,
        });
    }
    Ok(normalized)
}

/// The record key of a normalized base URL: everything after the scheme
pub fn url_key(normalized: &str) -> &str {
    normalized
        .strip_prefix(HTTPS)
        .or_else(|| normalized.strip_prefix(HTTP))
        .unwrap_or(normalized)
}

/// Check a room token: 1 to 64 chars of `[A-Za-z0-9_-]`
pub fn validate_room(room: &str) -> SyncResult<()> {
    if room.is_empty() {
        return Err(SyncError::Validation("room token is empty".to_string()));
    }
    if room.len() > MAX_ROOM_LEN {
        return Err(SyncError::Capacity {
            field: "room",
            actual: room.len(),
            max: MAX_ROOM_LEN,
        });
    }
    if !room
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(SyncError::Validation(format!(
            "room token has invalid characters: {}",
            room
        )));
    }
    Ok(())
}

/// Case-insensitive lookup key of a room token
pub fn room_key(room: &str) -> String {
    room.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        let cases = [
            ("https://Example.com:443/", "https://example.com"),
            ("http://example.com:80", "http://example.com"),
            ("example.com", "http://example.com"),
            ("EXAMPLE.com:443", "http://example.com"),
            ("example.com:80/", "http://example.com"),
            ("http://example.com:443", "http://example.com:443"),
            ("https://example.com:80", "https://example.com:80"),
            ("http://1.2.3.4:8080/", "http://1.2.3.4:8080"),
            ("https://example.com/sub/", "https://example.com/sub"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_base_url(input).unwrap(), expected, "{}", input);
        }
    }

    #[test]
    fn test_normalize_rejects() {
        assert!(matches!(
            normalize_base_url("ftp://example.com"),
            Err(SyncError::Validation(_))
        ));
        assert!(matches!(
            normalize_base_url("https://"),
            Err(SyncError::Validation(_))
        ));
        let long = format!("https://{}.com", "a".repeat(300));
        assert!(matches!(
            normalize_base_url(&long),
            Err(SyncError::Capacity { field: "base_url", .. })
        ));
    }

    #[test]
    fn test_url_key_drops_scheme() {
        assert_eq!(url_key("https://example.com"), "example.com");
        assert_eq!(url_key("http://example.com:8080"), "example.com:8080");
    }

    #[test]
    fn test_room_rules() {
        assert!(validate_room("Lokinet_Updates-2").is_ok());
        assert!(matches!(validate_room(""), Err(SyncError::Validation(_))));
        assert!(matches!(
            validate_room("no spaces"),
            Err(SyncError::Validation(_))
        ));
        assert!(matches!(
            validate_room(&"r".repeat(65)),
            Err(SyncError::Capacity { field: "room", .. })
        ));
        assert_eq!(room_key("SomeRoom"), "someroom");
    }
}
