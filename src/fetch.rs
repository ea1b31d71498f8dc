//! Remote sheet download

use crate::error::{ConvertError, Result};

/// Whether `source` looks like an http(s) URL.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch `url` with a single blocking GET. No retries; any non-success status is an error.
#[cfg(feature = "remote")]
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let fail = |message: String| ConvertError::RemoteFetchError { url: url.to_string(), message };

    log::info!("Fetching {}", url);
    let response = reqwest::blocking::get(url).map_err(|e| fail(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("HTTP {}", status)));
    }
    let bytes = response.bytes().map_err(|e| fail(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Without the `remote` feature URLs cannot be read.
#[cfg(not(feature = "remote"))]
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    Err(ConvertError::UnsupportedInput(format!(
        "{} is a URL but rsikit was built without the `remote` feature",
        url
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/a.dmi"));
        assert!(is_url("http://example.com/a.dmi"));
        assert!(!is_url("icons/a.dmi"));
        assert!(!is_url("ftp://example.com/a.dmi"));
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_unreachable_host_is_fetch_error() {
        // Port 9 on localhost is almost never listening.
        let err = fetch_bytes("http://127.0.0.1:9/none.dmi").unwrap_err();
        assert!(matches!(err, ConvertError::RemoteFetchError { .. }));
    }
}
