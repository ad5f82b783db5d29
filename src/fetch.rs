//! Loads export bytes from disk or over HTTP.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}

/// Reads `source` from a local path, or fetches it when it is an http(s) URL.
/// Gzip-compressed payloads are inflated.
#[tracing::instrument]
pub fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(source)?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read {source}"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");
    gunzip_if_compressed(bytes)
}

pub fn gunzip_if_compressed(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut inflated = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut inflated)
        .context("failed to inflate gzip payload")?;
    debug!(bytes = inflated.len(), "Inflated gzip payload");
    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_plain_bytes_pass_through() {
        let bytes = b"a;b;c\n".to_vec();
        assert_eq!(gunzip_if_compressed(bytes.clone()).unwrap(), bytes);
    }

    #[test]
    fn test_gzip_is_inflated() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"route;pax;start\n").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(
            gunzip_if_compressed(compressed).unwrap(),
            b"route;pax;start\n".to_vec()
        );
    }

    #[test]
    fn test_load_source_reads_local_file() {
        let path = format!("{}/ridership_peaks_fetch_test.csv", env::temp_dir().display());
        fs::write(&path, "x;y;z\n").unwrap();

        assert_eq!(load_source(&path).unwrap(), b"x;y;z\n".to_vec());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_source_missing_file_errors() {
        let err = load_source("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}
