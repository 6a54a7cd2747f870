//! Torrent content handed to the daemon: input detection, base64 encoding and the upload report.

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use deluge_rpc_types::DelugeError;

/// File name sent when the input carries none.
const DEFAULT_FILE_NAME: &str = "upload.torrent";

/// Torrent metainfo in one of the accepted forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TorrentInput {
    /// A `.torrent` file on the local filesystem.
    Path(PathBuf),
    /// Raw metainfo bytes.
    Bytes(Vec<u8>),
    /// Base64-encoded metainfo.
    Base64(String),
}

impl From<&str> for TorrentInput {
    /// A string naming an existing file is a path, anything else is taken as base64 content.
    fn from(value: &str) -> Self {
        if Path::new(value).is_file() {
            Self::Path(PathBuf::from(value))
        } else {
            Self::Base64(value.to_string())
        }
    }
}

impl From<String> for TorrentInput {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&Path> for TorrentInput {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<PathBuf> for TorrentInput {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<Vec<u8>> for TorrentInput {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for TorrentInput {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

/// Metainfo ready to be sent: raw bytes plus their canonical base64 encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentPayload {
    /// File name to report to the daemon.
    pub file_name: String,
    /// Raw metainfo.
    pub bytes: Vec<u8>,
    /// Standard (padded) base64 of `bytes`.
    pub base64: String,
}

impl TorrentPayload {
    /// Loads and validates `input`.
    ///
    /// Base64 input is decoded and re-encoded, so every input form of the same file yields the
    /// same `base64`.
    pub async fn resolve(input: TorrentInput) -> Result<Self, DelugeError> {
        let (file_name, bytes) = match input {
            TorrentInput::Path(path) => {
                debug!("Reading torrent file {}", path.display());
                let bytes = tokio::fs::read(&path).await.map_err(|e| {
                    DelugeError::Input(format!(
                        "failed to read torrent file {}: {e}",
                        path.display()
                    ))
                })?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
                (file_name, bytes)
            }
            TorrentInput::Bytes(bytes) => (DEFAULT_FILE_NAME.to_string(), bytes),
            TorrentInput::Base64(text) => {
                let bytes = STANDARD.decode(text.trim()).map_err(|e| {
                    DelugeError::Input(format!(
                        "input is neither an existing file nor valid base64: {e}"
                    ))
                })?;
                (DEFAULT_FILE_NAME.to_string(), bytes)
            }
        };

        if bytes.is_empty() {
            return Err(DelugeError::Input("torrent content is empty".into()));
        }
        // Metainfo is always a bencoded dictionary.
        if bytes.first() != Some(&b'd') {
            return Err(DelugeError::Input(
                "content is not a bencoded torrent dictionary".into(),
            ));
        }

        let base64 = STANDARD.encode(&bytes);
        Ok(Self {
            file_name,
            bytes,
            base64,
        })
    }
}

/// The daemon's report for an upload. A `false` `success` is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    /// Whether the daemon accepted the upload.
    pub success: bool,
    /// Files stored by the daemon.
    pub files: Vec<UploadedFile>,
}

/// One stored upload. The Web UI reports bare temporary paths, some proxies report objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original file name, when reported.
    pub filename: Option<String>,
    /// Location of the stored file on the daemon host.
    pub path: String,
}

impl<'de> Deserialize<'de> for UploadedFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Ok(match &value {
            Value::String(path) => Self {
                filename: None,
                path: path.clone(),
            },
            _ => Self {
                filename: text("filename"),
                path: text("path").unwrap_or_default(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const METAINFO: &[u8] =
        b"d8:announce23:http://tracker/announce4:infod4:name4:test12:piece lengthi16384eee";

    #[tokio::test]
    async fn path_bytes_and_base64_yield_identical_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.torrent");
        std::fs::write(&path, METAINFO).unwrap();
        let encoded = STANDARD.encode(METAINFO);

        let from_path = TorrentPayload::resolve(path.to_str().unwrap().into())
            .await
            .unwrap();
        let from_bytes = TorrentPayload::resolve(METAINFO.into()).await.unwrap();
        let from_base64 = TorrentPayload::resolve(encoded.clone().into())
            .await
            .unwrap();

        assert_eq!(from_path.base64, encoded);
        assert_eq!(from_bytes.base64, encoded);
        assert_eq!(from_base64.base64, encoded);
        assert_eq!(from_path.bytes, from_bytes.bytes);
        assert_eq!(from_path.file_name, "test.torrent");
        assert_eq!(from_bytes.file_name, DEFAULT_FILE_NAME);
    }

    #[test]
    fn string_input_detection() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(TorrentInput::from(path), TorrentInput::Path(path.into()));
        assert_eq!(
            TorrentInput::from("ZDQ6aW5mb2Vl"),
            TorrentInput::Base64("ZDQ6aW5mb2Vl".into())
        );
    }

    #[tokio::test]
    async fn invalid_inputs_are_input_errors() {
        let cases: Vec<TorrentInput> = vec![
            TorrentInput::Base64("not base64 at all!".into()),
            TorrentInput::Bytes(Vec::new()),
            TorrentInput::Bytes(b"<html>".to_vec()),
            TorrentInput::Path("/definitely/not/here.torrent".into()),
        ];
        for input in cases {
            match TorrentPayload::resolve(input.clone()).await {
                Err(DelugeError::Input(_)) => {}
                other => panic!("Expected Input error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn upload_report_accepts_paths_and_objects() {
        let response: UploadResponse = serde_json::from_value(json!({
            "success": true,
            "files": ["/tmp/delugeweb-abc/test.torrent"]
        }))
        .unwrap();
        assert!(response.success);
        assert_eq!(response.files[0].path, "/tmp/delugeweb-abc/test.torrent");
        assert_eq!(response.files[0].filename, None);

        let response: UploadResponse = serde_json::from_value(json!({
            "success": false,
            "files": [{"filename": "a.torrent", "path": "/tmp/a.torrent"}]
        }))
        .unwrap();
        assert!(!response.success);
        assert_eq!(response.files[0].filename.as_deref(), Some("a.torrent"));
    }
}
