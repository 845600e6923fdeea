//! File drop provider
//!
//! Writes each message as `<control-id>.hl7` into a directory watched by
//! the receiving system. The acknowledgment is the path of the written file.

use super::traits::{measure, DeliveryFailure, TransmissionProvider};
use crate::domain::{
    TransmissionError, TransmissionProtocol, TransmissionRequest, TransmissionResult,
};
use crate::hl7::Hl7Message;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const MAX_NAME_ATTEMPTS: u32 = 100;

/// Provider for directory paths and `file://` URLs
#[derive(Debug, Default)]
pub struct FileProvider;

impl FileProvider {
    pub fn new() -> Self {
        Self
    }

    /// Resolves an endpoint to the target directory
    pub fn directory(endpoint: &str) -> Option<PathBuf> {
        let path = endpoint.strip_prefix("file://").unwrap_or(endpoint).trim();
        if path.is_empty() || path.contains("://") {
            return None;
        }
        Some(PathBuf::from(path))
    }

    /// Base file name: the MSH-10 control id when readable, else the request id
    fn base_name(request: &TransmissionRequest) -> String {
        let control_id = Hl7Message::parse(request.message())
            .ok()
            .map(|message| message.control_id().to_string())
            .filter(|id| !id.is_empty());

        let name = control_id.unwrap_or_else(|| request.request_id().to_string());
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    async fn deliver(
        &self,
        request: &TransmissionRequest,
    ) -> Result<Option<String>, DeliveryFailure> {
        let directory = Self::directory(request.endpoint()).ok_or_else(|| {
            TransmissionError::InvalidEndpoint(format!(
                "{}: expected a directory path",
                request.endpoint()
            ))
        })?;

        fs::create_dir_all(&directory).await.map_err(|e| {
            TransmissionError::Transport(format!("create {}: {e}", directory.display()))
        })?;

        let base = Self::base_name(request);
        let (path, mut file) = create_unique(&directory, &base).await?;

        file.write_all(request.message().as_bytes())
            .await
            .map_err(|e| TransmissionError::Transport(format!("write {}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| TransmissionError::Transport(format!("flush {}: {e}", path.display())))?;

        Ok(Some(path.display().to_string()))
    }
}

/// Creates `<base>.hl7`, or `<base>-<n>.hl7` if the name is taken
async fn create_unique(
    directory: &Path,
    base: &str,
) -> Result<(PathBuf, fs::File), TransmissionError> {
    for n in 0..MAX_NAME_ATTEMPTS {
        let name = if n == 0 {
            format!("{base}.hl7")
        } else {
            format!("{base}-{n}.hl7")
        };
        let path = directory.join(name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(TransmissionError::Transport(format!(
                    "create {}: {e}",
                    path.display()
                )))
            }
        }
    }

    Err(TransmissionError::Transport(format!(
        "no free file name for '{base}' in {}",
        directory.display()
    )))
}

#[async_trait]
impl TransmissionProvider for FileProvider {
    fn protocol(&self) -> TransmissionProtocol {
        TransmissionProtocol::File
    }

    fn name(&self) -> &'static str {
        "File Drop Provider"
    }

    async fn send(&self, request: &TransmissionRequest) -> TransmissionResult {
        tracing::debug!(
            request_id = %request.request_id(),
            endpoint = %request.endpoint(),
            "Writing HL7 message to drop directory"
        );
        measure(self.deliver(request)).await
    }

    async fn validate_endpoint(&self, endpoint: &str) -> bool {
        Self::directory(endpoint).is_some()
    }

    async fn test_connection(&self, endpoint: &str) -> bool {
        let Some(directory) = Self::directory(endpoint) else {
            return false;
        };

        // the drop directory is created on first send; check the nearest existing ancestor
        for candidate in directory.ancestors() {
            let candidate = if candidate.as_os_str().is_empty() {
                Path::new(".")
            } else {
                candidate
            };
            match fs::metadata(candidate).await {
                Ok(metadata) => {
                    return metadata.is_dir() && !metadata.permissions().readonly();
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(_) => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use tempfile::TempDir;

    const MESSAGE: &str = "MSH|^~\\&|LIS|LAB|EHR|HOSP|20240115083000||ORU^R01|MSG001|P|2.5\rPID|1||P12345";

    fn request(endpoint: &str, message: &str) -> TransmissionRequest {
        TransmissionRequest::new(endpoint, message, TransmissionProtocol::File)
    }

    #[test]
    fn test_directory_resolution() {
        assert_eq!(
            FileProvider::directory("file:///var/hl7/out"),
            Some(PathBuf::from("/var/hl7/out"))
        );
        assert_eq!(FileProvider::directory("./out"), Some(PathBuf::from("./out")));
        assert_eq!(FileProvider::directory("http://host/out"), None);
        assert_eq!(FileProvider::directory(""), None);
    }

    #[tokio::test]
    async fn test_send_writes_control_id_file() {
        let dir = TempDir::new().unwrap();
        let endpoint = dir.path().to_str().unwrap();
        let provider = FileProvider::new();

        let result = provider.send(&request(endpoint, MESSAGE)).await;
        assert!(result.success, "{:?}", result.error_message);

        let written = dir.path().join("MSG001.hl7");
        assert_eq!(
            result.acknowledgment_message.as_deref(),
            Some(written.display().to_string().as_str())
        );
        assert_eq!(std::fs::read_to_string(written).unwrap(), MESSAGE);
    }

    #[tokio::test]
    async fn test_send_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let endpoint = dir.path().to_str().unwrap();
        let provider = FileProvider::new();

        assert!(provider.send(&request(endpoint, MESSAGE)).await.success);
        assert!(provider.send(&request(endpoint, MESSAGE)).await.success);

        assert!(dir.path().join("MSG001.hl7").exists());
        assert!(dir.path().join("MSG001-1.hl7").exists());
    }

    #[tokio::test]
    async fn test_send_unparseable_message_uses_request_id() {
        let dir = TempDir::new().unwrap();
        let endpoint = dir.path().to_str().unwrap();
        let req = request(endpoint, "not hl7");

        let result = FileProvider::new().send(&req).await;
        assert!(result.success);
        let expected = dir.path().join(format!("{}.hl7", req.request_id()));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_send_invalid_endpoint() {
        let result = FileProvider::new()
            .send(&request("https://example.com", MESSAGE))
            .await;
        assert!(!result.success);
        assert_eq!(result.failure_kind, Some(FailureKind::InvalidRequest));
    }

    #[tokio::test]
    async fn test_connection_leaves_filesystem_untouched() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("outbox").join("lab");
        let provider = FileProvider::new();
        assert!(provider.test_connection(nested.to_str().unwrap()).await);
        assert!(!dir.path().join("outbox").exists());
    }

    #[tokio::test]
    async fn test_connection_fails_under_a_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let provider = FileProvider::new();
        assert!(!provider.test_connection(file.to_str().unwrap()).await);
        assert!(!provider
            .test_connection(file.join("outbox").to_str().unwrap())
            .await);
    }
}
