//! Google Cloud Storage backend using the JSON API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header, Body, Client, RequestBuilder, Response};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::GcsConfig;

use super::error::TransferError;
use super::traits::ObjectStorage;

/// Tokens are refreshed this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Access token cached from the metadata server.
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

/// Google Cloud Storage client.
pub struct GcsStorage {
    client: Client,
    config: GcsConfig,
    token: RwLock<Option<CachedToken>>,
}

impl GcsStorage {
    /// Create a new GCS client.
    pub fn new(config: GcsConfig) -> Result<Self, TransferError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| TransferError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            token: RwLock::new(None),
        })
    }

    /// Get the endpoint without trailing slash.
    fn endpoint(&self) -> &str {
        self.config.endpoint.trim_end_matches('/')
    }

    /// Media download URL for an object.
    pub fn download_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.endpoint(),
            urlencoding::encode(bucket),
            urlencoding::encode(key)
        )
    }

    /// Simple-upload URL for a bucket; the object name goes in the query.
    pub fn upload_url(&self, bucket: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o",
            self.endpoint(),
            urlencoding::encode(bucket)
        )
    }

    /// Returns a bearer token, or `None` for unauthenticated access.
    async fn bearer_token(&self) -> Result<Option<String>, TransferError> {
        if let Some(token) = self.config.access_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Some(token.clone()));
        }

        let Some(metadata_url) = self.config.metadata_url.as_deref() else {
            return Ok(None);
        };

        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                    return Ok(Some(token.value.clone()));
                }
            }
        }

        debug!("Fetching storage access token from metadata server");
        let response = self
            .client
            .get(metadata_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| TransferError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransferError::Auth(format!(
                "metadata server returned HTTP {}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| TransferError::Auth(format!("invalid token response: {}", e)))?;

        let value = token.access_token.clone();
        *self.token.write().await = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(Some(value))
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, TransferError> {
        Ok(match self.bearer_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send(request: RequestBuilder) -> Result<Response, TransferError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransferError::Request("request timed out".to_string())
            } else {
                TransferError::Request(e.to_string())
            }
        })
    }

    async fn check_status(
        response: Response,
        bucket: &str,
        key: &str,
    ) -> Result<Response, TransferError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(bucket, key, status = status.as_u16(), "Storage request rejected");
        Err(TransferError::from_status(
            status.as_u16(),
            bucket,
            key,
            body.chars().take(200).collect(),
        ))
    }
}

#[async_trait]
impl ObjectStorage for GcsStorage {
    fn name(&self) -> &str {
        "gcs"
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<PathBuf, TransferError> {
        let request = self
            .authorized(self.client.get(self.download_url(bucket, key)))
            .await?;
        let mut response = Self::check_status(Self::send(request).await?, bucket, key).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| TransferError::io(dest, e))?;

        let mut total = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransferError::Request(e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| TransferError::io(dest, e))?;
            total += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| TransferError::io(dest, e))?;

        debug!(bucket, key, bytes = total, "Downloaded object");
        Ok(dest.to_path_buf())
    }

    async fn upload(
        &self,
        source: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<(), TransferError> {
        let file = tokio::fs::File::open(source)
            .await
            .map_err(|e| TransferError::io(source, e))?;
        let bytes = file
            .metadata()
            .await
            .map_err(|e| TransferError::io(source, e))?
            .len();

        let request = self
            .client
            .post(self.upload_url(bucket))
            .query(&[("uploadType", "media"), ("name", key)])
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, bytes)
            .body(Body::from(file));
        let request = self.authorized(request).await?;
        Self::check_status(Self::send(request).await?, bucket, key).await?;

        debug!(bucket, key, bytes, "Uploaded object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(endpoint: &str) -> GcsStorage {
        GcsStorage::new(GcsConfig {
            endpoint: endpoint.to_string(),
            access_token: Some("token".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_download_url_encodes_key() {
        let gcs = storage("https://storage.googleapis.com/");
        assert_eq!(
            gcs.download_url("pdf-to-png", "orders/case (O1)(I1).pdf"),
            "https://storage.googleapis.com/storage/v1/b/pdf-to-png/o/orders%2Fcase%20%28O1%29%28I1%29.pdf?alt=media"
        );
    }

    #[test]
    fn test_upload_url() {
        let gcs = storage("http://localhost:4443");
        assert_eq!(
            gcs.upload_url("rendered"),
            "http://localhost:4443/upload/storage/v1/b/rendered/o"
        );
    }

    #[tokio::test]
    async fn test_static_token_takes_precedence() {
        let gcs = storage("http://localhost:4443");
        assert_eq!(gcs.bearer_token().await.unwrap().as_deref(), Some("token"));
    }

    /// Accepts one HTTP request, answers 200 and returns the raw request.
    async fn capture_request(listener: tokio::net::TcpListener) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&received).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .to_ascii_lowercase()
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if received.len() >= end + 4 + length {
                    break;
                }
            }
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}")
            .await
            .unwrap();
        String::from_utf8_lossy(&received).into_owned()
    }

    #[tokio::test]
    async fn test_upload_sends_file_with_length_and_media_query() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(capture_request(listener));

        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("render.png");
        let content = b"\x89PNG\r\n\x1a\nstreamed render body";
        tokio::fs::write(&source, content).await.unwrap();

        storage(&endpoint)
            .upload(&source, "rendered", "orders/case(O1)(I1).png", "image/png")
            .await
            .unwrap();

        let request = server.await.unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(request
            .starts_with("POST /upload/storage/v1/b/rendered/o?uploadType=media&name=orders"));
        assert!(lower.contains(&format!("content-length: {}", content.len())));
        assert!(lower.contains("content-type: image/png"));
        assert!(lower.contains("authorization: bearer token"));
        assert!(!lower.contains("transfer-encoding: chunked"));
        assert!(request.ends_with("streamed render body"));
    }

    #[tokio::test]
    async fn test_upload_missing_source_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = storage("http://127.0.0.1:9")
            .upload(&dir.path().join("absent.png"), "rendered", "a.png", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Io { .. }));
    }

    #[tokio::test]
    async fn test_no_credentials_is_anonymous() {
        let gcs = GcsStorage::new(GcsConfig {
            endpoint: "http://localhost:4443".to_string(),
            access_token: None,
            metadata_url: None,
            timeout_secs: 5,
        })
        .unwrap();
        assert!(gcs.bearer_token().await.unwrap().is_none());
    }
}
