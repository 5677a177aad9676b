use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Body, Client};
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::contract::{ContentTransfer, RemoteError};

/// Streams file content to pre-signed direct upload URLs with a plain PUT.
///
/// No authorization header is sent: the URL itself carries the grant.
#[derive(Debug, Clone, Default)]
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ContentTransfer for HttpTransfer {
    async fn put_file(
        &self,
        url: &str,
        content_type: &str,
        path: &Path,
    ) -> Result<(), RemoteError> {
        let file = File::open(path).await?;
        let length = file.metadata().await?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(reqwest::header::CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(path = %path.display(), status = status.as_u16(), "Direct upload rejected");
            return Err(format!("HTTP {}", status.as_u16()).into());
        }
        debug!(path = %path.display(), bytes = length, "Direct upload accepted");
        Ok(())
    }
}
