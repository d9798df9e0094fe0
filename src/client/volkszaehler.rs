use crate::config::ServerConfig;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use std::time::Instant;
use thiserror::Error;

/// # Volkszaehler middleware upload
///
/// A reading is added to a channel by posting to the middleware's data
/// endpoint with the value in the query string and an empty body:
///
/// ```text
/// POST /{path}/data/{uuid}.json?value={celsius:.2} HTTP/1.1
/// ```
///
/// The middleware answers with a JSON document describing the stored tuple.
/// It is never inspected, and failed uploads are not retried: the next poll
/// cycle sends a fresh value.

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP_POST(): {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct VzClient {
    http: Client,
    base_url: String,
}

impl VzClient {
    pub fn new(server: &ServerConfig) -> Result<Self, UploadError> {
        let http = Client::builder()
            .user_agent(server.user_agent.as_str())
            .timeout(server.timeout())
            .build()
            .map_err(UploadError::Client)?;

        Ok(Self {
            http,
            base_url: base_url(&server.host, server.port, &server.path),
        })
    }

    pub fn data_url(&self, uuid: &str, celsius: f64) -> String {
        format!("{}/data/{}.json?value={:.2}", self.base_url, uuid, celsius)
    }

    /// Posts one value. Non-success statuses are logged and returned, not treated as errors.
    pub async fn upload(&self, uuid: &str, celsius: f64) -> Result<StatusCode, UploadError> {
        let start = Instant::now();
        let url = self.data_url(uuid, celsius);

        let response = self.http.post(&url).body("").send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Upload to {} answered {}", url, status);
        }

        debug!("upload({}) took: {} ms", url, start.elapsed().as_millis());
        Ok(status)
    }
}

fn base_url(host: &str, port: u16, path: &str) -> String {
    if path.is_empty() {
        format!("http://{}:{}", host, port)
    } else {
        format!("http://{}:{}/{}", host, port, path)
    }
}
