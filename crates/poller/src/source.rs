//! Where snapshots come from.

use async_trait::async_trait;
use blockview_snapshot::Snapshot;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::{PollError, PollResult};

/// A single read of the latest snapshot.
///
/// Implementations must not apply their own timeout: the poller bounds
/// every fetch and reports [`PollError::Timeout`] itself.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> PollResult<Snapshot>;
}

/// Reads `GET {endpoint}/latest_block` from a running provider.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    client: Client,
    url: Url,
}

impl HttpSnapshotSource {
    /// Creates a source for the provider at `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self, url::ParseError> {
        Self::with_client(endpoint, Client::new())
    }

    /// Creates a source that reuses an existing client.
    pub fn with_client(endpoint: &str, client: Client) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(endpoint)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let url = base.join("latest_block")?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> PollResult<Snapshot> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| PollError::unavailable(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PollError::NotFound);
        }
        if !status.is_success() {
            return Err(PollError::unavailable(format!("provider answered {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| PollError::unavailable(err.to_string()))?;
        let snapshot =
            Snapshot::from_slice(&body).map_err(|err| PollError::invalid_payload(err.to_string()))?;

        debug!(
            target: "blockview",
            url = %self.url,
            height = snapshot.block_height(),
            "snapshot fetched"
        );
        Ok(snapshot)
    }
}
