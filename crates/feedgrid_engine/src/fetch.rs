use std::time::Duration;

use feedgrid_core::Story;

use crate::types::{FailureKind, FetchError};

/// Network bounds applied to every fetch collaborator.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A widget's data source. `fetch` runs on the pool's runtime; it must
/// not assume any particular thread and must tolerate being cancelled
/// mid-flight when the pool shuts down.
#[async_trait::async_trait]
pub trait StoryFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Story>, FetchError>;
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if let Some(status) = err.status() {
        return FetchError::new(FailureKind::HttpStatus(status.as_u16()), err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::MalformedResponse, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
