//! Hacker News fetch collaborator.
//!
//! Two-step API: a story-type endpoint returns an ordered list of item
//! ids, then each item is fetched individually. Items are fetched
//! concurrently and re-assembled in rank order.

use serde::Deserialize;

use feedgrid_core::Story;

use crate::fetch::{map_reqwest_error, FetchSettings, StoryFetcher};
use crate::types::{FailureKind, FetchError};

const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Which story list to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryKind {
    Top,
    New,
    Best,
}

impl StoryKind {
    pub fn parse(raw: &str) -> Option<StoryKind> {
        match raw {
            "top" => Some(StoryKind::Top),
            "new" => Some(StoryKind::New),
            "best" => Some(StoryKind::Best),
            _ => None,
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            StoryKind::Top => "topstories",
            StoryKind::New => "newstories",
            StoryKind::Best => "beststories",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HnFetcher {
    client: reqwest::Client,
    kind: StoryKind,
    count: usize,
    base_url: String,
}

impl HnFetcher {
    pub fn new(kind: StoryKind, count: usize, settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            kind,
            count,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point at a different API root (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Raw item record as the API returns it. Deleted or dead items come
/// back with most fields missing, or as a literal `null`.
#[derive(Debug, Deserialize)]
struct HnItem {
    id: u64,
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    score: u32,
    by: Option<String>,
    #[serde(default)]
    descendants: u32,
}

#[async_trait::async_trait]
impl StoryFetcher for HnFetcher {
    async fn fetch(&self) -> Result<Vec<Story>, FetchError> {
        let ids_url = format!("{}/{}.json", self.base_url, self.kind.endpoint());
        let ids: Vec<u64> = self
            .client
            .get(&ids_url)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .error_for_status()
            .map_err(map_reqwest_error)?
            .json()
            .await
            .map_err(map_reqwest_error)?;

        let mut tasks = tokio::task::JoinSet::new();
        for (rank, id) in ids.into_iter().take(self.count).enumerate() {
            let client = self.client.clone();
            let item_url = format!("{}/item/{}.json", self.base_url, id);
            tasks.spawn(async move {
                let item: Option<HnItem> = client
                    .get(&item_url)
                    .send()
                    .await
                    .map_err(map_reqwest_error)?
                    .error_for_status()
                    .map_err(map_reqwest_error)?
                    .json()
                    .await
                    .map_err(map_reqwest_error)?;
                Ok::<_, FetchError>((rank, item))
            });
        }

        let mut ranked = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (rank, item) = joined
                .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))??;
            let Some(item) = item else {
                continue;
            };
            // Items without a title are deleted; skip them.
            let Some(title) = item.title else {
                continue;
            };
            ranked.push((
                rank,
                Story {
                    id: item.id,
                    title,
                    url: item.url,
                    score: item.score,
                    by: item.by.unwrap_or_default(),
                    comments: item.descendants,
                },
            ));
        }
        ranked.sort_by_key(|(rank, _)| *rank);
        Ok(ranked.into_iter().map(|(_, story)| story).collect())
    }
}
