use std::sync::Arc;
use std::time::{Duration, Instant};

use feedgrid_core::Story;
use feedgrid_engine::{FailureKind, FetchError, FetchEvent, FetchPool, StoryFetcher};

struct StubFetcher {
    delay: Duration,
    result: Result<Vec<Story>, FetchError>,
}

impl StubFetcher {
    fn ok(delay: Duration, titles: &[&str]) -> Arc<Self> {
        let stories = titles
            .iter()
            .enumerate()
            .map(|(index, title)| Story {
                id: index as u64,
                title: title.to_string(),
                url: None,
                score: 0,
                by: String::new(),
                comments: 0,
            })
            .collect();
        Arc::new(Self {
            delay,
            result: Ok(stories),
        })
    }

    fn failing(kind: FailureKind) -> Arc<Self> {
        Arc::new(Self {
            delay: Duration::ZERO,
            result: Err(FetchError::new(kind, "stub failure")),
        })
    }
}

#[async_trait::async_trait]
impl StoryFetcher for StubFetcher {
    async fn fetch(&self) -> Result<Vec<Story>, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

/// Poll `try_recv` until an event arrives or the deadline passes.
fn wait_for_event(pool: &FetchPool, deadline: Duration) -> Option<FetchEvent> {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if let Some(event) = pool.try_recv() {
            return Some(event);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    None
}

#[test]
fn completed_fetch_is_delivered() {
    let pool = FetchPool::new(Duration::from_secs(5)).expect("pool starts");
    pool.request(3, StubFetcher::ok(Duration::ZERO, &["a", "b"]));

    let event = wait_for_event(&pool, Duration::from_secs(2)).expect("event arrives");
    assert_eq!(event.widget_id, 3);
    let stories = event.result.expect("fetch ok");
    assert_eq!(stories.len(), 2);
    assert_eq!(stories[0].title, "a");
}

#[test]
fn try_recv_never_blocks() {
    let pool = FetchPool::new(Duration::from_secs(5)).expect("pool starts");
    assert!(pool.try_recv().is_none());
}

#[test]
fn slow_fetch_does_not_delay_fast_one() {
    let pool = FetchPool::new(Duration::from_secs(30)).expect("pool starts");
    pool.request(0, StubFetcher::ok(Duration::from_secs(20), &["slow"]));
    pool.request(1, StubFetcher::ok(Duration::ZERO, &["fast"]));

    let event = wait_for_event(&pool, Duration::from_secs(2)).expect("fast event arrives");
    assert_eq!(event.widget_id, 1);
}

#[test]
fn fetch_error_is_delivered_not_swallowed() {
    let pool = FetchPool::new(Duration::from_secs(5)).expect("pool starts");
    pool.request(7, StubFetcher::failing(FailureKind::Network));

    let event = wait_for_event(&pool, Duration::from_secs(2)).expect("event arrives");
    assert_eq!(event.widget_id, 7);
    let err = event.result.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}

#[test]
fn stalled_fetch_times_out() {
    let pool = FetchPool::new(Duration::from_millis(100)).expect("pool starts");
    pool.request(0, StubFetcher::ok(Duration::from_secs(60), &["never"]));

    let event = wait_for_event(&pool, Duration::from_secs(2)).expect("timeout event arrives");
    let err = event.result.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[test]
fn drop_with_in_flight_fetch_does_not_hang() {
    let pool = FetchPool::new(Duration::from_secs(30)).expect("pool starts");
    pool.request(0, StubFetcher::ok(Duration::from_secs(60), &["abandoned"]));
    drop(pool);
}

#[test]
fn events_carry_distinct_widget_ids() {
    let pool = FetchPool::new(Duration::from_secs(5)).expect("pool starts");
    pool.request(10, StubFetcher::ok(Duration::ZERO, &["x"]));
    pool.request(11, StubFetcher::ok(Duration::ZERO, &["y"]));

    let mut seen = Vec::new();
    while seen.len() < 2 {
        let event = wait_for_event(&pool, Duration::from_secs(2)).expect("event arrives");
        seen.push(event.widget_id);
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![10, 11]);
}
