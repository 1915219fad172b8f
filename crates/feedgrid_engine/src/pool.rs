use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::fetch::StoryFetcher;
use crate::types::{FailureKind, FetchError, FetchEvent, WidgetId};

enum PoolCommand {
    Fetch {
        widget_id: WidgetId,
        fetcher: Arc<dyn StoryFetcher>,
    },
}

/// Background fetch pool: a tokio runtime on its own thread, one task
/// per requested fetch. Requests and results cross std channels, so the
/// render loop never blocks on a fetch and fetches never block each
/// other. Concurrency is bounded only by the number of widgets asking.
pub struct FetchPool {
    cmd_tx: mpsc::Sender<PoolCommand>,
    event_rx: mpsc::Receiver<FetchEvent>,
}

impl FetchPool {
    /// Spawn the worker thread. `fetch_timeout` bounds every fetch so a
    /// stalled source degrades to a widget-local timeout error instead
    /// of starving that widget's refresh.
    pub fn new(fetch_timeout: Duration) -> io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<PoolCommand>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            log::debug!("fetch pool worker started");
            while let Ok(command) = cmd_rx.recv() {
                let PoolCommand::Fetch { widget_id, fetcher } = command;
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let result =
                        match tokio::time::timeout(fetch_timeout, fetcher.fetch()).await {
                            Ok(result) => result,
                            Err(_) => Err(FetchError::new(
                                FailureKind::Timeout,
                                format!("no response within {}s", fetch_timeout.as_secs()),
                            )),
                        };
                    // The receiver may already be gone during shutdown;
                    // a late result is dropped here, never delivered.
                    let _ = event_tx.send(FetchEvent { widget_id, result });
                });
            }
            // Command sender dropped: shut down without waiting for
            // in-flight fetches.
            log::debug!("fetch pool worker stopping");
            runtime.shutdown_background();
        });

        Ok(Self { cmd_tx, event_rx })
    }

    /// Start a fetch for `widget_id`. Never blocks.
    pub fn request(&self, widget_id: WidgetId, fetcher: Arc<dyn StoryFetcher>) {
        let _ = self.cmd_tx.send(PoolCommand::Fetch { widget_id, fetcher });
    }

    /// Next completed fetch, if any. Never blocks.
    pub fn try_recv(&self) -> Option<FetchEvent> {
        self.event_rx.try_recv().ok()
    }
}
