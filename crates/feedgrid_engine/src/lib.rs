//! Feedgrid engine: fetch collaborators and the background fetch pool.
mod fetch;
mod hn;
mod pool;
mod types;

pub use fetch::{FetchSettings, StoryFetcher};
pub use hn::{HnFetcher, StoryKind};
pub use pool::FetchPool;
pub use types::{FailureKind, FetchError, FetchEvent, WidgetId};
