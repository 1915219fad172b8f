//! Feedgrid core: pure configuration, layout, and scheduling domain.
mod config;
mod layout;
mod schedule;
mod story;

pub use config::{Config, ConfigError, GeneralSettings, Position, Theme, WidgetSpec};
pub use layout::{resolve_layout, Region};
pub use schedule::{RefreshSchedule, WidgetId};
pub use story::{FetchState, Story};
