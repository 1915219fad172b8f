//! Widget abstraction and the registry of known widget types.

pub mod news;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::Frame;

use feedgrid_core::{
    ConfigError, FetchState, GeneralSettings, Position, Story, Theme, WidgetSpec,
};
use feedgrid_engine::{FetchError, StoryFetcher};

/// The capability set every widget type implements. The scheduler and
/// render loop depend only on this trait, never on concrete types.
pub trait Widget: Send {
    fn title(&self) -> &str;
    fn position(&self) -> Position;
    /// Effective refresh cadence (spec override or general default).
    fn interval(&self) -> Duration;
    /// The data source handed to the fetch pool. Must not block; the
    /// pool drives it on its own runtime.
    fn fetcher(&self) -> Arc<dyn StoryFetcher>;
    /// Fold a completed fetch into widget state. An error replaces any
    /// previously fetched data; the widget shows it until the next
    /// successful fetch.
    fn apply(&mut self, result: Result<Vec<Story>, FetchError>);
    /// Current data snapshot, as the render loop will draw it.
    fn state(&self) -> &FetchState;
    fn render(&self, frame: &mut Frame, area: Rect, theme: Theme);
}

/// Builds one widget instance from its validated spec. `index` is the
/// widget's position in the config sequence, for error messages.
pub type WidgetFactory =
    fn(&WidgetSpec, &GeneralSettings, usize) -> Result<Box<dyn Widget>, ConfigError>;

/// Maps a widget `type` tag to its factory. Adding a widget kind is one
/// `register` call; the scheduler and render loop never change.
pub struct WidgetRegistry {
    factories: BTreeMap<&'static str, WidgetFactory>,
}

impl WidgetRegistry {
    /// Registry with the built-in widget kinds.
    pub fn builtin() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register("news", news::build);
        registry
    }

    pub fn register(&mut self, kind: &'static str, factory: WidgetFactory) {
        self.factories.insert(kind, factory);
    }

    /// Tags this registry can build; fed to config validation so an
    /// unknown `type` is rejected before any widget is constructed.
    pub fn kinds(&self) -> Vec<&str> {
        self.factories.keys().copied().collect()
    }

    pub fn build(
        &self,
        index: usize,
        spec: &WidgetSpec,
        general: &GeneralSettings,
    ) -> Result<Box<dyn Widget>, ConfigError> {
        let factory =
            self.factories
                .get(spec.kind.as_str())
                .ok_or_else(|| ConfigError::UnknownWidgetKind {
                    index,
                    kind: spec.kind.clone(),
                })?;
        factory(spec, general, index)
    }
}

pub(crate) fn border_style(theme: Theme) -> Style {
    match theme {
        Theme::Dark => Style::default().fg(Color::White),
        Theme::Light => Style::default().fg(Color::Black),
    }
}
