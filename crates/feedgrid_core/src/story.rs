/// One fetched news story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub score: u32,
    pub by: String,
    pub comments: u32,
}

/// The most recently completed fetch outcome for a widget.
///
/// An error replaces any previously fetched data; the widget shows the
/// failure until the next successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    /// No fetch has completed yet.
    #[default]
    Empty,
    Data(Vec<Story>),
    Error(String),
}

impl FetchState {
    pub fn is_error(&self) -> bool {
        matches!(self, FetchState::Error(_))
    }
}
