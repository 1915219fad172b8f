//! News-feed widget backed by the Hacker News collaborator.

use std::sync::Arc;
use std::time::Duration;

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Frame;
use serde::Deserialize;

use feedgrid_core::{
    ConfigError, FetchState, GeneralSettings, Position, Story, Theme, WidgetSpec,
};
use feedgrid_engine::{FetchError, FetchSettings, HnFetcher, StoryFetcher, StoryKind};

use crate::widget::{border_style, Widget};

/// Hard cap on stories per widget; each story costs one API request.
pub const MAX_STORY_COUNT: usize = 50;

const DEFAULT_TITLE: &str = "Hacker News";

/// Type-specific fields of a `[[widget]]` table with `type = "news"`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewsFields {
    #[serde(default = "default_story_count")]
    story_count: usize,
    #[serde(default = "default_story_type")]
    story_type: String,
}

fn default_story_count() -> usize {
    10
}

fn default_story_type() -> String {
    "top".to_string()
}

/// Factory registered under the `"news"` tag.
pub fn build(
    spec: &WidgetSpec,
    general: &GeneralSettings,
    index: usize,
) -> Result<Box<dyn Widget>, ConfigError> {
    let field_err = |message: String| ConfigError::WidgetField {
        index,
        kind: spec.kind.clone(),
        message,
    };

    let fields: NewsFields = spec
        .extra
        .clone()
        .try_into()
        .map_err(|err: toml::de::Error| field_err(err.message().to_string()))?;
    if fields.story_count == 0 || fields.story_count > MAX_STORY_COUNT {
        return Err(field_err(format!(
            "story_count must be between 1 and {MAX_STORY_COUNT}, got {}",
            fields.story_count
        )));
    }
    let kind = StoryKind::parse(&fields.story_type).ok_or_else(|| {
        field_err(format!(
            "unknown story_type {:?}, expected \"top\", \"new\" or \"best\"",
            fields.story_type
        ))
    })?;
    let fetcher = HnFetcher::new(kind, fields.story_count, &FetchSettings::default())
        .map_err(|err| field_err(err.to_string()))?;

    Ok(Box::new(NewsWidget {
        title: spec.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        position: spec.position,
        interval: spec.effective_interval(general),
        fetcher: Arc::new(fetcher),
        state: FetchState::Empty,
    }))
}

pub struct NewsWidget {
    title: String,
    position: Position,
    interval: Duration,
    fetcher: Arc<HnFetcher>,
    state: FetchState,
}

impl Widget for NewsWidget {
    fn title(&self) -> &str {
        &self.title
    }

    fn position(&self) -> Position {
        self.position
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn fetcher(&self) -> Arc<dyn StoryFetcher> {
        self.fetcher.clone()
    }

    fn apply(&mut self, result: Result<Vec<Story>, FetchError>) {
        match result {
            Ok(stories) => {
                log::debug!("widget {:?}: {} stories", self.title, stories.len());
                self.state = FetchState::Data(stories);
            }
            Err(err) => {
                log::warn!("widget {:?}: fetch failed: {err}", self.title);
                self.state = FetchState::Error(err.to_string());
            }
        }
    }

    fn state(&self) -> &FetchState {
        &self.state
    }

    fn render(&self, frame: &mut Frame, area: Rect, theme: Theme) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(border_style(theme));

        let items: Vec<ListItem> = match &self.state {
            FetchState::Empty => vec![ListItem::new("Loading...")],
            FetchState::Error(message) => vec![ListItem::new(Line::from(Span::styled(
                format!("Error: {message}"),
                Style::default().fg(Color::Red),
            )))],
            FetchState::Data(stories) => stories
                .iter()
                .enumerate()
                .flat_map(|(rank, story)| story_lines(rank, story, theme))
                .map(ListItem::new)
                .collect(),
        };
        frame.render_widget(List::new(items).block(block), area);
    }
}

/// One numbered title line plus one dimmed meta line per story.
fn story_lines(rank: usize, story: &Story, theme: Theme) -> [Line<'static>; 2] {
    let title_fg = match theme {
        Theme::Dark => Color::White,
        Theme::Light => Color::Black,
    };
    [
        Line::from(vec![
            Span::styled(format!("{:2}. ", rank + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(story.title.clone(), Style::default().fg(title_fg)),
        ]),
        Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("{} points", story.score), Style::default().fg(Color::Yellow)),
            Span::styled(
                format!(" | {} comments", story.comments),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!(" | by {}", story.by),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ]
}
