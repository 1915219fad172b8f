use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("refresh_interval_secs must be greater than zero")]
    ZeroInterval,
    #[error("unknown theme {0:?} (expected \"dark\" or \"light\")")]
    UnknownTheme(String),
    #[error("widget {index}: unknown widget type {kind:?}")]
    UnknownWidgetKind { index: usize, kind: String },
    /// Type-specific field rejected by the widget's factory.
    #[error("widget {index} ({kind}): {message}")]
    WidgetField {
        index: usize,
        kind: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Theme> {
        match raw {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

/// Grid cell a widget is declared at. Overlaps are allowed; the layout
/// engine decides draw order, not validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralSettings {
    pub refresh_interval_secs: u64,
    pub theme: Theme,
}

/// One validated widget declaration.
///
/// Type-specific fields stay in `extra`; the registered factory for
/// `kind` owns their schema and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    pub kind: String,
    pub title: Option<String>,
    pub position: Position,
    pub refresh_interval_secs: Option<u64>,
    pub extra: toml::Table,
}

impl WidgetSpec {
    /// Refresh cadence for this widget: its own override, or the
    /// general default.
    pub fn effective_interval(&self, general: &GeneralSettings) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .unwrap_or(general.refresh_interval_secs),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub general: GeneralSettings,
    pub widgets: Vec<WidgetSpec>,
}

impl Config {
    /// Read and validate a config file.
    pub fn load(path: &Path, known_kinds: &[&str]) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, known_kinds)
    }

    /// Parse config text and validate it against the widget kinds the
    /// caller's registry knows. Pure transform: no side effects.
    pub fn from_toml_str(text: &str, known_kinds: &[&str]) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        validate(raw, known_kinds)
    }
}

/// Built-in configuration used when no config is supplied: a single
/// news widget, top stories, count 15, 60 s refresh, dark theme.
impl Default for Config {
    fn default() -> Self {
        let mut extra = toml::Table::new();
        extra.insert("story_count".to_string(), toml::Value::Integer(15));
        extra.insert(
            "story_type".to_string(),
            toml::Value::String("top".to_string()),
        );
        Self {
            general: GeneralSettings {
                refresh_interval_secs: 60,
                theme: Theme::Dark,
            },
            widgets: vec![WidgetSpec {
                kind: "news".to_string(),
                title: Some("Hacker News".to_string()),
                position: Position { row: 0, col: 0 },
                refresh_interval_secs: None,
                extra,
            }],
        }
    }
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    general: RawGeneral,
    #[serde(default)]
    widgets: Vec<RawWidget>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGeneral {
    #[serde(default = "default_refresh_interval")]
    refresh_interval_secs: u64,
    #[serde(default = "default_theme")]
    theme: String,
}

impl Default for RawGeneral {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            theme: default_theme(),
        }
    }
}

#[derive(Deserialize)]
struct RawWidget {
    #[serde(rename = "type")]
    kind: String,
    title: Option<String>,
    position: Position,
    refresh_interval_secs: Option<u64>,
    #[serde(flatten)]
    extra: toml::Table,
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_theme() -> String {
    "dark".to_string()
}

fn validate(raw: RawConfig, known_kinds: &[&str]) -> Result<Config, ConfigError> {
    if raw.general.refresh_interval_secs == 0 {
        return Err(ConfigError::ZeroInterval);
    }
    let theme = Theme::parse(&raw.general.theme)
        .ok_or_else(|| ConfigError::UnknownTheme(raw.general.theme.clone()))?;

    let mut widgets = Vec::with_capacity(raw.widgets.len());
    for (index, widget) in raw.widgets.into_iter().enumerate() {
        if !known_kinds.contains(&widget.kind.as_str()) {
            return Err(ConfigError::UnknownWidgetKind {
                index,
                kind: widget.kind,
            });
        }
        if widget.refresh_interval_secs == Some(0) {
            return Err(ConfigError::ZeroInterval);
        }
        widgets.push(WidgetSpec {
            kind: widget.kind,
            title: widget.title,
            position: widget.position,
            refresh_interval_secs: widget.refresh_interval_secs,
            extra: widget.extra,
        });
    }

    Ok(Config {
        general: GeneralSettings {
            refresh_interval_secs: raw.general.refresh_interval_secs,
            theme,
        },
        widgets,
    })
}
