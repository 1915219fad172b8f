use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::Frame;

use feedgrid_app::runtime::{Dashboard, KeyOutcome};
use feedgrid_app::widget::{Widget, WidgetRegistry};
use feedgrid_core::{
    Config, ConfigError, FetchState, GeneralSettings, Position, Story, Theme, WidgetSpec,
};
use feedgrid_engine::{FailureKind, FetchError, StoryFetcher};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feedgrid_logging::initialize_for_tests);
}

struct StubFetcher {
    fail: bool,
    calls: AtomicU32,
}

#[async_trait::async_trait]
impl StoryFetcher for StubFetcher {
    async fn fetch(&self) -> Result<Vec<Story>, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(FetchError::new(FailureKind::Network, "stub is down"));
        }
        // The call count rides along in the score, so tests can observe
        // re-fetches through widget state alone.
        Ok(vec![Story {
            id: 1,
            title: "stub story".to_string(),
            url: None,
            score: call,
            by: "stub".to_string(),
            comments: 0,
        }])
    }
}

struct StubWidget {
    title: String,
    position: Position,
    interval: Duration,
    fetcher: Arc<StubFetcher>,
    state: FetchState,
}

impl Widget for StubWidget {
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
        self.state = match result {
            Ok(stories) => FetchState::Data(stories),
            Err(err) => FetchState::Error(err.to_string()),
        };
    }

    fn state(&self) -> &FetchState {
        &self.state
    }

    fn render(&self, _frame: &mut Frame, _area: Rect, _theme: Theme) {}
}

/// Factory for the `"stub"` kind. A `fail = true` field makes every
/// fetch fail.
fn build_stub(
    spec: &WidgetSpec,
    general: &GeneralSettings,
    _index: usize,
) -> Result<Box<dyn Widget>, ConfigError> {
    let fail = spec
        .extra
        .get("fail")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    Ok(Box::new(StubWidget {
        title: spec.title.clone().unwrap_or_else(|| "stub".to_string()),
        position: spec.position,
        interval: spec.effective_interval(general),
        fetcher: Arc::new(StubFetcher {
            fail,
            calls: AtomicU32::new(0),
        }),
        state: FetchState::Empty,
    }))
}

fn stub_dashboard(config_text: &str) -> Dashboard {
    let mut registry = WidgetRegistry::builtin();
    registry.register("stub", build_stub);
    let config = Config::from_toml_str(config_text, &registry.kinds()).expect("valid config");
    Dashboard::new(&config, &registry).expect("dashboard builds")
}

/// Tick until `done` holds or the deadline passes.
fn tick_until(dashboard: &mut Dashboard, deadline: Duration, done: impl Fn(&Dashboard) -> bool) {
    let start = Instant::now();
    while start.elapsed() < deadline {
        dashboard.tick(Instant::now());
        if done(dashboard) {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not reached within {deadline:?}");
}

fn all_settled(dashboard: &Dashboard) -> bool {
    dashboard
        .widgets()
        .iter()
        .all(|widget| !matches!(widget.state(), FetchState::Empty))
}

fn first_score(dashboard: &Dashboard) -> Option<u32> {
    match dashboard.widgets()[0].state() {
        FetchState::Data(stories) => Some(stories[0].score),
        _ => None,
    }
}

#[test]
fn first_tick_fetches_every_widget() {
    init_logging();
    let mut dashboard = stub_dashboard(
        r#"
        [[widgets]]
        type = "stub"
        position = { row = 0, col = 0 }

        [[widgets]]
        type = "stub"
        position = { row = 0, col = 1 }
        "#,
    );

    tick_until(&mut dashboard, Duration::from_secs(2), all_settled);
    for widget in dashboard.widgets() {
        match widget.state() {
            FetchState::Data(stories) => assert_eq!(stories[0].title, "stub story"),
            other => panic!("expected data, got {other:?}"),
        }
    }
}

#[test]
fn failing_widget_does_not_affect_the_others() {
    init_logging();
    let mut dashboard = stub_dashboard(
        r#"
        [[widgets]]
        type = "stub"
        title = "broken"
        fail = true
        position = { row = 0, col = 0 }

        [[widgets]]
        type = "stub"
        title = "healthy"
        position = { row = 0, col = 1 }
        "#,
    );

    tick_until(&mut dashboard, Duration::from_secs(2), all_settled);
    let widgets = dashboard.widgets();

    match widgets[0].state() {
        FetchState::Error(message) => {
            assert!(message.contains("network error"), "message: {message}")
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert!(matches!(widgets[1].state(), FetchState::Data(_)));
}

#[test]
fn widgets_start_empty_before_any_tick() {
    init_logging();
    let dashboard = stub_dashboard(
        r#"
        [[widgets]]
        type = "stub"
        position = { row = 0, col = 0 }
        "#,
    );
    assert!(matches!(
        dashboard.widgets()[0].state(),
        FetchState::Empty
    ));
}

#[test]
fn refresh_key_triggers_a_new_fetch_before_the_interval() {
    init_logging();
    let mut dashboard = stub_dashboard(
        r#"
        [general]
        refresh_interval_secs = 3600

        [[widgets]]
        type = "stub"
        position = { row = 0, col = 0 }
        "#,
    );

    tick_until(&mut dashboard, Duration::from_secs(2), |d| {
        first_score(d) == Some(1)
    });

    // Interval is an hour; only the manual refresh can cause a second
    // fetch within the test deadline.
    let outcome = dashboard.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE));
    assert_eq!(outcome, KeyOutcome::Continue);

    tick_until(&mut dashboard, Duration::from_secs(2), |d| {
        first_score(d) == Some(2)
    });
}

#[test]
fn quit_keys_are_recognized() {
    init_logging();
    let mut dashboard = stub_dashboard(
        r#"
        [[widgets]]
        type = "stub"
        position = { row = 0, col = 0 }
        "#,
    );

    assert_eq!(
        dashboard.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
        KeyOutcome::Quit
    );
    assert_eq!(
        dashboard.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        KeyOutcome::Quit
    );
    assert_eq!(
        dashboard.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)),
        KeyOutcome::Continue
    );
}
