//! The render loop: terminal ownership, input handling, and the tick
//! that bridges the schedule to the fetch pool.

use std::io::{self, Stdout};
use std::panic;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Frame, Terminal};

use feedgrid_core::{resolve_layout, Config, Position, RefreshSchedule, Theme, WidgetId};
use feedgrid_engine::FetchPool;

use crate::engine::{InitError, RunError};
use crate::widget::{Widget, WidgetRegistry};

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Render-loop lifecycle. `run` enters at `Starting` and returns once
/// `Stopped`; the terminal is restored on every exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Starting,
    Active,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// The widget instances, their refresh schedule, and the fetch pool
/// serving them. Lives from init until engine shutdown.
pub struct Dashboard {
    widgets: Vec<Box<dyn Widget>>,
    schedule: RefreshSchedule,
    pool: FetchPool,
    theme: Theme,
}

impl Dashboard {
    /// Build one widget instance per spec, in config order. Widget ids
    /// are the indices into that order.
    pub fn new(config: &Config, registry: &WidgetRegistry) -> Result<Self, InitError> {
        let mut widgets = Vec::with_capacity(config.widgets.len());
        for (index, spec) in config.widgets.iter().enumerate() {
            widgets.push(registry.build(index, spec, &config.general)?);
        }

        let now = Instant::now();
        let mut schedule = RefreshSchedule::new();
        for (index, widget) in widgets.iter().enumerate() {
            schedule.insert(index as WidgetId, widget.interval(), now);
        }

        let pool = FetchPool::new(FETCH_TIMEOUT).map_err(InitError::FetchPool)?;
        Ok(Self {
            widgets,
            schedule,
            pool,
            theme: config.general.theme,
        })
    }

    pub fn widgets(&self) -> &[Box<dyn Widget>] {
        &self.widgets
    }

    /// One scheduler advance: fold completed fetches into widget state,
    /// then start whatever is due. Results are applied before the next
    /// draw, so a partially-applied update is never rendered.
    pub fn tick(&mut self, now: Instant) {
        while let Some(event) = self.pool.try_recv() {
            self.schedule.complete(event.widget_id, now);
            if let Some(widget) = self.widgets.get_mut(event.widget_id as usize) {
                widget.apply(event.result);
            }
        }
        for id in self.schedule.due(now) {
            let Some(widget) = self.widgets.get(id as usize) else {
                continue;
            };
            self.schedule.mark_started(id);
            self.pool.request(id, widget.fetcher());
        }
    }

    /// Draw every widget into its resolved grid region, in config
    /// order. When two widgets share a cell the later one draws last
    /// and wins.
    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let positions: Vec<Position> = self.widgets.iter().map(|w| w.position()).collect();
        let regions = resolve_layout(&positions, area.width, area.height);
        for (widget, region) in self.widgets.iter().zip(regions) {
            let cell = Rect::new(region.x, region.y, region.width, region.height);
            widget.render(frame, cell, self.theme);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Char('q') => KeyOutcome::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                KeyOutcome::Quit
            }
            KeyCode::Char('r') => {
                log::info!("manual refresh requested");
                self.schedule.force_refresh(Instant::now());
                KeyOutcome::Continue
            }
            _ => KeyOutcome::Continue,
        }
    }

    /// Take over the terminal and block until the user quits or a
    /// fatal error ends the loop.
    pub fn run(&mut self) -> Result<(), RunError> {
        let mut session = TerminalSession::acquire().map_err(RunError::Terminal)?;

        // If a widget panics mid-draw the unwind crosses this frame
        // before any caller can react; restore the terminal first so
        // the panic is not hidden behind the alternate screen.
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal_modes();
            original_hook(info);
        }));

        let result = self.drive(session.terminal_mut());
        let restore = session.restore();
        result?;
        restore.map_err(RunError::Terminal)
    }

    fn drive(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), RunError> {
        log::info!("render loop starting with {} widgets", self.widgets.len());
        let mut state = LoopState::Starting;
        while state != LoopState::Stopped {
            state = match state {
                LoopState::Starting => {
                    // First frame before any fetch completes shows
                    // every widget in its placeholder state.
                    terminal.draw(|frame| self.draw(frame)).map_err(RunError::Io)?;
                    LoopState::Active
                }
                LoopState::Active => {
                    self.tick(Instant::now());
                    terminal.draw(|frame| self.draw(frame)).map_err(RunError::Io)?;
                    self.poll_input()?
                }
                LoopState::Stopping => {
                    log::info!("render loop stopping");
                    LoopState::Stopped
                }
                LoopState::Stopped => break,
            };
        }
        Ok(())
    }

    fn poll_input(&mut self) -> Result<LoopState, RunError> {
        if event::poll(INPUT_POLL_INTERVAL).map_err(RunError::Io)? {
            if let Event::Key(key) = event::read().map_err(RunError::Io)? {
                if key.kind == KeyEventKind::Press && self.handle_key(key) == KeyOutcome::Quit {
                    return Ok(LoopState::Stopping);
                }
            }
        }
        Ok(LoopState::Active)
    }
}

/// RAII terminal acquisition: raw mode plus alternate screen, undone on
/// `restore` or on drop, whichever comes first.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl TerminalSession {
    fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(err) => {
                restore_terminal_modes();
                return Err(err);
            }
        };
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Best-effort restore usable from a panic hook, where the session
/// itself is unreachable.
fn restore_terminal_modes() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}
