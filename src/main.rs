use ems_tui::auth::{resolve_token, CredentialsManager};
use ems_tui::binding::InsightsBinding;
use ems_tui::client::InsightsClient;
use ems_tui::config::Config;
use ems_tui::ui::{render_insights, theme::COLOR_DIM};

use color_eyre::Result;
use crossterm::{
    cursor::Show,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;

/// Application state for the insights screen.
struct App {
    client: Arc<InsightsClient>,
    binding: InsightsBinding,
    token: Option<String>,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    fn new(config: Config, token: Option<String>) -> Self {
        let client = Arc::new(InsightsClient::with_base_url(config.base_url));
        let binding = InsightsBinding::new(Arc::clone(&client));
        Self {
            client,
            binding,
            token,
            status: None,
            should_quit: false,
        }
    }

    /// Start (or restart) the insights stream. Activation is explicit
    /// because generation is costly on the backend.
    fn activate(&mut self) {
        let Some(token) = &self.token else {
            self.status =
                Some("No valid token. Set EMS_TOKEN or log in via the web app first.".to_string());
            return;
        };

        // Still streaming: ignore the keypress rather than restart mid-flight
        if self.binding.target().is_some() && !self.binding.state().done {
            return;
        }

        let url = self.client.insights_url(token);
        self.status = None;
        // Clear first so re-running with the same token opens a fresh session
        self.binding.set_target(None);
        self.binding.set_target(Some(url));
    }

    /// Cancel the active stream, keeping whatever text already arrived.
    fn cancel(&mut self) {
        self.binding.set_target(None);
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('i') | KeyCode::Enter => self.activate(),
            KeyCode::Char('c') => self.cancel(),
            _ => {}
        }
    }
}

fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(frame.area());

    render_insights(frame, chunks[0], app.binding.state());

    let footer = match &app.status {
        Some(status) => Line::from(Span::styled(status.clone(), Style::default().fg(COLOR_DIM))),
        None => Line::from(Span::styled(
            " i: generate  c: cancel  q: quit",
            Style::default().fg(COLOR_DIM),
        )),
    };
    frame.render_widget(Paragraph::new(footer), chunks[1]);
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut events = EventStream::new();

    while !app.should_quit {
        terminal.draw(|frame| draw(frame, app))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.handle_key(key.code);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
            update = app.binding.session_mut().next_update() => {
                if let Some(update) = update {
                    app.binding.session_mut().apply(update);
                }
                // Fold in anything else already queued before redrawing
                app.binding.session_mut().drain_pending();
            }
        }
    }

    Ok(())
}

/// Setup panic hook to restore terminal on panic
fn setup_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = execute!(io::stdout(), Show);
        original_hook(panic_info);
    }));
}

/// Restore terminal to normal mode
fn restore_terminal<B: ratatui::backend::Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env();
    let token = resolve_token(CredentialsManager::new().as_ref());
    if token.is_none() {
        tracing::warn!("no valid token found; streaming will be unavailable");
    }

    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(config, token);
    let result = run_app(&mut terminal, &mut app).await;

    restore_terminal(&mut terminal)?;

    result
}
