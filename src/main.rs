//! news-ticker: terminal front end.
//!
//! Parses the command line, mounts one ticker and runs the event loop.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use news_ticker::app::App;
use news_ticker::config::{FeedSource, TickerConfig, TickerType};
use news_ticker::inject::InjectionRegistry;
use news_ticker::poll::{Acquisition, Mount, ThreadExecutor};
use news_ticker::source::{RelayClient, DEFAULT_RELAY};
use news_ticker::timer::{Clock, SystemClock};
use news_ticker::{input, logging, ui};

/// Consumer id this terminal registers under for injection.
const CONSUMER_ID: &str = "terminal-0";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Widget configuration (JSON).
    #[arg(long, env = "NEWS_TICKER_CONFIG")]
    config: Option<PathBuf>,

    /// Feed URL to show; repeat for several.  Replaces configured feeds.
    #[arg(long = "feed", value_name = "URL")]
    feeds: Vec<String>,

    /// Relay endpoint feeds are fetched through.
    #[arg(long, env = "NEWS_TICKER_RELAY", default_value = DEFAULT_RELAY)]
    relay: String,

    /// JSON array of items to inject at startup, as a host page would.
    #[arg(long, value_name = "PATH")]
    inject: Option<PathBuf>,

    /// Override the configured ticker type.
    #[arg(long, value_enum)]
    ticker: Option<TickerType>,

    /// Write logs here (filtered by RUST_LOG).
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn ticker_config(&self) -> Result<TickerConfig> {
        let mut config = match &self.config {
            Some(path) => TickerConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TickerConfig::default(),
        };
        if !self.feeds.is_empty() {
            config.feeds = self
                .feeds
                .iter()
                .enumerate()
                .map(|(i, url)| FeedSource::new(format!("cli-{i}"), url.as_str(), url.as_str()))
                .collect();
        }
        if let Some(ticker) = self.ticker {
            config.ticker_type = ticker;
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Enters raw mode and the alternate screen; [`Drop`] restores both, also
/// during unwinding.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init(args.log_file.as_deref())?;
    let config = args.ticker_config()?;

    let fetcher = Arc::new(RelayClient::new(&args.relay)?);
    let registry = InjectionRegistry::global();
    let clock = SystemClock::new();

    let acquisition = Acquisition::mount(
        Mount {
            consumer_id: CONSUMER_ID,
            feeds: &config.feeds,
            fetcher,
            executor: Arc::new(ThreadExecutor),
            registry: Arc::clone(&registry),
        },
        clock.now(),
    );
    let mut app = App::new(config, acquisition);

    if let Some(path) = &args.inject {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        registry.set_items_json(&json)?;
    }

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;

    // ~20 fps keeps the marquee smooth.
    let tick_rate = Duration::from_millis(50);

    while !app.quit {
        let frame = app.tick(clock.now());
        let status = app.status();
        guard.terminal.draw(|f| ui::draw(f, &frame, &status))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }
    }

    app.unmount();
    tracing::info!("ticker closed");
    Ok(())
}
