//! qbak-tui: interactive editor for the backup configuration
//!
//! A single form with the key, path list, retention and destination. Fields
//! are normalized as they lose focus; nothing is written back until Save.

mod app;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use qbak_core::BackupConfig;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::debug;

pub use app::{clear_key, clear_path, parse_retention, quote_paths, split_paths};

use app::{App, Outcome};

/// Open the editor on `config`. Returns `true` when the user saved, in which
/// case `config` holds the edited values.
pub fn edit(config: &mut BackupConfig) -> Result<bool> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("enter alternate screen")?;
    stdout
        .execute(EnableBracketedPaste)
        .context("enable bracketed paste")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    // Panic hook: restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    let mut app = App::new(config);
    let looped = run(&mut terminal, &mut app);
    restore_terminal()?;
    looped?;

    match app.outcome {
        Some(Outcome::Saved) => {
            app.apply(config).map_err(anyhow::Error::msg)?;
            debug!(paths = config.paths.len(), "configuration edited");
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.outcome.is_none() {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(250)).context("event poll")? {
            match event::read().context("event read")? {
                Event::Key(key) => app.handle_key(key),
                Event::Paste(text) => app.handle_paste(&text),
                _ => {}
            }
        }
    }
    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    let mut stdout = io::stdout();
    stdout
        .execute(DisableBracketedPaste)
        .context("disable bracketed paste")?;
    stdout
        .execute(LeaveAlternateScreen)
        .context("leave alternate screen")?;
    Ok(())
}
