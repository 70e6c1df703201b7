//! Terminal setup and teardown.

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    style,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::io::{self, Stdout, Write};
use std::sync::Once;

/// Raw mode, alternate screen and mouse capture for as long as the guard lives.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new(stdout: &mut Stdout) -> Result<Self> {
        install_panic_hook();
        terminal::enable_raw_mode().context("enable_raw_mode failed")?;
        stdout.execute(terminal::EnterAlternateScreen)?;
        stdout.execute(EnableMouseCapture)?;
        stdout.execute(terminal::Clear(ClearType::All))?;
        stdout.flush()?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

fn restore() {
    let mut stdout = io::stdout();
    let _ = stdout.execute(style::ResetColor);
    let _ = stdout.execute(cursor::SetCursorStyle::DefaultUserShape);
    let _ = stdout.execute(cursor::Show);
    let _ = stdout.execute(DisableMouseCapture);
    let _ = stdout.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

/// Leave the alternate screen before the panic message prints, so it stays readable.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            tracing::error!(%info, "panic");
            default_panic(info);
        }));
    });
}
