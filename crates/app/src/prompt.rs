use std::io::{Stderr, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};

use crate::error::{AppError, Result};

const PASSWORD_ENV: &str = "NEXKONTROL_PASSWORD";
const ATTEMPTS: usize = 3;

/// Reads a password from `NEXKONTROL_PASSWORD`, or interactively with
/// masked echo.
pub fn password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    read_masked("Password: ")
}

/// Like [`password`], but asks twice when interactive.
pub fn new_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    for _ in 0..ATTEMPTS {
        let first = read_masked("Password: ")?;
        if first.is_empty() {
            notice("Password must not be empty.")?;
            continue;
        }
        if read_masked("Confirm password: ")? == first {
            return Ok(first);
        }
        notice("Passwords do not match. Try again.")?;
    }

    Err(AppError::Input("too many attempts".to_string()))
}

struct RawMode;

impl RawMode {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().map_err(terminal_error)?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn terminal_error(err: std::io::Error) -> AppError {
    AppError::Terminal(err.to_string())
}

fn print_line(out: &mut Stderr, text: &str) -> Result<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(text)
    )
    .map_err(terminal_error)?;
    out.flush().map_err(terminal_error)
}

fn notice(text: &str) -> Result<()> {
    let _raw = RawMode::enter()?;
    print_line(&mut std::io::stderr(), &format!("{text}\r\n"))
}

fn read_masked(prompt: &str) -> Result<String> {
    let _raw = RawMode::enter()?;
    let mut out = std::io::stderr();
    print_line(&mut out, prompt)?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read().map_err(terminal_error)?
        else {
            continue;
        };

        let echo = match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n")).map_err(terminal_error)?;
                break;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n")).map_err(terminal_error)?;
                return Err(AppError::Input("interrupted".to_string()));
            }
            KeyCode::Backspace if buf.pop().is_some() => "\u{8} \u{8}",
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                "*"
            }
            _ => continue,
        };
        execute!(out, Print(echo)).map_err(terminal_error)?;
    }

    out.flush().map_err(terminal_error)?;
    Ok(buf)
}
