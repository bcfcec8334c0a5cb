//! Clipboard sinks for the log viewer's copy button.

use std::io::{self, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// OSC 52 "set clipboard" sequence understood by most terminal emulators.
pub fn osc52(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
}

#[derive(Debug)]
pub enum Clipboard {
    /// Write through the controlling terminal.
    Terminal,
    /// Keep the last copy in memory (headless use and tests).
    Memory(Option<String>),
}

impl Clipboard {
    pub fn set(&mut self, text: &str) -> io::Result<()> {
        match self {
            Clipboard::Terminal => {
                let mut out = io::stdout();
                out.write_all(osc52(text).as_bytes())?;
                out.flush()
            }
            Clipboard::Memory(slot) => {
                *slot = Some(text.to_string());
                Ok(())
            }
        }
    }

    pub fn contents(&self) -> Option<&str> {
        match self {
            Clipboard::Terminal => None,
            Clipboard::Memory(slot) => slot.as_deref(),
        }
    }
}
