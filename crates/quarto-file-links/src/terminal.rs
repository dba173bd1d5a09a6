/*
 * terminal.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * OSC 8 terminal hyperlinks.
 */

//! Clickable links in terminal output.

/// Wrap `text` in an OSC 8 hyperlink pointing at `url`.
///
/// Terminals without OSC 8 support show `text` only.
/// Format: `\x1b]8;;URL\x1b\\TEXT\x1b]8;;\x1b\\`
pub fn hyperlink(url: &str, text: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}
