/*
 * catalog.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Built-in IDE link format catalog.
 */

//! Built-in IDE link format catalog.
//!
//! Maps short editor aliases (like "vscode") to their link templates. The
//! templates use `%f` for the file path and `%l` for the line number.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Global IDE alias table, loaded lazily from JSON embedded at compile time.
///
/// # Panics
///
/// Panics if the embedded JSON is invalid. This should only happen during
/// development if someone edits `ide_link_formats.json` incorrectly.
pub static IDE_LINK_FORMATS: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    let json_data = include_str!("../ide_link_formats.json");
    serde_json::from_str(json_data).expect("Invalid IDE link format JSON - this is a bug in Quarto")
});

/// Look up the link template for an IDE alias.
///
/// # Example
///
/// ```
/// use quarto_file_links::catalog::get_ide_format;
///
/// assert_eq!(get_ide_format("vscode"), Some("vscode://file/%f:%l"));
/// assert_eq!(get_ide_format("notepad"), None);
/// ```
pub fn get_ide_format(alias: &str) -> Option<&'static str> {
    IDE_LINK_FORMATS.get(alias).map(String::as_str)
}

/// All known IDE aliases, sorted.
pub fn ide_aliases() -> impl Iterator<Item = &'static str> {
    IDE_LINK_FORMATS.keys().map(String::as_str)
}
