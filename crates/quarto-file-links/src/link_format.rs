/*
 * link_format.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Link format templates and path rewrite rules.
 */

//! Link format templates and path rewrite rules.
//!
//! A link format is a template containing `%f` (file path) and `%l` (line
//! number) placeholders, plus an ordered list of path rewrites. The textual
//! form packs both into a single string:
//!
//! ```text
//! vscode://file/%f:%l&/app/>/home/me/project/&/vendor/>/home/me/vendor/
//! ```
//!
//! Everything up to the first `&` that follows the last placeholder is the
//! template. The rest is a sequence of `&prefix>replacement` rules.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// Errors produced when building a [`LinkFormat`] from its flat form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkFormatError {
    /// The flat sequence had no template.
    #[error("Link format is empty")]
    Empty,

    /// A path prefix was not followed by its replacement.
    #[error("Path prefix {prefix:?} has no replacement")]
    MissingReplacement {
        /// The dangling prefix
        prefix: String,
    },
}

/// A single prefix substitution applied to file paths before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    /// Literal prefix matched against the start of the file path
    pub prefix: String,
    /// Text that replaces the matched prefix
    pub replacement: String,
}

/// A resolved link format: a template plus its path rewrites.
///
/// Serializes as the flat sequence `[template, prefix_1, replacement_1, ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LinkFormat {
    template: String,
    rewrites: Vec<PathRewrite>,
}

impl LinkFormat {
    /// Create a format with no path rewrites.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            rewrites: Vec::new(),
        }
    }

    /// Append a path rewrite. Rewrites are tried in insertion order.
    pub fn with_rewrite(mut self, prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.rewrites.push(PathRewrite {
            prefix: prefix.into(),
            replacement: replacement.into(),
        });
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn rewrites(&self) -> &[PathRewrite] {
        &self.rewrites
    }

    /// Parse the textual form of a link format.
    ///
    /// Parsing never fails: text without a rewrite suffix is taken as the
    /// template verbatim.
    ///
    /// # Example
    ///
    /// ```
    /// use quarto_file_links::LinkFormat;
    ///
    /// let format = LinkFormat::parse("file://%f#L%l&/var/www/>/home/user/");
    /// assert_eq!(format.template(), "file://%f#L%l");
    /// assert_eq!(format.rewrites()[0].prefix, "/var/www/");
    /// assert_eq!(format.rewrites()[0].replacement, "/home/user/");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let Some(boundary) = template_boundary(raw) else {
            return Self::new(raw);
        };

        let mut pieces = split_rewrite_rules(&raw[boundary..]);
        // Text before the first rule is never part of a pair
        pieces.remove(0);

        let mut format = Self::new(&raw[..boundary]);
        let mut pieces = pieces.into_iter();
        while let (Some(prefix), Some(replacement)) = (pieces.next(), pieces.next()) {
            // A closing '>' after the replacement is optional
            let replacement = replacement.strip_suffix('>').unwrap_or(&replacement).to_string();
            format = format.with_rewrite(prefix, replacement);
        }
        format
    }

    /// Build a format from the flat `[template, prefix, replacement, ...]` form.
    pub fn from_parts(parts: Vec<String>) -> Result<Self, LinkFormatError> {
        let mut parts = parts.into_iter();
        let template = parts.next().ok_or(LinkFormatError::Empty)?;

        let mut format = Self::new(template);
        while let Some(prefix) = parts.next() {
            match parts.next() {
                Some(replacement) => format = format.with_rewrite(prefix, replacement),
                None => return Err(LinkFormatError::MissingReplacement { prefix }),
            }
        }
        Ok(format)
    }

    /// The flat `[template, prefix, replacement, ...]` form.
    pub fn to_parts(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(1 + self.rewrites.len() * 2);
        parts.push(self.template.clone());
        for rewrite in &self.rewrites {
            parts.push(rewrite.prefix.clone());
            parts.push(rewrite.replacement.clone());
        }
        parts
    }

    /// Apply the first matching path rewrite to `file`.
    ///
    /// At most one rewrite is applied. An empty prefix matches every path.
    pub fn rewrite_path<'a>(&self, file: &'a str) -> Cow<'a, str> {
        for rewrite in &self.rewrites {
            if let Some(rest) = file.strip_prefix(rewrite.prefix.as_str()) {
                return Cow::Owned(format!("{}{}", rewrite.replacement, rest));
            }
        }
        Cow::Borrowed(file)
    }

    /// Render a link for `file` at `line`.
    ///
    /// Placeholders are replaced in a single left-to-right pass, so `%f` or
    /// `%l` appearing inside the substituted path are left alone.
    pub fn render(&self, file: &str, line: usize) -> String {
        let file = self.rewrite_path(file);
        let line = line.to_string();

        let mut out = String::with_capacity(self.template.len() + file.len() + line.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('%') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            match after.as_bytes().first() {
                Some(b'f') => {
                    out.push_str(&file);
                    rest = &after[1..];
                }
                Some(b'l') => {
                    out.push_str(&line);
                    rest = &after[1..];
                }
                _ => {
                    out.push('%');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl TryFrom<Vec<String>> for LinkFormat {
    type Error = LinkFormatError;

    fn try_from(parts: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_parts(parts)
    }
}

impl From<LinkFormat> for Vec<String> {
    fn from(format: LinkFormat) -> Self {
        format.to_parts()
    }
}

/// Byte offset where the template ends and the rewrite rules begin.
///
/// This is the first `&` at or after the last `%f`/`%l`. A boundary at
/// offset zero means there is no template, so the whole string is kept.
fn template_boundary(raw: &str) -> Option<usize> {
    let last_placeholder = [raw.rfind("%f"), raw.rfind("%l")]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0);

    match raw[last_placeholder..].find('&') {
        Some(offset) if last_placeholder + offset > 0 => Some(last_placeholder + offset),
        _ => None,
    }
}

/// Split rewrite rules on `&prefix>`, keeping the captured prefixes.
///
/// Returns alternating literal and prefix pieces, always starting and
/// ending with a literal piece (possibly empty). A prefix is one or more
/// characters other than `>` and may itself contain `&`.
fn split_rewrite_rules(rules: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(amp) = rules[cursor..].find('&').map(|i| cursor + i) {
        match rules[amp + 1..].find('>') {
            // "&>" has an empty prefix, try the next '&'
            Some(0) => cursor = amp + 1,
            Some(len) => {
                pieces.push(rules[literal_start..amp].to_string());
                pieces.push(rules[amp + 1..amp + 1 + len].to_string());
                literal_start = amp + 1 + len + 1;
                cursor = literal_start;
            }
            None => break,
        }
    }

    pieces.push(rules[literal_start..].to_string());
    pieces
}
