/*
 * formatter.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * File link formatter and its builder.
 */

//! The file link formatter.
//!
//! [`FileLinkFormatter`] turns a `(file, line)` pair into a clickable link.
//! Its format is decided once, at construction, from the first source that
//! yields a value:
//!
//! 1. the explicit format given to the builder, or the `QUARTO_IDE` /
//!    `QUARTO_EDITOR` environment variables;
//! 2. the IDE alias table, if that value is a known alias;
//! 3. the debugger `file-link-format` setting;
//! 4. `file://%f#L%l`.
//!
//! A formatter built with [`FormatInput::Unresolved`] instead resolves its
//! format from the current request on every call, until [`snapshot`] pins
//! the result down.
//!
//! [`snapshot`]: FileLinkFormatter::snapshot

use crate::catalog;
use crate::link_format::LinkFormat;
use crate::resolver::{RequestStack, UrlTemplate};
use crate::settings::{DebuggerSettings, Environment, ProcessEnvironment, ide_from_environment};
use crate::terminal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::MAIN_SEPARATOR;
use std::sync::Arc;

/// Used when no other source provides a link format.
pub const DEFAULT_FILE_LINK_FORMAT: &str = "file://%f#L%l";

/// The statically supplied link format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatInput {
    /// An IDE alias or a raw link format string.
    Text(String),
    /// An already parsed format, used as is.
    Structured(LinkFormat),
    /// No static format; rely on request-based resolution only.
    Unresolved,
}

impl From<&str> for FormatInput {
    fn from(text: &str) -> Self {
        FormatInput::Text(text.to_string())
    }
}

impl From<String> for FormatInput {
    fn from(text: String) -> Self {
        FormatInput::Text(text)
    }
}

impl From<LinkFormat> for FormatInput {
    fn from(format: LinkFormat) -> Self {
        FormatInput::Structured(format)
    }
}

/// Builder for [`FileLinkFormatter`].
#[derive(Default)]
pub struct FileLinkFormatterBuilder {
    format: Option<FormatInput>,
    environment: Option<Box<dyn Environment>>,
    debugger: Option<DebuggerSettings>,
    ide_formats: Option<BTreeMap<String, String>>,
    request_stack: Option<Arc<dyn RequestStack>>,
    base_dir: Option<String>,
    url_template: Option<UrlTemplate>,
}

impl FileLinkFormatterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit format. When unset, the format comes from the environment.
    pub fn format(mut self, format: impl Into<FormatInput>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Environment used for fallback lookups (defaults to the process).
    pub fn environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Some(Box::new(environment));
        self
    }

    /// Debugger settings. Defaults to [`DebuggerSettings::from_environment`].
    pub fn debugger_settings(mut self, settings: DebuggerSettings) -> Self {
        self.debugger = Some(settings);
        self
    }

    /// Replace the built-in IDE alias table.
    pub fn ide_formats(mut self, formats: BTreeMap<String, String>) -> Self {
        self.ide_formats = Some(formats);
        self
    }

    pub fn request_stack(mut self, stack: Arc<dyn RequestStack>) -> Self {
        self.request_stack = Some(stack);
        self
    }

    /// Directory stripped from file paths in request-based links.
    pub fn base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn url_template(mut self, template: impl Into<UrlTemplate>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    pub fn build(self) -> FileLinkFormatter {
        let environment = self
            .environment
            .unwrap_or_else(|| Box::new(ProcessEnvironment) as Box<dyn Environment>);

        let input = self
            .format
            .unwrap_or_else(|| FormatInput::Text(ide_from_environment(environment.as_ref())));

        let format = match input {
            FormatInput::Structured(format) => Some(format),
            FormatInput::Unresolved => None,
            FormatInput::Text(key) => {
                let debugger = self
                    .debugger
                    .unwrap_or_else(|| DebuggerSettings::from_environment(environment.as_ref()));
                Some(resolve_text_format(&key, self.ide_formats.as_ref(), &debugger))
            }
        };

        FileLinkFormatter {
            format,
            frozen: false,
            request_stack: self.request_stack,
            base_dir: self.base_dir,
            url_template: self.url_template,
        }
    }
}

fn resolve_text_format(
    key: &str,
    ide_formats: Option<&BTreeMap<String, String>>,
    debugger: &DebuggerSettings,
) -> LinkFormat {
    let alias = match ide_formats {
        Some(formats) => formats.get(key).map(String::as_str),
        None => catalog::get_ide_format(key),
    };

    let (raw, source) = match alias.unwrap_or(key) {
        "" => match debugger.file_link_format() {
            Some(configured) => (configured, "debugger settings"),
            None => (DEFAULT_FILE_LINK_FORMAT, "default"),
        },
        raw if alias.is_some() => (raw, "IDE alias"),
        raw => (raw, "explicit"),
    };

    tracing::debug!(source, format = raw, "Resolved file link format");
    LinkFormat::parse(raw)
}

/// Formats source locations as clickable links.
pub struct FileLinkFormatter {
    format: Option<LinkFormat>,
    frozen: bool,
    request_stack: Option<Arc<dyn RequestStack>>,
    base_dir: Option<String>,
    url_template: Option<UrlTemplate>,
}

impl FileLinkFormatter {
    pub fn builder() -> FileLinkFormatterBuilder {
        FileLinkFormatterBuilder::new()
    }

    /// Formatter for an explicit format, with environment fallbacks.
    pub fn with_format(format: impl Into<FormatInput>) -> Self {
        Self::builder().format(format).build()
    }

    /// Link for `file` at `line`, or `None` when no link format is available.
    ///
    /// # Example
    ///
    /// ```
    /// use quarto_file_links::FileLinkFormatter;
    ///
    /// let formatter = FileLinkFormatter::with_format("vscode");
    /// assert_eq!(
    ///     formatter.format("/home/me/doc.qmd", 12).as_deref(),
    ///     Some("vscode://file//home/me/doc.qmd:12")
    /// );
    /// ```
    pub fn format(&self, file: &str, line: usize) -> Option<String> {
        self.link_format().map(|format| format.render(file, line))
    }

    /// Render `file:line`, as an OSC 8 terminal hyperlink when a link is available.
    pub fn hyperlink(&self, file: &str, line: usize) -> String {
        let text = format!("{}:{}", file, line);
        match self.format(file, line) {
            Some(url) => terminal::hyperlink(&url, &text),
            None => text,
        }
    }

    /// The link format in effect right now.
    ///
    /// Request-based formats are resolved on each call and are not cached.
    pub fn link_format(&self) -> Option<Cow<'_, LinkFormat>> {
        if let Some(format) = &self.format {
            return Some(Cow::Borrowed(format));
        }
        if self.frozen {
            return None;
        }
        self.resolve_dynamic().map(Cow::Owned)
    }

    /// Whether [`snapshot`](Self::snapshot) has pinned the format.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Resolve the format now and keep the outcome for good.
    ///
    /// Afterwards the formatter never consults the request stack again, and
    /// the returned snapshot can be persisted and turned back into an
    /// equivalent formatter.
    pub fn snapshot(&mut self) -> FormatterSnapshot {
        if !self.frozen {
            self.format = self.link_format().map(Cow::into_owned);
            self.frozen = true;
        }
        FormatterSnapshot {
            file_link_format: self.format.clone(),
        }
    }

    fn resolve_dynamic(&self) -> Option<LinkFormat> {
        let stack = self.request_stack.as_ref()?;
        let base_dir = self.base_dir.as_deref().filter(|dir| !dir.is_empty())?;
        let url_template = self.url_template.as_ref()?;

        let Some(request) = stack.main_request() else {
            tracing::debug!("No main request; file links are unavailable");
            return None;
        };
        let url_template = url_template.get()?;

        let template = format!("{}{}", request.scheme_and_host(), url_template);
        Some(LinkFormat::new(template).with_rewrite(format!("{}{}", base_dir, MAIN_SEPARATOR), ""))
    }
}

impl Default for FileLinkFormatter {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for FileLinkFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLinkFormatter")
            .field("format", &self.format)
            .field("frozen", &self.frozen)
            .field("has_request_stack", &self.request_stack.is_some())
            .field("base_dir", &self.base_dir)
            .field("url_template", &self.url_template)
            .finish()
    }
}

/// The persisted form of a [`FileLinkFormatter`].
///
/// `file_link_format` serializes as the flat format array, or as `false`
/// when no format could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterSnapshot {
    #[serde(with = "format_or_false")]
    pub file_link_format: Option<LinkFormat>,
}

impl From<FormatterSnapshot> for FileLinkFormatter {
    fn from(snapshot: FormatterSnapshot) -> Self {
        FileLinkFormatter {
            format: snapshot.file_link_format,
            frozen: true,
            request_stack: None,
            base_dir: None,
            url_template: None,
        }
    }
}

mod format_or_false {
    use crate::link_format::LinkFormat;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Format(LinkFormat),
        Flag(bool),
    }

    pub fn serialize<S: Serializer>(value: &Option<LinkFormat>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(format) => format.serialize(serializer),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<LinkFormat>, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Format(format) => Ok(Some(format)),
            Repr::Flag(false) => Ok(None),
            Repr::Flag(true) => Err(D::Error::custom("expected a link format array or `false`")),
        }
    }
}
