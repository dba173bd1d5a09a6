/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Clickable source links for Quarto debug and error output.
 */

//! Clickable source links for Quarto debug and error output.
//!
//! Diagnostics point at a file and a line. This crate turns that location
//! into a link the user can click to open the file in an editor, either as
//! an IDE URI (`vscode://file/...`) or as an HTTP URL served by a preview
//! server.
//!
//! # Link formats
//!
//! A link format is a template with `%f` and `%l` placeholders, optionally
//! followed by path rewrites that map one directory onto another (for
//! example a container path onto the host checkout):
//!
//! ```text
//! vscode://file/%f:%l&/workspace/>/home/me/project/
//! ```
//!
//! Short IDE aliases such as `vscode`, `phpstorm` or `emacs` expand to the
//! templates in the built-in [`catalog`].
//!
//! # Example
//!
//! ```
//! use quarto_file_links::FileLinkFormatter;
//!
//! let formatter = FileLinkFormatter::with_format("file://%f#L%l&/var/www/>/home/user/");
//! assert_eq!(
//!     formatter.format("/var/www/app/index.qmd", 7).as_deref(),
//!     Some("file:///home/user/app/index.qmd#L7")
//! );
//! ```
//!
//! # Request-based links
//!
//! With no static format, links can be built from the request a server is
//! currently handling; see [`FileLinkFormatterBuilder::request_stack`] and
//! [`UrlTemplate`].

pub mod catalog;
pub mod formatter;
pub mod link_format;
pub mod resolver;
pub mod settings;
pub mod terminal;

pub use catalog::{IDE_LINK_FORMATS, get_ide_format, ide_aliases};
pub use formatter::{
    DEFAULT_FILE_LINK_FORMAT, FileLinkFormatter, FileLinkFormatterBuilder, FormatInput,
    FormatterSnapshot,
};
pub use link_format::{LinkFormat, LinkFormatError, PathRewrite};
pub use resolver::{
    DeferredTemplate, RequestContext, RequestStack, RouteError, StaticRequestStack, UrlGenerator,
    UrlTemplate, generate_url_format,
};
pub use settings::{
    DebuggerSettings, Environment, ProcessEnvironment, SettingsError, ide_from_environment,
};
