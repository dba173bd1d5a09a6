/*
 * settings.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Environment and debugger settings fallbacks.
 */

//! Fallback sources for the link format.
//!
//! When no explicit format is given, the IDE alias is read from the
//! environment. When that is empty too, the debugger's `file-link-format`
//! setting is consulted: first the runtime value, then the value from the
//! settings file.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Primary environment variable naming the IDE alias or link format.
pub const IDE_ENV_VAR: &str = "QUARTO_IDE";

/// Consulted only when [`IDE_ENV_VAR`] is unset.
pub const IDE_FALLBACK_ENV_VAR: &str = "QUARTO_EDITOR";

/// Runtime override for the debugger link format.
pub const FILE_LINK_FORMAT_ENV_VAR: &str = "QUARTO_FILE_LINK_FORMAT";

/// Errors that can occur while loading debugger settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Failed to read settings file {}: {source}", .path.display())]
    Read {
        /// Path of the settings file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has the wrong shape.
    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Read-only view of environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// IDE alias (or raw format) from the environment.
///
/// A variable that is set wins even when empty; the fallback variable is
/// only read when the primary one is unset. Returns `""` when neither is set.
pub fn ide_from_environment(env: &dyn Environment) -> String {
    env.var(IDE_ENV_VAR)
        .or_else(|| env.var(IDE_FALLBACK_ENV_VAR))
        .unwrap_or_default()
}

/// The debugger's `file-link-format` setting from its two sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebuggerSettings {
    /// Value in effect for this process (highest priority)
    pub runtime: Option<String>,
    /// Value from the settings file
    pub configured: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SettingsFile {
    #[serde(default)]
    debug: DebugTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DebugTable {
    file_link_format: Option<String>,
}

impl DebuggerSettings {
    /// Settings with the runtime value taken from [`FILE_LINK_FORMAT_ENV_VAR`].
    pub fn from_environment(env: &dyn Environment) -> Self {
        Self {
            runtime: env.var(FILE_LINK_FORMAT_ENV_VAR),
            configured: None,
        }
    }

    pub fn with_configured(mut self, value: impl Into<String>) -> Self {
        self.configured = Some(value.into());
        self
    }

    /// Parse a settings document and use its `[debug] file-link-format`
    /// entry as the configured value.
    ///
    /// ```
    /// use quarto_file_links::DebuggerSettings;
    ///
    /// let settings = DebuggerSettings::from_toml_str(
    ///     "[debug]\nfile-link-format = \"vscode://file/%f:%l\"\n",
    /// ).unwrap();
    /// assert_eq!(settings.file_link_format(), Some("vscode://file/%f:%l"));
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
        let file: SettingsFile = toml::from_str(source)?;
        Ok(Self {
            runtime: None,
            configured: file.debug.file_link_format,
        })
    }

    /// Load the configured value from a settings file, keeping `self.runtime`.
    pub fn load(self, path: &Path) -> Result<Self, SettingsError> {
        let source = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let loaded = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "Loaded debugger settings");
        Ok(Self {
            runtime: self.runtime,
            configured: loaded.configured,
        })
    }

    /// The first non-empty value, runtime before configured.
    pub fn file_link_format(&self) -> Option<&str> {
        [self.runtime.as_deref(), self.configured.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
    }
}
