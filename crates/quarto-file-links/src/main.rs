/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Command-line entry point for quarto-file-link.
 */

//! quarto-file-link - print a clickable link for a source location

use anyhow::{Context, Result, bail};
use clap::Parser;
use quarto_file_links::{
    DebuggerSettings, FileLinkFormatter, FormatInput, IDE_LINK_FORMATS, ProcessEnvironment,
    StaticRequestStack, terminal,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quarto-file-link")]
#[command(version)]
#[command(about = "Print a clickable link to a source location", long_about = None)]
struct Cli {
    /// Source file
    #[arg(required_unless_present = "list_ides")]
    file: Option<String>,

    /// Line number
    #[arg(required_unless_present = "list_ides")]
    line: Option<usize>,

    /// IDE alias or link format (defaults to $QUARTO_IDE)
    #[arg(short, long)]
    format: Option<String>,

    /// TOML settings file with a `[debug] file-link-format` entry
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Link to a server instead of an IDE (scheme and host, e.g. http://localhost:4200)
    #[arg(long, requires_all = ["base_dir", "url_template"], conflicts_with = "format")]
    host: Option<String>,

    /// Project directory stripped from file paths in server links
    #[arg(long)]
    base_dir: Option<String>,

    /// Server path and query template, e.g. "/_open?file=%f&line=%l"
    #[arg(long)]
    url_template: Option<String>,

    /// Print an OSC 8 terminal hyperlink instead of the bare link
    #[arg(long)]
    hyperlink: bool,

    /// List the known IDE aliases and exit
    #[arg(long)]
    list_ides: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries the link
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarto_file_links=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.list_ides {
        for (alias, template) in IDE_LINK_FORMATS.iter() {
            println!("{:<10} {}", alias, template);
        }
        return Ok(());
    }

    let (Some(file), Some(line)) = (cli.file.as_deref(), cli.line) else {
        bail!("FILE and LINE are required");
    };

    let mut debugger = DebuggerSettings::from_environment(&ProcessEnvironment);
    if let Some(path) = &cli.settings {
        debugger = debugger
            .load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    }

    let mut builder = FileLinkFormatter::builder().debugger_settings(debugger);
    if let Some(host) = cli.host {
        builder = builder
            .format(FormatInput::Unresolved)
            .request_stack(Arc::new(StaticRequestStack::new(host)));
        if let Some(base_dir) = cli.base_dir {
            builder = builder.base_dir(base_dir);
        }
        if let Some(url_template) = cli.url_template {
            builder = builder.url_template(url_template);
        }
    } else if let Some(format) = cli.format {
        builder = builder.format(format);
    }
    let formatter = builder.build();

    let Some(output) = render_link(&formatter, file, line, cli.hyperlink) else {
        bail!("No link format available for {}:{}", file, line);
    };
    println!("{}", output);
    Ok(())
}

/// The link for `file:line`, resolved once and optionally wrapped for the terminal.
fn render_link(
    formatter: &FileLinkFormatter,
    file: &str,
    line: usize,
    hyperlink: bool,
) -> Option<String> {
    let link = formatter.format(file, line)?;
    if hyperlink {
        Some(terminal::hyperlink(&link, &format!("{}:{}", file, line)))
    } else {
        Some(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarto_file_links::{RequestContext, RequestStack};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStack {
        lookups: AtomicUsize,
    }

    impl RequestStack for CountingStack {
        fn main_request(&self) -> Option<Arc<dyn RequestContext>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            StaticRequestStack::new("http://localhost:4200").main_request()
        }
    }

    fn server_formatter(stack: Arc<CountingStack>) -> FileLinkFormatter {
        FileLinkFormatter::builder()
            .format(FormatInput::Unresolved)
            .request_stack(stack)
            .base_dir("/project")
            .url_template("/_open?file=%f&line=%l")
            .build()
    }

    #[test]
    fn test_hyperlink_resolves_request_once() {
        let stack = Arc::new(CountingStack::default());
        let formatter = server_formatter(stack.clone());

        let output = render_link(&formatter, "/tmp/a.qmd", 3, true).unwrap();
        assert_eq!(
            output,
            terminal::hyperlink("http://localhost:4200/_open?file=/tmp/a.qmd&line=3", "/tmp/a.qmd:3")
        );
        assert_eq!(stack.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_plain_link() {
        let stack = Arc::new(CountingStack::default());
        let formatter = server_formatter(stack.clone());

        assert_eq!(
            render_link(&formatter, "/tmp/a.qmd", 3, false).as_deref(),
            Some("http://localhost:4200/_open?file=/tmp/a.qmd&line=3")
        );
        assert_eq!(stack.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_link_available() {
        let formatter = FileLinkFormatter::builder()
            .format(FormatInput::Unresolved)
            .build();
        assert_eq!(render_link(&formatter, "/tmp/a.qmd", 3, true), None);
    }
}
