/*
 * formatter_integration.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end tests for file link formatting.
 */

use quarto_file_links::{
    DebuggerSettings, FileLinkFormatter, FileLinkFormatterBuilder, FormatInput, FormatterSnapshot,
    LinkFormat, RequestContext, RequestStack, RouteError, StaticRequestStack, UrlGenerator,
    UrlTemplate,
};
use std::collections::HashMap;
use std::path::MAIN_SEPARATOR;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Builder that ignores the process environment
fn builder() -> FileLinkFormatterBuilder {
    FileLinkFormatter::builder()
        .environment(HashMap::<String, String>::new())
        .debugger_settings(DebuggerSettings::default())
}

/// Join path components with the platform separator
fn native_path(parts: &[&str]) -> String {
    parts.join(&MAIN_SEPARATOR.to_string())
}

struct CountingRouter {
    calls: AtomicUsize,
}

impl UrlGenerator for CountingRouter {
    fn generate(&self, route_name: &str, _params: &[(&str, &str)]) -> Result<String, RouteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match route_name {
            "_open_file" => Ok("/_quarto/open".to_string()),
            other => Err(RouteError::NotFound(other.to_string())),
        }
    }
}

/// A request stack whose main request can be switched on and off
#[derive(Default)]
struct SwitchableStack {
    host: Mutex<Option<String>>,
    lookups: AtomicUsize,
}

struct HostRequest(String);

impl RequestContext for HostRequest {
    fn scheme_and_host(&self) -> String {
        self.0.clone()
    }
}

impl RequestStack for SwitchableStack {
    fn main_request(&self) -> Option<Arc<dyn RequestContext>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let host = self.host.lock().unwrap().clone()?;
        Some(Arc::new(HostRequest(host)))
    }
}

#[test]
fn test_template_substitution() {
    let formatter = builder().format("editor://open?path=%f&line=%l").build();
    insta::assert_snapshot!(
        formatter.format("/home/me/report.qmd", 128).unwrap(),
        @"editor://open?path=/home/me/report.qmd&line=128"
    );
}

#[test]
fn test_container_path_rewrite() {
    let formatter = builder()
        .format("file://%f#L%l&/var/www/>/home/user/>")
        .build();
    insta::assert_snapshot!(
        formatter.format("/var/www/app/index.php", 31).unwrap(),
        @"file:///home/user/app/index.php#L31"
    );
}

#[test]
fn test_rewrite_skipped_when_prefix_differs() {
    let formatter = builder().format("file://%f#L%l&/var/www/>/home/user/").build();
    assert_eq!(
        formatter.format("/opt/app/index.php", 1).as_deref(),
        Some("file:///opt/app/index.php#L1")
    );
}

#[test]
fn test_unknown_alias_is_a_literal_template() {
    let known = builder().format("emacs").build();
    assert_eq!(
        known.format("/a.el", 4).as_deref(),
        Some("emacs://open?url=file:///a.el&line=4")
    );

    let unknown = builder().format("my-editor:%f").build();
    assert_eq!(unknown.format("/a.el", 4).as_deref(), Some("my-editor:/a.el"));
}

#[test]
fn test_format_is_idempotent() {
    let formatter = builder().format("vscode").build();
    let first = formatter.format("/x/y.rs", 10);
    let second = formatter.format("/x/y.rs", 10);
    assert_eq!(first, second);
}

#[test]
fn test_no_format_and_no_resolver() {
    let formatter = builder().format(FormatInput::Unresolved).build();
    for line in [0, 1, 99] {
        assert_eq!(formatter.format("/any/file.rs", line), None);
    }
}

#[test]
fn test_request_based_links() {
    let formatter = builder()
        .format(FormatInput::Unresolved)
        .request_stack(Arc::new(StaticRequestStack::new("https://ide.local")))
        .base_dir(native_path(&["", "srv", "app"]))
        .url_template("/trace?file=%f&line=%l")
        .build();

    let file = native_path(&["", "srv", "app", "src", "Foo.php"]);
    let expected = format!(
        "https://ide.local/trace?file={}&line=12",
        native_path(&["src", "Foo.php"])
    );
    assert_eq!(formatter.format(&file, 12), Some(expected));
}

#[test]
fn test_routed_template_generated_once() {
    let router = Arc::new(CountingRouter {
        calls: AtomicUsize::new(0),
    });
    let stack = Arc::new(SwitchableStack::default());
    let formatter = builder()
        .format(FormatInput::Unresolved)
        .request_stack(stack.clone())
        .base_dir("/project")
        .url_template(UrlTemplate::from_route(
            router.clone(),
            "_open_file",
            "?file=%f&line=%l",
        ))
        .build();

    // No request yet: the router is not consulted
    assert_eq!(formatter.format("/project/a.qmd", 1), None);
    assert_eq!(router.calls.load(Ordering::SeqCst), 0);

    *stack.host.lock().unwrap() = Some("http://localhost:4200".to_string());
    for _ in 0..3 {
        assert_eq!(
            formatter.format("/elsewhere/a.qmd", 1).as_deref(),
            Some("http://localhost:4200/_quarto/open?file=/elsewhere/a.qmd&line=1")
        );
    }
    assert_eq!(router.calls.load(Ordering::SeqCst), 1);
    assert_eq!(stack.lookups.load(Ordering::SeqCst), 4);
}

#[test]
fn test_failed_route_is_never_retried() {
    let router = Arc::new(CountingRouter {
        calls: AtomicUsize::new(0),
    });
    let formatter = builder()
        .format(FormatInput::Unresolved)
        .request_stack(Arc::new(StaticRequestStack::new("http://h")))
        .base_dir("/project")
        .url_template(UrlTemplate::from_route(router.clone(), "no_such_route", ""))
        .build();

    assert_eq!(formatter.format("/project/a.qmd", 1), None);
    assert_eq!(formatter.format("/project/a.qmd", 1), None);
    assert_eq!(router.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_snapshot_detaches_from_requests() {
    let stack = Arc::new(SwitchableStack::default());
    *stack.host.lock().unwrap() = Some("http://preview:8080".to_string());

    let mut formatter = builder()
        .format(FormatInput::Unresolved)
        .request_stack(stack.clone())
        .base_dir("/project")
        .url_template("/open?f=%f")
        .build();

    let snapshot = formatter.snapshot();
    *stack.host.lock().unwrap() = None;

    assert_eq!(
        formatter.format("/tmp/x.qmd", 1).as_deref(),
        Some("http://preview:8080/open?f=/tmp/x.qmd")
    );
    assert_eq!(stack.lookups.load(Ordering::SeqCst), 1);

    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: FileLinkFormatter = serde_json::from_str::<FormatterSnapshot>(&json)
        .unwrap()
        .into();
    assert!(restored.is_frozen());
    assert_eq!(
        restored.format("/tmp/x.qmd", 1),
        formatter.format("/tmp/x.qmd", 1)
    );
}

#[test]
fn test_structured_format_from_parts() {
    let parts = vec![
        "idea://open?file=%f&line=%l".to_string(),
        "/build/".to_string(),
        "/src/".to_string(),
    ];
    let formatter = builder()
        .format(LinkFormat::from_parts(parts).unwrap())
        .build();
    insta::assert_snapshot!(
        formatter.format("/build/main.rs", 2).unwrap(),
        @"idea://open?file=/src/main.rs&line=2"
    );
}

#[test]
fn test_settings_file_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quarto-debug.toml");
    std::fs::write(
        &path,
        "[debug]\nfile-link-format = \"zed://file/%f:%l&/ci/>/home/dev/\"\n",
    )
    .unwrap();

    let settings = DebuggerSettings::default().load(&path).unwrap();
    let formatter = FileLinkFormatter::builder()
        .environment(HashMap::<String, String>::new())
        .debugger_settings(settings)
        .build();

    assert_eq!(
        formatter.format("/ci/lib.rs", 8).as_deref(),
        Some("zed://file//home/dev/lib.rs:8")
    );
}
