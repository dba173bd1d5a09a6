/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Request-based link format resolution.
 */

//! Inputs for resolving a link format from the current request.
//!
//! When a server renders an error page, source links can point back at the
//! server itself (e.g. an endpoint that opens the file in the browser). The
//! link base then depends on the request being served, so it can only be
//! resolved while a request is live.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The request currently being served.
pub trait RequestContext: Send + Sync {
    /// Scheme and authority, e.g. `https://localhost:4200`.
    fn scheme_and_host(&self) -> String;
}

/// Access to the main (outermost) request, if one is in flight.
pub trait RequestStack: Send + Sync {
    fn main_request(&self) -> Option<Arc<dyn RequestContext>>;
}

/// A request stack that always reports the same host.
///
/// Useful for hosts without per-request state, such as a preview server
/// with a fixed address or a command-line tool.
#[derive(Debug, Clone)]
pub struct StaticRequestStack {
    request: Arc<StaticRequest>,
}

#[derive(Debug)]
struct StaticRequest {
    scheme_and_host: String,
}

impl RequestContext for StaticRequest {
    fn scheme_and_host(&self) -> String {
        self.scheme_and_host.clone()
    }
}

impl StaticRequestStack {
    pub fn new(scheme_and_host: impl Into<String>) -> Self {
        Self {
            request: Arc::new(StaticRequest {
                scheme_and_host: scheme_and_host.into(),
            }),
        }
    }
}

impl RequestStack for StaticRequestStack {
    fn main_request(&self) -> Option<Arc<dyn RequestContext>> {
        let request: Arc<dyn RequestContext> = self.request.clone();
        Some(request)
    }
}

/// Errors reported by a [`UrlGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Route '{0}' does not exist")]
    NotFound(String),

    #[error("Missing parameters for route '{route}': {}", .missing.join(", "))]
    MissingParameters {
        route: String,
        missing: Vec<String>,
    },

    #[error("Invalid value for parameter '{parameter}' of route '{route}'")]
    InvalidParameter { route: String, parameter: String },

    #[error("Route generation failed: {0}")]
    Other(String),
}

/// Generates URLs for named routes.
pub trait UrlGenerator: Send + Sync {
    fn generate(&self, route_name: &str, params: &[(&str, &str)]) -> Result<String, RouteError>;
}

/// Build a URL template from a named route plus a query string.
///
/// Link formatting is a best-effort debug aid, so a failing router yields
/// `None` instead of an error.
///
/// # Example
///
/// ```
/// use quarto_file_links::{generate_url_format, RouteError, UrlGenerator};
///
/// struct Router;
///
/// impl UrlGenerator for Router {
///     fn generate(&self, route: &str, _params: &[(&str, &str)]) -> Result<String, RouteError> {
///         match route {
///             "open_file" => Ok("/_open".to_string()),
///             other => Err(RouteError::NotFound(other.to_string())),
///         }
///     }
/// }
///
/// assert_eq!(
///     generate_url_format(&Router, "open_file", "?file=%f&line=%l").as_deref(),
///     Some("/_open?file=%f&line=%l")
/// );
/// assert_eq!(generate_url_format(&Router, "missing", "?file=%f"), None);
/// ```
pub fn generate_url_format(
    router: &dyn UrlGenerator,
    route_name: &str,
    query_string: &str,
) -> Option<String> {
    match router.generate(route_name, &[]) {
        Ok(path) => Some(format!("{}{}", path, query_string)),
        Err(error) => {
            tracing::warn!(route = route_name, %error, "Could not generate file link URL");
            None
        }
    }
}

type Producer = Box<dyn Fn() -> Option<String> + Send + Sync>;

/// A URL template computed on first use.
///
/// The producer runs at most once for the lifetime of the value, and its
/// outcome is kept even when it is `None`.
pub struct DeferredTemplate {
    producer: Producer,
    value: OnceCell<Option<String>>,
}

impl DeferredTemplate {
    pub fn new(producer: impl Fn() -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            producer: Box::new(producer),
            value: OnceCell::new(),
        }
    }

    /// The produced template, running the producer if it has not run yet.
    pub fn get(&self) -> Option<&str> {
        self.value
            .get_or_init(|| {
                tracing::debug!("Producing deferred file link URL template");
                (self.producer)()
            })
            .as_deref()
    }

    /// Whether the producer has already run.
    pub fn is_consumed(&self) -> bool {
        self.value.get().is_some()
    }
}

impl fmt::Debug for DeferredTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredTemplate")
            .field("value", &self.value.get())
            .finish_non_exhaustive()
    }
}

/// URL template appended to the request's scheme and host.
#[derive(Debug)]
pub enum UrlTemplate {
    Fixed(String),
    Deferred(DeferredTemplate),
}

impl UrlTemplate {
    pub fn deferred(producer: impl Fn() -> Option<String> + Send + Sync + 'static) -> Self {
        UrlTemplate::Deferred(DeferredTemplate::new(producer))
    }

    /// A template generated from a named route the first time it is needed.
    pub fn from_route(
        router: Arc<dyn UrlGenerator>,
        route_name: impl Into<String>,
        query_string: impl Into<String>,
    ) -> Self {
        let route_name = route_name.into();
        let query_string = query_string.into();
        Self::deferred(move || generate_url_format(router.as_ref(), &route_name, &query_string))
    }

    /// The template text, or `None` if it is unavailable or empty.
    pub fn get(&self) -> Option<&str> {
        let template = match self {
            UrlTemplate::Fixed(template) => Some(template.as_str()),
            UrlTemplate::Deferred(deferred) => deferred.get(),
        };
        template.filter(|t| !t.is_empty())
    }
}

impl From<String> for UrlTemplate {
    fn from(template: String) -> Self {
        UrlTemplate::Fixed(template)
    }
}

impl From<&str> for UrlTemplate {
    fn from(template: &str) -> Self {
        UrlTemplate::Fixed(template.to_string())
    }
}
