//! The dynamic route table.

use crate::model::{RestMethod, UriKind, UriRegistration};
use crate::registry::Registry;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Which CRUD handler serves a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    List,
    Get,
    Put,
    Patch,
    Delete,
}

impl HandlerKind {
    /// Picks the handler for a declared method on a URI of the given kind.
    /// Link URIs are read-only; anything but `GET` on them has no handler.
    pub fn select(method: RestMethod, uri_kind: &UriKind) -> Option<Self> {
        let read_only = matches!(uri_kind, UriKind::SingleLink { .. } | UriKind::NamedLink { .. });
        match method {
            RestMethod::Get => Some(HandlerKind::Get),
            _ if read_only => None,
            RestMethod::List => Some(HandlerKind::List),
            RestMethod::Put => Some(HandlerKind::Put),
            RestMethod::Patch => Some(HandlerKind::Patch),
            RestMethod::Delete => Some(HandlerKind::Delete),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

fn compile(path: &str) -> Vec<Segment> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(s.to_string()),
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    method: RestMethod,
    handler: HandlerKind,
}

#[derive(Debug, Clone)]
struct Route {
    segments: Vec<Segment>,
    /// Canonical URI the registry knows this path by. Differs from the
    /// route's own path for short aliases.
    uri: String,
    /// HTTP verb → binding.
    bindings: BTreeMap<&'static str, Binding>,
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub uri: String,
    pub method: RestMethod,
    pub handler: HandlerKind,
    pub path_params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched(RouteMatch),
    /// Some route matches the path, none binds the verb.
    MethodNotAllowed,
    NotFound,
}

/// Path templates and their bound handlers.
///
/// Registration is append-only and idempotent: binding an existing
/// `(verb, path)` again overwrites it. Removing a URI from the registry does
/// not remove its route; dispatch notices the missing URI info instead.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from every registration currently in the registry.
    pub fn rebuild(registry: &Registry) -> Self {
        let mut table = Self::new();
        for reg in registry.registrations() {
            table.register(&reg);
        }
        debug!(routes = table.len(), "Route table rebuilt");
        table
    }

    /// Binds every declared method of `reg` under its URI and, if present,
    /// its short alias.
    pub fn register(&mut self, reg: &UriRegistration) {
        let paths = std::iter::once(reg.uri.as_str()).chain(reg.short_uri.as_deref());
        for path in paths {
            let route = self
                .routes
                .entry(path.to_string())
                .or_insert_with(|| Route {
                    segments: compile(path),
                    uri: reg.uri.clone(),
                    bindings: BTreeMap::new(),
                });
            route.uri = reg.uri.clone();
            for method in reg.methods.keys() {
                match HandlerKind::select(*method, &reg.kind) {
                    Some(handler) => {
                        route.bindings.insert(
                            method.http_verb(),
                            Binding {
                                method: *method,
                                handler,
                            },
                        );
                    }
                    None => warn!(uri = %reg.uri, method = method.as_str(), "No handler for method on link URI"),
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Finds the binding for `verb` on `path`.
    ///
    /// Among matching routes the one with a literal segment at the earliest
    /// position where they differ wins, so `/leader/status` beats
    /// `/leader/{orgchart.Leader}`.
    pub fn resolve(&self, verb: &str, path: &str) -> Resolution {
        let parts: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).map(|c| c.into_owned()).unwrap_or_else(|_| s.to_string()))
            .collect();

        let mut path_matched = false;
        let mut best: Option<(Vec<bool>, &Route, Binding)> = None;
        for route in self.routes.values() {
            let Some(specificity) = match_segments(&route.segments, &parts) else {
                continue;
            };
            path_matched = true;
            let Some(binding) = route.bindings.get(verb) else {
                continue;
            };
            let better = match &best {
                Some((current, _, _)) => specificity > *current,
                None => true,
            };
            if better {
                best = Some((specificity, route, *binding));
            }
        }

        match best {
            Some((_, route, binding)) => {
                let path_params = route
                    .segments
                    .iter()
                    .zip(parts)
                    .filter_map(|(seg, value)| match seg {
                        Segment::Param(name) => Some((name.clone(), value)),
                        Segment::Literal(_) => None,
                    })
                    .collect();
                Resolution::Matched(RouteMatch {
                    uri: route.uri.clone(),
                    method: binding.method,
                    handler: binding.handler,
                    path_params,
                })
            }
            None if path_matched => Resolution::MethodNotAllowed,
            None => Resolution::NotFound,
        }
    }
}

/// `Some(literal-flags)` when `parts` fits `segments`.
fn match_segments(segments: &[Segment], parts: &[String]) -> Option<Vec<bool>> {
    if segments.len() != parts.len() {
        return None;
    }
    segments
        .iter()
        .zip(parts)
        .map(|(seg, part)| match seg {
            Segment::Literal(lit) if lit == part => Some(true),
            Segment::Literal(_) => None,
            Segment::Param(_) => Some(false),
        })
        .collect()
}
