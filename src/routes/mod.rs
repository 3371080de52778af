//! # Route Table Builder
//!
//! Turns URI registrations into something a request path can be matched
//! against. [`expand_uris`] derives the status and link URIs from the declared
//! ones; [`RouteTable`] compiles path templates, binds one handler per method,
//! and resolves incoming `(verb, path)` pairs.

mod expand;
mod table;

pub use expand::expand_uris;
pub use table::{HandlerKind, Resolution, RouteMatch, RouteTable};
