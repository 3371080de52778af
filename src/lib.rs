#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Hierarchy Gateway
//!
//! > **A REST front door for a hierarchical object store.**
//!
//! Objects in the store are flat: one map of named objects per kind, found by
//! label. The gateway gives them back their shape. Kinds nest under parent
//! kinds, parents keep references to their children, and every object is
//! addressed by a URI whose path carries its ancestors' display names.
//! Kinds and URIs are not compiled in; they arrive at runtime as
//! notifications, and the route table follows.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Why a registry plus an actor store?
//!
//! - **Registry** ([`registry`]): shared, read-mostly metadata behind
//!   per-map locks. Requests only ever take short read locks and clone.
//! - **Store actor** ([`flat_store`]): one task owns every object and handles
//!   requests one at a time, so writes never race.
//!
//! Handlers sit between the two and never hold a registry lock across a store
//! call.
//!
//! ## 🚀 Core Concepts
//!
//! ### Hashed names
//! A display name is only unique among siblings. The stored name is a SHA-1
//! of the full ancestor chain plus the display name
//! ([`naming::hashed_name`]), so `l1` under `root=a` and `l1` under `root=b`
//! are different objects.
//!
//! ### Derived URIs
//! Declaring `GET` on a URI also serves `<uri>/status` and one
//! `<uri>/<field>` per child or link field ([`routes::expand_uris`]).
//!
//! ### Restarts
//! New URIs bind into the live route table immediately. A structural kind
//! change instead restarts the HTTP server: drain, rebuild routes, re-bind.
//! See [`lifecycle`].
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each layer has its own `thiserror` enum: [`flat_store::StoreError`],
//! [`handlers::HandlerError`] (which owns the HTTP status mapping) and
//! [`error::GatewayError`] for the process itself.
//!
//! ### 2. Concurrency Model
//! Three notification queues, one consumer task each ([`events`]). The
//! store actor processes sequentially; requests run concurrently on axum.
//!
//! ### 3. Observability
//! `tracing` everywhere with structured fields. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Kind, URI and config data types |
//! | [`registry`] | Live metadata maps |
//! | [`naming`] | Display names, labels, hashed names |
//! | [`routes`] | URI expansion and the dynamic route table |
//! | [`handlers`] | GET / LIST / PUT / PATCH / DELETE |
//! | [`server`] | axum adapter, CORS, docs and debug endpoints |
//! | [`openapi`] | Per-datamodel OpenAPI documents |
//! | [`events`] | Notification queues and their consumers |
//! | [`lifecycle`] | Startup, restart loop, shutdown, logging |
//! | [`config`] | CLI / environment configuration |
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run -- --bind-addr 127.0.0.1:5000 --schema-file seed.json
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test --workspace
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod lifecycle;
pub mod model;
pub mod naming;
pub mod openapi;
pub mod registry;
pub mod routes;
pub mod server;
