//! Plain data describing the hierarchy: kinds, URIs, schemas, and the
//! side configuration (datamodel titles, CORS, tenants) that arrives on the
//! notification stream.

pub mod config;
pub mod kind;
pub mod schema;
pub mod uri;

pub use config::*;
pub use kind::*;
pub use schema::*;
pub use uri::*;
