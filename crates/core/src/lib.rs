//! Core engine for noticeboard records
//!
//! Schema registry, normalizers, constraint validation, weighted search
//! documents and the mutation pipeline that ties them together.

pub mod constants;
mod env_config;
mod error;
mod index;
mod normalize;
mod pipeline;
mod schema;
mod validate;

pub use env_config::*;
pub use error::*;
pub use index::*;
pub use normalize::*;
pub use pipeline::*;
pub use schema::*;
pub use validate::*;
