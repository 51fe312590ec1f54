//! Data Transfer Objects for REST request/response serialization.
//!
//! Entity snapshots are served as the domain records themselves; this
//! module only holds request bodies, query parameters, and envelopes
//! that exist for the HTTP surface.

pub mod command_dto;
pub mod status_dto;

pub use command_dto::*;
pub use status_dto::*;
