//! Election operations, independent of the HTTP surface.
//!
//! Everything here talks to persistence through [`ElectionStore`](crate::model::store::ElectionStore)
//! and reports failures as [`crate::error::Error`]; the routes in [`crate::api`] only adapt
//! requests onto these functions.

pub mod casting;
pub mod election_config;
pub mod lifecycle;
pub mod registry;

pub use casting::cast_vote;
