//! Domain layer
//!
//! Contains the search engine and its supporting domain models.

pub mod events;
pub mod search;
pub mod specification;
