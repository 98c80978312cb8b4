//! Relationship Discoverer (§4.6): FK import + PK-match inference.

mod discoverer;
mod joinability;

pub use discoverer::{discover_fk, discover_pk_match};
pub use joinability::classify_joinability;
