//! API-facing shared types and helpers.

pub mod common;
