//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (timestamps, IDs, error codes)
//! - `subscription` - Trial and paid plan lifecycle, access gate, payment facts

pub mod foundation;
pub mod subscription;
