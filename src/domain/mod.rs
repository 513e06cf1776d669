//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `deal` - Sales opportunities, stages and turning-point forecasts
//! - `interaction` - Logged client contact and its critique

pub mod deal;
pub mod foundation;
pub mod interaction;
