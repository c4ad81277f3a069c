//! Savings-goal progression engine.
//!
//! This crate computes savings-goal targets and installment schedules for
//! the Fixed, Ascending, Descending, Random and FreeForm progression
//! types, and keeps an in-memory goal cache consistent with a pluggable
//! persistence backend.
//!
//! - [`calculator`]: pure target, progress and per-slot math.
//! - [`store`]: the goal state cache with derived views.
//! - [`gateway`]: the persistence traits and an in-memory backend.
//! - `client`: HTTP gateways over the savings REST API (features `async`
//!   and `blocking`).

pub mod calculator;
#[cfg(any(feature = "async", feature = "blocking"))]
pub mod client;
pub mod error;
pub mod gateway;
pub mod models;
pub mod store;
