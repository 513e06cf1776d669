//! Deal Pilot - sales pipeline tracking with AI critique and forecasting.
//!
//! Deals and their logged interactions live in an in-memory store owned by
//! the [`OrchestrationEngine`](application::OrchestrationEngine). Each logged
//! interaction is reviewed by "the Critic", and every change to a deal's
//! history triggers a fresh turning-point forecast from "the Oracle".

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
