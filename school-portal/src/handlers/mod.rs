//! HTTP handlers: pages, server actions and the fee API.

pub mod actions;
pub mod app;
pub mod auth;
pub mod dashboard;
pub mod fees;
pub mod metrics;
