//! Read-only operator API: queue statistics, targets and recent runs.

pub mod auth;
pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;
