//! HTTP request handlers.

pub mod basic;
pub mod station;
