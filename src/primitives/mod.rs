//! Low-level building blocks beneath the attribute storage layer.

pub mod region;
