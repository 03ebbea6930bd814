//! Adapter implementations for registry ports.

pub mod memory;
pub mod postgres;
