//! Step definitions for task governance scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
