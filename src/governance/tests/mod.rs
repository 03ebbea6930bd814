//! Unit tests for the governance context.
