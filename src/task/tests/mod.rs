//! Unit tests for the task context.

mod workflow_tests;
