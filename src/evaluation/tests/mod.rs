//! Unit tests for the evaluator gateway.
