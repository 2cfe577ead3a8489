//! Unit tests for sarge-deploy
//!
//! These tests use simulated hosts and run fast without external I/O.

mod mocks;
mod property_tests;
