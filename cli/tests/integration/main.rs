//! Integration tests for sarge-deploy
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them reach a deployment host.

mod cli_tests;
