//! Lifecycle scenario tests against a recording plugin.

mod common;

mod run_tests;
