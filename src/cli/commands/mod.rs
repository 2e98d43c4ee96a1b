//! CLI Commands module
//!
//! This module contains all command implementations for the thirteenf CLI.
//! Each command follows a consistent pattern with dedicated Args and Command structs.

pub mod cleanup;
pub mod diff;
pub mod export;
pub mod fetch;
pub mod run;
pub mod summary;
pub mod test_notify;
