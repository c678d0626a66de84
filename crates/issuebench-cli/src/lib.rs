//! Command-line front end for the issuebench harness
//!
//! `issuebench bench ...` runs every registered backend through the timed
//! workload; `issuebench crash ...` runs one half of the crash scenario.
//! Both take order-independent `key=value` tokens on top of the optional
//! TOML config.

pub mod args;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
