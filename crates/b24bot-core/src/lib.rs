//! Core domain + application logic for the Bitrix24 contact robot.
//!
//! This crate is intentionally framework-agnostic. The portal REST API, the OAuth
//! server and the HTTP surface live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod install;
pub mod logging;
pub mod ports;
pub mod robot;
pub mod service;
pub mod token_store;

pub use errors::{Error, Result};
