//! Core types and utilities for voxplex
//!
//! This crate provides the configuration, logging, error and session
//! types shared by the other voxplex components.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use error::{Error, Result};
