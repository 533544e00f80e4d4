//! Unit tests for borg-manager
//!
//! Configuration parsing, defaults merging and action parsing, without
//! running any command.

mod action;
mod config;
