//! Command tests for borg-manager
//!
//! These tests run whole action sequences against a mocked executor and
//! check which command lines would have been started, in which order.

mod gates;
mod init;
mod rclone;
mod shell;
