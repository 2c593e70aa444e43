//! Core traits and types for the travel agent
//!
//! This crate provides the `Tool` trait for external data adapters,
//! plus the input/output envelopes and error types shared by every
//! crate that calls or implements a tool.

pub mod tool;

pub use tool::{Tool, ToolError, ToolInput, ToolOutput};
