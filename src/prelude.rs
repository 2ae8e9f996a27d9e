//! Prelude module for convenient imports
//!
//! ```
//! use anyagent::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`Value`] - Tagged value
//! - [`Grammar`] - Grammar node
//! - [`Interpreter`] - Parse/unparse engine
//! - [`LineCache`] - Lines the interpreter walks
//!
//! ## Agent
//! - [`AnyAgent`] - Read/write façade
//! - [`Description`] - Grammar plus source declaration
//! - [`AgentPath`] - Structural path
//! - [`AgentConfig`] - Settings
//!
//! ## Error Handling
//! - [`AgentError`], [`DescriptionError`], [`GrammarError`], [`ParseError`]

// ============================================================================
// Core Types
// ============================================================================

pub use crate::engine::{Grammar, Interpreter, LineCache, Value};

// ============================================================================
// Agent
// ============================================================================

pub use crate::engine::{AgentConfig, AgentPath, AnyAgent, Description, Source};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::{AgentError, DescriptionError, GrammarError, ParseError};
