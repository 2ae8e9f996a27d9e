//! Grammar engine for AnyAgent
//!
//! One declarative grammar drives both directions: parsing lines into a
//! [`Value`] tree and rendering a tree back into text.
//!
//! # Module Organization
//!
//! ## Values and Notation
//! - [`value`] - Tagged value union
//! - [`notation`] - Reader for term notation
//! - [`source_location`] - Line/column tracking for notation errors
//!
//! ## Grammar
//! - [`grammar`] - Closed grammar node enum, decoded once
//! - [`grammar_analysis`] - Load-time lint pass
//! - [`grammar_dsl`] - Builders for grammar values
//! - [`char_class`] - Character sets
//!
//! ## Interpreter
//! - [`lines`] - Line cache and cursor
//! - [`leaf`] - Leaf types (numbers, hostnames, ...)
//! - [`parser`] - Parse direction
//! - [`unparser`] - Write direction
//!
//! ## Agent
//! - [`source`] - File, program and in-memory sources
//! - [`path`] - Structural paths
//! - [`description`] - `Description(...)` declarations
//! - [`agent`] - Read/write façade
//! - [`config`] - Agent configuration
//! - [`error`] - Error types

// ============================================================================
// Module Declarations
// ============================================================================

pub mod agent;
pub mod char_class;
pub mod config;
pub mod description;
pub mod error;
pub mod grammar;
pub mod grammar_analysis;
pub mod grammar_dsl;
pub mod leaf;
pub mod lines;
pub mod notation;
pub mod parser;
pub mod path;
pub mod source;
pub mod source_location;
pub mod unparser;
pub mod value;

// ============================================================================
// Core Types
// ============================================================================

pub use grammar::{Alternative, Grammar, GrammarError};
pub use parser::{Interpreter, ParseContext, ParseOutcome};
pub use value::{Term, TypeMismatch, Value, ValueKind};

// ============================================================================
// Agent
// ============================================================================

pub use agent::AnyAgent;
pub use config::AgentConfig;
pub use description::Description;
pub use path::AgentPath;
pub use source::{CacheStats, Source, SourceKind};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{AgentError, DescriptionError, ParseError};
pub use notation::NotationError;

// ============================================================================
// Analysis
// ============================================================================

pub use grammar_analysis::{GrammarAnalyzer, GrammarStats, GrammarWarning, WarningKind};

// ============================================================================
// Lines
// ============================================================================

pub use char_class::CharSet;
pub use lines::{Cursor, LineCache};
