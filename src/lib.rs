//! AnyAgent - Grammar-Driven Configuration File Access
//!
//! A declarative grammar describes the layout of a line-oriented text
//! source (a configuration file, the output of a program, an in-memory
//! buffer). The same grammar is used in both directions:
//! - parsing the lines into a tree of values (lists, maps, strings,
//!   numbers, ...)
//! - rendering a tree back into text that parses to the same tree
//!
//! The crate provides:
//! - Closed grammar node set decoded once from a term value
//! - Backtracking interpreter with tuple frames and line-spanning cursor
//! - Leaf types for numbers, hex values, booleans, floats, IPv4 addresses,
//!   hostnames and user names
//! - Term notation reader for grammar descriptions kept in text
//! - File, program and in-memory sources with mtime-based caching
//! - Structural paths for reading and writing parts of the tree
//!
//! ## Quick Start
//!
//! ```rust
//! use anyagent::engine::grammar_dsl::*;
//! use anyagent::engine::{Grammar, Interpreter, LineCache, Value};
//!
//! let grammar = Grammar::from_value(&list(number(), separator(","))).unwrap();
//! let lines = LineCache::new(vec!["1,2,3".into()], "#", false);
//!
//! let mut interpreter = Interpreter::new(&lines, false);
//! let parsed = interpreter.parse(&grammar).unwrap().value.unwrap();
//! assert_eq!(
//!     parsed,
//!     Value::list(vec![Value::int(1), Value::int(2), Value::int(3)])
//! );
//! assert_eq!(interpreter.unparse(&grammar, &parsed).as_deref(), Some("1,2,3"));
//! ```
//!
//! ## Using an Agent
//!
//! ```rust,no_run
//! use anyagent::prelude::*;
//!
//! let description = Description::parse(
//!     "`Description(`File(\"/etc/numbers\"), \"#\", false, `List(`Number(), \"\\n\"))",
//! )
//! .unwrap();
//! let mut agent = AnyAgent::with_description(AgentConfig::default(), description).unwrap();
//! let all = agent.read(&".".parse().unwrap(), &[]).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable logging using the `log` crate (on by default)

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

#[macro_use]
mod macros;

// Prelude module for convenient imports
pub mod prelude;

// Grammar engine and agent
pub mod engine;

/// Re-export commonly used types for convenience
pub use engine::{
    AgentConfig, AgentError, AgentPath, AnyAgent, CacheStats, Description, DescriptionError,
    Grammar, GrammarError, Interpreter, LineCache, ParseError, Source, Value,
};
