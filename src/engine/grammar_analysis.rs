//! Grammar analysis and warnings
//!
//! Decoding a grammar only checks keywords and arities. This pass looks at
//! how nodes are nested and warns about constructs that decode fine but
//! cannot do anything useful at parse time:
//! - `Fillup()` when the description does not enable fillup mode
//! - field shorthand, `Name`, `Value` or `Continue` outside any `Tuple`
//! - `Match()` outside a `Choice` action
//! - `Choice`/`Or` alternatives that repeat an earlier alternative
//! - empty literals, which always match
//!
//! # Example
//!
//! ```
//! use anyagent::engine::grammar_analysis::{GrammarAnalyzer, WarningKind};
//! use anyagent::engine::grammar_dsl::*;
//! use anyagent::engine::grammar::Grammar;
//!
//! let grammar = Grammar::from_value(&field("port", number())).unwrap();
//! let warnings = GrammarAnalyzer::new(&grammar, false).analyze();
//! assert_eq!(warnings[0].kind, WarningKind::FieldOutsideTuple);
//! ```

use super::grammar::Grammar;

/// Kind of grammar warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// `Fillup()` in a grammar whose description has no fillup mode
    ///
    /// The node is a no-op in that case.
    FillupWithoutMode,

    /// Field shorthand, `Name` or `Value` with no enclosing `Tuple`
    FieldOutsideTuple,

    /// `Continue` with no enclosing `Tuple` to restart
    ContinueOutsideTuple,

    /// `Match()` that is not inside the action of a `Choice`
    ///
    /// It fails unless some earlier `Choice` left a match behind.
    MatchOutsideChoice,

    /// An alternative identical to an earlier one in the same `Choice`/`Or`
    UnreachableAlternative,

    /// `""` literal, which always matches
    EmptyLiteral,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FillupWithoutMode => write!(f, "fillup without fillup mode"),
            Self::FieldOutsideTuple => write!(f, "field outside tuple"),
            Self::ContinueOutsideTuple => write!(f, "continue outside tuple"),
            Self::MatchOutsideChoice => write!(f, "match outside choice"),
            Self::UnreachableAlternative => write!(f, "unreachable alternative"),
            Self::EmptyLiteral => write!(f, "empty literal"),
        }
    }
}

/// A grammar warning
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarWarning {
    /// The kind of warning
    pub kind: WarningKind,
    /// Keyword path from the root to the node, e.g. `Tuple/List/Fillup`
    pub location: String,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for GrammarWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.location, self.kind, self.message)
    }
}

/// Node counts collected while analyzing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrammarStats {
    /// Total number of nodes
    pub nodes: usize,
    /// Deepest nesting level (root = 1)
    pub depth: usize,
    /// Number of `Tuple` nodes
    pub tuples: usize,
    /// Number of leaf atoms and literals
    pub leaves: usize,
}

#[derive(Clone, Copy, Default)]
struct Scope {
    in_tuple: bool,
    in_action: bool,
}

/// Grammar analyzer
pub struct GrammarAnalyzer<'a> {
    grammar: &'a Grammar,
    fillup_mode: bool,
    warnings: Vec<GrammarWarning>,
    stats: GrammarStats,
}

impl<'a> GrammarAnalyzer<'a> {
    /// Create a new analyzer for the given grammar
    pub fn new(grammar: &'a Grammar, fillup_mode: bool) -> Self {
        Self {
            grammar,
            fillup_mode,
            warnings: Vec::new(),
            stats: GrammarStats::default(),
        }
    }

    /// Analyze the grammar and return all warnings
    pub fn analyze(mut self) -> Vec<GrammarWarning> {
        let mut path = Vec::new();
        self.visit(self.grammar, Scope::default(), &mut path);
        self.warnings
    }

    /// Analyze the grammar and return only the statistics
    pub fn stats(mut self) -> GrammarStats {
        let mut path = Vec::new();
        self.visit(self.grammar, Scope::default(), &mut path);
        self.stats
    }

    fn warn(&mut self, kind: WarningKind, path: &[String], message: impl Into<String>) {
        self.warnings.push(GrammarWarning {
            kind,
            location: path.join("/"),
            message: message.into(),
        });
    }

    fn check_duplicates<'g>(
        &mut self,
        alternatives: impl Iterator<Item = &'g Grammar>,
        path: &[String],
    ) {
        let mut seen: Vec<&Grammar> = Vec::new();
        for (i, alt) in alternatives.enumerate() {
            if seen.contains(&alt) {
                self.warn(
                    WarningKind::UnreachableAlternative,
                    path,
                    format!("alternative {} repeats an earlier one: {}", i, alt),
                );
            }
            seen.push(alt);
        }
    }

    fn visit(&mut self, g: &Grammar, scope: Scope, path: &mut Vec<String>) {
        path.push(g.kind_name().to_string());
        self.stats.nodes += 1;
        self.stats.depth = self.stats.depth.max(path.len());

        match g {
            Grammar::Literal(s) => {
                self.stats.leaves += 1;
                if s.is_empty() {
                    self.warn(WarningKind::EmptyLiteral, path, "\"\" always matches");
                }
            }
            Grammar::Fillup if !self.fillup_mode => {
                self.warn(
                    WarningKind::FillupWithoutMode,
                    path,
                    "comment lines are skipped, Fillup() will never capture anything",
                );
            }
            Grammar::Field { .. } | Grammar::Name(_) | Grammar::Value(_) if !scope.in_tuple => {
                self.warn(
                    WarningKind::FieldOutsideTuple,
                    path,
                    "there is no tuple to receive the field",
                );
            }
            Grammar::Continue(_) if !scope.in_tuple => {
                self.warn(
                    WarningKind::ContinueOutsideTuple,
                    path,
                    "there is no tuple loop to restart",
                );
            }
            Grammar::Match if !scope.in_action => {
                self.warn(
                    WarningKind::MatchOutsideChoice,
                    path,
                    "Match() only sees a value inside a Choice action",
                );
            }
            Grammar::Tuple(_) => self.stats.tuples += 1,
            Grammar::Or(alts) => self.check_duplicates(alts.iter(), path),
            Grammar::Choice(alts) => self.check_duplicates(alts.iter().map(|a| &a.pattern), path),
            Grammar::Number
            | Grammar::Hexval
            | Grammar::Boolean
            | Grammar::Float
            | Grammar::Ip4Number
            | Grammar::Hostname
            | Grammar::Username
            | Grammar::String { .. }
            | Grammar::Separator(_)
            | Grammar::Whitespace => self.stats.leaves += 1,
            _ => {}
        }

        match g {
            Grammar::Tuple(items) => {
                let inner = Scope {
                    in_tuple: true,
                    ..scope
                };
                for item in items {
                    self.visit(item, inner, path);
                }
            }
            Grammar::Choice(alts) => {
                for alt in alts {
                    self.visit(&alt.pattern, scope, path);
                    if let Some(action) = &alt.action {
                        let inner = Scope {
                            in_action: true,
                            ..scope
                        };
                        self.visit(action, inner, path);
                    }
                }
            }
            other => {
                for child in other.children() {
                    self.visit(child, scope, path);
                }
            }
        }

        path.pop();
    }
}
