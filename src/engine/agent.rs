//! Agent façade
//!
//! [`AnyAgent`] ties a [`Description`] to its source. `read` parses the
//! source with the root grammar (re-using the cached tree while the source
//! is unchanged) and walks a path into the result; `write` renders a value
//! with the grammar at a path and stores the text.
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::agent::AnyAgent;
//! use anyagent::engine::description::Description;
//! use anyagent::engine::value::Value;
//!
//! let mut agent = AnyAgent::default();
//! agent
//!     .describe(
//!         Description::parse(
//!             "`Description(`Local(\"m\"), \"#\", false, `List(`Number(), \",\"))",
//!         )
//!         .unwrap(),
//!     )
//!     .unwrap();
//!
//! let numbers = Value::list(vec![Value::int(1), Value::int(2)]);
//! agent.write(&".".parse().unwrap(), &numbers, &[]).unwrap();
//! assert_eq!(agent.read(&".".parse().unwrap(), &[]).unwrap(), numbers);
//! ```

use super::config::AgentConfig;
use super::description::{Description, DESCRIPTION_TERM};
use super::error::AgentError;
use super::grammar::Grammar;
use super::lines::LineCache;
use super::parser::Interpreter;
use super::path::{component_index, AgentPath};
use super::source::{CacheStats, SourceCache};
use super::value::Value;

/// Grammar-driven reader and writer for one source
#[derive(Debug, Clone, Default)]
pub struct AnyAgent {
    config: AgentConfig,
    description: Option<Description>,
    fingerprint: u64,
    source_cache: SourceCache,
    lines: LineCache,
    parsed: Option<Value>,
}

impl AnyAgent {
    /// Create an agent without description
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create an agent and describe it
    pub fn with_description(
        config: AgentConfig,
        description: Description,
    ) -> Result<Self, AgentError> {
        let mut agent = Self::new(config);
        agent.describe(description)?;
        Ok(agent)
    }

    /// The active configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The active description, if any
    pub fn description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    /// Load and parse counters
    pub fn stats(&self) -> CacheStats {
        self.source_cache.stats()
    }

    /// Raw lines currently cached
    pub fn lines(&self) -> &[String] {
        self.lines.lines()
    }

    /// Install a description
    ///
    /// Re-describing keeps the cached lines and tree when nothing changed.
    pub fn describe(&mut self, description: Description) -> Result<(), AgentError> {
        for warning in description.warnings() {
            log_warn!("grammar: {}", warning);
        }
        let fingerprint = description.fingerprint();
        if self.description.is_some() {
            log_warn!("Rereading Description; you might have forgotten to use another agent");
            if fingerprint == self.fingerprint {
                self.description = Some(description);
                return Ok(());
            }
        }
        self.source_cache = SourceCache::new();
        self.lines = LineCache::new(Vec::new(), &description.comments, description.fillup);
        self.parsed = None;
        self.fingerprint = fingerprint;
        self.description = Some(description);
        Ok(())
    }

    /// Read the value at `path`
    ///
    /// `args` resolves `arg(n)` in the source name.
    pub fn read(&mut self, path: &AgentPath, args: &[Value]) -> Result<Value, AgentError> {
        if self.description.is_none() {
            log_error!("Read: no description");
            return Err(AgentError::NoDescription);
        }
        self.validate(args)?;

        if path.is_raw() {
            return Ok(self.read_raw(path));
        }
        let Some(root) = &self.parsed else {
            return Err(AgentError::ParseFailed { line: None });
        };
        Ok(read_value_by_path(root, path))
    }

    fn read_raw(&self, path: &AgentPath) -> Value {
        let components = path.components();
        match components.len() {
            1 => Value::list(self.lines.lines().iter().cloned().map(Value::String).collect()),
            2 => match component_index(&components[1]).and_then(|n| self.lines.lines().get(n)) {
                Some(line) => Value::string(line.clone()),
                None => {
                    log_debug!("no raw line {}", components[1]);
                    Value::Void
                }
            },
            _ => {
                log_debug!("raw path too long: {}", path);
                Value::Void
            }
        }
    }

    /// Write `value` at `path`
    pub fn write(
        &mut self,
        path: &AgentPath,
        value: &Value,
        args: &[Value],
    ) -> Result<(), AgentError> {
        let description = self.description.as_ref().ok_or_else(|| {
            log_error!("Write: no description");
            AgentError::NoDescription
        })?;
        if description.read_only {
            log_error!("Write: agent is read-only");
            return Err(AgentError::ReadOnly);
        }

        if path.is_raw() {
            return self.write_raw(path, value, args);
        }

        let syntax = find_syntax(&description.syntax, path).ok_or_else(|| {
            log_error!("Write: no syntax for path {}", path);
            AgentError::NoSyntax {
                path: path.to_string(),
            }
        })?;

        let mut interpreter = Interpreter::new(&self.lines, description.read_only)
            .with_max_recursion_depth(self.config.max_recursion_depth);
        let body = interpreter.unparse(syntax, value).ok_or_else(|| {
            log_error!("Wrong value for path {}: {}", path, value);
            AgentError::NonConforming {
                path: path.to_string(),
            }
        })?;
        let header = match &description.header {
            Some(header) => interpreter.unparse(header, &Value::Void).unwrap_or_else(|| {
                log_warn!("header grammar renders nothing");
                String::new()
            }),
            None => String::new(),
        };

        let mut text = header + &body;
        if self.config.trailing_newline {
            text.push('\n');
        }
        let stored = self
            .source_cache
            .store(&description.source, args, &text, &self.config)?;
        if let Some(lines) = stored {
            self.lines.set_lines(lines);
        }
        self.parsed = None;
        Ok(())
    }

    fn write_raw(
        &mut self,
        path: &AgentPath,
        value: &Value,
        args: &[Value],
    ) -> Result<(), AgentError> {
        self.refresh(args)?;
        let bad = |reason: &str| {
            log_error!("Write {}: {}", path, reason);
            AgentError::BadPath {
                path: path.to_string(),
                reason: reason.to_string(),
            }
        };
        let components = path.components();
        match (components.len(), value) {
            (1, Value::List(items)) => {
                self.lines
                    .set_lines(items.iter().map(Value::to_text).collect());
            }
            (2, Value::String(line)) => {
                let index = component_index(&components[1]).ok_or_else(|| bad("not a line number"))?;
                if !self.lines.set_line(index, line.clone()) {
                    return Err(bad("line number past the end"));
                }
            }
            (1, _) => return Err(bad("raw lines must be a list")),
            (2, _) => return Err(bad("a raw line must be a string")),
            _ => return Err(bad("raw path too long")),
        }
        self.parse_lines()
    }

    /// The root grammar, as declared
    pub fn dir(&self, _path: &AgentPath) -> Result<Value, AgentError> {
        let description = self.description.as_ref().ok_or(AgentError::NoDescription)?;
        Ok(Value::list(vec![description.syntax_value.clone()]))
    }

    /// Handle a command term outside read/write/dir
    ///
    /// `Description(...)` installs a description and yields `Some(Void)`;
    /// anything else is left to the caller (`None`).
    pub fn other_command(&mut self, command: &Value) -> Result<Option<Value>, AgentError> {
        match command {
            Value::Term(term) if term.name == DESCRIPTION_TERM => {
                let description = Description::from_value(command)?;
                self.describe(description)?;
                Ok(Some(Value::Void))
            }
            _ => Ok(None),
        }
    }

    /// Reload lines if the source changed, keeping the parsed tree otherwise
    fn refresh(&mut self, args: &[Value]) -> Result<(), AgentError> {
        let Some(description) = &self.description else {
            return Err(AgentError::NoDescription);
        };
        if let Some(lines) = self
            .source_cache
            .load(&description.source, args, &self.config)?
        {
            self.lines.set_lines(lines);
            self.parsed = None;
        }
        Ok(())
    }

    fn validate(&mut self, args: &[Value]) -> Result<(), AgentError> {
        self.refresh(args)?;
        if self.parsed.is_none() {
            self.parse_lines()?;
        }
        Ok(())
    }

    fn parse_lines(&mut self) -> Result<(), AgentError> {
        let Some(description) = &self.description else {
            return Err(AgentError::NoDescription);
        };
        self.parsed = None;
        let outcome = Interpreter::new(&self.lines, description.read_only)
            .with_max_recursion_depth(self.config.max_recursion_depth)
            .parse(&description.syntax)?;
        self.source_cache.record_parse();
        match outcome.value {
            Some(value) => {
                self.parsed = Some(value);
                Ok(())
            }
            None => {
                let line = outcome.cursor.line_number();
                log_error!("parse failed at line {:?}", line);
                Err(AgentError::ParseFailed { line })
            }
        }
    }
}

/// Walk `path` into a parsed tree
///
/// A component starting with a digit indexes a list, or looks up its text
/// as a map key. Any other component looks up a map key. Dead ends yield
/// `Void`.
pub fn read_value_by_path(root: &Value, path: &AgentPath) -> Value {
    let mut current = root;
    for component in path.components() {
        let next = match (current, component_index(component)) {
            (Value::List(items), Some(index)) => items.get(index),
            (Value::Map(map), _) => map.get(component.as_str()),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => {
                log_debug!("nothing at {} in {}", component, current);
                return Value::Void;
            }
        }
    }
    current.clone()
}

/// Grammar node that renders the value at `path`
///
/// A field name selects the field's grammar, a number selects the n-th
/// field of a `Tuple` or the element grammar of a `List`. Literal text is
/// passed through. `Optional` wrappers are looked through.
pub fn find_syntax<'g>(root: &'g Grammar, path: &AgentPath) -> Option<&'g Grammar> {
    let mut current = root;
    for component in path.components() {
        current = unwrap_optional(current);
        current = match current {
            Grammar::Field { name, inner } if name == component => inner.as_ref(),
            Grammar::Tuple(items) => {
                let mut fields = items.iter().filter_map(|item| match unwrap_optional(item) {
                    Grammar::Field { name, inner } => Some((name, inner.as_ref())),
                    _ => None,
                });
                match component_index(component) {
                    Some(index) => fields.nth(index).map(|(_, inner)| inner)?,
                    None => fields.find(|(name, _)| *name == component).map(|(_, inner)| inner)?,
                }
            }
            Grammar::List { element, .. } if component_index(component).is_some() => element.as_ref(),
            Grammar::Literal(_) => current,
            _ => return None,
        };
    }
    Some(current)
}

fn unwrap_optional(mut grammar: &Grammar) -> &Grammar {
    while let Grammar::Optional(inner) = grammar {
        grammar = inner.as_ref();
    }
    grammar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grammar_dsl::*;
    use crate::engine::source::Source;

    fn path(s: &str) -> AgentPath {
        s.parse().unwrap()
    }

    fn local_agent(syntax: Value) -> AnyAgent {
        let description = Description::new(Source::local("mem"), "#", false, syntax).unwrap();
        AnyAgent::with_description(AgentConfig::default(), description).unwrap()
    }

    fn hosts() -> Value {
        list(
            tuple(vec![
                field("ip", string("^ \t\n")),
                whitespace(),
                field("name", hostname()),
            ]),
            lit("\n"),
        )
    }

    #[test]
    fn test_no_description() {
        let mut agent = AnyAgent::default();
        assert!(matches!(agent.read(&path("."), &[]), Err(AgentError::NoDescription)));
        assert!(matches!(
            agent.write(&path("."), &Value::Void, &[]),
            Err(AgentError::NoDescription)
        ));
        assert!(agent.dir(&path(".")).is_err());
    }

    #[test]
    fn test_local_write_then_read() {
        let mut agent = local_agent(hosts());
        let entry = Value::map(vec![
            ("ip", Value::string("10.0.0.1")),
            ("name", Value::string("gw.local")),
        ]);
        agent
            .write(&path("."), &Value::list(vec![entry.clone()]), &[])
            .unwrap();
        assert_eq!(agent.lines(), &["10.0.0.1 gw.local\n".to_string()]);
        assert_eq!(agent.read(&path(".0"), &[]).unwrap(), entry);
        assert_eq!(
            agent.read(&path(".0.name"), &[]).unwrap(),
            Value::string("gw.local")
        );
        assert_eq!(agent.read(&path(".3.name"), &[]).unwrap(), Value::Void);
    }

    #[test]
    fn test_non_conforming_write() {
        let mut agent = local_agent(list(number(), lit(",")));
        agent
            .write(&path("."), &Value::list(vec![Value::int(1)]), &[])
            .unwrap();
        let err = agent
            .write(&path("."), &Value::list(vec![Value::string("x")]), &[])
            .unwrap_err();
        assert!(matches!(err, AgentError::NonConforming { .. }));
        assert_eq!(agent.lines(), &["1\n".to_string()]);
    }

    #[test]
    fn test_raw_paths() {
        let mut agent = local_agent(list(number(), lit("\n")));
        let lines = Value::list(vec![Value::string("1\n"), Value::string("2\n")]);
        agent.write(&path("._"), &lines, &[]).unwrap();
        assert_eq!(agent.read(&path("._"), &[]).unwrap(), lines);
        assert_eq!(agent.read(&path("._.1"), &[]).unwrap(), Value::string("2\n"));
        assert_eq!(agent.read(&path("._.7"), &[]).unwrap(), Value::Void);

        agent.write(&path("._.2"), &Value::string("3\n"), &[]).unwrap();
        assert_eq!(
            agent.read(&path("."), &[]).unwrap(),
            Value::list(vec![Value::int(1), Value::int(2), Value::int(3)])
        );
        assert!(matches!(
            agent.write(&path("._.9"), &Value::string("x\n"), &[]),
            Err(AgentError::BadPath { .. })
        ));
        assert!(matches!(
            agent.write(&path("._"), &Value::string("x"), &[]),
            Err(AgentError::BadPath { .. })
        ));
    }

    #[test]
    fn test_find_syntax() {
        let g = Grammar::from_value(&tuple(vec![
            field("a", number()),
            lit("="),
            optional(field("b", list(hostname(), lit(",")))),
        ]))
        .unwrap();
        assert_eq!(find_syntax(&g, &path(".a")), Some(&Grammar::Number));
        assert_eq!(find_syntax(&g, &path(".b.0")), Some(&Grammar::Hostname));
        assert_eq!(find_syntax(&g, &path(".1.3")), Some(&Grammar::Hostname));
        assert_eq!(find_syntax(&g, &path(".c")), None);
        assert_eq!(find_syntax(&g, &path(".a.x")), None);
        assert_eq!(find_syntax(&g, &path(".")), Some(&g));
    }

    #[test]
    fn test_read_value_by_path() {
        let tree = Value::map(vec![
            ("list", Value::list(vec![Value::int(5)])),
            ("7", Value::string("seven")),
        ]);
        assert_eq!(read_value_by_path(&tree, &path(".list.0")), Value::int(5));
        assert_eq!(read_value_by_path(&tree, &path(".7")), Value::string("seven"));
        assert_eq!(read_value_by_path(&tree, &path(".list.x")), Value::Void);
        assert_eq!(read_value_by_path(&tree, &path(".list.0.y")), Value::Void);
    }

    #[test]
    fn test_dir_returns_grammar() {
        let agent = local_agent(number());
        assert_eq!(
            agent.dir(&path(".")).unwrap(),
            Value::list(vec![number()])
        );
    }

    #[test]
    fn test_other_command() {
        let mut agent = AnyAgent::default();
        let command = Description::new(Source::local("m"), "#", true, number())
            .unwrap()
            .to_value();
        assert_eq!(agent.other_command(&command).unwrap(), Some(Value::Void));
        assert!(agent.description().is_some());
        assert_eq!(
            agent
                .other_command(&Value::term("Reset", vec![]))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_redescribe_keeps_cache_when_unchanged() {
        let mut agent = local_agent(list(number(), lit(",")));
        agent
            .write(&path("."), &Value::list(vec![Value::int(4)]), &[])
            .unwrap();
        let same = agent.description().cloned().unwrap();
        agent.describe(same).unwrap();
        assert_eq!(agent.lines(), &["4\n".to_string()]);

        let other = Description::new(Source::local("mem"), "#", false, number()).unwrap();
        agent.describe(other).unwrap();
        assert!(agent.lines().is_empty());
    }

    #[test]
    fn test_read_only_refuses_write() {
        let description = Description::new(Source::local("m"), "#", true, number()).unwrap();
        let mut agent = AnyAgent::with_description(AgentConfig::default(), description).unwrap();
        assert!(matches!(
            agent.write(&path("."), &Value::int(1), &[]),
            Err(AgentError::ReadOnly)
        ));
    }
}
