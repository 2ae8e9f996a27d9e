//! Data sources
//!
//! A description names where its lines come from:
//! - `File(name)`: a file, re-read only when its modification time changes
//! - `Run(command)`: output of `sh -c command`, captured on every read
//! - `Local(name)`: in-memory lines that only writes change
//!
//! The name may be a template mixing strings with `arg(n)` terms, resolved
//! against the argument list of each `read`/`write` call.
//!
//! [`SourceCache`] tracks the load state:
//!
//! ```text
//! Unloaded -> Loaded(mtime) -> Stale -> Loaded(new mtime)
//! ```

use super::config::AgentConfig;
use super::error::{AgentError, DescriptionError};
use super::lines::split_lines;
use super::value::{Term, Value};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;
use std::time::SystemTime;

/// Piece of a source name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal text
    Text(String),
    /// `arg(n)`: the n-th call argument, which must be a string
    Arg(usize),
}

/// Source name, possibly parameterized by call arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    parts: Vec<TemplatePart>,
}

impl NameTemplate {
    /// A fixed name
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            parts: vec![TemplatePart::Text(name.into())],
        }
    }

    /// Build from template parts
    pub fn from_parts(parts: Vec<TemplatePart>) -> Self {
        Self { parts }
    }

    /// Decode the arguments of a source term
    ///
    /// Every argument is either a string or an `arg(n)` term with an
    /// integer `n`.
    pub fn from_args(args: &[Value]) -> Result<Self, DescriptionError> {
        if args.is_empty() {
            return Err(DescriptionError::BadSource {
                found: "source without name".to_string(),
            });
        }
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            let part = match arg {
                Value::String(text) => TemplatePart::Text(text.clone()),
                Value::Term(Term { name, args: index }) if name == "arg" && index.len() == 1 => {
                    match &index[0] {
                        Value::Int(n) if *n >= 0 => TemplatePart::Arg(*n as usize),
                        _ => {
                            return Err(DescriptionError::BadSource {
                                found: arg.to_string(),
                            })
                        }
                    }
                }
                other => {
                    return Err(DescriptionError::BadSource {
                        found: other.to_string(),
                    })
                }
            };
            parts.push(part);
        }
        Ok(Self { parts })
    }

    /// The template parts
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Whether no part refers to a call argument
    pub fn is_literal(&self) -> bool {
        self.parts
            .iter()
            .all(|p| matches!(p, TemplatePart::Text(_)))
    }

    /// Resolve against call arguments
    pub fn resolve(&self, args: &[Value]) -> Result<String, AgentError> {
        let mut name = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => name.push_str(text),
                TemplatePart::Arg(index) => match args.get(*index) {
                    Some(Value::String(text)) => name.push_str(text),
                    _ => {
                        log_error!("Bad argument arg({}), have {} arguments", index, args.len());
                        return Err(AgentError::BadArgument { index: *index });
                    }
                },
            }
        }
        if name.is_empty() {
            log_error!("source name resolves to the empty string");
            return Err(AgentError::BadArgument { index: 0 });
        }
        Ok(name)
    }

    fn to_values(&self) -> Vec<Value> {
        self.parts
            .iter()
            .map(|p| match p {
                TemplatePart::Text(text) => Value::string(text.clone()),
                TemplatePart::Arg(n) => Value::term("arg", vec![Value::int(*n as i64)]),
            })
            .collect()
    }
}

/// Kind of source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A file
    File,
    /// A program's standard output
    Run,
    /// In-memory lines
    Local,
}

impl SourceKind {
    /// Term name in a description
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::File => "File",
            SourceKind::Run => "Run",
            SourceKind::Local => "Local",
        }
    }
}

/// Where lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Kind of source
    pub kind: SourceKind,
    /// File name, command line or local name
    pub name: NameTemplate,
}

impl Source {
    /// A fixed file
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::File,
            name: NameTemplate::literal(path),
        }
    }

    /// A fixed command
    pub fn run(command: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Run,
            name: NameTemplate::literal(command),
        }
    }

    /// An in-memory source
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Local,
            name: NameTemplate::literal(name),
        }
    }

    /// Decode `File(..)`, `Run(..)` or `Local(..)`
    pub fn from_value(value: &Value) -> Result<Self, DescriptionError> {
        let bad = || DescriptionError::BadSource {
            found: value.to_string(),
        };
        let Value::Term(term) = value else {
            return Err(bad());
        };
        let kind = match term.name.as_str() {
            "File" => SourceKind::File,
            "Run" => SourceKind::Run,
            "Local" => SourceKind::Local,
            _ => return Err(bad()),
        };
        let name = NameTemplate::from_args(&term.args).map_err(|_| bad())?;
        Ok(Self { kind, name })
    }

    /// Back to a term value
    pub fn to_value(&self) -> Value {
        Value::term(self.kind.name(), self.name.to_values())
    }

    /// Whether the source can never be written
    #[inline]
    pub fn is_program(&self) -> bool {
        self.kind == SourceKind::Run
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// Load and parse counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Times lines were read from a file or program
    pub loads: usize,
    /// Times the root grammar ran over the lines
    pub parses: usize,
    /// Reads answered without touching the source
    pub hits: usize,
}

/// Load state of a source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheState {
    /// Nothing read yet
    #[default]
    Unloaded,
    /// `name` did not exist at the last load; its lines are empty
    Missing {
        /// Resolved source name
        name: String,
    },
    /// Lines of `name` as of `mtime`
    Loaded {
        /// Resolved source name
        name: String,
        /// Modification time at load (`None` for local sources)
        mtime: Option<SystemTime>,
    },
    /// Must be re-read before the next use
    Stale,
}

/// Load state plus statistics for one agent
#[derive(Debug, Clone, Default)]
pub struct SourceCache {
    state: CacheState,
    stats: CacheStats,
}

impl SourceCache {
    /// Create an unloaded cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &CacheState {
        &self.state
    }

    /// Counters so far
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Count one run of the root grammar
    pub fn record_parse(&mut self) {
        self.stats.parses += 1;
    }

    /// Force a reload on the next [`load`](Self::load)
    pub fn invalidate(&mut self) {
        self.state = CacheState::Stale;
    }

    /// Bring the lines up to date
    ///
    /// Returns the new lines when they changed, `None` when the cached
    /// lines are still current.
    pub fn load(
        &mut self,
        source: &Source,
        args: &[Value],
        config: &AgentConfig,
    ) -> Result<Option<Vec<String>>, AgentError> {
        let name = source.name.resolve(args)?;
        match source.kind {
            SourceKind::File => self.load_file(&name, config),
            SourceKind::Run => self.load_program(&name, config).map(Some),
            SourceKind::Local => Ok(self.load_local(name)),
        }
    }

    fn load_file(
        &mut self,
        name: &str,
        config: &AgentConfig,
    ) -> Result<Option<Vec<String>>, AgentError> {
        let metadata = match fs::metadata(name) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if matches!(&self.state, CacheState::Missing { name: missing } if missing == name) {
                    self.stats.hits += 1;
                    return Ok(None);
                }
                log_debug!("File not found: {}", name);
                self.state = CacheState::Missing {
                    name: name.to_string(),
                };
                return Ok(Some(Vec::new()));
            }
            Err(e) => return Err(io_error(name, e)),
        };
        let mtime = metadata.modified().ok();

        if let CacheState::Loaded {
            name: loaded,
            mtime: Some(previous),
        } = &self.state
        {
            if loaded == name && mtime == Some(*previous) {
                log_debug!("cache hit for {}", name);
                self.stats.hits += 1;
                return Ok(None);
            }
        }

        log_debug!("reading {}", name);
        let bytes = fs::read(name).map_err(|e| io_error(name, e))?;
        let text = String::from_utf8_lossy(&bytes);
        self.stats.loads += 1;
        self.state = CacheState::Loaded {
            name: name.to_string(),
            mtime,
        };
        Ok(Some(split_lines(&text, config.keep_line_terminators)))
    }

    fn load_program(
        &mut self,
        command: &str,
        config: &AgentConfig,
    ) -> Result<Vec<String>, AgentError> {
        log_debug!("running '{}'", command);
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(locale) = &config.program_locale {
            cmd.env("LC_ALL", locale);
        }
        let output = cmd.output().map_err(|source| {
            log_error!("can't run '{}': {}", command, source);
            AgentError::Spawn {
                command: command.to_string(),
                source,
            }
        })?;
        if !output.status.success() {
            log_warn!("'{}' exited with {}", command, output.status);
        }
        self.stats.loads += 1;
        // program output is never reused
        self.state = CacheState::Stale;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(split_lines(&text, config.keep_line_terminators))
    }

    fn load_local(&mut self, name: String) -> Option<Vec<String>> {
        match &self.state {
            CacheState::Loaded { name: loaded, .. } if *loaded == name => {
                self.stats.hits += 1;
                None
            }
            _ => {
                self.state = CacheState::Loaded { name, mtime: None };
                Some(Vec::new())
            }
        }
    }

    /// Store written text
    ///
    /// Files are replaced and the cache goes stale. Local sources keep the
    /// text in memory and return the new lines.
    pub fn store(
        &mut self,
        source: &Source,
        args: &[Value],
        text: &str,
        config: &AgentConfig,
    ) -> Result<Option<Vec<String>>, AgentError> {
        let name = source.name.resolve(args)?;
        match source.kind {
            SourceKind::File => {
                if config.atomic_write {
                    write_atomic(&name, text)?;
                } else {
                    fs::write(&name, text).map_err(|e| io_error(&name, e))?;
                }
                log_debug!("wrote {} bytes to {}", text.len(), name);
                self.invalidate();
                Ok(None)
            }
            SourceKind::Local => {
                self.state = CacheState::Loaded { name, mtime: None };
                Ok(Some(split_lines(text, config.keep_line_terminators)))
            }
            SourceKind::Run => Err(AgentError::ReadOnly),
        }
    }
}

fn io_error(name: &str, e: io::Error) -> AgentError {
    if e.kind() == io::ErrorKind::PermissionDenied {
        log_error!("Cant access {}: {}", name, e);
        AgentError::PermissionDenied {
            path: name.to_string(),
        }
    } else {
        log_error!("I/O error on {}: {}", name, e);
        AgentError::Io {
            path: name.to_string(),
            source: e,
        }
    }
}

/// Write through a temporary file in the target directory
///
/// The target's permissions carry over to the replacement.
fn write_atomic(name: &str, text: &str) -> Result<(), AgentError> {
    let target = Path::new(name);
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_error(name, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| io_error(name, e))?;
    if let Ok(metadata) = fs::metadata(target) {
        fs::set_permissions(tmp.path(), metadata.permissions()).map_err(|e| io_error(name, e))?;
    }
    tmp.persist(target).map_err(|e| io_error(name, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AgentConfig {
        AgentConfig::default()
    }

    #[test]
    fn test_template_resolve() {
        let t = NameTemplate::from_args(&[
            Value::string("/etc/"),
            Value::term("arg", vec![Value::int(1)]),
        ])
        .unwrap();
        assert!(!t.is_literal());
        let args = [Value::string("x"), Value::string("hosts")];
        assert_eq!(t.resolve(&args).unwrap(), "/etc/hosts");
        assert!(matches!(
            t.resolve(&[Value::string("x")]),
            Err(AgentError::BadArgument { index: 1 })
        ));
        assert!(matches!(
            t.resolve(&[Value::string("x"), Value::int(3)]),
            Err(AgentError::BadArgument { index: 1 })
        ));
    }

    #[test]
    fn test_source_from_value() {
        let v = Value::term("Run", vec![Value::string("echo hi")]);
        let s = Source::from_value(&v).unwrap();
        assert!(s.is_program());
        assert_eq!(s.to_value(), v);

        assert!(Source::from_value(&Value::term("Pipe", vec![Value::string("x")])).is_err());
        assert!(Source::from_value(&Value::term("File", vec![])).is_err());
        assert!(Source::from_value(&Value::string("/etc/hosts")).is_err());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let mut cache = SourceCache::new();
        let lines = cache
            .load(&Source::file(path.to_string_lossy()), &[], &config())
            .unwrap();
        assert_eq!(lines, Some(Vec::new()));
        assert_eq!(
            cache.state(),
            &CacheState::Missing {
                name: path.to_string_lossy().into_owned()
            }
        );
    }

    #[test]
    fn test_missing_file_cached_until_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later");
        let source = Source::file(path.to_string_lossy());
        let mut cache = SourceCache::new();

        assert_eq!(cache.load(&source, &[], &config()).unwrap(), Some(Vec::new()));
        assert_eq!(cache.load(&source, &[], &config()).unwrap(), None);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().loads, 0);

        fs::write(&path, "a\n").unwrap();
        assert_eq!(
            cache.load(&source, &[], &config()).unwrap(),
            Some(vec!["a\n".to_string()])
        );
        assert_eq!(cache.stats().loads, 1);
    }

    #[test]
    fn test_file_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        fs::write(&path, "a\nb\n").unwrap();
        let source = Source::file(path.to_string_lossy());
        let mut cache = SourceCache::new();

        let first = cache.load(&source, &[], &config()).unwrap();
        assert_eq!(first, Some(vec!["a\n".to_string(), "b\n".to_string()]));
        assert_eq!(cache.load(&source, &[], &config()).unwrap(), None);
        assert_eq!(cache.stats().loads, 1);
        assert_eq!(cache.stats().hits, 1);

        cache.invalidate();
        assert!(cache.load(&source, &[], &config()).unwrap().is_some());
        assert_eq!(cache.stats().loads, 2);
    }

    #[test]
    fn test_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        let source = Source::file(path.to_string_lossy());
        let mut cache = SourceCache::new();
        cache.store(&source, &[], "x\n", &config()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x\n");
        assert_eq!(cache.state(), &CacheState::Stale);

        let plain = config().with_atomic_write(false);
        cache.store(&source, &[], "y\n", &plain).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "y\n");
    }

    #[test]
    fn test_local_source() {
        let source = Source::local("mem");
        let mut cache = SourceCache::new();
        assert_eq!(cache.load(&source, &[], &config()).unwrap(), Some(Vec::new()));
        assert_eq!(cache.load(&source, &[], &config()).unwrap(), None);
        let stored = cache.store(&source, &[], "1\n2\n", &config()).unwrap();
        assert_eq!(stored, Some(vec!["1\n".to_string(), "2\n".to_string()]));
        assert_eq!(cache.load(&source, &[], &config()).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_program_never_cached() {
        let source = Source::run("echo hello");
        let mut cache = SourceCache::new();
        let lines = cache.load(&source, &[], &config()).unwrap();
        assert_eq!(lines, Some(vec!["hello\n".to_string()]));
        assert!(cache.load(&source, &[], &config()).unwrap().is_some());
        assert_eq!(cache.stats().loads, 2);
        assert!(matches!(
            cache.store(&source, &[], "x", &config()),
            Err(AgentError::ReadOnly)
        ));
    }
}
