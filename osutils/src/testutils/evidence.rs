use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap},
    io,
    path::{Path, PathBuf},
};

use glob::{MatchOptions, Pattern};

use crate::evidence::{EvidenceError, EvidenceSource};

/// A single query made against a [`FakeEvidence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Exists(PathBuf),
    IsFile(PathBuf),
    IsDir(PathBuf),
    Glob(String),
    Read(PathBuf),
    Exec(String),
}

/// In-memory host used to drive probes in tests.
///
/// Adding a file or directory implicitly adds its ancestors as directories.
/// Commands are keyed by their rendered command line, e.g.
/// `/sbin/sysctl -n hw.model`; commands that were not added fail as if the
/// binary was missing. Every query is recorded in order.
#[derive(Debug, Default)]
pub struct FakeEvidence {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    others: BTreeSet<PathBuf>,
    commands: HashMap<String, String>,
    queries: RefCell<Vec<Query>>,
}

impl FakeEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        self.add_ancestors(&path);
        self.files.insert(path, content.into());
        self
    }

    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.add_ancestors(&path);
        self.dirs.insert(path);
        self
    }

    /// Adds a path that exists but is neither a readable file nor a directory.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.add_ancestors(&path);
        self.others.insert(path);
        self
    }

    pub fn with_command(mut self, command: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.commands.insert(command.into(), stdout.into());
        self
    }

    /// Returns the queries made so far, in order.
    pub fn queries(&self) -> Vec<Query> {
        self.queries.borrow().clone()
    }

    /// Returns the commands executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.queries
            .borrow()
            .iter()
            .filter_map(|query| match query {
                Query::Exec(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_queries(&self) {
        self.queries.borrow_mut().clear();
    }

    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn record(&self, query: Query) {
        self.queries.borrow_mut().push(query);
    }
}

impl EvidenceSource for FakeEvidence {
    fn exists(&self, path: &Path) -> bool {
        self.record(Query::Exists(path.into()));
        self.files.contains_key(path) || self.dirs.contains(path) || self.others.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.record(Query::IsFile(path.into()));
        self.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.record(Query::IsDir(path.into()));
        self.dirs.contains(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, EvidenceError> {
        self.record(Query::Glob(pattern.into()));
        let compiled = Pattern::new(pattern).map_err(|source| EvidenceError::Glob {
            pattern: pattern.into(),
            source,
        })?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };

        let mut found = self
            .files
            .keys()
            .chain(&self.dirs)
            .chain(&self.others)
            .filter(|path| compiled.matches_path_with(path, options))
            .cloned()
            .collect::<Vec<_>>();
        found.sort();
        Ok(found)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, EvidenceError> {
        self.record(Query::Read(path.into()));
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| EvidenceError::Read {
                path: path.into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
    }

    fn exec(&self, program: &str, args: &[&str]) -> Result<String, EvidenceError> {
        let command = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.record(Query::Exec(command.clone()));
        self.commands
            .get(&command)
            .cloned()
            .ok_or_else(|| EvidenceError::Execute {
                command,
                explanation: "could not be executed: not found".into(),
            })
    }
}
