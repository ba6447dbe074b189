//! Read-only access to the host state that virtualization probes consult.
//!
//! Everything a probe may look at goes through [`EvidenceSource`]: path
//! metadata, globbing, whole-file reads and capturing the stdout of a command.
//! [`HostEvidence`] answers these queries from the running system.

use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

use log::trace;

use crate::{exe::RunAndCheck, path};

#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Command '{command}' {explanation}")]
    Execute {
        command: String,
        explanation: String,
    },
}

/// Queries against the state of a host.
///
/// Implementations must not modify the host. Paths are always absolute host
/// paths such as `/proc/self/status`.
pub trait EvidenceSource {
    /// Returns whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns whether `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Returns whether `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns the paths matching a glob `pattern`, in sorted order.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, EvidenceError>;

    /// Reads the whole file at `path`.
    fn read_to_string(&self, path: &Path) -> Result<String, EvidenceError>;

    /// Runs `program` with `args` and returns its stdout. A non-zero exit is an
    /// error.
    fn exec(&self, program: &str, args: &[&str]) -> Result<String, EvidenceError>;
}

impl<E: EvidenceSource + ?Sized> EvidenceSource for &E {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, EvidenceError> {
        (**self).glob(pattern)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, EvidenceError> {
        (**self).read_to_string(path)
    }

    fn exec(&self, program: &str, args: &[&str]) -> Result<String, EvidenceError> {
        (**self).exec(program, args)
    }
}

/// Evidence from the live system.
///
/// With a root set, every filesystem query is answered from beneath that
/// directory instead of `/`. Commands always run on the current system.
#[derive(Debug, Clone, Default)]
pub struct HostEvidence {
    root: Option<PathBuf>,
}

impl HostEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspects a host filesystem mounted at `root`, e.g. `/host` inside a
    /// container.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => path::join_relative(root, path),
            None => path.to_path_buf(),
        }
    }
}

impl EvidenceSource for HostEvidence {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, EvidenceError> {
        let full_pattern = match &self.root {
            Some(root) => format!(
                "{}/{}",
                glob::Pattern::escape(&root.to_string_lossy()).trim_end_matches('/'),
                pattern.trim_start_matches('/')
            ),
            None => pattern.to_owned(),
        };
        trace!("Globbing '{full_pattern}'");

        let paths = glob::glob(&full_pattern).map_err(|source| EvidenceError::Glob {
            pattern: full_pattern.clone(),
            source,
        })?;

        // Unreadable entries are skipped, same as a shell glob would.
        Ok(paths
            .filter_map(Result::ok)
            .filter_map(|found| match &self.root {
                Some(root) => path::unjoin_relative(root, found),
                None => Some(found),
            })
            .collect())
    }

    fn read_to_string(&self, path: &Path) -> Result<String, EvidenceError> {
        let resolved = self.resolve(path);
        trace!("Reading '{}'", resolved.display());
        std::fs::read_to_string(&resolved).map_err(|source| EvidenceError::Read {
            path: resolved,
            source,
        })
    }

    fn exec(&self, program: &str, args: &[&str]) -> Result<String, EvidenceError> {
        Command::new(program).args(args).output_and_check()
    }
}
