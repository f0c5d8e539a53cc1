//! History backends: the only place raw git text comes from.
//!
//! Analyzers depend on the [`HistoryBackend`] trait alone, so the subprocess-based
//! [`ExecBackend`], the in-memory [`ScriptedBackend`] or any library-based
//! implementation can be swapped without touching the parsing and aggregation code.

pub mod exec;
pub mod scripted;

pub use exec::ExecBackend;
pub use scripted::ScriptedBackend;

use crate::types::Result;

use std::fmt;

/// The kinds of history query a backend must answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitCommand {
    /// History listing (`git log`), with a caller-supplied pretty format and optional numstat.
    Log,
    /// Author summary listing (`git shortlog`).
    Shortlog,
    /// Reference metadata listing (`git for-each-ref`).
    ForEachRef,
    /// Reachability counts (`git rev-list`).
    RevList,
    /// Branch name listing (`git branch`).
    Branch,
    /// Tag name listing (`git tag`).
    Tag,
    /// Name of the checked-out branch; arguments are ignored.
    CurrentBranch,
}

impl GitCommand {
    /// The git subcommand (and fixed leading arguments) this kind maps to.
    pub fn subcommand(self) -> &'static [&'static str] {
        match self {
            GitCommand::Log => &["log"],
            GitCommand::Shortlog => &["shortlog"],
            GitCommand::ForEachRef => &["for-each-ref"],
            GitCommand::RevList => &["rev-list"],
            GitCommand::Branch => &["branch"],
            GitCommand::Tag => &["tag"],
            GitCommand::CurrentBranch => &["rev-parse", "--abbrev-ref", "HEAD"],
        }
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subcommand().join(" "))
    }
}

/// Answers history queries with the exact text the corresponding git command prints.
///
/// Implementations own transport, cancellation and timeouts; a failure of any kind
/// must be returned as an error, never as partial output.
pub trait HistoryBackend {
    /// Runs one query.
    ///
    /// # Errors
    /// Any `GitError` for which `is_backend_failure()` holds.
    fn query(&self, command: GitCommand, args: &[String]) -> Result<String>;
}

impl<B: HistoryBackend + ?Sized> HistoryBackend for &B {
    fn query(&self, command: GitCommand, args: &[String]) -> Result<String> {
        (**self).query(command, args)
    }
}

impl<B: HistoryBackend + ?Sized> HistoryBackend for Box<B> {
    fn query(&self, command: GitCommand, args: &[String]) -> Result<String> {
        (**self).query(command, args)
    }
}

impl<B: HistoryBackend + ?Sized> HistoryBackend for std::sync::Arc<B> {
    fn query(&self, command: GitCommand, args: &[String]) -> Result<String> {
        (**self).query(command, args)
    }
}
