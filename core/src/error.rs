//! Defines the error types used throughout the GitNerds library.
use thiserror::Error;

/// Represents errors that can occur while querying history or validating input.
///
/// Malformed lines in git output are never reported here: parsers skip them.
#[derive(Debug, Error)]
pub enum GitError {
    /// Failed to execute the external 'git' process.
    #[error("Unable to execute git process")]
    Execution,

    /// The output (stdout or stderr) from the 'git' process was not valid UTF-8.
    #[error("Unable to decode output from git executable")]
    Undecodable,

    /// The 'git' command executed but exited with a non-zero status.
    /// Contains the captured stdout and stderr from the failed command.
    #[error("git failed with the following stdout: {stdout} stderr: {stderr}")]
    GitError { stdout: String, stderr: String },

    /// The 'git' executable was not found in the system's PATH.
    #[error("'git' command not found. Please ensure Git is installed and that its executable is included in your system's PATH environment variable.")]
    GitNotFound,

    /// Repository at the specified path is not a valid Git repository.
    #[error("Not a valid Git repository at {0}")]
    NotAGitRepository(String),

    /// A history backend other than the git executable failed.
    #[error("History backend failed: {0}")]
    Backend(String),

    /// A command that answers with a single value returned something else.
    #[error("Unexpected output from git: {0}")]
    UnexpectedOutput(String),

    /// The requested trend period is not one of `day`, `month` or `year`.
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// The history query is inconsistent or incomplete.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The provided string is not a valid Git reference name (e.g., branch name).
    #[error("Ref name is invalid: {0}")]
    InvalidRefName(String),

    /// The provided commit hash is invalid.
    #[error("Commit hash is invalid: {0}")]
    InvalidCommitHash(String),
}

impl GitError {
    /// Returns `true` when the error came from the history backend rather than
    /// from validating caller input.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            GitError::Execution
                | GitError::Undecodable
                | GitError::GitError { .. }
                | GitError::GitNotFound
                | GitError::NotAGitRepository(_)
                | GitError::Backend(_)
                | GitError::UnexpectedOutput(_)
        )
    }
}
