//! Backend that shells out to the `git` executable.

use crate::backend::{GitCommand, HistoryBackend};
use crate::error::GitError;
use crate::types::Result;

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str;

/// Runs git commands inside a repository's working directory.
#[derive(Debug, Clone)]
pub struct ExecBackend {
    location: PathBuf,
}

impl ExecBackend {
    /// Opens an existing Git repository.
    ///
    /// This checks that the path is actually inside a work tree
    /// by running `git rev-parse --is-inside-work-tree`.
    ///
    /// # Errors
    /// Returns `GitError::GitNotFound` if git is missing, and
    /// `GitError::NotAGitRepository` for any other failure.
    pub fn open<P: AsRef<Path>>(p: P) -> Result<ExecBackend> {
        let backend = ExecBackend {
            location: PathBuf::from(p.as_ref()),
        };

        match execute_git_fn(&backend.location, ["rev-parse", "--is-inside-work-tree"], |output| {
            Ok(output.trim() == "true")
        }) {
            Ok(true) => Ok(backend),
            Err(GitError::GitNotFound) => Err(GitError::GitNotFound),
            _ => Err(GitError::NotAGitRepository(
                p.as_ref().display().to_string(),
            )),
        }
    }

    /// The directory commands run in.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Whether `HEAD` resolves to a commit; false on a freshly initialised repository.
    fn head_is_born(&self) -> Result<bool> {
        match execute_git_fn(&self.location, ["rev-parse", "--verify", "-q", "HEAD"], |_| Ok(())) {
            Ok(()) => Ok(true),
            Err(GitError::GitError { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl HistoryBackend for ExecBackend {
    fn query(&self, command: GitCommand, args: &[String]) -> Result<String> {
        let mut full: Vec<&str> = Vec::new();
        if command == GitCommand::Log {
            // Root commits carry no file changes.
            full.extend(["-c", "log.showRoot=false"]);
        }
        full.extend(command.subcommand());
        if command != GitCommand::CurrentBranch {
            full.extend(args.iter().map(String::as_str));
        }
        tracing::debug!(command = %command, args = ?args, "running git");

        let result = execute_git_fn(&self.location, full, |output| {
            Ok(if command == GitCommand::CurrentBranch {
                output.trim().to_string()
            } else {
                output.to_string()
            })
        });

        match result {
            Err(err @ GitError::GitError { .. })
                if matches!(command, GitCommand::Log | GitCommand::Shortlog) =>
            {
                if self.head_is_born()? {
                    Err(err)
                } else {
                    tracing::debug!(command = %command, "HEAD has no commits yet");
                    Ok(String::new())
                }
            }
            other => other,
        }
    }
}

/// Executes a Git command and processes its stdout on success using a closure.
/// Handles errors, including capturing stderr on failure.
fn execute_git_fn<I, S, P, F, R>(p: P, args: I, process: F) -> Result<R>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    P: AsRef<Path>,
    F: FnOnce(&str) -> Result<R>,
{
    let command_result = Command::new("git")
        .current_dir(p.as_ref())
        .args(args)
        .stdin(Stdio::null())
        .output();

    match command_result {
        Ok(output) => {
            if output.status.success() {
                match str::from_utf8(&output.stdout) {
                    Ok(stdout_str) => process(stdout_str),
                    Err(_) => Err(GitError::Undecodable),
                }
            } else {
                let stdout = str::from_utf8(&output.stdout)
                    .map(|s| s.trim_end().to_owned())
                    .unwrap_or_else(|_| String::from("[stdout: undecodable UTF-8]"));
                let stderr = str::from_utf8(&output.stderr)
                    .map(|s| s.trim_end().to_owned())
                    .unwrap_or_else(|_| String::from("[stderr: undecodable UTF-8]"));
                Err(GitError::GitError { stdout, stderr })
            }
        }
        Err(e) => {
            if e.kind() == ErrorKind::NotFound {
                Err(GitError::GitNotFound)
            } else {
                tracing::debug!(error = %e, "failed to spawn git");
                Err(GitError::Execution)
            }
        }
    }
}
