//! An in-memory backend that answers from canned output.
//!
//! Useful for tests and for replaying captured git output without a repository.

use crate::backend::{GitCommand, HistoryBackend};
use crate::error::GitError;
use crate::types::Result;

use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    Failure(String),
}

#[derive(Debug, Clone)]
struct Rule {
    command: GitCommand,
    fragment: Option<String>,
    reply: Reply,
}

impl Rule {
    fn matches(&self, command: GitCommand, args: &[String]) -> bool {
        self.command == command
            && self
                .fragment
                .as_deref()
                .map_or(true, |f| args.iter().any(|a| a.contains(f)))
    }
}

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: GitCommand,
    pub args: Vec<String>,
}

/// Answers queries from rules registered up front, first match wins.
///
/// A rule matches a call when the command kind is equal and, if a fragment was
/// given, at least one argument contains it. Calls matching no rule fail with
/// `GitError::Backend`.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    rules: Vec<Rule>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every `command` call with `output`.
    pub fn on(self, command: GitCommand, output: impl Into<String>) -> Self {
        self.push(command, None, Reply::Output(output.into()))
    }

    /// Answers `command` calls having an argument that contains `fragment`.
    pub fn on_arg(self, command: GitCommand, fragment: &str, output: impl Into<String>) -> Self {
        self.push(command, Some(fragment.to_string()), Reply::Output(output.into()))
    }

    /// Fails every `command` call with `GitError::Backend(message)`.
    pub fn fail(self, command: GitCommand, message: impl Into<String>) -> Self {
        self.push(command, None, Reply::Failure(message.into()))
    }

    /// Fails `command` calls having an argument that contains `fragment`.
    pub fn fail_arg(self, command: GitCommand, fragment: &str, message: impl Into<String>) -> Self {
        self.push(command, Some(fragment.to_string()), Reply::Failure(message.into()))
    }

    fn push(mut self, command: GitCommand, fragment: Option<String>, reply: Reply) -> Self {
        self.rules.push(Rule {
            command,
            fragment,
            reply,
        });
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl HistoryBackend for ScriptedBackend {
    fn query(&self, command: GitCommand, args: &[String]) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                command,
                args: args.to_vec(),
            });
        }

        match self.rules.iter().find(|rule| rule.matches(command, args)) {
            Some(Rule {
                reply: Reply::Output(output),
                ..
            }) => Ok(output.clone()),
            Some(Rule {
                reply: Reply::Failure(message),
                ..
            }) => Err(GitError::Backend(message.clone())),
            None => Err(GitError::Backend(format!(
                "no scripted reply for `git {command} {}`",
                args.join(" ")
            ))),
        }
    }
}
