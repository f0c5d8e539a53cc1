//! Defines core validated types: reference names, commit ids and the
//! period/bucket selectors used by the temporal analyzer.
use super::GitError;
#[cfg(feature = "serde")]
use serde::{de, Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use std::{
    fmt,
    fmt::{Display, Formatter},
    result::Result as stdResult,
};

/// A specialized `Result` type for GitNerds operations.
pub type Result<A> = stdResult<A, GitError>;

/// Represents a validated Git branch name (or more generally, a reference name).
///
/// Can be created from a string using `FromStr`, which validates the format
/// according to Git's reference naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct BranchName {
    pub(crate) value: String,
}

impl FromStr for BranchName {
    type Err = GitError;

    /// Parses a string into a `BranchName`, returning `Err(GitError::InvalidRefName)` if
    /// the string does not conform to Git's reference naming rules.
    fn from_str(s: &str) -> Result<Self> {
        if is_valid_reference_name(s) {
            Ok(BranchName {
                value: String::from(s),
            })
        } else {
            Err(GitError::InvalidRefName(s.to_string()))
        }
    }
}

impl Display for BranchName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for BranchName {
    /// Deserializes a string into a `BranchName`, validating the format.
    fn deserialize<D>(deserializer: D) -> stdResult<BranchName, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BranchName::from_str(&s).map_err(de::Error::custom)
    }
}

// --- Internal validation logic ---

const INVALID_REFERENCE_CHARS: [char; 5] = [' ', '~', '^', ':', '\\'];
const INVALID_REFERENCE_START: &str = "-";
const INVALID_REFERENCE_END: &str = ".";

/// Checks if a string is a valid Git reference name based on common rules.
///
/// Rules approximated from `git check-ref-format`.
/// See: https://git-scm.com/docs/git-check-ref-format
fn is_valid_reference_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(INVALID_REFERENCE_START)
        && !name.starts_with('.')
        && !name.starts_with('/')
        && !name.ends_with(INVALID_REFERENCE_END)
        && !name.ends_with('/')
        && name.chars().all(|c| {
            !c.is_ascii_control() && INVALID_REFERENCE_CHARS.iter().all(|invalid| c != *invalid)
        })
        && !name.contains("/.")
        && !name.contains("@{")
        && !name.contains("..")
        && name != "@"
        && !name.contains("//")
        && !name.contains("/*")
        && !name.contains('?')
        && !name.contains('[')
        && !name.contains(']')
}

// --- CommitHash Type ---

/// An opaque commit id as printed by git (full or abbreviated).
///
/// Only emptiness and embedded whitespace are rejected; the value is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct CommitHash {
    value: String,
}

impl FromStr for CommitHash {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self> {
        if !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            Ok(CommitHash {
                value: s.to_string(),
            })
        } else {
            Err(GitError::InvalidCommitHash(s.to_string()))
        }
    }
}

impl Display for CommitHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl AsRef<str> for CommitHash {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

// --- Temporal selectors ---

/// A time dimension commits can be bucketed along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum TimeBucket {
    Day,
    Month,
    Year,
    Weekday,
    Hour,
    Timezone,
}

impl TimeBucket {
    /// All dimensions, in the order reports list them.
    pub const ALL: [TimeBucket; 6] = [
        TimeBucket::Day,
        TimeBucket::Month,
        TimeBucket::Year,
        TimeBucket::Weekday,
        TimeBucket::Hour,
        TimeBucket::Timezone,
    ];

    /// The `--date=` directive that makes `git log` print this bucket's key.
    ///
    /// Every `format:` directive renders in the commit's own recorded offset.
    pub fn date_directive(self) -> &'static str {
        match self {
            TimeBucket::Day => "short",
            TimeBucket::Month => "format:%Y-%m",
            TimeBucket::Year => "format:%Y",
            TimeBucket::Weekday => "format:%A",
            TimeBucket::Hour => "format:%H",
            TimeBucket::Timezone => "format:%z",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeBucket::Day => "day",
            TimeBucket::Month => "month",
            TimeBucket::Year => "year",
            TimeBucket::Weekday => "weekday",
            TimeBucket::Hour => "hour",
            TimeBucket::Timezone => "timezone",
        }
    }
}

impl FromStr for TimeBucket {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self> {
        TimeBucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == s)
            .ok_or_else(|| GitError::InvalidPeriod(s.to_string()))
    }
}

impl Display for TimeBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The granularity of a commit trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum TrendPeriod {
    Day,
    Month,
    Year,
}

impl TrendPeriod {
    pub(crate) fn bucket(self) -> TimeBucket {
        match self {
            TrendPeriod::Day => TimeBucket::Day,
            TrendPeriod::Month => TimeBucket::Month,
            TrendPeriod::Year => TimeBucket::Year,
        }
    }
}

impl FromStr for TrendPeriod {
    type Err = GitError;

    /// Accepts exactly `day`, `month` or `year`; anything else is `GitError::InvalidPeriod`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "day" => Ok(TrendPeriod::Day),
            "month" => Ok(TrendPeriod::Month),
            "year" => Ok(TrendPeriod::Year),
            other => Err(GitError::InvalidPeriod(other.to_string())),
        }
    }
}

impl Display for TrendPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.bucket().as_str())
    }
}

// --- Tests ---
