//! Error types for hierarchy building, scene mutation and document import.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One structural problem found while building a puppet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildIssue {
    /// `member` declares a parent that was not materialized.
    MissingParent { member: String, parent: String },
    /// `member` borrows its pivot from a group the asset does not have.
    UnknownPivot { member: String, pivot: String },
    /// Members whose parent links form a cycle, in first-seen order.
    Cycle { members: Vec<String> },
    /// `member` lists a variant candidate the asset does not have.
    UnknownVariant { member: String, variant: String },
    /// The rig lists `member` more than once.
    DuplicateMember { member: String },
    /// The puppet asset could not be obtained at all.
    AssetUnavailable { path: String },
}

impl fmt::Display for BuildIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildIssue::MissingParent { member, parent } => {
                write!(f, "member '{member}' has unknown parent '{parent}'")
            }
            BuildIssue::UnknownPivot { member, pivot } => {
                write!(f, "member '{member}' references unknown pivot group '{pivot}'")
            }
            BuildIssue::Cycle { members } => {
                write!(f, "parent cycle through [{}]", members.join(", "))
            }
            BuildIssue::UnknownVariant { member, variant } => {
                write!(f, "member '{member}' lists unknown variant group '{variant}'")
            }
            BuildIssue::DuplicateMember { member } => {
                write!(f, "member '{member}' is listed more than once")
            }
            BuildIssue::AssetUnavailable { path } => write!(f, "puppet asset '{path}' unavailable"),
        }
    }
}

/// Structural error: the hierarchy description cannot form a forest.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("puppet build failed: {}", join_display(.issues))]
pub struct BuildError {
    pub issues: Vec<BuildIssue>,
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl BuildError {
    pub fn asset_unavailable(path: impl Into<String>) -> Self {
        Self {
            issues: vec![BuildIssue::AssetUnavailable { path: path.into() }],
        }
    }

    /// Every member named by any issue, without duplicates, in issue order.
    pub fn members(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for issue in &self.issues {
            let names: Vec<&str> = match issue {
                BuildIssue::MissingParent { member, .. }
                | BuildIssue::UnknownPivot { member, .. }
                | BuildIssue::UnknownVariant { member, .. }
                | BuildIssue::DuplicateMember { member } => vec![member.as_str()],
                BuildIssue::Cycle { members } => members.iter().map(String::as_str).collect(),
                BuildIssue::AssetUnavailable { .. } => Vec::new(),
            };
            for n in names {
                if !out.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }
}

/// A mutation was refused because it would break a scene invariant.
/// The scene is left unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum InvariantViolation {
    #[error("puppet '{name}' already exists")]
    DuplicatePuppet { name: String },

    #[error("object '{name}' already exists")]
    DuplicateObject { name: String },

    #[error("unknown puppet '{name}'")]
    UnknownPuppet { name: String },

    #[error("unknown member '{member}' on puppet '{puppet}'")]
    UnknownMember { puppet: String, member: String },

    #[error("unknown object '{name}'")]
    UnknownObject { name: String },

    #[error("frame {frame} is outside the playback range [{start}, {end}]")]
    FrameOutOfRange { frame: u32, start: u32, end: u32 },

    #[error("invalid playback bounds: start {start} > end {end}")]
    InvalidBounds { start: u32, end: u32 },

    #[error("fps must be > 0")]
    InvalidFps,

    #[error("scene size must be positive, got {width}x{height}")]
    InvalidSceneSize { width: u32, height: u32 },

    #[error("scale must be finite and >= 0, got {scale}")]
    InvalidScale { scale: f64 },

    #[error("{what} must be finite")]
    NonFinite { what: String },

    #[error("puppet '{puppet}' is still referenced by objects [{}]", .objects.join(", "))]
    PuppetInUse { puppet: String, objects: Vec<String> },

    #[error("object '{name}' is not attached")]
    NotAttached { name: String },

    #[error("member '{member}' on puppet '{puppet}' is not a root")]
    NotARoot { puppet: String, member: String },

    #[error("variant '{variant}' is not declared for member '{member}' on puppet '{puppet}'")]
    UnknownVariant {
        puppet: String,
        member: String,
        variant: String,
    },
}

/// A problem found while importing a scene document. `path` is a JSON-pointer-like
/// location such as `keyframes[2].objects.hat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIssue {
    pub path: String,
    pub message: String,
}

impl DocumentIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DocumentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Import data was missing required fields or had the wrong shape.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("malformed scene document ({} issue(s)): {}", .issues.len(), join_display(.issues))]
pub struct MalformedDocument {
    pub issues: Vec<DocumentIssue>,
}

/// Any error the scene layer can return.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error(transparent)]
    Structural(#[from] BuildError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Malformed(#[from] MalformedDocument),
}

impl SceneError {
    /// Category used in log lines.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            SceneError::Structural(_) => "structural",
            SceneError::Invariant(_) => "invariant",
            SceneError::Malformed(_) => "document",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_lists_members_once() {
        let err = BuildError {
            issues: vec![
                BuildIssue::Cycle {
                    members: vec!["a".into(), "b".into()],
                },
                BuildIssue::MissingParent {
                    member: "a".into(),
                    parent: "z".into(),
                },
            ],
        };
        assert_eq!(err.members(), vec!["a", "b"]);
        let msg = err.to_string();
        assert!(msg.contains("cycle through [a, b]"), "{msg}");
    }

    #[test]
    fn scene_error_wraps_invariant() {
        let err: SceneError = InvariantViolation::InvalidFps.into();
        assert_eq!(err.category(), "invariant");
        assert_eq!(err.to_string(), "fps must be > 0");
    }

    #[test]
    fn puppet_in_use_message() {
        let err = InvariantViolation::PuppetInUse {
            puppet: "manu".into(),
            objects: vec!["hat".into(), "cane".into()],
        };
        assert_eq!(
            err.to_string(),
            "puppet 'manu' is still referenced by objects [hat, cane]"
        );
    }
}
