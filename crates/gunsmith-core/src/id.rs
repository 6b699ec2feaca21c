//! Namespaced identifiers for guns and the items that own them.
//!
//! An [`Identifier`] is a `namespace:path` pair. It keys registry snapshots,
//! names items in the host, and derives the resource address of each gun
//! definition (`<namespace>/<directory>/<path>.<ext>`).

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Namespace assumed when a string carries no `namespace:` prefix.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors produced when parsing or constructing an [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier '{0}' has an empty path")]
    EmptyPath(String),
    #[error("non [a-z0-9_.-] character in namespace of identifier '{0}'")]
    InvalidNamespace(String),
    #[error("non [a-z0-9/._-] character in path of identifier '{0}'")]
    InvalidPath(String),
}

// ===========================================================================
// Identifier
// ===========================================================================

/// A `namespace:path` key. Equality, hashing, and ordering compare the
/// namespace first and then the path, by exact string value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    namespace: String,
    path: String,
}

fn valid_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

fn valid_path_char(c: char) -> bool {
    valid_namespace_char(c) || c == '/'
}

impl Identifier {
    /// Build an identifier from its two parts, validating both.
    pub fn new(namespace: &str, path: &str) -> Result<Self, IdentifierError> {
        let namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            namespace
        };
        if path.is_empty() {
            return Err(IdentifierError::EmptyPath(format!("{namespace}:{path}")));
        }
        if !namespace.chars().all(valid_namespace_char) {
            return Err(IdentifierError::InvalidNamespace(format!(
                "{namespace}:{path}"
            )));
        }
        if !path.chars().all(valid_path_char) {
            return Err(IdentifierError::InvalidPath(format!("{namespace}:{path}")));
        }
        Ok(Self::from_parts_unchecked(namespace, path))
    }

    /// Parse `namespace:path`, or a bare `path` in [`DEFAULT_NAMESPACE`].
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        match s.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }

    /// Only for parts already known to satisfy the character rules.
    pub(crate) fn from_parts_unchecked(namespace: &str, path: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resource address of this identifier's definition file, e.g.
    /// `cgm/guns/pistol.json` for `cgm:pistol` in directory `guns`.
    pub fn resource_path(&self, directory: &str, extension: &str) -> String {
        format!(
            "{}/{}/{}.{}",
            self.namespace, directory, self.path, extension
        )
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identifier::parse(&s).map_err(de::Error::custom)
    }
}
