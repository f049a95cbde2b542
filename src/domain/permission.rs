use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission pair value object: the `(object, operation)` identity of an authorizable action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermPair {
    pub object_name: String,
    pub operation_name: String,
}

impl PermPair {
    pub fn new(object_name: impl Into<String>, operation_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            operation_name: operation_name.into(),
        }
    }

    /// Returns true when both components are present.
    pub fn is_well_formed(&self) -> bool {
        !self.object_name.is_empty() && !self.operation_name.is_empty()
    }
}

impl fmt::Display for PermPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_name, self.operation_name)
    }
}

impl From<(&str, &str)> for PermPair {
    fn from((object_name, operation_name): (&str, &str)) -> Self {
        Self::new(object_name, operation_name)
    }
}

/// Permission entity: a named, described permission pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub description: String,
    pub object_name: String,
    pub operation_name: String,
}

impl Permission {
    /// Creates a new Permission.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        object_name: impl Into<String>,
        operation_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            object_name: object_name.into(),
            operation_name: operation_name.into(),
        }
    }

    /// The pair this permission grants.
    pub fn pair(&self) -> PermPair {
        PermPair::new(self.object_name.as_str(), self.operation_name.as_str())
    }

    pub fn matches(&self, pair: &PermPair) -> bool {
        self.object_name == pair.object_name && self.operation_name == pair.operation_name
    }
}

/// A permission given either as a stored entity or as a bare pair.
#[derive(Clone, Debug)]
pub enum PermRef<'a> {
    Permission(&'a Permission),
    Pair(PermPair),
}

impl PermRef<'_> {
    /// Resolves the reference to its pair.
    pub fn into_pair(self) -> PermPair {
        match self {
            PermRef::Permission(perm) => perm.pair(),
            PermRef::Pair(pair) => pair,
        }
    }
}

impl<'a> From<&'a Permission> for PermRef<'a> {
    fn from(perm: &'a Permission) -> Self {
        PermRef::Permission(perm)
    }
}

impl From<PermPair> for PermRef<'_> {
    fn from(pair: PermPair) -> Self {
        PermRef::Pair(pair)
    }
}

impl From<&PermPair> for PermRef<'_> {
    fn from(pair: &PermPair) -> Self {
        PermRef::Pair(pair.clone())
    }
}

impl From<(&str, &str)> for PermRef<'_> {
    fn from(pair: (&str, &str)) -> Self {
        PermRef::Pair(pair.into())
    }
}
