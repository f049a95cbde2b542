use serde::{Deserialize, Serialize};

/// Role entity: represents a role in the RBAC system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub description: String,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A role given either as an entity or by name.
#[derive(Clone, Copy, Debug)]
pub enum RoleRef<'a> {
    Role(&'a Role),
    Name(&'a str),
}

impl<'a> RoleRef<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            RoleRef::Role(role) => role.name.as_str(),
            RoleRef::Name(name) => name,
        }
    }
}

impl<'a> From<&'a Role> for RoleRef<'a> {
    fn from(role: &'a Role) -> Self {
        RoleRef::Role(role)
    }
}

impl<'a> From<&'a str> for RoleRef<'a> {
    fn from(name: &'a str) -> Self {
        RoleRef::Name(name)
    }
}

impl<'a> From<&'a String> for RoleRef<'a> {
    fn from(name: &'a String) -> Self {
        RoleRef::Name(name.as_str())
    }
}
