use crate::domain::permission::PermPair;
use std::collections::{BTreeMap, BTreeSet};

/// Snapshot of everything a user is granted through their roles.
///
/// Built fresh for each query. Iteration is lazy and can be restarted any
/// number of times; it yields `(role_name, pair)` once for every pair each
/// held role grants, in the order the roles were assigned.
#[derive(Clone, Debug, Default)]
pub struct UserPermissions {
    roles: Vec<String>,
    grants: BTreeMap<String, BTreeSet<PermPair>>,
}

impl UserPermissions {
    pub fn new(roles: Vec<String>, grants: BTreeMap<String, BTreeSet<PermPair>>) -> Self {
        Self { roles, grants }
    }

    /// Role names the user held when the snapshot was taken.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PermPair)> + '_ {
        self.roles.iter().flat_map(move |role| {
            self.grants
                .get(role)
                .into_iter()
                .flatten()
                .map(move |pair| (role.as_str(), pair))
        })
    }

    /// Returns true if any held role grants the pair.
    pub fn contains(&self, pair: &PermPair) -> bool {
        self.iter().any(|(_, granted)| granted == pair)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
