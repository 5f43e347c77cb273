//! Roles and the requesting-user view
//!
//! Authentication itself lives behind the server's `Auth` capability; the
//! core only needs to know who is asking and which roles they hold.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Roles an administrator may assign to users, in the order the roles
/// listing API reports them
pub const ASSIGNABLE_ROLES: [&str; 4] = ["admin", "usersAdmin", "pivotAdmin", "pivotUser"];

/// A named role, matched by exact string equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role(pub String);

impl Role {
    /// Role every fresh install grants its single anonymous user
    pub fn admin() -> Self {
        Role("admin".into())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role(s.to_string())
    }
}

/// The authenticated user a query runs on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier
    pub user_id: String,
    /// Roles held by this user
    pub roles: HashSet<Role>,
}

impl User {
    /// Build a user from an id and role names
    pub fn new(user_id: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        User {
            user_id: user_id.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// True if the user holds at least one of the given roles
    pub fn has_any_role(&self, required: &HashSet<Role>) -> bool {
        !self.roles.is_disjoint(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_roles_do_not_match() {
        let user = User::new("alice", [Role::from("analyst")]);
        let required: HashSet<Role> = [Role::from("admin")].into();
        assert!(!user.has_any_role(&required));
    }

    #[test]
    fn catalogue_includes_the_default_admin_role() {
        assert!(ASSIGNABLE_ROLES.contains(&Role::admin().0.as_str()));
    }

    #[test]
    fn one_shared_role_matches() {
        let user = User::new("bob", [Role::from("analyst"), Role::from("ops")]);
        let required: HashSet<Role> = [Role::from("ops"), Role::from("admin")].into();
        assert!(user.has_any_role(&required));
    }
}
