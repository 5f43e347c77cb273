//! Role-gated link group definitions
//!
//! A link group bundles cross-reference links surfaced alongside query
//! results. The invariant enforced downstream: a link is returned to a user
//! only if the user holds a role in the owning group's `view_roles`.

use crate::indicator::IndicatorType;
use crate::roles::{Role, User};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One cross-reference link within a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    /// Display name
    pub name: String,
    /// Link target, with `%{value}` substituted by the indicator value
    pub url: String,
    /// Indicator types this link applies to
    pub itypes: Vec<IndicatorType>,
}

/// A named, role-gated, ordered bundle of links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGroup {
    /// Unique group id
    pub id: String,
    /// Display name
    pub name: String,
    /// User who created the group; can always edit it
    pub creator: String,
    /// Ordered link definitions
    pub links: Vec<LinkDefinition>,
    /// Roles allowed to see this group's links
    pub view_roles: HashSet<Role>,
    /// Roles allowed to modify or delete the group
    pub edit_roles: HashSet<Role>,
}

impl LinkGroup {
    /// True if the user may see this group's links
    pub fn can_view(&self, user: &User) -> bool {
        user.has_any_role(&self.view_roles) || self.can_edit(user)
    }

    /// True if the user may modify or delete this group
    pub fn can_edit(&self, user: &User) -> bool {
        user.user_id == self.creator || user.has_any_role(&self.edit_roles)
    }
}
