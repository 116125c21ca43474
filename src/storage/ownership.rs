// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership scoping for task storage.
//!
//! Every task access carries an [`AccessScope`] built from the caller, so
//! the owner filter cannot be forgotten at a call site.

use crate::auth::{AuthenticatedUser, Role};
use crate::models::Task;

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;
}

impl OwnedResource for Task {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }
}

/// Which records a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// Admin access: no owner filter.
    Unrestricted,
    /// Only records owned by this user ID.
    OwnedBy(String),
}

impl AccessScope {
    /// Derive the scope from the caller's role.
    pub fn for_user(user: &AuthenticatedUser) -> Self {
        if user.role.has_privilege(Role::Admin) {
            AccessScope::Unrestricted
        } else {
            AccessScope::OwnedBy(user.user_id.clone())
        }
    }

    /// The owner filter, if any.
    pub fn owner(&self) -> Option<&str> {
        match self {
            AccessScope::Unrestricted => None,
            AccessScope::OwnedBy(owner) => Some(owner),
        }
    }

    /// Whether the resource is visible in this scope.
    pub fn permits<R: OwnedResource + ?Sized>(&self, resource: &R) -> bool {
        match self {
            AccessScope::Unrestricted => true,
            AccessScope::OwnedBy(owner) => resource.owner_user_id() == owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owner: String,
    }

    impl OwnedResource for TestResource {
        fn owner_user_id(&self) -> &str {
            &self.owner
        }
    }

    fn make_user(user_id: &str, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
            username: format!("{user_id}-name"),
            role,
            expires_at: 0,
        }
    }

    #[test]
    fn regular_user_is_scoped_to_self() {
        let scope = AccessScope::for_user(&make_user("user_123", Role::User));
        assert_eq!(scope, AccessScope::OwnedBy("user_123".into()));
        assert_eq!(scope.owner(), Some("user_123"));
    }

    #[test]
    fn admin_is_unrestricted() {
        let scope = AccessScope::for_user(&make_user("admin_1", Role::Admin));
        assert_eq!(scope, AccessScope::Unrestricted);
        assert_eq!(scope.owner(), None);
    }

    #[test]
    fn permits_owner_only() {
        let resource = TestResource {
            owner: "user_123".to_string(),
        };
        assert!(AccessScope::OwnedBy("user_123".into()).permits(&resource));
        assert!(!AccessScope::OwnedBy("user_456".into()).permits(&resource));
        assert!(AccessScope::Unrestricted.permits(&resource));
    }
}
