//! Declarative access policy.
//!
//! Every guarded route describes its rule as a [`Policy`] and asks
//! [`Policy::evaluate`] for a [`Decision`]. Admin bypass, role lists and
//! owner-or-admin checks all live here instead of being re-implemented per
//! handler.

use uuid::Uuid;

use super::{Identity, Role};

/// What a route requires from its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy<'a> {
    /// Caller must hold one of the listed roles.
    AnyRole(&'a [Role]),
    /// Caller must be the owner of the resource (the story's `created_by`).
    Owner(Uuid),
    /// Admin only.
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Granted only because the caller is an admin.
    AllowAdminOverride,
    Deny,
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        !matches!(self, Self::Deny)
    }
}

impl Policy<'_> {
    #[must_use]
    pub fn evaluate(&self, identity: &Identity) -> Decision {
        let satisfied = match self {
            Policy::AnyRole(roles) => roles.contains(&identity.role),
            Policy::Owner(owner) => identity.id == *owner,
            Policy::Admin => false,
        };

        if satisfied {
            Decision::Allow
        } else if identity.is_admin() {
            Decision::AllowAdminOverride
        } else {
            Decision::Deny
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: "reader".to_string(),
            role,
        }
    }

    #[test]
    fn role_list_membership() {
        let author = identity(Role::Author);
        let user = identity(Role::User);

        assert_eq!(
            Policy::AnyRole(&[Role::Author]).evaluate(&author),
            Decision::Allow
        );
        assert_eq!(
            Policy::AnyRole(&[Role::Author]).evaluate(&user),
            Decision::Deny
        );
        assert_eq!(Policy::AnyRole(&[]).evaluate(&author), Decision::Deny);
    }

    #[test]
    fn admin_bypasses_every_rule() {
        let admin = identity(Role::Admin);

        for policy in [
            Policy::AnyRole(&[Role::Author]),
            Policy::Owner(Uuid::new_v4()),
            Policy::Admin,
        ] {
            let decision = policy.evaluate(&admin);
            assert_eq!(decision, Decision::AllowAdminOverride);
            assert!(decision.is_allowed());
        }
    }

    #[test]
    fn admin_listed_explicitly_is_a_plain_allow() {
        let admin = identity(Role::Admin);
        assert_eq!(
            Policy::AnyRole(&[Role::Admin]).evaluate(&admin),
            Decision::Allow
        );
    }

    #[test]
    fn ownership_is_by_id_only() {
        let author = identity(Role::Author);
        assert_eq!(Policy::Owner(author.id).evaluate(&author), Decision::Allow);
        assert_eq!(
            Policy::Owner(Uuid::new_v4()).evaluate(&author),
            Decision::Deny
        );
    }

    #[test]
    fn admin_policy_denies_everyone_else() {
        assert!(!Policy::Admin.evaluate(&identity(Role::Author)).is_allowed());
        assert!(!Policy::Admin.evaluate(&identity(Role::User)).is_allowed());
    }
}
