//! Role resolution
//!
//! Derives the effective role of an account from its superuser flag and
//! profile. Never fails: accounts without a profile are treated as attendees.

use crate::models::account::{Account, Role};

pub struct RoleResolver;

impl RoleResolver {
    pub fn resolve(account: &Account) -> Role {
        if account.is_superuser {
            return Role::Admin;
        }
        account
            .profile
            .as_ref()
            .map(|profile| profile.role)
            .unwrap_or(Role::Attendee)
    }
}
