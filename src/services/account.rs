//! Account service implementation
//!
//! This service handles admin user management and the self-service profile
//! edits of attendees and organizers.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::database::store::{retry_transient, Store};
use crate::models::*;
use crate::services::auth::{Action, AuthorizationGate};
use crate::services::capacity::CapacityLedger;
use crate::services::lifecycle::EventLifecycle;
use crate::services::role::RoleResolver;
use crate::utils::clock::Clock;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::{helpers, logging};

/// Admin user list filter
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Matches username, first name, last name or email
    pub q: Option<String>,
}

impl UserFilter {
    fn matches(&self, account: &Account, needle: Option<&str>) -> bool {
        if let Some(role) = self.role {
            if account.profile.as_ref().map(|p| p.role) != Some(role) {
                return false;
            }
        }
        match needle {
            Some(q) => [&account.username, &account.first_name, &account.last_name, &account.email]
                .into_iter()
                .any(|field| helpers::contains_ignore_case(field, q)),
            None => true,
        }
    }
}

/// Account service for managing users
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        Self { store, clock, settings }
    }

    /// List accounts ordered by username
    pub async fn list_users(&self, actor: &Account, filter: UserFilter) -> Result<Vec<Account>> {
        AuthorizationGate::require(actor, Action::ManageUsers, None)?;
        debug!(user_id = actor.id, role = ?filter.role, "Listing users");

        let needle = helpers::normalize_query(filter.q.as_deref());
        let mut uow = self.store.begin().await?;
        let accounts = uow.list_accounts().await?;
        uow.commit().await?;

        Ok(accounts
            .into_iter()
            .filter(|a| filter.matches(a, needle.as_deref()))
            .collect())
    }

    /// Admin edit of another account, creating its profile when missing
    pub async fn update_user(&self, actor: &Account, user_id: i64, request: UpdateAccountRequest) -> Result<Account> {
        AuthorizationGate::require(actor, Action::ManageUsers, None)?;

        let mut uow = self.store.begin().await?;
        let mut account = uow
            .find_account(user_id)
            .await?
            .ok_or(EventDeskError::AccountNotFound { user_id })?;

        if let Some(username) = request.username {
            let username = username.trim();
            if username.is_empty() {
                return Err(EventDeskError::InvalidInput("Username is required.".to_string()));
            }
            account.username = username.to_string();
        }
        if let Some(first_name) = request.first_name {
            account.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            account.last_name = last_name.trim().to_string();
        }
        if let Some(email) = request.email {
            account.email = normalize_email(&email)?;
        }
        if let Some(is_active) = request.is_active {
            account.is_active = is_active;
        }
        if let Some(role) = request.role {
            account.profile.get_or_insert_with(|| Profile::with_role(user_id, role)).role = role;
        }

        uow.save_account(&account).await?;
        uow.commit().await?;

        logging::log_admin_action(
            actor.id,
            "update_user",
            Some(&user_id.to_string()),
            Some(RoleResolver::resolve(&account).as_str()),
        );
        Ok(account)
    }

    /// Delete an account with everything it owns; an admin cannot delete itself
    pub async fn delete_user(&self, actor: &Account, user_id: i64) -> Result<()> {
        AuthorizationGate::require(actor, Action::ManageUsers, None)?;
        if actor.id == user_id {
            warn!(user_id = actor.id, "Refused self-deletion");
            return Err(EventDeskError::PolicyViolation(
                "You cannot delete your own account.".to_string(),
            ));
        }

        retry_transient(self.settings.policy.transient_retries, "delete_user", || {
            self.delete_user_once(user_id)
        })
        .await?;

        logging::log_admin_action(actor.id, "delete_user", Some(&user_id.to_string()), None);
        Ok(())
    }

    async fn delete_user_once(&self, user_id: i64) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let joined: BTreeSet<i64> = uow
            .list_user_participations(user_id)
            .await?
            .into_iter()
            .map(|p| p.event_id)
            .collect();

        // event rows before the cascade touches participations, the order leave uses
        let mut events = Vec::with_capacity(joined.len());
        for event_id in joined {
            if let Some(event) = uow.lock_event(event_id).await? {
                events.push(event);
            }
        }

        if !uow.delete_account(user_id).await? {
            return Err(EventDeskError::AccountNotFound { user_id });
        }

        // the removed participations freed slots on events organized by others
        for mut event in events {
            if event.organizer_id == user_id {
                continue;
            }
            if let Some(capacity) = CapacityLedger::resync(uow.as_mut(), event.id).await? {
                if let Some(next) = EventLifecycle::reopen_if_space(event.status, &capacity) {
                    event.status = next;
                    event.updated_at = self.clock.now();
                    uow.save_event(&event).await?;
                }
            }
        }

        uow.commit().await
    }

    /// Attendees and organizers editing their own names and email
    pub async fn update_own_profile(&self, actor: &Account, request: UpdateProfileRequest) -> Result<Account> {
        let action = match RoleResolver::resolve(actor) {
            Role::Organizer => Action::EditOrganizerProfile,
            _ => Action::EditAttendeeProfile,
        };
        AuthorizationGate::require(actor, action, None)?;

        let email = request.email.as_deref().map(normalize_email).transpose()?;

        let mut uow = self.store.begin().await?;
        let mut account = uow
            .find_account(actor.id)
            .await?
            .ok_or(EventDeskError::AccountNotFound { user_id: actor.id })?;

        if let Some(first_name) = request.first_name {
            account.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            account.last_name = last_name.trim().to_string();
        }
        if let Some(email) = email {
            account.email = email;
        }

        uow.save_account(&account).await?;
        uow.commit().await?;

        info!(user_id = actor.id, "Profile updated");
        Ok(account)
    }
}

/// Trimmed, lower-cased and validated email; blank clears it
fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if !email.is_empty() && !helpers::is_valid_email(&email) {
        return Err(EventDeskError::InvalidInput("Enter a valid email address.".to_string()));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        assert_eq!(normalize_email("").unwrap(), "");
        assert!(normalize_email("not-an-email").is_err());
    }
}
