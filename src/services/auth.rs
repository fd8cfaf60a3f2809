//! Authorization gate
//! 
//! Decides whether an actor may perform an action, as a pure function over
//! the resolved role, the action and (for ownership-scoped actions) the
//! target event. Every state-mutating service operation asks the gate before
//! touching storage.

use std::fmt;
use crate::models::{Account, Event, Role};
use crate::services::role::RoleResolver;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::logging;

pub const ADMIN_ONLY: &str = "Admin access only.";
pub const NOT_ALLOWED: &str = "You are not allowed to view this page.";
pub const NOT_OWNER: &str = "You can only manage your own events.";

/// Every action the engine guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // admin
    ReviewEvents,
    ApproveEvent,
    DeclineEvent,
    ManageUsers,
    ViewAllFeedback,
    ViewAdminDashboard,
    // organizer
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    ViewEventFeedback,
    ViewOrganizerDashboard,
    ListOwnEvents,
    EditOrganizerProfile,
    // attendee
    BrowseEvents,
    ListJoinedEvents,
    JoinEvent,
    LeaveEvent,
    SubmitFeedback,
    EditAttendeeProfile,
    // any authenticated actor
    ViewEventDetail,
}

/// Which role an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Admin,
    Organizer,
    Attendee,
    Shared,
}

impl Action {
    pub fn scope(&self) -> Scope {
        match self {
            Action::ReviewEvents
            | Action::ApproveEvent
            | Action::DeclineEvent
            | Action::ManageUsers
            | Action::ViewAllFeedback
            | Action::ViewAdminDashboard => Scope::Admin,
            Action::CreateEvent
            | Action::UpdateEvent
            | Action::DeleteEvent
            | Action::ViewEventFeedback
            | Action::ViewOrganizerDashboard
            | Action::ListOwnEvents
            | Action::EditOrganizerProfile => Scope::Organizer,
            Action::BrowseEvents
            | Action::ListJoinedEvents
            | Action::JoinEvent
            | Action::LeaveEvent
            | Action::SubmitFeedback
            | Action::EditAttendeeProfile => Scope::Attendee,
            Action::ViewEventDetail => Scope::Shared,
        }
    }

    /// Organizer actions that only the event's organizer may perform
    pub fn requires_ownership(&self) -> bool {
        matches!(self, Action::UpdateEvent | Action::DeleteEvent | Action::ViewEventFeedback)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

pub struct AuthorizationGate;

impl AuthorizationGate {
    /// Decide whether `actor` may perform `action`
    ///
    /// Ownership-scoped actions check ownership only when `target` is given,
    /// so services can run the role check before loading the event and the
    /// ownership check right after.
    pub fn authorize(actor: &Account, action: Action, target: Option<&Event>) -> Decision {
        let role = RoleResolver::resolve(actor);

        match action.scope() {
            Scope::Shared => Decision::Allowed,
            Scope::Admin if role == Role::Admin => Decision::Allowed,
            Scope::Admin => Decision::Denied(ADMIN_ONLY.to_string()),
            Scope::Organizer if role == Role::Organizer => match target {
                Some(event) if action.requires_ownership() && event.organizer_id != actor.id => {
                    Decision::Denied(NOT_OWNER.to_string())
                }
                _ => Decision::Allowed,
            },
            Scope::Attendee if role == Role::Attendee => Decision::Allowed,
            Scope::Organizer | Scope::Attendee => Decision::Denied(NOT_ALLOWED.to_string()),
        }
    }

    /// Like [`authorize`](Self::authorize) but turns a denial into an error
    pub fn require(actor: &Account, action: Action, target: Option<&Event>) -> Result<()> {
        match Self::authorize(actor, action, target) {
            Decision::Allowed => Ok(()),
            Decision::Denied(reason) => {
                logging::log_denial(actor.id, &action.to_string(), &reason);
                Err(EventDeskError::PermissionDenied(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, Profile};
    use chrono::Utc;

    fn actor(id: i64, role: Option<Role>, is_superuser: bool) -> Account {
        Account {
            id,
            username: format!("user{}", id),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_superuser,
            is_active: true,
            date_joined: Utc::now(),
            profile: role.map(|r| Profile::with_role(id, r)),
        }
    }

    fn event_owned_by(organizer_id: i64) -> Event {
        Event {
            id: 10,
            organizer_id,
            title: "Balboa workshop".to_string(),
            date: None,
            location: String::new(),
            short_description: String::new(),
            image: None,
            status: EventStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_scope() {
        let admin = actor(1, Some(Role::Admin), false);
        let superuser = actor(2, None, true);
        let organizer = actor(3, Some(Role::Organizer), false);

        assert!(AuthorizationGate::authorize(&admin, Action::ApproveEvent, None).is_allowed());
        assert!(AuthorizationGate::authorize(&superuser, Action::ManageUsers, None).is_allowed());
        assert_eq!(
            AuthorizationGate::authorize(&organizer, Action::DeclineEvent, None),
            Decision::Denied(ADMIN_ONLY.to_string())
        );
    }

    #[test]
    fn test_organizer_ownership() {
        let owner = actor(3, Some(Role::Organizer), false);
        let other = actor(4, Some(Role::Organizer), false);
        let event = event_owned_by(3);

        assert!(AuthorizationGate::authorize(&owner, Action::UpdateEvent, Some(&event)).is_allowed());
        assert_eq!(
            AuthorizationGate::authorize(&other, Action::DeleteEvent, Some(&event)),
            Decision::Denied(NOT_OWNER.to_string())
        );
        // creation has no owner yet
        assert!(AuthorizationGate::authorize(&other, Action::CreateEvent, None).is_allowed());
    }

    #[test]
    fn test_role_mismatch_is_denied() {
        let attendee = actor(5, Some(Role::Attendee), false);
        let organizer = actor(3, Some(Role::Organizer), false);
        let admin = actor(1, Some(Role::Admin), false);

        assert!(!AuthorizationGate::authorize(&attendee, Action::CreateEvent, None).is_allowed());
        assert!(!AuthorizationGate::authorize(&organizer, Action::JoinEvent, None).is_allowed());
        assert!(!AuthorizationGate::authorize(&admin, Action::JoinEvent, None).is_allowed());
        assert!(AuthorizationGate::authorize(&attendee, Action::JoinEvent, None).is_allowed());
    }

    #[test]
    fn test_profileless_account_acts_as_attendee() {
        let bare = actor(6, None, false);
        assert!(AuthorizationGate::authorize(&bare, Action::BrowseEvents, None).is_allowed());
        assert!(!AuthorizationGate::authorize(&bare, Action::ReviewEvents, None).is_allowed());
    }

    #[test]
    fn test_shared_actions_allowed_for_everyone() {
        for role in [Role::Admin, Role::Organizer, Role::Attendee] {
            let a = actor(7, Some(role), false);
            assert!(AuthorizationGate::authorize(&a, Action::ViewEventDetail, None).is_allowed());
        }
    }

    #[test]
    fn test_require_maps_denial_to_error() {
        let attendee = actor(5, Some(Role::Attendee), false);
        let err = AuthorizationGate::require(&attendee, Action::ApproveEvent, None).unwrap_err();
        assert!(matches!(err, EventDeskError::PermissionDenied(ref r) if r == ADMIN_ONLY));
    }
}
