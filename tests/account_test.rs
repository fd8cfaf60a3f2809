//! Admin user management and self-service profile edits

mod helpers;

use assert_matches::assert_matches;
use eventdesk::models::*;
use eventdesk::services::{JoinOutcome, UserFilter};
use eventdesk::utils::errors::{ErrorCategory, EventDeskError};
use helpers::*;

#[tokio::test]
async fn test_list_users_filters_by_role_and_text() {
    let ctx = TestContext::new();
    let admin = ctx.admin("ada").await;
    ctx.organizer("olga").await;
    ctx.attendee("alice").await;
    ctx.attendee("bob").await;
    let accounts = &ctx.services.account_service;

    let all = accounts.list_users(&admin, UserFilter::default()).await.unwrap();
    let names: Vec<&str> = all.iter().map(|a| a.username.as_str()).collect();
    assert_eq!(names, vec!["ada", "alice", "bob", "olga"]);

    let filter = UserFilter { role: Some(Role::Attendee), q: None };
    assert_eq!(accounts.list_users(&admin, filter).await.unwrap().len(), 2);

    let filter = UserFilter { role: None, q: Some("BOB@EXAMPLE".into()) };
    let found = accounts.list_users(&admin, filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "bob");
}

#[tokio::test]
async fn test_non_admins_cannot_manage_users() {
    let ctx = TestContext::new();
    let olga = ctx.organizer("olga").await;
    let alice = ctx.attendee("alice").await;

    let err = ctx.services.account_service.list_users(&olga, UserFilter::default()).await.unwrap_err();
    assert_eq!(err.user_message(), "Admin access only.");
    let err = ctx.services.account_service.delete_user(&alice, olga.id).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Authorization);
}

#[tokio::test]
async fn test_update_user_assigns_role_to_profileless_account() {
    let ctx = TestContext::new();
    let admin = ctx.admin("ada").await;
    let plain = ctx.account("plain", None).await;

    let request = UpdateAccountRequest {
        role: Some(Role::Organizer),
        email: Some("Plain@Example.com".into()),
        ..Default::default()
    };
    let updated = ctx.services.account_service.update_user(&admin, plain.id, request).await.unwrap();
    assert_eq!(updated.profile.as_ref().map(|p| p.role), Some(Role::Organizer));
    assert_eq!(updated.email, "plain@example.com");

    // the new role takes effect for the gate right away
    let event = ctx.pending_event(&updated, "Promoted", None, 5).await;
    assert_eq!(event.organizer_id, plain.id);
}

#[tokio::test]
async fn test_update_user_rejects_duplicate_username() {
    let ctx = TestContext::new();
    let admin = ctx.admin("ada").await;
    let alice = ctx.attendee("alice").await;
    ctx.attendee("bob").await;

    let request = UpdateAccountRequest { username: Some("bob".into()), ..Default::default() };
    let err = ctx.services.account_service.update_user(&admin, alice.id, request).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Constraint);
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let ctx = TestContext::new();
    let admin = ctx.admin("ada").await;

    let err = ctx.services.account_service.delete_user(&admin, admin.id).await.unwrap_err();
    assert_matches!(err, EventDeskError::PolicyViolation(_));
    assert_eq!(ctx.services.account_service.list_users(&admin, UserFilter::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleting_attendee_frees_their_slots() {
    let ctx = TestContext::new();
    let admin = ctx.admin("ada").await;
    let organizer = ctx.organizer("olga").await;
    let alice = ctx.attendee("alice").await;
    let bob = ctx.attendee("bob").await;
    let event = ctx.approved_event(&organizer, "One seat", None, 1).await;

    ctx.services.participation_service.join(&alice, event.id).await.unwrap();
    ctx.services.feedback_service.submit(&alice, event.id, 5, "").await.unwrap();
    assert_eq!(ctx.event(event.id).await.unwrap().status, EventStatus::Full);

    ctx.services.account_service.delete_user(&admin, alice.id).await.unwrap();

    assert_eq!(ctx.event(event.id).await.unwrap().status, EventStatus::Approved);
    assert_eq!(ctx.capacity(event.id).await.unwrap().current_participants, 0);
    assert_eq!(ctx.services.feedback_service.average(event.id).await.unwrap().count, 0);
    assert_matches!(
        ctx.services.participation_service.join(&bob, event.id).await.unwrap(),
        JoinOutcome::Joined { .. }
    );
}

#[tokio::test]
async fn test_deleting_organizer_removes_their_events() {
    let ctx = TestContext::new();
    let admin = ctx.admin("ada").await;
    let organizer = ctx.organizer("olga").await;
    let event = ctx.approved_event(&organizer, "Orphan", None, 5).await;

    ctx.services.account_service.delete_user(&admin, organizer.id).await.unwrap();
    assert!(ctx.event(event.id).await.is_none());
    assert!(ctx.capacity(event.id).await.is_none());

    let err = ctx.services.account_service.delete_user(&admin, organizer.id).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_update_own_profile() {
    let ctx = TestContext::new();
    let alice = ctx.attendee("alice").await;
    let olga = ctx.organizer("olga").await;
    let admin = ctx.admin("ada").await;
    let accounts = &ctx.services.account_service;

    let request = UpdateProfileRequest {
        first_name: Some(" Alicia ".into()),
        email: Some("ALICIA@Example.org".into()),
        ..Default::default()
    };
    let updated = accounts.update_own_profile(&alice, request).await.unwrap();
    assert_eq!(updated.first_name, "Alicia");
    assert_eq!(updated.email, "alicia@example.org");

    let request = UpdateProfileRequest { last_name: Some("Organizer".into()), ..Default::default() };
    assert_eq!(accounts.update_own_profile(&olga, request).await.unwrap().last_name, "Organizer");

    let request = UpdateProfileRequest { email: Some("broken".into()), ..Default::default() };
    let err = accounts.update_own_profile(&alice, request).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);

    let err = accounts.update_own_profile(&admin, UpdateProfileRequest::default()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Authorization);
}
