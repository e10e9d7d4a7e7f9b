//! Database integration tests
//!
//! These tests verify, through the same `DatabaseBackend` trait the server
//! uses:
//! - Profile creation and public ids
//! - Presence updates and the stale sweep
//! - The friend invite lifecycle and its error cases
//! - Group invites
//! - Profile and city search
//! - Maintenance catalog queries

use uuid::Uuid;

use wayfarer_server::db::{DatabaseBackend, SqliteBackend, StoreError};
use wayfarer_shared::{
    is_public_id, City, CityQuery, InviteAction, InviteDirection, InviteStatus, ProfileQuery,
    ProfileUpdate,
};

// Helper function to create test database
async fn setup_test_db() -> SqliteBackend {
    SqliteBackend::in_memory()
        .await
        .expect("Failed to create test database")
}

async fn new_user(db: &SqliteBackend) -> Uuid {
    let id = Uuid::new_v4();
    db.ensure_profile(id).await.unwrap();
    id
}

async fn named_user(db: &SqliteBackend, username: &str, display_name: &str) -> Uuid {
    let id = new_user(db).await;
    let update = ProfileUpdate {
        username: Some(username.to_string()),
        display_name: Some(display_name.to_string()),
        avatar_url: None,
    };
    db.update_profile(id, &update.validated().unwrap()).await.unwrap();
    id
}

fn city(id: i64, name: &str, country: &str, population: i64) -> City {
    City {
        id,
        name: name.to_string(),
        country_code: country.to_string(),
        admin_name: None,
        population,
        latitude: 0.0,
        longitude: 0.0,
    }
}

// ── Profiles ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ensure_profile_assigns_public_id_once() {
    let db = setup_test_db().await;
    let user = Uuid::new_v4();

    let first = db.ensure_profile(user).await.unwrap();
    assert!(is_public_id(&first.public_id));
    assert!(!first.online);
    assert!(first.username.is_none());

    // Second call returns the existing row untouched
    let second = db.ensure_profile(user).await.unwrap();
    assert_eq!(first.public_id, second.public_id);
    assert_eq!(first.created_at, second.created_at);

    let by_public = db.get_profile_by_public_id(&first.public_id).await.unwrap().unwrap();
    assert_eq!(by_public.id, user);
}

#[tokio::test]
async fn test_missing_profile_lookups() {
    let db = setup_test_db().await;
    assert!(db.get_profile(Uuid::new_v4()).await.unwrap().is_none());
    assert!(db.get_profile_by_public_id("00000000").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_profile_and_username_uniqueness() {
    let db = setup_test_db().await;
    let alice = named_user(&db, "alice", "Alice Liddell").await;

    let profile = db.get_profile(alice).await.unwrap().unwrap();
    assert_eq!(profile.username.as_deref(), Some("alice"));
    assert_eq!(profile.display_name.as_deref(), Some("Alice Liddell"));

    // Partial update keeps the other columns
    let update = ProfileUpdate {
        avatar_url: Some("/avatars/cat.png".to_string()),
        ..Default::default()
    };
    let profile = db.update_profile(alice, &update).await.unwrap();
    assert_eq!(profile.username.as_deref(), Some("alice"));
    assert_eq!(profile.avatar_url.as_deref(), Some("/avatars/cat.png"));

    let bob = new_user(&db).await;
    let taken = ProfileUpdate {
        username: Some("alice".to_string()),
        ..Default::default()
    };
    match db.update_profile(bob, &taken).await {
        Err(StoreError::Conflict(msg)) => assert_eq!(msg, "Username already taken"),
        other => panic!("expected conflict, got {:?}", other),
    }

    let ghost = db.update_profile(Uuid::new_v4(), &update).await;
    assert!(matches!(ghost, Err(StoreError::NotFound(_))));
}

// ── Presence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_online_status_round_trip() {
    let db = setup_test_db().await;
    let user = new_user(&db).await;

    db.set_online_status(user, true).await.unwrap();
    let profile = db.get_profile(user).await.unwrap().unwrap();
    assert!(profile.online);
    assert!(profile.last_seen_at.is_some());

    db.set_online_status(user, false).await.unwrap();
    assert!(!db.get_profile(user).await.unwrap().unwrap().online);
}

#[tokio::test]
async fn test_online_status_requires_profile() {
    let db = setup_test_db().await;
    let result = db.set_online_status(Uuid::new_v4(), true).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_stale_sweep_only_touches_old_heartbeats() {
    let db = setup_test_db().await;
    let user = new_user(&db).await;
    let idle = new_user(&db).await;
    db.set_online_status(user, true).await.unwrap();

    // Fresh heartbeat survives a generous TTL
    assert_eq!(db.mark_stale_offline(3600).await.unwrap(), 0);
    assert!(db.get_profile(user).await.unwrap().unwrap().online);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(db.mark_stale_offline(0).await.unwrap(), 1);
    assert!(!db.get_profile(user).await.unwrap().unwrap().online);
    assert!(!db.get_profile(idle).await.unwrap().unwrap().online);
}

#[tokio::test]
async fn test_stale_sweep_rejects_out_of_range_ttls() {
    let db = setup_test_db().await;
    let user = new_user(&db).await;
    db.set_online_status(user, true).await.unwrap();

    let result = db.mark_stale_offline(-120).await;
    assert!(matches!(result, Err(StoreError::Invalid(_))));
    assert!(db.get_profile(user).await.unwrap().unwrap().online);

    let result = db.mark_stale_offline(i64::MAX / 10).await;
    assert!(matches!(result, Err(StoreError::Invalid(_))));
    assert!(db.get_profile(user).await.unwrap().unwrap().online);
}

// ── Friend invites ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_friend_invite_accept_flow() {
    let db = setup_test_db().await;
    let alice = named_user(&db, "alice", "Alice").await;
    let bob = named_user(&db, "bob", "Bob").await;

    let invite = db.create_friend_invite(alice, bob).await.unwrap();
    assert_eq!(invite.status, InviteStatus::Pending);
    assert!(invite.responded_at.is_none());

    let incoming = db
        .list_friend_invites(bob, InviteDirection::Incoming, Some(InviteStatus::Pending))
        .await
        .unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].id, invite.id);

    let outgoing = db
        .list_friend_invites(bob, InviteDirection::Outgoing, None)
        .await
        .unwrap();
    assert!(outgoing.is_empty());

    let accepted = db
        .respond_friend_invite(invite.id, bob, InviteAction::Accept)
        .await
        .unwrap();
    assert_eq!(accepted.status, InviteStatus::Accepted);
    assert!(accepted.responded_at.is_some());

    let friends: Vec<Uuid> = db.list_friends(alice).await.unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(friends, vec![bob]);
    let friends: Vec<Uuid> = db.list_friends(bob).await.unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(friends, vec![alice]);
}

#[tokio::test]
async fn test_friend_invite_double_accept_conflicts() {
    let db = setup_test_db().await;
    let alice = new_user(&db).await;
    let bob = new_user(&db).await;
    let invite = db.create_friend_invite(alice, bob).await.unwrap();

    db.respond_friend_invite(invite.id, bob, InviteAction::Accept).await.unwrap();
    match db.respond_friend_invite(invite.id, bob, InviteAction::Accept).await {
        Err(StoreError::Conflict(msg)) => assert_eq!(msg, "Invite is already accepted"),
        other => panic!("expected conflict, got {:?}", other),
    }

    // A settled invite cannot be rejected either
    let reject = db.respond_friend_invite(invite.id, bob, InviteAction::Reject).await;
    assert!(matches!(reject, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn test_friend_invite_roles_are_enforced() {
    let db = setup_test_db().await;
    let alice = new_user(&db).await;
    let bob = new_user(&db).await;
    let mallory = new_user(&db).await;
    let invite = db.create_friend_invite(alice, bob).await.unwrap();

    // Only the recipient may accept
    let by_sender = db.respond_friend_invite(invite.id, alice, InviteAction::Accept).await;
    assert!(matches!(by_sender, Err(StoreError::Forbidden)));
    let by_stranger = db.respond_friend_invite(invite.id, mallory, InviteAction::Reject).await;
    assert!(matches!(by_stranger, Err(StoreError::Forbidden)));

    // Only the sender may cancel
    let by_recipient = db.respond_friend_invite(invite.id, bob, InviteAction::Cancel).await;
    assert!(matches!(by_recipient, Err(StoreError::Forbidden)));

    let cancelled = db
        .respond_friend_invite(invite.id, alice, InviteAction::Cancel)
        .await
        .unwrap();
    assert_eq!(cancelled.status, InviteStatus::Cancelled);

    let missing = db.respond_friend_invite(Uuid::new_v4(), bob, InviteAction::Accept).await;
    match missing {
        Err(StoreError::NotFound(msg)) => assert_eq!(msg, "Invite not found"),
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_friend_invite_creation_rules() {
    let db = setup_test_db().await;
    let alice = new_user(&db).await;
    let bob = new_user(&db).await;

    let own = db.create_friend_invite(alice, alice).await;
    assert!(matches!(own, Err(StoreError::Invalid(_))));

    let nobody = db.create_friend_invite(alice, Uuid::new_v4()).await;
    assert!(matches!(nobody, Err(StoreError::NotFound(_))));

    let invite = db.create_friend_invite(alice, bob).await.unwrap();

    // A pending invite blocks both directions
    match db.create_friend_invite(bob, alice).await {
        Err(StoreError::Conflict(msg)) => assert_eq!(msg, "Invite already pending"),
        other => panic!("expected conflict, got {:?}", other),
    }

    db.respond_friend_invite(invite.id, bob, InviteAction::Accept).await.unwrap();
    match db.create_friend_invite(alice, bob).await {
        Err(StoreError::Conflict(msg)) => assert_eq!(msg, "Already friends"),
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_invite_can_be_resent() {
    let db = setup_test_db().await;
    let alice = new_user(&db).await;
    let bob = new_user(&db).await;

    let first = db.create_friend_invite(alice, bob).await.unwrap();
    db.respond_friend_invite(first.id, bob, InviteAction::Reject).await.unwrap();

    let second = db.create_friend_invite(alice, bob).await.unwrap();
    assert_ne!(first.id, second.id);

    let all = db.list_friend_invites(alice, InviteDirection::All, None).await.unwrap();
    assert_eq!(all.len(), 2);
    let rejected = db
        .list_friend_invites(alice, InviteDirection::All, Some(InviteStatus::Rejected))
        .await
        .unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].id, first.id);
    assert!(db.list_friends(alice).await.unwrap().is_empty());
}

// ── Group invites ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_group_invite_reject_by_invitee_only() {
    let db = setup_test_db().await;
    let owner = new_user(&db).await;
    let guest = new_user(&db).await;
    let group = Uuid::new_v4();

    let invite = db.create_group_invite(group, owner, guest).await.unwrap();
    assert_eq!(db.list_group_invites(guest).await.unwrap().len(), 1);
    assert!(db.list_group_invites(owner).await.unwrap().is_empty());

    let duplicate = db.create_group_invite(group, owner, guest).await;
    assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

    let by_owner = db.reject_group_invite(invite.id, owner).await;
    assert!(matches!(by_owner, Err(StoreError::Forbidden)));

    db.reject_group_invite(invite.id, guest).await.unwrap();
    assert!(db.list_group_invites(guest).await.unwrap().is_empty());

    let again = db.reject_group_invite(invite.id, guest).await;
    assert!(matches!(again, Err(StoreError::NotFound(_))));
}

// ── Search ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_profile_search_by_name_prefix() {
    let db = setup_test_db().await;
    let me = named_user(&db, "marco", "Marco Polo").await;
    let maria = named_user(&db, "maria", "Maria Sibylla").await;
    let _ibn = named_user(&db, "ibn", "Ibn Battuta").await;

    let query = ProfileQuery::parse("@MA").unwrap();
    let found: Vec<Uuid> = db
        .search_profiles(&query, Some(me), 10)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(found, vec![maria]);

    // Display names match too, and an exact username sorts first
    let query = ProfileQuery::parse("ibn").unwrap();
    let found = db.search_profiles(&query, None, 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username.as_deref(), Some("ibn"));

    let everyone = ProfileQuery::parse("m").unwrap();
    assert_eq!(db.search_profiles(&everyone, None, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_search_by_public_id_prefix() {
    let db = setup_test_db().await;
    let user = new_user(&db).await;
    let profile = db.get_profile(user).await.unwrap().unwrap();

    let query = ProfileQuery::parse(&profile.public_id).unwrap();
    let found = db.search_profiles(&query, None, 5).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, user);

    // Excluding the caller hides their own profile
    assert!(db.search_profiles(&query, Some(user), 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_like_metacharacters_match_literally() {
    let db = setup_test_db().await;
    let _ = named_user(&db, "under_score", "Underscore").await;
    let _ = named_user(&db, "underxscore", "Other").await;

    let query = ProfileQuery::parse("under_").unwrap();
    let found = db.search_profiles(&query, None, 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username.as_deref(), Some("under_score"));
}

#[tokio::test]
async fn test_add_friend_queries_are_logged() {
    let db = setup_test_db().await;
    let user = new_user(&db).await;

    db.log_add_friend_query(user, "mar").await.unwrap();
    db.log_add_friend_query(user, "12345678").await.unwrap();

    let logs = db.list_add_friend_logs(user, 10).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].query, "12345678");
    assert_eq!(logs[1].query, "mar");
    assert!(logs.iter().all(|l| l.user_id == user));
}

#[tokio::test]
async fn test_city_search_orders_by_population() {
    let db = setup_test_db().await;
    db.upsert_city(&city(1, "Paris", "FR", 2_100_000)).await.unwrap();
    db.upsert_city(&city(2, "Paris", "US", 25_000)).await.unwrap();
    db.upsert_city(&city(3, "Pamplona", "ES", 200_000)).await.unwrap();
    db.upsert_city(&city(4, "Lyon", "FR", 500_000)).await.unwrap();

    let query = CityQuery::parse(Some("pa"), None, None).unwrap();
    let names: Vec<(String, String)> = db
        .search_cities(&query)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.name, c.country_code))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Paris".to_string(), "FR".to_string()),
            ("Pamplona".to_string(), "ES".to_string()),
            ("Paris".to_string(), "US".to_string()),
        ]
    );

    let query = CityQuery::parse(Some("paris"), Some("us"), Some(5)).unwrap();
    let found = db.search_cities(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 2);

    // Upsert replaces in place
    db.upsert_city(&city(4, "Lyon", "FR", 520_000)).await.unwrap();
    let query = CityQuery::parse(Some("ly"), None, None).unwrap();
    assert_eq!(db.search_cities(&query).await.unwrap()[0].population, 520_000);
}

// ── Maintenance ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = setup_test_db().await;
    db.run_migrations().await.unwrap();
    db.ping().await.unwrap();
}

#[tokio::test]
async fn test_list_indexes_and_constraints() {
    let db = setup_test_db().await;

    let indexes = db.list_indexes(Some("friend_invites")).await.unwrap();
    assert!(indexes.iter().all(|i| i.table == "friend_invites"));
    assert!(indexes.iter().any(|i| i.name == "idx_friend_invites_open_pair"));

    let all = db.list_indexes(None).await.unwrap();
    assert!(all.iter().any(|i| i.name == "idx_cities_name"));

    let constraints = db.list_constraints("friend_invites").await.unwrap();
    assert!(constraints.iter().any(|c| c.kind == "PRIMARY KEY"));
    let foreign: Vec<_> = constraints.iter().filter(|c| c.kind == "FOREIGN KEY").collect();
    assert_eq!(foreign.len(), 2);
    assert!(foreign
        .iter()
        .any(|c| c.detail.as_deref() == Some("(sender_id) REFERENCES profiles(id)")));

    let profiles = db.list_constraints("profiles").await.unwrap();
    assert!(profiles.iter().any(|c| c.kind == "UNIQUE"));
}
