mod common;

use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::SubsecRound;
use chrono::Utc;
use common::TestDb;
use user_service::domain::session::errors::StoreError;
use user_service::domain::session::models::RefreshToken;
use user_service::domain::session::ports::CredentialStore;
use user_service::domain::user::models::EmailAddress;
use user_service::domain::user::models::FirstName;
use user_service::domain::user::models::LastName;
use user_service::domain::user::models::PhoneNumber;
use user_service::domain::user::models::User;
use user_service::domain::user::models::UserId;
use user_service::outbound::repositories::PostgresCredentialStore;

// TIMESTAMPTZ keeps microseconds
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn user(phone_number: &str) -> User {
    let now = now();
    User {
        id: UserId::new(),
        first_name: FirstName::new("Ann".to_string()).unwrap(),
        last_name: None,
        email: None,
        phone_number: PhoneNumber::new(phone_number.to_string()).unwrap(),
        password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn token_for(user_id: UserId, token: &str, expires_in: Duration) -> RefreshToken {
    let now = now();
    RefreshToken::new(user_id, token.to_string(), now + expires_in, now)
}

async fn store_with_user(db: &TestDb, phone_number: &str) -> (PostgresCredentialStore, User) {
    let store = PostgresCredentialStore::new(db.pool.clone());
    let user = store
        .create_user(user(phone_number))
        .await
        .expect("Failed to create user");
    (store, user)
}

#[tokio::test]
async fn test_user_round_trip() {
    let Some(db) = TestDb::try_new().await else {
        return;
    };
    let (store, mut created) = store_with_user(&db, "+1000").await;

    let by_handle = store
        .find_user_by_handle(&created.phone_number)
        .await
        .unwrap()
        .expect("User not found by phone number");
    assert_eq!(by_handle.id, created.id);
    assert_eq!(by_handle.password_hash, created.password_hash);
    assert_eq!(by_handle.created_at, created.created_at);
    assert!(by_handle.last_name.is_none());

    created.last_name = Some(LastName::new("Smith".to_string()).unwrap());
    created.email = Some(EmailAddress::new("ann@example.com".to_string()).unwrap());
    created.updated_at = now();
    store.update_user(created.clone()).await.unwrap();

    let by_id = store
        .find_user_by_id(&created.id)
        .await
        .unwrap()
        .expect("User not found by id");
    assert_eq!(by_id.last_name, created.last_name);
    assert_eq!(by_id.email, created.email);
    assert_eq!(by_id.updated_at, created.updated_at);

    // Optional columns can be cleared again
    created.last_name = None;
    created.email = None;
    store.update_user(created.clone()).await.unwrap();
    let cleared = store.find_user_by_id(&created.id).await.unwrap().unwrap();
    assert!(cleared.last_name.is_none());
    assert!(cleared.email.is_none());

    assert!(store
        .find_user_by_id(&UserId::new())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_duplicate_phone_number_is_conflict() {
    let Some(db) = TestDb::try_new().await else {
        return;
    };
    let (store, _ann) = store_with_user(&db, "+1000").await;

    let result = store.create_user(user("+1000")).await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));

    let mut bob = store.create_user(user("+2000")).await.unwrap();
    bob.phone_number = PhoneNumber::new("+1000".to_string()).unwrap();
    let result = store.update_user(bob).await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));

    let result = store.update_user(user("+3000")).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_find_active_refresh_token_skips_revoked_and_expired() {
    let Some(db) = TestDb::try_new().await else {
        return;
    };
    let (store, user) = store_with_user(&db, "+1000").await;

    let active = token_for(user.id, "active", Duration::hours(1));
    let expired = token_for(user.id, "expired", Duration::seconds(-1));
    let mut revoked = token_for(user.id, "revoked", Duration::hours(1));
    revoked.revoked = true;

    for token in [active.clone(), expired, revoked] {
        store.save_refresh_token(token).await.unwrap();
    }

    let found = store
        .find_active_refresh_token("active")
        .await
        .unwrap()
        .expect("Active token not found");
    assert_eq!(found.id, active.id);
    assert_eq!(found.user_id, user.id);
    assert_eq!(found.expires_at, active.expires_at);
    assert!(!found.revoked);

    assert!(store
        .find_active_refresh_token("expired")
        .await
        .unwrap()
        .is_none());
    assert!(store
        .find_active_refresh_token("revoked")
        .await
        .unwrap()
        .is_none());
    assert!(store
        .find_active_refresh_token("unknown")
        .await
        .unwrap()
        .is_none());

    // Same token string twice violates the unique index
    let duplicate = token_for(user.id, "active", Duration::hours(1));
    assert!(matches!(
        store.save_refresh_token(duplicate).await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_concurrent_revoke_has_one_winner() {
    let Some(db) = TestDb::try_new().await else {
        return;
    };
    let (store, user) = store_with_user(&db, "+1000").await;
    let store = Arc::new(store);

    store
        .save_refresh_token(token_for(user.id, "contested", Duration::hours(1)))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.revoke_refresh_token("contested").await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.expect("Revoke task panicked") {
            Ok(()) => winners += 1,
            Err(e) => assert!(matches!(e, StoreError::NotFound(_)), "{:?}", e),
        }
    }
    assert_eq!(winners, 1);

    assert!(store
        .find_active_refresh_token("contested")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_revoke_all_and_purge_counts() {
    let Some(db) = TestDb::try_new().await else {
        return;
    };
    let (store, ann) = store_with_user(&db, "+1000").await;
    let bob = store.create_user(user("+2000")).await.unwrap();

    let mut already_revoked = token_for(ann.id, "ann-revoked", Duration::hours(1));
    already_revoked.revoked = true;
    for token in [
        token_for(ann.id, "ann-1", Duration::hours(1)),
        token_for(ann.id, "ann-2", Duration::hours(1)),
        token_for(ann.id, "ann-expired", Duration::seconds(-1)),
        already_revoked,
        token_for(bob.id, "bob-1", Duration::hours(1)),
    ] {
        store.save_refresh_token(token).await.unwrap();
    }

    assert_eq!(store.revoke_all_for_user(&ann.id).await.unwrap(), 2);
    assert_eq!(store.revoke_all_for_user(&ann.id).await.unwrap(), 0);

    // Other users keep their sessions
    assert!(store
        .find_active_refresh_token("bob-1")
        .await
        .unwrap()
        .is_some());

    assert_eq!(
        store.purge_expired_refresh_tokens(Utc::now()).await.unwrap(),
        1
    );
    assert_eq!(
        store
            .purge_expired_refresh_tokens(Utc::now() + Duration::hours(2))
            .await
            .unwrap(),
        4
    );
}
