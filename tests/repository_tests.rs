//! PostgreSQL store tests
//!
//! Need a database: set TEST_DATABASE_URL and run with `--ignored`.

use chirpy_auth::{
    db::PgStores,
    error::StoreError,
    models::auth::RefreshToken,
    repository::{RefreshTokenStore, UserStore},
};
use chrono::{Duration, Utc};

mod common;

async fn setup_test_db() -> PgStores {
    let config = common::create_test_config();
    let stores = PgStores::connect(&config.database)
        .await
        .expect("Failed to connect test stores");

    sqlx::query("TRUNCATE TABLE refresh_tokens, users CASCADE")
        .execute(stores.pool())
        .await
        .expect("Failed to truncate tables");

    stores
}

#[tokio::test]
#[ignore]
async fn test_user_repository_round_trip() {
    let stores = setup_test_db().await;
    let users = stores.users.clone();

    let created = users.create_user("walt@breakingbad.com", "hash").await.unwrap();
    assert!(!created.is_chirpy_red);

    assert!(matches!(
        users.create_user("walt@breakingbad.com", "hash").await,
        Err(StoreError::Conflict(_))
    ));

    let found = users
        .get_user_by_email("walt@breakingbad.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);

    let updated = users
        .update_credentials(created.id, "heisenberg@breakingbad.com", "hash2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.password_hash, "hash2");

    assert!(users.upgrade_user(created.id).await.unwrap());
    assert!(!users.upgrade_user(uuid::Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_refresh_token_revoke_once() {
    let stores = setup_test_db().await;
    let users = stores.users.clone();
    let tokens = stores.refresh_tokens.clone();

    let user = users.create_user("walt@breakingbad.com", "hash").await.unwrap();
    let now = Utc::now();
    let record = RefreshToken {
        token: chirpy_auth::auth::refresh_token::generate(),
        user_id: user.id,
        created_at: now,
        expires_at: now + Duration::days(60),
        revoked_at: None,
    };
    tokens.create_refresh_token(&record).await.unwrap();

    assert!(tokens.revoke_refresh_token(&record.token, now).await.unwrap());
    assert!(!tokens
        .revoke_refresh_token(&record.token, now + Duration::minutes(1))
        .await
        .unwrap());

    let stored = tokens.get_refresh_token(&record.token).await.unwrap().unwrap();
    let revoked_at = stored.revoked_at.expect("token should be revoked");
    // Postgres keeps microseconds
    assert!((revoked_at - now).num_milliseconds().abs() < 1);

    assert!(tokens.get_refresh_token("missing").await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_against_postgres() {
    let stores = setup_test_db().await;
    stores.ping().await.unwrap();

    let config = common::create_test_config();
    let service = stores.auth_service(&config).unwrap();

    common::register_user(&service, "saul@bettercall.com", "04234").await;
    let session = service.login("saul@bettercall.com", "04234").await.unwrap();

    let access_token = service.refresh_access_token(&session.refresh_token).await.unwrap();
    assert!(!access_token.is_empty());
    service.revoke_session(&session.refresh_token).await.unwrap();
    assert!(service.refresh_access_token(&session.refresh_token).await.is_err());
}
