use std::sync::Arc;

use chrono::Duration;
use futures_util::future::join_all;
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use token_lifecycle::{
    auth::{
        IdentityStore, JwtKeys, RefreshTokenState, RefreshTokenStore, TokenError, TokenLifecycle,
        TokenPair, TokenSettings, UserIdentity,
        memory::{MemoryIdentityStore, MemoryRefreshTokenStore},
        password::hash_password,
    },
    config::DatabaseConfig,
    db::{self, dao::DaoContext},
};

const SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";

struct Harness {
    lifecycle: TokenLifecycle,
    tokens: Arc<dyn RefreshTokenStore>,
    alice: UserIdentity,
    // Keeps a file-backed database alive for the harness lifetime.
    _dir: Option<TempDir>,
}

async fn sqlite() -> DatabaseConnection {
    // One connection: every pooled connection to `:memory:` would be a separate database.
    let cfg = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_idle: 1,
        connect_timeout_secs: 5,
    };
    db::connect(&cfg).await.expect("sqlite should open")
}

fn settings(access_ttl: Duration) -> TokenSettings {
    TokenSettings {
        access_ttl,
        refresh_ttl: Duration::days(180),
    }
}

async fn sql_harness(access_ttl: Duration) -> Harness {
    let db = sqlite().await;
    harness_on(DaoContext::with_default_timeout(&db), access_ttl, None).await
}

/// Pooled connections to one on-disk database, so writers genuinely contend.
async fn file_sql_harness(access_ttl: Duration) -> Harness {
    let dir = TempDir::new().expect("temp dir should be created");
    let cfg = DatabaseConfig {
        url: format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("tokens.db").display()
        ),
        max_connections: 4,
        min_idle: 1,
        connect_timeout_secs: 30,
    };
    let db = db::connect(&cfg).await.expect("sqlite file should open");
    let daos = DaoContext::new(&db, std::time::Duration::from_secs(30));
    harness_on(daos, access_ttl, Some(dir)).await
}

async fn harness_on(daos: DaoContext, access_ttl: Duration, dir: Option<TempDir>) -> Harness {
    let users = Arc::new(daos.user());
    let tokens: Arc<dyn RefreshTokenStore> = Arc::new(daos.refresh_token());

    let hash = hash_password("password123").expect("hash should succeed");
    let alice = IdentityStore::create_user(users.as_ref(), "alice@example.com", "alice", &hash)
        .await
        .expect("user should be created");

    Harness {
        lifecycle: TokenLifecycle::new(
            JwtKeys::from_secret(SECRET),
            settings(access_ttl),
            tokens.clone(),
            users,
        ),
        tokens,
        alice,
        _dir: dir,
    }
}

async fn memory_harness(access_ttl: Duration) -> Harness {
    let users = Arc::new(MemoryIdentityStore::new());
    let tokens: Arc<dyn RefreshTokenStore> = Arc::new(MemoryRefreshTokenStore::new());
    let alice = users
        .add_user("alice@example.com", "alice", "password123")
        .await
        .expect("user should be created");

    Harness {
        lifecycle: TokenLifecycle::new(
            JwtKeys::from_secret(SECRET),
            settings(access_ttl),
            tokens.clone(),
            users,
        ),
        tokens,
        alice,
        _dir: None,
    }
}

async fn issue(h: &Harness) -> TokenPair {
    h.lifecycle
        .issue_for_user(&h.alice)
        .await
        .expect("issue should succeed")
}

#[tokio::test]
async fn issued_pair_is_bound_by_jti() {
    let h = sql_harness(Duration::minutes(15)).await;
    let pair = issue(&h).await;

    let claims = h
        .lifecycle
        .codec()
        .verify(&pair.access_token)
        .expect("access token should verify");
    let row = h
        .tokens
        .find_by_token(&pair.refresh_token)
        .await
        .expect("lookup should succeed")
        .expect("row should be persisted");

    assert_eq!(claims.user_id, h.alice.id);
    assert_eq!(claims.email, "alice@example.com");
    assert_eq!(claims.sub, "alice");
    assert_eq!(row.jwt_id, claims.jti);
    assert_eq!(row.user_id, h.alice.id);
}

#[tokio::test]
async fn refresh_token_rotates_exactly_once() {
    let h = sql_harness(Duration::minutes(-5)).await;
    let pair = issue(&h).await;

    let rotated = h
        .lifecycle
        .rotate(&pair.access_token, &pair.refresh_token)
        .await
        .expect("first rotation should succeed");
    let err = h
        .lifecycle
        .rotate(&pair.access_token, &pair.refresh_token)
        .await
        .expect_err("replay should fail");
    assert!(matches!(err, TokenError::TokenAlreadyUsed));

    // The new pair is itself rotatable once.
    h.lifecycle
        .rotate(&rotated.access_token, &rotated.refresh_token)
        .await
        .expect("rotating the new pair should succeed");
}

#[tokio::test]
async fn live_access_token_cannot_be_rotated() {
    let h = sql_harness(Duration::minutes(15)).await;
    let pair = issue(&h).await;

    let err = h
        .lifecycle
        .rotate(&pair.access_token, &pair.refresh_token)
        .await
        .expect_err("live access token should be refused");
    assert!(matches!(err, TokenError::NotExpired));
}

#[tokio::test]
async fn refresh_token_from_another_session_is_a_mismatch() {
    let h = sql_harness(Duration::minutes(-5)).await;
    let session_a = issue(&h).await;
    let session_b = issue(&h).await;

    let err = h
        .lifecycle
        .rotate(&session_b.access_token, &session_a.refresh_token)
        .await
        .expect_err("mixed sessions should be refused");
    assert!(matches!(err, TokenError::TokenMismatch));
}

#[tokio::test]
async fn revoked_token_is_refused_regardless_of_use() {
    let h = sql_harness(Duration::minutes(-5)).await;
    let fresh = issue(&h).await;
    let consumed = issue(&h).await;
    h.lifecycle
        .rotate(&consumed.access_token, &consumed.refresh_token)
        .await
        .expect("rotation should succeed");

    let revoked = h
        .lifecycle
        .revoke_all_for_user(h.alice.id)
        .await
        .expect("revoke should succeed");
    assert_eq!(revoked, 3);

    for pair in [&fresh, &consumed] {
        let err = h
            .lifecycle
            .rotate(&pair.access_token, &pair.refresh_token)
            .await
            .expect_err("revoked token should be refused");
        assert!(matches!(err, TokenError::TokenRevoked));
    }

    let sessions = h
        .lifecycle
        .sessions_for_user(h.alice.id)
        .await
        .expect("listing should succeed");
    assert!(
        sessions
            .iter()
            .all(|session| session.state == RefreshTokenState::Revoked)
    );
}

#[tokio::test]
async fn unknown_refresh_token_is_not_found() {
    let h = sql_harness(Duration::minutes(-5)).await;
    let pair = issue(&h).await;

    let err = h
        .lifecycle
        .rotate(&pair.access_token, "never-issued")
        .await
        .expect_err("unknown refresh token should be refused");
    assert!(matches!(err, TokenError::TokenNotFound));
}

async fn race(h: Harness) {
    let pair = issue(&h).await;

    let attempts = (0..100).map(|_| {
        let lifecycle = h.lifecycle.clone();
        let access = pair.access_token.clone();
        let refresh = pair.refresh_token.clone();
        tokio::spawn(async move { lifecycle.rotate(&access, &refresh).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("rotation task should not panic"))
        .collect();

    let winners = results.iter().filter(|result| result.is_ok()).count();
    let replays = results
        .iter()
        .filter(|result| matches!(result, Err(TokenError::TokenAlreadyUsed)))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(replays, 99);

    let sessions = h
        .lifecycle
        .sessions_for_user(h.alice.id)
        .await
        .expect("listing should succeed");
    assert_eq!(sessions.len(), 2, "exactly one replacement row is stored");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotation_has_one_winner_sql() {
    race(sql_harness(Duration::minutes(-5)).await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotation_has_one_winner_in_memory() {
    race(memory_harness(Duration::minutes(-5)).await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotation_has_one_winner_sql_pooled_file() {
    race(file_sql_harness(Duration::minutes(-5)).await).await;
}
