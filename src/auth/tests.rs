//! Tests for the auth module

use super::*;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn refresh_config(server: &MockServer) -> AuthConfig {
    AuthConfig::Oauth2Refresh {
        token_url: format!("{}/login/oauth2/access_token", server.uri()),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: "my-refresh-token".to_string(),
    }
}

// ============================================================================
// CachedToken Tests
// ============================================================================

#[test]
fn test_cached_token_not_expired() {
    let token = CachedToken::expires_in("test".to_string(), 3600);
    assert!(!token.is_expired());
}

#[test]
fn test_cached_token_expired() {
    let token = CachedToken::expires_in("test".to_string(), -100);
    assert!(token.is_expired());
}

#[test]
fn test_cached_token_within_buffer_counts_as_expired() {
    let token = CachedToken::expires_in("test".to_string(), 10);
    assert!(token.is_expired());
}

#[test]
fn test_cached_token_no_expiration() {
    let token = CachedToken::new("test".to_string(), None);
    assert!(!token.is_expired());
}

// ============================================================================
// Authenticator Tests
// ============================================================================

#[tokio::test]
async fn test_no_auth() {
    let auth = Authenticator::new(AuthConfig::None);
    let req = reqwest::Client::new().get("https://example.com/api");

    let built = auth.apply(req).await.unwrap().build().unwrap();
    assert!(built.headers().get("Authorization").is_none());
    assert_err!(auth.access_token().await);
}

#[tokio::test]
async fn test_oauth2_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth2/access_token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_id=client"))
        .and(body_string_contains("client_secret=secret"))
        .and(body_string_contains("refresh_token=my-refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));
    assert!(auth.config().requires_refresh());

    let req = reqwest::Client::new().get("https://example.com/api");
    let built = auth.apply(req).await.unwrap().build().unwrap();
    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Bearer refreshed-token"
    );
}

#[tokio::test]
async fn test_oauth2_token_caching_shared_across_clones() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "cached-token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));
    let shared = auth.clone();

    assert_eq!(auth.access_token().await.unwrap(), "cached-token");
    assert_eq!(shared.access_token().await.unwrap(), "cached-token");
}

#[tokio::test]
async fn test_oauth2_clear_cache_forces_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token",
            "expires_in": 3600
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));
    assert_ok!(auth.access_token().await);
    auth.clear_cache().await;
    assert_ok!(auth.access_token().await);
}

#[tokio::test]
async fn test_oauth2_refresh_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));
    let err = auth.access_token().await.unwrap_err();

    assert!(matches!(err, crate::error::Error::TokenRefresh { .. }));
    assert!(err.to_string().contains("401"));
    assert!(err.to_string().contains("invalid_grant"));
}
