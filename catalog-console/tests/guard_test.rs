mod common;

use std::time::Duration;

use catalog_console::middleware::guard::{evaluate, GuardDecision};
use catalog_console::session::{AuthSession, SessionStore};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{api_with_session, user_json};

#[tokio::test]
async fn login_page_is_admitted_without_backend_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("admin")))
        .expect(0)
        .mount(&server)
        .await;

    let (api, _) = api_with_session(&server.uri(), Some("tok"));
    assert!(matches!(
        evaluate("/login", &api).await,
        GuardDecision::Admit(None)
    ));
}

#[tokio::test]
async fn missing_token_redirects_without_backend_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("admin")))
        .expect(0)
        .mount(&server)
        .await;

    let (api, _) = api_with_session(&server.uri(), None);
    assert!(matches!(
        evaluate("/products", &api).await,
        GuardDecision::RedirectToLogin
    ));
}

#[tokio::test]
async fn valid_token_is_admitted_after_one_identity_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("readonly")))
        .expect(1)
        .mount(&server)
        .await;

    let (api, store) = api_with_session(&server.uri(), Some("tok"));
    match evaluate("/products", &api).await {
        GuardDecision::Admit(Some(user)) => assert_eq!(user.role, "readonly"),
        other => panic!("unexpected decision: {other:?}"),
    }
    assert_eq!(store.token().await.as_deref(), Some("tok"));
}

#[tokio::test]
async fn rejected_token_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token"})))
        .expect(1)
        .mount(&server)
        .await;

    let (api, store) = api_with_session(&server.uri(), Some("tok"));
    assert!(matches!(
        evaluate("/", &api).await,
        GuardDecision::RedirectToLogin
    ));
    assert!(store.token().await.is_none());
}

/// An unreachable backend is indistinguishable from an invalid token: the
/// session is cleared and the user has to log in again.
#[tokio::test]
async fn unreachable_backend_also_clears_session() {
    let (api, store) = api_with_session("http://127.0.0.1:1", Some("tok"));
    assert!(matches!(
        evaluate("/products", &api).await,
        GuardDecision::RedirectToLogin
    ));
    assert!(store.token().await.is_none());
}

#[tokio::test]
async fn stored_role_follows_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("readonly")))
        .expect(1)
        .mount(&server)
        .await;

    let (api, store) = api_with_session(&server.uri(), None);
    store
        .set_session("tok".to_string(), Some("admin".to_string()))
        .await;

    assert!(matches!(
        evaluate("/products", &api).await,
        GuardDecision::Admit(Some(_))
    ));
    let stored = store.load().await;
    assert_eq!(stored.token.as_deref(), Some("tok"));
    assert_eq!(stored.role.as_deref(), Some("readonly"));
}

#[tokio::test]
async fn logout_during_check_is_not_undone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(user_json("readonly"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (api, store) = api_with_session(&server.uri(), None);
    store
        .set_session("tok".to_string(), Some("admin".to_string()))
        .await;

    let logout = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.clear_session().await;
    };
    let (decision, ()) = tokio::join!(evaluate("/products", &api), logout);

    assert!(matches!(decision, GuardDecision::Admit(Some(_))));
    assert_eq!(store.load().await, AuthSession::default());
}
