use super::*;
use crate::client::{ApiClient, RetryPolicy};
use crate::request::MockHttpClient;
use crate::storage::{FileStorage, MemoryStorage, StorageError};
use folio_shared::TOKEN_STORAGE_KEY;
use folio_shared::protocol::HttpMethod;
use serde_json::json;
use std::io;
use std::path::Path;

const BASE: &str = "http://api.test/api";

fn login_url() -> String {
    format!("{BASE}{}", folio_shared::protocol::PATH_LOGIN)
}

fn store_with(storage: Box<dyn TokenStorage>) -> (Rc<MockHttpClient>, SessionStore) {
    let state = Rc::new(SessionState::new(storage, TOKEN_STORAGE_KEY));
    let http = Rc::new(MockHttpClient::new());
    let client = ApiClient::new(BASE, RetryPolicy::none(), http.clone(), state.clone());
    (http, SessionStore::new(state, AuthService::new(client)))
}

fn file_store(path: &Path) -> (Rc<MockHttpClient>, SessionStore) {
    store_with(Box::new(FileStorage::new(path)))
}

/// Every operation fails, as with an unreadable session file.
struct BrokenStorage;

impl BrokenStorage {
    fn err() -> StorageError {
        StorageError::Io {
            path: "broken.json".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }
    }
}

impl TokenStorage for BrokenStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(Self::err())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(Self::err())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(Self::err())
    }
}

fn record_events(store: &SessionStore) -> Rc<RefCell<Vec<SessionEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    store.subscribe(move |ev| sink.borrow_mut().push(ev));
    events
}

// =========================================================
// login / restore
// =========================================================

#[tokio::test]
async fn login_persists_token_for_next_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let (http, store) = file_store(&path);
    store.restore();
    http.mock_response(HttpMethod::Post, &login_url(), 200, json!({"token": "jwt-1"}));

    store
        .login(&LoginCredentials::new("admin", "secret"))
        .await
        .unwrap();
    assert!(store.is_authenticated());
    assert!(store.is_admin());

    let body = http.requests_to(HttpMethod::Post, &login_url())[0].json_body();
    assert_eq!(body, json!({"username": "admin", "password": "secret"}));

    // simulate a restart
    let (_, restarted) = file_store(&path);
    assert!(restarted.is_loading());
    restarted.restore();
    assert!(!restarted.is_loading());
    assert_eq!(restarted.token().as_deref(), Some("jwt-1"));
}

#[tokio::test]
async fn failed_login_keeps_previous_token() {
    let (http, store) = store_with(Box::new(MemoryStorage::with_entry(TOKEN_STORAGE_KEY, "old")));
    store.restore();
    http.mock_response(
        HttpMethod::Post,
        &login_url(),
        401,
        json!({"message": "Bad credentials"}),
    );

    let err = store
        .login(&LoginCredentials::new("admin", "wrong"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Bad credentials");
    assert_eq!(store.token().as_deref(), Some("old"));
}

#[tokio::test]
async fn failed_login_when_logged_out_stays_logged_out() {
    let (http, store) = store_with(Box::new(MemoryStorage::new()));
    store.restore();
    http.mock_network_failure(HttpMethod::Post, &login_url());

    let err = store
        .login(&LoginCredentials::new("admin", "pw"))
        .await
        .unwrap_err();

    assert!(err.is_network());
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn empty_token_is_rejected() {
    let (http, store) = store_with(Box::new(MemoryStorage::new()));
    store.restore();
    http.mock_response(HttpMethod::Post, &login_url(), 200, json!({"token": "  "}));

    assert!(store.login(&LoginCredentials::new("a", "b")).await.is_err());
    assert_eq!(store.token(), None);
}

#[tokio::test]
async fn login_fails_when_token_cannot_be_persisted() {
    let (http, store) = store_with(Box::new(BrokenStorage));
    store.restore();
    http.mock_response(HttpMethod::Post, &login_url(), 200, json!({"token": "jwt"}));

    let err = store
        .login(&LoginCredentials::new("a", "b"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, crate::error::FolioErrorKind::Storage);
    assert_eq!(store.token(), None);
}

#[test]
fn restore_without_token_ends_loading() {
    let (_, store) = store_with(Box::new(MemoryStorage::new()));
    let events = record_events(&store);

    store.restore();

    assert!(!store.is_loading());
    assert!(!store.is_authenticated());
    assert_eq!(
        *events.borrow(),
        vec![SessionEvent::Restored { authenticated: false }]
    );
}

#[test]
fn restore_with_unreadable_storage_ends_loading() {
    let (_, store) = store_with(Box::new(BrokenStorage));
    store.restore();
    assert!(!store.is_loading());
    assert!(!store.is_authenticated());
}

#[test]
fn restore_with_corrupt_file_ends_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    let (_, store) = file_store(&path);
    store.restore();

    assert!(!store.is_loading());
    assert_eq!(store.token(), None);
}

#[test]
fn restore_runs_once() {
    let storage = MemoryStorage::with_entry(TOKEN_STORAGE_KEY, "t");
    let (_, store) = store_with(Box::new(storage));
    let events = record_events(&store);

    store.restore();
    store.logout();
    store.restore();

    assert!(!store.is_authenticated());
    assert_eq!(
        *events.borrow(),
        vec![
            SessionEvent::Restored { authenticated: true },
            SessionEvent::LoggedOut
        ]
    );
}

// =========================================================
// logout / expiry
// =========================================================

#[test]
fn logout_clears_memory_and_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    FileStorage::new(&path)
        .set(TOKEN_STORAGE_KEY, "jwt")
        .unwrap();

    let (_, store) = file_store(&path);
    store.restore();
    assert!(store.is_authenticated());

    store.logout();

    assert!(!store.is_authenticated());
    assert_eq!(
        FileStorage::new(&path).get(TOKEN_STORAGE_KEY).unwrap(),
        None
    );
}

#[test]
fn logout_never_fails_on_broken_storage() {
    let (_, store) = store_with(Box::new(BrokenStorage));
    store.restore();
    store.logout();
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn unauthorized_response_expires_session() {
    let (http, store) = store_with(Box::new(MemoryStorage::with_entry(TOKEN_STORAGE_KEY, "stale")));
    store.restore();
    let events = record_events(&store);

    let skills = format!("{BASE}/skills");
    http.mock_response(HttpMethod::Get, &skills, 401, json!({}));

    let client = ApiClient::new(
        BASE,
        RetryPolicy::none(),
        http.clone(),
        store.state().clone(),
    );
    let err = client
        .call(&folio_shared::protocol::ListSkills)
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!store.is_authenticated());
    assert_eq!(*events.borrow(), vec![SessionEvent::Expired]);
}
