//! Client core for a personal portfolio site and its admin dashboard.
//!
//! [`App`] wires the pieces together once at startup:
//! storage -> session -> API client -> services -> router. Everything is
//! shared through `Rc` handles on a single thread.

pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod guard;
pub mod home;
pub mod hook;
pub mod request;
pub mod route;
pub mod session;
pub mod storage;

pub use folio_shared as shared;

use api::{AdminService, AuthService, PortfolioService};
use client::ApiClient;
use config::FolioConfig;
use dashboard::Dashboard;
use error::FolioResult;
use guard::{MemoryNavigator, Navigator, RouterService};
use home::PortfolioHome;
use request::{HttpClient, ReqwestHttpClient};
use session::{SessionState, SessionStore};
use std::rc::Rc;
use storage::{FileStorage, TokenStorage};
use tracing::{debug, info};

use folio_shared::TOKEN_STORAGE_KEY;

/// The application context: one of each service, built once.
pub struct App {
    config: FolioConfig,
    session: SessionStore,
    client: ApiClient,
    portfolio: PortfolioService,
    admin: AdminService,
    router: RouterService,
}

impl App {
    pub fn new(
        config: FolioConfig,
        http: Rc<dyn HttpClient>,
        storage: Box<dyn TokenStorage>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        let state = Rc::new(SessionState::new(storage, TOKEN_STORAGE_KEY));
        let client = ApiClient::new(&config.api_base_url, config.retry_policy(), http, state.clone());

        let router = RouterService::new(state.clone(), navigator);
        router.attach();

        // 401 -> login view, unless already there
        let on_401 = router.clone();
        client.on_unauthorized(move |event| {
            debug!(method = event.method.as_str(), path = %event.path, "unauthorized response");
            on_401.redirect_to_login();
        });

        let session = SessionStore::new(state, AuthService::new(client.clone()));

        Self {
            portfolio: PortfolioService::new(client.clone()),
            admin: AdminService::new(client.clone()),
            config,
            session,
            client,
            router,
        }
    }

    /// Production wiring: reqwest transport, file-backed session, in-memory
    /// history starting at the home view.
    pub fn from_config(config: FolioConfig) -> FolioResult<Self> {
        config.validate()?;
        let http = ReqwestHttpClient::new(config.request_timeout)?;
        let storage = FileStorage::new(config.storage_path.clone());
        Ok(Self::new(
            config,
            Rc::new(http),
            Box::new(storage),
            Rc::new(MemoryNavigator::default()),
        ))
    }

    /// Restores the persisted session. Call once before the first guarded
    /// navigation.
    pub fn start(&self) {
        info!(api = %self.config.api_base_url, "starting");
        self.session.restore();
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn portfolio(&self) -> &PortfolioService {
        &self.portfolio
    }

    pub fn admin(&self) -> &AdminService {
        &self.admin
    }

    pub fn router(&self) -> &RouterService {
        &self.router
    }

    pub fn home(&self) -> PortfolioHome {
        PortfolioHome::new(self.portfolio.clone())
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.portfolio.clone(), self.admin.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::GuardDecision;
    use crate::request::MockHttpClient;
    use crate::route::AppRoute;
    use folio_shared::LoginCredentials;
    use folio_shared::protocol::HttpMethod;
    use serde_json::json;

    const BASE: &str = "http://api.test/api";

    struct Harness {
        _dir: tempfile::TempDir,
        path: std::path::PathBuf,
        http: Rc<MockHttpClient>,
        nav: Rc<MemoryNavigator>,
        app: App,
    }

    fn harness(token: Option<&str>, start_path: &str) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        if let Some(token) = token {
            FileStorage::new(&path).set(TOKEN_STORAGE_KEY, token).unwrap();
        }
        let http = Rc::new(MockHttpClient::new());
        let nav = Rc::new(MemoryNavigator::new(start_path));
        let app = App::new(
            FolioConfig::default().with_base_url(BASE),
            http.clone(),
            Box::new(FileStorage::new(&path)),
            nav.clone(),
        );
        app.start();
        Harness {
            _dir: dir,
            path,
            http,
            nav,
            app,
        }
    }

    fn persisted(h: &Harness) -> Option<String> {
        FileStorage::new(&h.path).get(TOKEN_STORAGE_KEY).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_clears_storage_and_lands_on_login() {
        let h = harness(Some("stale"), "/");
        h.http
            .mock_response(HttpMethod::Get, &format!("{BASE}/skills"), 401, json!({}));

        let err = h.app.portfolio().get_skills().await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(persisted(&h), None);
        assert!(!h.app.session().is_authenticated());
        assert_eq!(h.app.router().current_route(), AppRoute::Login);
        assert_eq!(h.nav.current_path(), "/login");
    }

    #[tokio::test]
    async fn unauthorized_on_admin_view_goes_to_login_once() {
        let h = harness(Some("stale"), "/admin");
        assert_eq!(h.app.router().decision(), GuardDecision::Render(AppRoute::Admin));
        h.http
            .mock_response(HttpMethod::Delete, &format!("{BASE}/projects/1"), 401, json!({}));

        h.app.admin().delete_project(1).await.unwrap_err();

        assert_eq!(h.nav.entries(), vec!["/admin", "/login"]);
    }

    #[tokio::test]
    async fn unauthorized_while_on_login_does_not_navigate() {
        let h = harness(None, "/login");
        let before = h.nav.entries();

        h.http
            .mock_response(HttpMethod::Get, &format!("{BASE}/user"), 401, json!({}));
        h.app.portfolio().get_profile().await.unwrap_err();

        assert_eq!(h.nav.entries(), before);
        assert_eq!(h.app.router().current_route(), AppRoute::Login);
    }

    #[tokio::test]
    async fn login_survives_restart() {
        let h = harness(None, "/login");
        h.http.mock_response(
            HttpMethod::Post,
            &format!("{BASE}/auth/login"),
            200,
            json!({"token": "jwt-9"}),
        );

        h.app
            .session()
            .login(&LoginCredentials::new("admin", "pw"))
            .await
            .unwrap();
        assert_eq!(h.app.router().current_route(), AppRoute::Admin);

        let restarted = App::new(
            FolioConfig::default().with_base_url(BASE),
            Rc::new(MockHttpClient::new()),
            Box::new(FileStorage::new(&h.path)),
            Rc::new(MemoryNavigator::new("/admin")),
        );
        assert_eq!(restarted.router().decision(), GuardDecision::Loading);
        restarted.start();
        assert_eq!(
            restarted.session().is_authenticated(),
            h.app.session().is_authenticated()
        );
        assert_eq!(restarted.router().decision(), GuardDecision::Render(AppRoute::Admin));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let cfg = FolioConfig::default().with_base_url("ftp://example.com");
        assert!(App::from_config(cfg).is_err());
    }
}
