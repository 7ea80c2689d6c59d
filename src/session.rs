//! 认证模块
//!
//! 认证状态的唯一来源。`SessionState` 持有 token，并且是唯一访问
//! [`TokenStorage`] 的代码；`SessionStore` 在其上提供登录、登出与恢复操作。
//! 两者都在启动时创建一次，通过 `Rc` 共享。

use crate::api::AuthService;
use crate::error::{FolioError, FolioResult};
use crate::storage::TokenStorage;
use folio_shared::LoginCredentials;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// 会话变化事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// 启动时的恢复已完成
    Restored { authenticated: bool },
    LoggedIn,
    LoggedOut,
    /// 后端以 401 拒绝了 token
    Expired,
}

type SessionListener = Rc<dyn Fn(SessionEvent)>;

/// Token 持有者
///
/// 每个操作完成后，内存中的 token 与持久化的一致。唯一的例外是清除时存储失败：
/// 记录日志，内存仍被清空。
pub struct SessionState {
    storage: Box<dyn TokenStorage>,
    storage_key: String,
    token: RefCell<Option<String>>,
    /// `restore` 执行前为 true
    loading: Cell<bool>,
    listeners: RefCell<Vec<SessionListener>>,
}

impl SessionState {
    pub fn new(storage: Box<dyn TokenStorage>, storage_key: impl Into<String>) -> Self {
        Self {
            storage,
            storage_key: storage_key.into(),
            token: RefCell::new(None),
            loading: Cell::new(true),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    /// 单管理员部署：持有 token 即为管理员
    pub fn is_admin(&self) -> bool {
        self.is_authenticated()
    }

    /// 启动恢复完成前为 `true`
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn subscribe(&self, listener: impl Fn(SessionEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// 从存储中恢复 token，仅执行一次，之后的调用被忽略。
    /// 即使存储不可读，`loading` 最终也为 false。
    pub fn restore(&self) {
        if !self.loading.get() {
            debug!("session already restored");
            return;
        }

        let persisted = match self.storage.get(&self.storage_key) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "could not read persisted session, starting logged out");
                None
            }
        };

        let authenticated = persisted.is_some();
        *self.token.borrow_mut() = persisted;
        self.loading.set(false);

        info!(authenticated, "session restored");
        self.notify(SessionEvent::Restored { authenticated });
    }

    /// 先持久化再更新内存，存储失败时两边都保留原 token
    pub(crate) fn establish(&self, token: String) -> FolioResult<()> {
        self.storage
            .set(&self.storage_key, &token)
            .map_err(|e| FolioError::from(e).in_op("session.persist"))?;
        *self.token.borrow_mut() = Some(token);
        // 登录也意味着状态已确定
        self.loading.set(false);
        self.notify(SessionEvent::LoggedIn);
        Ok(())
    }

    /// 无条件执行：即使存储失败也清空内存
    pub(crate) fn clear(&self, event: SessionEvent) {
        if let Err(e) = self.storage.remove(&self.storage_key) {
            warn!(error = %e, "could not remove persisted session token");
        }
        let had_token = self.token.borrow_mut().take().is_some();
        debug!(had_token, ?event, "session cleared");
        self.notify(event);
    }

    fn notify(&self, event: SessionEvent) {
        // 先克隆监听器列表，允许回调中再次订阅
        let listeners: Vec<SessionListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }
}

/// 全局共享的会话操作
#[derive(Clone)]
pub struct SessionStore {
    state: Rc<SessionState>,
    auth: AuthService,
}

impl SessionStore {
    pub fn new(state: Rc<SessionState>, auth: AuthService) -> Self {
        Self { state, auth }
    }

    pub fn state(&self) -> &Rc<SessionState> {
        &self.state
    }

    pub fn token(&self) -> Option<String> {
        self.state.token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.state.is_admin()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn subscribe(&self, listener: impl Fn(SessionEvent) + 'static) {
        self.state.subscribe(listener);
    }

    /// 用凭据换取 token 并持久化。
    ///
    /// 失败时原样返回错误，当前 token (如有) 保持不变。
    pub async fn login(&self, credentials: &LoginCredentials) -> FolioResult<()> {
        let response = self
            .auth
            .login(credentials)
            .await
            .map_err(|e| e.in_op("session.login"))?;

        if response.token.trim().is_empty() {
            return Err(FolioError::unauthorized("login response carried an empty token")
                .in_op("session.login"));
        }

        self.state
            .establish(response.token)
            .map_err(|e| e.in_op("session.login"))?;
        info!(username = %credentials.username, "logged in");
        Ok(())
    }

    /// 不会失败
    pub fn logout(&self) {
        self.state.clear(SessionEvent::LoggedOut);
        info!("logged out");
    }

    pub fn restore(&self) {
        self.state.restore();
    }
}

#[cfg(test)]
mod tests;
