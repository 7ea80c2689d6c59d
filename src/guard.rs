//! 路由服务模块 - 守卫与导航
//!
//! 导航流程：请求 -> 守卫 -> 更新历史记录 -> 当前路由。
//! 历史记录由 [`Navigator`] trait 抽象；守卫本身是会话状态与目标路由的纯函数。

use crate::route::AppRoute;
use crate::session::{SessionEvent, SessionState};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info};

/// 守卫视角下的会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// 会话恢复尚未完成
    Checking,
    Authenticated,
    Unauthenticated,
}

impl GuardState {
    pub fn from_session(session: &SessionState) -> Self {
        if session.is_loading() {
            GuardState::Checking
        } else if session.is_authenticated() {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// 显示加载状态，暂不重定向
    Loading,
    Render(AppRoute),
    Redirect(AppRoute),
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn resolve(state: GuardState, target: AppRoute) -> GuardDecision {
        if target == AppRoute::NotFound {
            return GuardDecision::Redirect(AppRoute::Home);
        }

        if target.requires_auth() {
            return match state {
                GuardState::Checking => GuardDecision::Loading,
                GuardState::Authenticated => GuardDecision::Render(target),
                GuardState::Unauthenticated => {
                    GuardDecision::Redirect(AppRoute::auth_failure_redirect())
                }
            };
        }

        if target.should_redirect_when_authenticated() && state == GuardState::Authenticated {
            return GuardDecision::Redirect(AppRoute::auth_success_redirect());
        }

        GuardDecision::Render(target)
    }
}

// =========================================================
// 历史记录 (History)
// =========================================================

/// 浏览器历史记录的替代抽象
pub trait Navigator {
    fn current_path(&self) -> String;
    fn push(&self, path: &str);
    /// 替换当前记录 (重定向使用)
    fn replace(&self, path: &str);
}

#[derive(Debug)]
pub struct MemoryNavigator {
    entries: RefCell<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(initial_path: &str) -> Self {
        Self {
            entries: RefCell::new(vec![initial_path.to_string()]),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(AppRoute::Home.to_path())
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.entries.borrow().last().cloned().unwrap_or_else(|| "/".to_string())
    }

    fn push(&self, path: &str) {
        self.entries.borrow_mut().push(path.to_string());
    }

    fn replace(&self, path: &str) {
        let mut entries = self.entries.borrow_mut();
        match entries.last_mut() {
            Some(last) => *last = path.to_string(),
            None => entries.push(path.to_string()),
        }
    }
}

// =========================================================
// 路由器服务
// =========================================================

struct RouterInner {
    session: Rc<SessionState>,
    navigator: Rc<dyn Navigator>,
    current: Cell<AppRoute>,
}

/// 持有当前路由，所有路由变更都经过守卫
#[derive(Clone)]
pub struct RouterService {
    inner: Rc<RouterInner>,
}

impl RouterService {
    pub fn new(session: Rc<SessionState>, navigator: Rc<dyn Navigator>) -> Self {
        let initial = AppRoute::from_path(&navigator.current_path());
        Self {
            inner: Rc::new(RouterInner {
                session,
                navigator,
                current: Cell::new(initial),
            }),
        }
    }

    /// 会话变化时重新执行守卫
    pub fn attach(&self) {
        let weak: Weak<RouterInner> = Rc::downgrade(&self.inner);
        self.inner.session.subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                RouterService { inner }.on_session_event(event);
            }
        });
    }

    pub fn current_route(&self) -> AppRoute {
        self.inner.current.get()
    }

    pub fn guard_state(&self) -> GuardState {
        GuardState::from_session(&self.inner.session)
    }

    /// 当前路由此刻应显示的内容
    pub fn decision(&self) -> GuardDecision {
        RouteGuard::resolve(self.guard_state(), self.current_route())
    }

    pub fn navigate(&self, path: &str) -> GuardDecision {
        self.navigate_to_route(AppRoute::from_path(path), true)
    }

    /// 供 401 处理使用，已在登录页时不做任何事
    pub fn redirect_to_login(&self) {
        if self.current_route() == AppRoute::Login {
            debug!("already on login, skipping redirect");
            return;
        }
        info!("session rejected, redirecting to login");
        self.set_route(AppRoute::Login, false);
    }

    fn navigate_to_route(&self, target: AppRoute, use_push: bool) -> GuardDecision {
        let decision = RouteGuard::resolve(self.guard_state(), target);
        match decision {
            GuardDecision::Loading | GuardDecision::Render(_) => self.set_route(target, use_push),
            GuardDecision::Redirect(to) => {
                debug!(from = %target, to = %to, "guard redirect");
                // 重定向替换当前历史记录
                self.set_route(to, false);
            }
        }
        decision
    }

    fn on_session_event(&self, event: SessionEvent) {
        let route = self.current_route();
        match event {
            SessionEvent::Restored { .. } => {
                // 检查中 -> 已确定：重新评估之前请求的路由
                self.navigate_to_route(route, false);
            }
            SessionEvent::LoggedIn => {
                if route.should_redirect_when_authenticated() {
                    self.set_route(AppRoute::auth_success_redirect(), true);
                }
            }
            SessionEvent::LoggedOut | SessionEvent::Expired => {
                if route.requires_auth() {
                    self.set_route(AppRoute::auth_failure_redirect(), true);
                }
            }
        }
    }

    fn set_route(&self, route: AppRoute, use_push: bool) {
        if use_push {
            self.inner.navigator.push(route.to_path());
        } else {
            self.inner.navigator.replace(route.to_path());
        }
        self.inner.current.set(route);
    }
}
