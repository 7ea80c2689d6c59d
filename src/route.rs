//! 路由定义模块
//!
//! 纯粹的路由模型：有哪些视图，以及哪些视图受会话保护。

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 公开作品集 (默认路由)
    #[default]
    Home,
    Login,
    /// 管理面板及其子路径 (需要认证)
    Admin,
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举，`/admin` 下的子路径均归入管理面板
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Home,
            "/login" => Self::Login,
            "/admin" => Self::Admin,
            p if p.starts_with("/admin/") => Self::Admin,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Admin => "/admin",
            Self::NotFound => "/404",
        }
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// 已认证用户访问这些路由时会被重定向
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login)
    }

    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    pub fn auth_success_redirect() -> Self {
        Self::Admin
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}
