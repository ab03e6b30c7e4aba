use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

pub const ACCESS_COOKIE: &str = "token";
pub const REFRESH_COOKIE: &str = "refreshToken";

const ACCESS_PATH: &str = "/";
/// Refresh token is only ever sent back to the auth endpoints
const REFRESH_PATH: &str = "/auth";

/// Builds the two session cookies
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    pub fn access_cookie(&self, token: &str, ttl_seconds: i64) -> Cookie<'static> {
        self.build(ACCESS_COOKIE, token.to_string(), ACCESS_PATH, ttl_seconds)
    }

    pub fn refresh_cookie(&self, token: &str, ttl_seconds: i64) -> Cookie<'static> {
        self.build(REFRESH_COOKIE, token.to_string(), REFRESH_PATH, ttl_seconds)
    }

    /// Expired, empty copies of both cookies
    pub fn removal_cookies(&self) -> [Cookie<'static>; 2] {
        let mut access = self.build(ACCESS_COOKIE, String::new(), ACCESS_PATH, 0);
        access.make_removal();
        let mut refresh = self.build(REFRESH_COOKIE, String::new(), REFRESH_PATH, 0);
        refresh.make_removal();
        [access, refresh]
    }

    fn build(&self, name: &'static str, value: String, path: &'static str, ttl: i64) -> Cookie<'static> {
        Cookie::build(name, value)
            .path(path)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(Duration::seconds(ttl))
            .finish()
    }
}

/// Access token from the `token` cookie, else from `Authorization: Bearer`
pub fn access_token_from(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }
    bearer_token(req.headers())
}

pub fn refresh_token_from(req: &HttpRequest) -> Option<String> {
    req.cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn bearer_token(headers: &actix_web::http::header::HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
