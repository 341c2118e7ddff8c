use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::AuthConfig;
use crate::models::user::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

/// Add both session cookies for a freshly issued token pair.
pub fn with_session(jar: CookieJar, tokens: &TokenPair, config: &AuthConfig) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        config.access_token_ttl,
        config.cookie_secure,
    ))
    .add(session_cookie(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        config.refresh_token_ttl,
        config.cookie_secure,
    ))
}

/// Expire both session cookies.
pub fn without_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}
