//! Cookie identity helpers to keep HTTP handlers free of framework details.
//!
//! The identity cookie holds `{user_id}:{digest}` produced by
//! [`get_auth_cookie`]. [`SessionContext`] resolves it on every request and
//! builds the login and logout cookies.

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::warn;

use crate::domain::security::{get_auth_cookie, get_user_id_from_cookie};
use crate::domain::{AccountService, Error, User, UserId};

/// Lifetime of the identity cookie.
pub const COOKIE_MAX_AGE_DAYS: i64 = 30;

/// Cookie naming and signing settings shared by every request.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub cookie_name: String,
    pub secret_key: String,
    pub cookie_secure: bool,
}

/// The identity resolved from the request cookie, if any.
#[derive(Debug, Clone)]
pub struct SessionContext {
    settings: web::Data<AuthSettings>,
    user_id: Option<UserId>,
}

impl SessionContext {
    fn from_http_request(req: &HttpRequest) -> Result<Self, Error> {
        let settings = req
            .app_data::<web::Data<AuthSettings>>()
            .cloned()
            .ok_or_else(|| Error::internal("authentication settings are not configured"))?;
        let user_id = req
            .cookie(&settings.cookie_name)
            .and_then(|cookie| get_user_id_from_cookie(cookie.value(), &settings.secret_key))
            .and_then(|raw| match UserId::new(&raw) {
                Ok(id) => Some(id),
                Err(error) => {
                    warn!(%error, "invalid user id in auth cookie");
                    None
                }
            });
        Ok(Self { settings, user_id })
    }

    /// The signed-in user's id, if the cookie verified.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Require a signed-in user or return `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id.ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Load the signed-in user. A cookie for a vanished account reads as anonymous.
    pub async fn user(&self, accounts: &AccountService) -> Result<Option<User>, Error> {
        match &self.user_id {
            Some(id) => accounts.find_user_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Cookie identifying `user_id` for the next requests.
    pub fn login_cookie(&self, user_id: &UserId) -> Cookie<'static> {
        let token = get_auth_cookie(&user_id.to_string(), &self.settings.secret_key);
        Cookie::build(self.settings.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .secure(self.settings.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
            .finish()
    }

    /// Expired cookie that clears the identity.
    pub fn logout_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.settings.cookie_name.clone(), "")
            .path("/")
            .http_only(true)
            .finish();
        cookie.make_removal();
        cookie
    }
}

impl FromRequest for SessionContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}
