//! Account handlers: login, registration, logout and the account page.
//!
//! ```text
//! GET|POST /login      GET|POST /account/login
//! GET|POST /register   GET|POST /account/register
//! GET /logout          GET /account/logout
//! GET /account         POST /account/password
//! ```

use actix_web::{HttpResponse, get, post, routes, web};
use tracing::info;

use crate::domain::Error;
use crate::inbound::http::form::FormData;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::view_models::account::{
    AccountViewModel, LoginViewModel, PasswordViewModel, RegisterViewModel,
};
use crate::inbound::http::view_models::ensure_valid;
use crate::inbound::http::{ApiResult, redirect};

const LOGIN_FAILED: &str = "The account does not exist or the password is wrong.";
const EMAIL_TAKEN: &str = "A user with that email already exists.";

#[routes]
#[get("/login")]
#[get("/account/login")]
pub async fn login_form() -> web::Json<LoginViewModel> {
    web::Json(LoginViewModel::default())
}

/// Verify the credentials and set the identity cookie.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content_type = "application/x-www-form-urlencoded", description = "email, password"),
    responses(
        (status = 302, description = "Logged in; redirects to /account", headers(("Set-Cookie" = String, description = "Identity cookie"))),
        (status = 400, description = "Missing field", body = Error),
        (status = 401, description = "Unknown account or wrong password", body = Error)
    ),
    tags = ["account"]
)]
#[routes]
#[post("/login")]
#[post("/account/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: FormData,
) -> ApiResult<HttpResponse> {
    let mut vm = LoginViewModel::from_form(&form);
    vm.validate();
    ensure_valid(vm.error.as_deref())?;
    let user = state
        .accounts
        .login_user(&vm.email, &vm.password)
        .await?
        .ok_or_else(|| Error::unauthorized(LOGIN_FAILED))?;
    info!(user_id = %user.id, "user logged in");
    Ok(redirect("/account")
        .cookie(session.login_cookie(&user.id))
        .finish())
}

#[routes]
#[get("/register")]
#[get("/account/register")]
pub async fn register_form() -> web::Json<RegisterViewModel> {
    web::Json(RegisterViewModel::default())
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content_type = "application/x-www-form-urlencoded", description = "name, email, password"),
    responses(
        (status = 302, description = "Registered; redirects to /account"),
        (status = 400, description = "Invalid form", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["account"]
)]
#[routes]
#[post("/register")]
#[post("/account/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: FormData,
) -> ApiResult<HttpResponse> {
    let mut vm = RegisterViewModel::from_form(&form);
    vm.validate();
    ensure_valid(vm.error.as_deref())?;
    let user = state
        .accounts
        .register_user(&vm.name, &vm.email, &vm.password)
        .await?
        .ok_or_else(|| Error::conflict(EMAIL_TAKEN))?;
    Ok(redirect("/account")
        .cookie(session.login_cookie(&user.id))
        .finish())
}

#[routes]
#[get("/logout")]
#[get("/account/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    redirect("/").cookie(session.logout_cookie()).finish()
}

/// The signed-in user's profile and owned recipes; anonymous visitors are
/// sent to the login form.
#[utoipa::path(
    get,
    path = "/account",
    responses(
        (status = 200, description = "Account page", body = AccountViewModel),
        (status = 302, description = "Not signed in; redirects to /account/login")
    ),
    tags = ["account"]
)]
#[get("/account")]
pub async fn account_index(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let Some(user) = session.user(&state.accounts).await? else {
        return Ok(redirect("/account/login").finish());
    };
    let mut recipes = Vec::with_capacity(user.recipe_ids.len());
    for id in &user.recipe_ids {
        if let Some(recipe) = state.recipes.find_recipe_by_id(id).await? {
            recipes.push(recipe);
        }
    }
    Ok(HttpResponse::Ok().json(AccountViewModel { user, recipes }))
}

#[utoipa::path(
    post,
    path = "/account/password",
    request_body(content_type = "application/x-www-form-urlencoded", description = "password"),
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid password", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["account"]
)]
#[post("/account/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: FormData,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let mut vm = PasswordViewModel::from_form(&form);
    vm.validate();
    ensure_valid(vm.error.as_deref())?;
    if !state.accounts.change_password(&user_id, &vm.password).await? {
        return Err(Error::not_found("user not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}
