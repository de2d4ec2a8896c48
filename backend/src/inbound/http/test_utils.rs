//! Test helpers for inbound HTTP components.
//!
//! [`TestContext`] wires the real use cases over the in-memory repositories
//! and a temporary file tree so handler tests exercise the whole request path.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest};
use actix_web::http::header;
use actix_web::{App, test, web};
use tempfile::TempDir;

use crate::domain::ports::{MockRecipeScraper, RecipeScraper};
use crate::domain::security::{HashStrength, get_auth_cookie};
use crate::domain::{AccountService, Recipe, RecipeFilePaths, RecipeService, User};
use crate::inbound::http::session::AuthSettings;
use crate::inbound::http::state::HttpState;
use crate::outbound::export::PdfRecipeExporter;
use crate::outbound::images::ThumbnailImporter;
use crate::outbound::memory::{InMemoryRecipeRepository, InMemoryUserRepository};
use crate::test_support::{MutableClock, fixture_timestamp, sample_draft};

/// Password given to every account created by [`register_and_login`].
pub const TEST_PASSWORD: &str = "password";

/// Handler state, auth settings and the scratch directory behind them.
pub struct TestContext {
    pub state: HttpState,
    pub auth: AuthSettings,
    pub clock: Arc<MutableClock>,
    pub files: TempDir,
}

impl TestContext {
    /// Context whose scraper panics if a test reaches it.
    pub fn new() -> Self {
        Self::with_scraper(MockRecipeScraper::new())
    }

    pub fn with_scraper(scraper: impl RecipeScraper + 'static) -> Self {
        let files = TempDir::new().expect("temp dir");
        let clock = Arc::new(MutableClock::new(fixture_timestamp()));
        let image_dir = files.path().join("images");
        let accounts = AccountService::new(
            Arc::new(InMemoryUserRepository::new(clock.clone())),
            HashStrength::Fast,
        );
        let recipes = RecipeService::new(
            Arc::new(InMemoryRecipeRepository::new(clock.clone())),
            Arc::new(ThumbnailImporter::new(
                image_dir.clone(),
                ["png", "jpg", "jpeg", "gif"],
            )),
            Arc::new(PdfRecipeExporter::new()),
            Arc::new(scraper),
            clock.clone(),
            RecipeFilePaths {
                image_dir,
                export_dir: files.path().join("exports"),
            },
        );
        Self {
            state: HttpState::new(accounts, recipes),
            auth: AuthSettings {
                cookie_name: "recipebox_user".into(),
                secret_key: "test-secret".into(),
                cookie_secure: false,
            },
            clock,
            files,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.auth.cookie_name
    }

    /// Attach the handler state to `app`.
    pub fn app<T>(&self, app: App<T>) -> App<T>
    where
        T: ServiceFactory<ServiceRequest, Config = (), Error = actix_web::Error, InitError = ()>,
    {
        app.app_data(web::Data::new(self.state.clone()))
            .app_data(web::Data::new(self.auth.clone()))
    }

    /// Store the breakfast fixture and record `owner` as its creator.
    pub async fn create_sample_recipe(&self, owner: &User) -> Recipe {
        let recipe = self
            .state
            .recipes
            .create_recipe(sample_draft(), &[])
            .await
            .expect("create recipe");
        self.state
            .accounts
            .add_recipe(&owner.id, &recipe.id)
            .await
            .expect("record owner");
        recipe
    }
}

/// Register an account directly through the use case and return it with a
/// valid identity cookie.
pub async fn register_and_login(
    ctx: &TestContext,
    name: &str,
    email: &str,
) -> (User, Cookie<'static>) {
    let user = ctx
        .state
        .accounts
        .register_user(name, email, TEST_PASSWORD)
        .await
        .expect("register")
        .expect("email is new");
    let token = get_auth_cookie(&user.id.to_string(), &ctx.auth.secret_key);
    let cookie = Cookie::new(ctx.auth.cookie_name.clone(), token);
    (user, cookie)
}

/// `POST` with a url-encoded body.
pub fn form_post(uri: &str, body: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload(body.to_owned())
}
