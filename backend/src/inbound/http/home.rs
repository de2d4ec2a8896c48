//! Landing and about pages.
//!
//! ```text
//! GET /        GET /index
//! GET /about
//! ```

use actix_web::{get, routes, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::view_models::display_name;
use crate::inbound::http::view_models::home::{AboutViewModel, IndexViewModel};

/// Active recipes with the tag cloud.
#[routes]
#[get("/")]
#[get("/index")]
pub async fn index(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<IndexViewModel>> {
    let user = session.user(&state.accounts).await?;
    let recipes = state.recipes.get_all_recipes(Some(false)).await?;
    let tags = state.recipes.get_tags().await?;
    Ok(web::Json(IndexViewModel {
        user_name: display_name(user.as_ref()),
        recipes,
        tags,
    }))
}

#[utoipa::path(
    get,
    path = "/about",
    responses((status = 200, description = "About page", body = AboutViewModel)),
    tags = ["home"]
)]
#[get("/about")]
pub async fn about(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AboutViewModel>> {
    let user = session.user(&state.accounts).await?;
    Ok(web::Json(AboutViewModel::new(display_name(user.as_ref()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{TestContext, register_and_login};
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case("/")]
    #[case("/index")]
    #[actix_web::test]
    async fn index_greets_guests(#[case] path: &str) {
        let ctx = TestContext::new();
        let app = test::init_service(ctx.app(App::new().service(index))).await;
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(path).to_request())
                .await;
        assert_eq!(body["user_name"], "Guest");
        assert_eq!(body["recipes"], Value::Array(Vec::new()));
    }

    #[actix_web::test]
    async fn index_names_the_signed_in_user_and_lists_tags() {
        let ctx = TestContext::new();
        let (user, cookie) = register_and_login(&ctx, "Ada", "ada@example.com").await;
        ctx.create_sample_recipe(&user).await;
        let app = test::init_service(ctx.app(App::new().service(index))).await;

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(body["user_name"], "Ada");
        assert_eq!(body["recipes"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["tags"], serde_json::json!(["breakfast", "fast"]));
    }

    #[actix_web::test]
    async fn about_reports_the_version() {
        let ctx = TestContext::new();
        let app = test::init_service(ctx.app(App::new().service(about))).await;
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/about").to_request())
                .await;
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
