//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects the annotated handlers and the schemas they reference.
//! Debug builds serve it through Swagger UI at `/docs`.

use crate::domain::{Error, ErrorCode, Recipe, User};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the identity cookie scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "IdentityCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "recipebox_user",
                "Identity cookie issued by POST /login or POST /register.",
            ))),
        );
    }
}

/// OpenAPI document for the HTTP interface.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Recipebox API",
        description = "Recipe collection pages, account management and health probes.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::home::about,
        crate::inbound::http::account::login,
        crate::inbound::http::account::register,
        crate::inbound::http::account::account_index,
        crate::inbound::http::account::change_password,
        crate::inbound::http::recipes::list_recipes,
        crate::inbound::http::recipes::view_recipe,
        crate::inbound::http::recipes::add_recipe,
        crate::inbound::http::recipes::edit_recipe,
        crate::inbound::http::recipes::delete_recipe,
        crate::inbound::http::recipes::search_recipes,
        crate::inbound::http::recipes::recipes_by_tag,
        crate::inbound::http::recipes::export_recipe,
        crate::inbound::http::recipes::import_from_url,
        crate::inbound::http::recipes::import_from_pdf,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode, Recipe, User)),
    tags(
        (name = "home", description = "Landing pages"),
        (name = "account", description = "Login, registration and the account page"),
        (name = "recipes", description = "Recipe browsing, editing, export and import"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/recipe/view/{id}")]
    #[case("/recipe/import/pdf")]
    #[case("/account")]
    #[case("/health/ready")]
    fn documents_the_handler_paths(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn registers_the_shared_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        for name in ["Error", "ErrorCode", "Recipe", "User"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
        assert!(
            doc.components
                .as_ref()
                .expect("components")
                .security_schemes
                .contains_key("IdentityCookie")
        );
    }
}
