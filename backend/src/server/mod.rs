//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{FileSettings, ServerConfig};

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use recipebox::Trace;
use recipebox::doc::ApiDoc;
use recipebox::inbound::http::health::{HealthState, live, ready, rest_status};
use recipebox::inbound::http::session::AuthSettings;
use recipebox::inbound::http::state::HttpState;
use recipebox::inbound::http::{account, home, recipes};

/// Largest accepted request body; PDF imports arrive as raw bodies.
const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    auth: web::Data<AuthSettings>,
    swagger: bool,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        auth,
        swagger,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(auth)
        .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
        .wrap(Trace)
        .service(home::index)
        .service(home::about)
        .service(account::login_form)
        .service(account::login)
        .service(account::register_form)
        .service(account::register)
        .service(account::logout)
        .service(account::account_index)
        .service(account::change_password)
        .service(recipes::list_recipes)
        .service(recipes::deleted_recipes)
        .service(recipes::view_recipe)
        .service(recipes::add_form)
        .service(recipes::add_recipe)
        .service(recipes::edit_form)
        .service(recipes::edit_recipe)
        .service(recipes::delete_recipe)
        .service(recipes::copy_recipe)
        .service(recipes::search_recipes)
        .service(recipes::recipes_by_tag)
        .service(recipes::recent_recipes)
        .service(recipes::favorite_recipes)
        .service(recipes::random_recipe)
        .service(recipes::export_recipe)
        .service(recipes::mark_made)
        .service(recipes::add_tag)
        .service(recipes::remove_tag)
        .service(recipes::import_from_url)
        .service(recipes::import_from_pdf)
        .service(rest_status)
        .service(ready)
        .service(live);

    app.configure(|cfg| {
        if swagger {
            cfg.service(
                SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()),
            );
        }
    })
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when the file directories cannot be created,
/// or when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config)?;
    let ServerConfig {
        auth,
        bind_addr,
        swagger,
        ..
    } = config;
    let auth = web::Data::new(auth);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            auth: auth.clone(),
            swagger,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
