//! Recipe handlers.
//!
//! Read routes are open to guests; every mutation needs a signed-in user.
//! Created recipes (forms, copies and imports) are recorded as owned by the
//! user that made them.

use std::path::PathBuf;

use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Error, Recipe, RecipeId, UserId};
use crate::inbound::http::form::FormData;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::view_models::recipe::{
    RecipeFormViewModel, RecipeListViewModel, RecipeViewModel, SearchViewModel, TagViewModel,
    UpdateOutcome, parse_tag_path,
};
use crate::inbound::http::view_models::{display_name, ensure_valid};
use crate::inbound::http::{ApiResult, redirect};

/// Number of recipes on the "recently changed" page.
pub const RECENT_LIMIT: usize = 10;

const NOT_FOUND: &str = "recipe not found";

fn parse_recipe_id(raw: &str) -> Result<RecipeId, Error> {
    raw.parse().map_err(|_| Error::not_found(NOT_FOUND))
}

fn view_location(id: &RecipeId) -> String {
    format!("/recipe/view/{id}")
}

async fn user_name(state: &HttpState, session: &SessionContext) -> Result<String, Error> {
    let user = session.user(&state.accounts).await?;
    Ok(display_name(user.as_ref()))
}

async fn existing_recipe(state: &HttpState, id: &RecipeId) -> Result<Recipe, Error> {
    state
        .recipes
        .find_recipe_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))
}

/// Record `owner` as the creator of freshly created `recipes`.
///
/// When ownership cannot be stored the recipes are soft-deleted again, so an
/// ownerless recipe never shows up in the listings.
async fn record_owner(state: &HttpState, owner: &UserId, recipes: &[Recipe]) -> Result<(), Error> {
    for recipe in recipes {
        if let Err(err) = state.accounts.add_recipe(owner, &recipe.id).await {
            warn!(
                user_id = %owner,
                recipe_id = %recipe.id,
                error = %err.message(),
                "ownership not recorded; withdrawing created recipes"
            );
            for created in recipes {
                if let Err(rollback) = state.recipes.delete_recipe(&created.id).await {
                    warn!(
                        recipe_id = %created.id,
                        error = %rollback.message(),
                        "failed to withdraw unowned recipe"
                    );
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

async fn list(
    state: &HttpState,
    session: &SessionContext,
    recipes: Vec<Recipe>,
) -> ApiResult<web::Json<RecipeListViewModel>> {
    Ok(web::Json(RecipeListViewModel {
        user_name: user_name(state, session).await?,
        recipes,
    }))
}

/// Active recipes.
#[utoipa::path(
    get,
    path = "/recipe",
    responses((status = 200, description = "Active recipes", body = RecipeListViewModel)),
    tags = ["recipes"]
)]
#[get("/recipe")]
pub async fn list_recipes(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RecipeListViewModel>> {
    let recipes = state.recipes.get_all_recipes(Some(false)).await?;
    list(&state, &session, recipes).await
}

/// Soft-deleted recipes.
#[get("/recipe/deleted")]
pub async fn deleted_recipes(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RecipeListViewModel>> {
    let recipes = state.recipes.get_all_recipes(Some(true)).await?;
    list(&state, &session, recipes).await
}

#[utoipa::path(
    get,
    path = "/recipe/view/{id}",
    params(("id" = String, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Recipe", body = RecipeViewModel),
        (status = 404, description = "Unknown recipe", body = Error)
    ),
    tags = ["recipes"]
)]
#[get("/recipe/view/{id}")]
pub async fn view_recipe(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RecipeViewModel>> {
    let id = parse_recipe_id(&path)?;
    let recipe = existing_recipe(&state, &id).await?;
    Ok(web::Json(RecipeViewModel::new(
        user_name(&state, &session).await?,
        recipe,
    )))
}

#[get("/recipe/add")]
pub async fn add_form() -> web::Json<RecipeFormViewModel> {
    web::Json(RecipeFormViewModel::default())
}

/// Create a recipe from the submitted form.
#[utoipa::path(
    post,
    path = "/recipe/add",
    request_body(content_type = "application/x-www-form-urlencoded", description = "Recipe form fields"),
    responses(
        (status = 302, description = "Created; redirects to the recipe"),
        (status = 400, description = "Invalid form", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["recipes"]
)]
#[post("/recipe/add")]
pub async fn add_recipe(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: FormData,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let mut vm = RecipeFormViewModel::from_form(&form);
    vm.validate();
    ensure_valid(vm.error.as_deref())?;
    let recipe = state.recipes.create_recipe(vm.to_draft(), &[]).await?;
    record_owner(&state, &owner, std::slice::from_ref(&recipe)).await?;
    Ok(redirect(&view_location(&recipe.id)).finish())
}

#[get("/recipe/edit/{id}")]
pub async fn edit_form(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<RecipeFormViewModel>> {
    let id = parse_recipe_id(&path)?;
    let recipe = existing_recipe(&state, &id).await?;
    Ok(web::Json(RecipeFormViewModel::from_recipe(&recipe)))
}

#[utoipa::path(
    post,
    path = "/recipe/edit/{id}",
    params(("id" = String, Path, description = "Recipe id")),
    request_body(content_type = "application/x-www-form-urlencoded", description = "Recipe form fields"),
    responses(
        (status = 302, description = "Saved; redirects to the recipe"),
        (status = 400, description = "Invalid form", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Unknown recipe", body = Error)
    ),
    tags = ["recipes"]
)]
#[post("/recipe/edit/{id}")]
pub async fn edit_recipe(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    form: FormData,
) -> ApiResult<HttpResponse> {
    session.require_user_id()?;
    let id = parse_recipe_id(&path)?;
    let mut vm = RecipeFormViewModel::from_form(&form);
    vm.validate();
    ensure_valid(vm.error.as_deref())?;
    let recipe = state
        .recipes
        .edit_recipe(&id, vm.to_draft())
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(redirect(&view_location(&recipe.id)).finish())
}

/// Soft-delete a recipe.
#[utoipa::path(
    post,
    path = "/recipe/delete/{id}",
    params(("id" = String, Path, description = "Recipe id")),
    responses(
        (status = 302, description = "Deleted; redirects to /recipe"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Unknown recipe", body = Error)
    ),
    tags = ["recipes"]
)]
#[post("/recipe/delete/{id}")]
pub async fn delete_recipe(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_user_id()?;
    let id = parse_recipe_id(&path)?;
    if state.recipes.delete_recipe(&id).await? == 0 {
        return Err(Error::not_found(NOT_FOUND));
    }
    Ok(redirect("/recipe").finish())
}

#[post("/recipe/copy/{id}")]
pub async fn copy_recipe(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let id = parse_recipe_id(&path)?;
    let copy = state
        .recipes
        .copy_recipe(&id)
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;
    record_owner(&state, &owner, std::slice::from_ref(&copy)).await?;
    Ok(redirect(&view_location(&copy.id)).finish())
}

/// Name matches first, then full-text matches. A blank query finds nothing.
#[utoipa::path(
    get,
    path = "/recipe/search",
    params(("search_text" = String, Query, description = "Search text")),
    responses((status = 200, description = "Matches", body = SearchViewModel)),
    tags = ["recipes"]
)]
#[get("/recipe/search")]
pub async fn search_recipes(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: FormData,
) -> ApiResult<web::Json<SearchViewModel>> {
    let mut vm = SearchViewModel::from_form(&form, user_name(&state, &session).await?);
    if !vm.search_text.is_empty() {
        vm.recipes = state.recipes.recipes_search(&vm.search_text).await?;
    }
    Ok(web::Json(vm))
}

/// Recipes carrying every tag in the comma separated list.
#[utoipa::path(
    get,
    path = "/recipe/tag/{tags}",
    params(("tags" = String, Path, description = "Comma separated tags")),
    responses((status = 200, description = "Tagged recipes", body = TagViewModel)),
    tags = ["recipes"]
)]
#[get("/recipe/tag/{tags}")]
pub async fn recipes_by_tag(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<TagViewModel>> {
    let tags = parse_tag_path(&path);
    let recipes = state.recipes.find_recipes_by_tag(&tags).await?;
    Ok(web::Json(TagViewModel {
        user_name: user_name(&state, &session).await?,
        tags,
        recipes,
    }))
}

#[get("/recipe/recent")]
pub async fn recent_recipes(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RecipeListViewModel>> {
    let recipes = state.recipes.recent_recipes(RECENT_LIMIT).await?;
    list(&state, &session, recipes).await
}

#[get("/recipe/favorites")]
pub async fn favorite_recipes(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RecipeListViewModel>> {
    let recipes = state.recipes.favorite_recipes().await?;
    list(&state, &session, recipes).await
}

#[get("/recipe/random")]
pub async fn random_recipe(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RecipeViewModel>> {
    let recipe = state
        .recipes
        .random_recipe()
        .await?
        .ok_or_else(|| Error::not_found("there are no recipes yet"))?;
    Ok(web::Json(RecipeViewModel::new(
        user_name(&state, &session).await?,
        recipe,
    )))
}

/// Download the recipe as a PDF.
#[utoipa::path(
    get,
    path = "/recipe/export/{id}",
    params(("id" = String, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 404, description = "Unknown recipe", body = Error)
    ),
    tags = ["recipes"]
)]
#[get("/recipe/export/{id}")]
pub async fn export_recipe(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_recipe_id(&path)?;
    let file = state
        .recipes
        .export_recipe(&id)
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;
    let bytes = tokio::fs::read(&file)
        .await
        .map_err(|err| Error::internal(format!("export unreadable: {err}")))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{id}.pdf"));
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(bytes))
}

#[post("/recipe/made/{id}")]
pub async fn mark_made(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UpdateOutcome>> {
    session.require_user_id()?;
    let id = parse_recipe_id(&path)?;
    existing_recipe(&state, &id).await?;
    let updated = state.recipes.mark_made(&id).await?;
    Ok(web::Json(UpdateOutcome { updated }))
}

fn submitted_tag(form: &FormData) -> Result<String, Error> {
    let tag = form.value("tag").trim();
    if tag.is_empty() {
        return Err(Error::invalid_request("You must specify a tag."));
    }
    Ok(tag.to_owned())
}

#[post("/recipe/tags/{id}/add")]
pub async fn add_tag(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    form: FormData,
) -> ApiResult<web::Json<UpdateOutcome>> {
    session.require_user_id()?;
    let id = parse_recipe_id(&path)?;
    let tag = submitted_tag(&form)?;
    existing_recipe(&state, &id).await?;
    let updated = state.recipes.add_tag(&id, &tag).await?;
    Ok(web::Json(UpdateOutcome { updated }))
}

#[post("/recipe/tags/{id}/remove")]
pub async fn remove_tag(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    form: FormData,
) -> ApiResult<web::Json<UpdateOutcome>> {
    session.require_user_id()?;
    let id = parse_recipe_id(&path)?;
    let tag = submitted_tag(&form)?;
    existing_recipe(&state, &id).await?;
    let updated = state.recipes.remove_tag(&id, &tag).await?;
    Ok(web::Json(UpdateOutcome { updated }))
}

/// Scrape a recipe page into a new recipe.
#[utoipa::path(
    post,
    path = "/recipe/import",
    request_body(content_type = "application/x-www-form-urlencoded", description = "url"),
    responses(
        (status = 302, description = "Imported; redirects to the recipe"),
        (status = 400, description = "Missing url or unusable page", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["recipes"]
)]
#[post("/recipe/import")]
pub async fn import_from_url(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: FormData,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let url = form.value("url").trim();
    if url.is_empty() {
        return Err(Error::invalid_request("You must specify a URL."));
    }
    let recipe = state.recipes.import_recipe_from_url(url).await?;
    record_owner(&state, &owner, std::slice::from_ref(&recipe)).await?;
    info!(recipe_id = %recipe.id, %url, "imported recipe from url");
    Ok(redirect(&view_location(&recipe.id)).finish())
}

/// Re-import recipes from a PDF produced by the export route.
#[utoipa::path(
    post,
    path = "/recipe/import/pdf",
    request_body(content_type = "application/pdf", description = "Exported document"),
    responses(
        (status = 200, description = "Imported recipes", body = RecipeListViewModel),
        (status = 400, description = "Not a recipe export", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["recipes"]
)]
#[post("/recipe/import/pdf")]
pub async fn import_from_pdf(
    state: web::Data<HttpState>,
    session: SessionContext,
    body: web::Bytes,
) -> ApiResult<web::Json<RecipeListViewModel>> {
    let owner = session.require_user_id()?;
    if body.is_empty() {
        return Err(Error::invalid_request("You must upload a PDF document."));
    }
    let upload: PathBuf =
        std::env::temp_dir().join(format!("recipebox-import-{}.pdf", Uuid::new_v4().simple()));
    tokio::fs::write(&upload, &body)
        .await
        .map_err(|err| Error::internal(format!("upload could not be stored: {err}")))?;
    let imported = state.recipes.import_recipes_from_pdf(&upload).await;
    if let Err(err) = tokio::fs::remove_file(&upload).await {
        warn!(path = %upload.display(), error = %err, "failed to remove pdf upload");
    }
    let recipes = imported?;
    record_owner(&state, &owner, &recipes).await?;
    list(&state, &session, recipes).await
}
