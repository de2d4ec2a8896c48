//! Recipe use cases.
//!
//! Mostly thin delegation to the [`RecipeRepository`], plus the rules that
//! belong to no single adapter: uploaded image processing on create, the
//! export cache keyed by modification time, and turning scraped pages into
//! drafts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mockable::Clock;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    ImageProcessingError, ImageProcessor, RecipeExportError, RecipeExporter,
    RecipePersistenceError, RecipeRepository, RecipeScrapeError, RecipeScraper, ScrapedRecipe,
};
use crate::domain::{Error, Recipe, RecipeDraft, RecipeId, Servings};

/// Cook time recorded for imported recipes that publish no total time.
pub const UNKNOWN_COOK_TIME: f64 = 999.0;

/// Tag attached to every recipe imported from a web page.
pub const IMPORTED_TAG: &str = "imported";

fn map_recipe_error(error: RecipePersistenceError) -> Error {
    match error {
        RecipePersistenceError::Connection { message } => {
            Error::service_unavailable(format!("recipe repository unavailable: {message}"))
        }
        RecipePersistenceError::Query { message } => {
            Error::internal(format!("recipe repository error: {message}"))
        }
    }
}

fn map_image_error(error: ImageProcessingError) -> Error {
    Error::internal(error.to_string())
}

fn map_export_error(error: RecipeExportError) -> Error {
    match error {
        RecipeExportError::Io { message } => Error::internal(format!("export failed: {message}")),
        RecipeExportError::Format { message } => {
            Error::invalid_request(format!("not a recipe export: {message}"))
        }
    }
}

fn map_scrape_error(error: RecipeScrapeError) -> Error {
    match error {
        RecipeScrapeError::Fetch { .. } | RecipeScrapeError::Parse { .. } => {
            Error::invalid_request(error.to_string())
        }
        RecipeScrapeError::Io { message } => Error::internal(message),
    }
}

fn validated(draft: RecipeDraft) -> Result<RecipeDraft, Error> {
    draft
        .validate()
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    Ok(draft.normalized())
}

/// Filesystem locations used by the recipe use cases.
#[derive(Debug, Clone)]
pub struct RecipeFilePaths {
    /// Directory holding processed images and scraped downloads.
    pub image_dir: PathBuf,
    /// Directory holding cached exports.
    pub export_dir: PathBuf,
}

/// Recipe service orchestrating the recipe repository and file adapters.
#[derive(Clone)]
pub struct RecipeService {
    recipes: Arc<dyn RecipeRepository>,
    images: Arc<dyn ImageProcessor>,
    exporter: Arc<dyn RecipeExporter>,
    scraper: Arc<dyn RecipeScraper>,
    clock: Arc<dyn Clock>,
    paths: RecipeFilePaths,
}

impl RecipeService {
    /// Create a new service from its collaborators.
    pub fn new(
        recipes: Arc<dyn RecipeRepository>,
        images: Arc<dyn ImageProcessor>,
        exporter: Arc<dyn RecipeExporter>,
        scraper: Arc<dyn RecipeScraper>,
        clock: Arc<dyn Clock>,
        paths: RecipeFilePaths,
    ) -> Self {
        Self {
            recipes,
            images,
            exporter,
            scraper,
            clock,
            paths,
        }
    }

    /// `Some(false)` lists active recipes, `Some(true)` deleted ones, `None` all.
    pub async fn get_all_recipes(&self, deleted: Option<bool>) -> Result<Vec<Recipe>, Error> {
        let result = match deleted {
            Some(false) => self.recipes.active().await,
            Some(true) => self.recipes.deleted().await,
            None => self.recipes.all().await,
        };
        result.map_err(map_recipe_error)
    }

    pub async fn find_recipe_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, Error> {
        self.recipes.find_by_id(id).await.map_err(map_recipe_error)
    }

    /// Validate and store a new recipe, processing each uploaded image first.
    ///
    /// Uploads with a disallowed extension are skipped.
    pub async fn create_recipe(
        &self,
        draft: RecipeDraft,
        uploads: &[PathBuf],
    ) -> Result<Recipe, Error> {
        let mut draft = validated(draft)?;
        for upload in uploads {
            match self.images.process(upload).await.map_err(map_image_error)? {
                Some(filename) => draft.images.push(filename),
                None => debug!(path = %upload.display(), "skipping upload with unsupported type"),
            }
        }
        let recipe = self
            .recipes
            .create(&draft)
            .await
            .map_err(map_recipe_error)?;
        info!(recipe_id = %recipe.id, "created recipe");
        Ok(recipe)
    }

    pub async fn edit_recipe(
        &self,
        id: &RecipeId,
        draft: RecipeDraft,
    ) -> Result<Option<Recipe>, Error> {
        let draft = validated(draft)?;
        self.recipes
            .edit(id, &draft)
            .await
            .map_err(map_recipe_error)
    }

    /// Soft-delete a recipe. Returns the number of recipes marked deleted.
    pub async fn delete_recipe(&self, id: &RecipeId) -> Result<usize, Error> {
        self.recipes.delete(id).await.map_err(map_recipe_error)
    }

    pub async fn copy_recipe(&self, id: &RecipeId) -> Result<Option<Recipe>, Error> {
        self.recipes.copy(id).await.map_err(map_recipe_error)
    }

    pub async fn find_recipes_by_tag(&self, tags: &[String]) -> Result<Vec<Recipe>, Error> {
        self.recipes
            .find_by_tag(tags)
            .await
            .map_err(map_recipe_error)
    }

    pub async fn get_tags(&self) -> Result<Vec<String>, Error> {
        self.recipes.tags().await.map_err(map_recipe_error)
    }

    pub async fn add_tag(&self, id: &RecipeId, tag: &str) -> Result<usize, Error> {
        self.recipes
            .add_tag(id, tag)
            .await
            .map_err(map_recipe_error)
    }

    pub async fn remove_tag(&self, id: &RecipeId, tag: &str) -> Result<usize, Error> {
        self.recipes
            .delete_tag(id, tag)
            .await
            .map_err(map_recipe_error)
    }

    /// Record that the recipe was made now. Returns `0` when already made today.
    pub async fn mark_made(&self, id: &RecipeId) -> Result<usize, Error> {
        self.recipes
            .mark_made(id, self.clock.utc())
            .await
            .map_err(map_recipe_error)
    }

    /// Most recently modified active recipes, newest first.
    pub async fn recent_recipes(&self, limit: usize) -> Result<Vec<Recipe>, Error> {
        let mut recipes = self.recipes.active().await.map_err(map_recipe_error)?;
        recipes.sort_by(|a, b| b.last_modified_date.cmp(&a.last_modified_date));
        recipes.truncate(limit);
        Ok(recipes)
    }

    pub async fn favorite_recipes(&self) -> Result<Vec<Recipe>, Error> {
        let recipes = self.recipes.active().await.map_err(map_recipe_error)?;
        Ok(recipes.into_iter().filter(|recipe| recipe.favorite).collect())
    }

    /// A uniformly chosen active recipe, if there are any.
    pub async fn random_recipe(&self) -> Result<Option<Recipe>, Error> {
        let recipes = self.recipes.active().await.map_err(map_recipe_error)?;
        Ok(recipes.choose(&mut rand::thread_rng()).cloned())
    }

    /// Name matches followed by full-text matches.
    ///
    /// A recipe matching both ways appears twice.
    pub async fn recipes_search(&self, text: &str) -> Result<Vec<Recipe>, Error> {
        let mut results = self
            .recipes
            .find_by_name(text)
            .await
            .map_err(map_recipe_error)?;
        let text_matches = self
            .recipes
            .search_text(text)
            .await
            .map_err(map_recipe_error)?;
        results.extend(text_matches);
        Ok(results)
    }

    /// Path of the export file for `recipe` in its current state.
    #[must_use]
    pub fn export_path(&self, recipe: &Recipe) -> PathBuf {
        self.paths.export_dir.join(format!(
            "{}_{}.pdf",
            recipe.id,
            recipe.last_modified_date.timestamp_micros()
        ))
    }

    /// Export a recipe, reusing the cached file while the recipe is unchanged.
    ///
    /// Returns `None` when the recipe does not exist.
    pub async fn export_recipe(&self, id: &RecipeId) -> Result<Option<PathBuf>, Error> {
        let Some(recipe) = self.find_recipe_by_id(id).await? else {
            return Ok(None);
        };
        let path = self.export_path(&recipe);
        let cached = tokio::fs::try_exists(&path)
            .await
            .map_err(|err| Error::internal(format!("export cache lookup failed: {err}")))?;
        if cached {
            debug!(recipe_id = %id, path = %path.display(), "serving cached export");
            return Ok(Some(path));
        }
        tokio::fs::create_dir_all(&self.paths.export_dir)
            .await
            .map_err(|err| Error::internal(format!("export directory unavailable: {err}")))?;
        self.exporter
            .export(&recipe, &path)
            .await
            .map_err(map_export_error)?;
        info!(recipe_id = %id, path = %path.display(), "exported recipe");
        Ok(Some(path))
    }

    /// Create every recipe embedded in a previously exported document.
    pub async fn import_recipes_from_pdf(&self, path: &Path) -> Result<Vec<Recipe>, Error> {
        let drafts = self.exporter.import(path).await.map_err(map_export_error)?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let draft = validated(draft)?;
            created.push(
                self.recipes
                    .create(&draft)
                    .await
                    .map_err(map_recipe_error)?,
            );
        }
        info!(count = created.len(), "imported recipes from export");
        Ok(created)
    }

    /// Scrape a recipe page and store the result.
    ///
    /// A failed image download is logged and the recipe is stored without it.
    pub async fn import_recipe_from_url(&self, url: &str) -> Result<Recipe, Error> {
        let scraped = self.scraper.scrape(url).await.map_err(map_scrape_error)?;
        let image_url = scraped.image.clone();
        let mut uploads = Vec::new();
        if let Some(image_url) = image_url {
            match self
                .scraper
                .download_image(&image_url, &self.paths.image_dir)
                .await
            {
                Ok(path) => uploads.push(path),
                Err(err) => warn!(%url, error = %err, "recipe image download failed"),
            }
        }
        let draft = draft_from_scraped(url, scraped)?;
        self.create_recipe(draft, &uploads).await
    }
}

/// First label of the URL host, ignoring a leading `www.`.
fn host_label(url: &str) -> Result<String, Error> {
    let parsed =
        url::Url::parse(url).map_err(|err| Error::invalid_request(format!("invalid url: {err}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::invalid_request("url has no host"))?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    Ok(host.split('.').next().unwrap_or(host).to_lowercase())
}

/// Normalise scraped fields into a draft.
pub(crate) fn draft_from_scraped(url: &str, scraped: ScrapedRecipe) -> Result<RecipeDraft, Error> {
    let host = host_label(url)?;
    let mut notes = vec![format!("Imported from: {url}")];
    notes.extend(
        scraped
            .nutrients
            .iter()
            .map(|(key, value)| format!("{key}: {value}")),
    );
    Ok(RecipeDraft {
        name: scraped.title,
        prep_time: 0.0,
        cook_time: scraped.total_time.unwrap_or(UNKNOWN_COOK_TIME),
        servings: scraped
            .yields
            .map_or_else(|| Servings::Text(String::new()), |yields| Servings::parse(&yields)),
        ingredients: scraped.ingredients,
        directions: scraped
            .instructions
            .split('\n')
            .map(str::to_owned)
            .collect(),
        tags: vec![IMPORTED_TAG.to_owned(), host],
        notes,
        rating: None,
        favorite: false,
        images: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        MockImageProcessor, MockRecipeExporter, MockRecipeRepository, MockRecipeScraper,
    };
    use crate::outbound::memory::InMemoryRecipeRepository;
    use crate::test_support::{MutableClock, fixture_timestamp, sample_draft};
    use rstest::rstest;
    use tempfile::TempDir;

    struct Harness {
        recipes: Arc<dyn RecipeRepository>,
        images: MockImageProcessor,
        exporter: MockRecipeExporter,
        scraper: MockRecipeScraper,
        clock: Arc<MutableClock>,
        dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let clock = Arc::new(MutableClock::new(fixture_timestamp()));
            Self {
                recipes: Arc::new(InMemoryRecipeRepository::new(clock.clone())),
                images: MockImageProcessor::new(),
                exporter: MockRecipeExporter::new(),
                scraper: MockRecipeScraper::new(),
                clock,
                dir: TempDir::new().expect("temp dir"),
            }
        }

        fn with_repository(mut self, repo: MockRecipeRepository) -> Self {
            self.recipes = Arc::new(repo);
            self
        }

        fn build(self) -> (RecipeService, Arc<MutableClock>, TempDir) {
            let paths = RecipeFilePaths {
                image_dir: self.dir.path().join("images"),
                export_dir: self.dir.path().join("exports"),
            };
            let service = RecipeService::new(
                self.recipes,
                Arc::new(self.images),
                Arc::new(self.exporter),
                Arc::new(self.scraper),
                self.clock.clone(),
                paths,
            );
            (service, self.clock, self.dir)
        }
    }

    #[tokio::test]
    async fn create_rejects_invalid_drafts_before_storage() {
        let mut repo = MockRecipeRepository::new();
        repo.expect_create().never();
        let (service, _, _dir) = Harness::new().with_repository(repo).build();

        let draft = RecipeDraft {
            ingredients: Vec::new(),
            ..sample_draft()
        };
        let error = service
            .create_recipe(draft, &[])
            .await
            .expect_err("missing ingredients");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn create_attaches_processed_images_and_skips_unsupported() {
        let mut harness = Harness::new();
        harness.images.expect_process().returning(|path| {
            Ok(path
                .extension()
                .filter(|ext| *ext == "png")
                .map(|_| "0123abcd.png".to_owned()))
        });
        let (service, _, _dir) = harness.build();

        let recipe = service
            .create_recipe(
                sample_draft(),
                &[PathBuf::from("photo.png"), PathBuf::from("notes.txt")],
            )
            .await
            .expect("create");
        assert_eq!(recipe.images, vec!["0123abcd.png".to_owned()]);
        assert_eq!(recipe.num_ingredients, 2);
    }

    #[tokio::test]
    async fn spam_and_eggs_is_found_by_tag() {
        let (service, _, _dir) = Harness::new().build();
        let created = service
            .create_recipe(sample_draft(), &[])
            .await
            .expect("create");

        let found = service
            .find_recipes_by_tag(&["breakfast".to_owned()])
            .await
            .expect("by tag");
        assert_eq!(found, vec![created]);

        let tags = service.get_tags().await.expect("tags");
        assert!(tags.contains(&"breakfast".to_owned()));
        assert!(tags.contains(&"fast".to_owned()));
    }

    #[tokio::test]
    async fn get_all_recipes_filters_by_deleted_flag() {
        let (service, _, _dir) = Harness::new().build();
        let kept = service.create_recipe(sample_draft(), &[]).await.expect("create");
        let gone = service.create_recipe(sample_draft(), &[]).await.expect("create");
        assert_eq!(service.delete_recipe(&gone.id).await.expect("delete"), 1);

        let active = service.get_all_recipes(Some(false)).await.expect("active");
        let deleted = service.get_all_recipes(Some(true)).await.expect("deleted");
        let all = service.get_all_recipes(None).await.expect("all");
        assert_eq!(active.iter().map(|r| r.id).collect::<Vec<_>>(), vec![kept.id]);
        assert_eq!(deleted.iter().map(|r| r.id).collect::<Vec<_>>(), vec![gone.id]);
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn mark_made_twice_on_one_day_is_a_no_op() {
        let (service, clock, _dir) = Harness::new().build();
        let recipe = service.create_recipe(sample_draft(), &[]).await.expect("create");

        assert_eq!(service.mark_made(&recipe.id).await.expect("made"), 1);
        clock.advance_seconds(60);
        assert_eq!(service.mark_made(&recipe.id).await.expect("made"), 0);
        let stored = service
            .find_recipe_by_id(&recipe.id)
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(stored.when_made.len(), 1);
    }

    #[tokio::test]
    async fn recent_recipes_orders_by_modification() {
        let (service, clock, _dir) = Harness::new().build();
        let first = service.create_recipe(sample_draft(), &[]).await.expect("create");
        clock.advance_seconds(10);
        let second = service.create_recipe(sample_draft(), &[]).await.expect("create");
        clock.advance_seconds(10);
        service.add_tag(&first.id, "dinner").await.expect("tag");

        let recent = service.recent_recipes(1).await.expect("recent");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, first.id);
        let all = service.recent_recipes(10).await.expect("recent");
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn favorites_and_random_only_see_active_recipes() {
        let (service, _, _dir) = Harness::new().build();
        assert!(service.random_recipe().await.expect("random").is_none());

        let favorite = RecipeDraft {
            favorite: true,
            ..sample_draft()
        };
        let kept = service.create_recipe(favorite.clone(), &[]).await.expect("create");
        let gone = service.create_recipe(favorite, &[]).await.expect("create");
        service.delete_recipe(&gone.id).await.expect("delete");

        let favorites = service.favorite_recipes().await.expect("favorites");
        assert_eq!(favorites.iter().map(|r| r.id).collect::<Vec<_>>(), vec![kept.id]);
        let random = service.random_recipe().await.expect("random").expect("some");
        assert_eq!(random.id, kept.id);
    }

    #[tokio::test]
    async fn search_concatenates_name_and_text_matches() {
        let mut repo = MockRecipeRepository::new();
        let recipe = Recipe::from_draft(RecipeId::random(), sample_draft(), fixture_timestamp());
        let by_name = recipe.clone();
        let by_text = recipe.clone();
        repo.expect_find_by_name()
            .return_once(move |_| Ok(vec![by_name]));
        repo.expect_search_text()
            .return_once(move |_| Ok(vec![by_text]));
        let (service, _, _dir) = Harness::new().with_repository(repo).build();

        let results = service.recipes_search("spam").await.expect("search");
        assert_eq!(results, vec![recipe.clone(), recipe]);
    }

    #[tokio::test]
    async fn export_is_cached_until_the_recipe_changes() {
        let mut harness = Harness::new();
        harness
            .exporter
            .expect_export()
            .times(2)
            .returning(|_, path| {
                std::fs::write(path, b"%PDF-1.5").map_err(|err| RecipeExportError::io(err.to_string()))
            });
        let (service, clock, _dir) = harness.build();
        let recipe = service.create_recipe(sample_draft(), &[]).await.expect("create");

        let first = service.export_recipe(&recipe.id).await.expect("export").expect("path");
        let again = service.export_recipe(&recipe.id).await.expect("export").expect("path");
        assert_eq!(first, again);
        let name = first.file_name().and_then(|n| n.to_str()).expect("file name");
        assert!(name.starts_with(&format!("{}_", recipe.id)));
        assert!(name.ends_with(".pdf"));

        clock.advance_seconds(5);
        service.add_tag(&recipe.id, "dinner").await.expect("tag");
        let changed = service.export_recipe(&recipe.id).await.expect("export").expect("path");
        assert_ne!(first, changed);
    }

    #[tokio::test]
    async fn export_of_missing_recipe_is_none() {
        let (service, _, _dir) = Harness::new().build();
        let path = service.export_recipe(&RecipeId::random()).await.expect("export");
        assert!(path.is_none());
    }

    #[tokio::test]
    async fn pdf_import_creates_each_embedded_recipe() {
        let mut harness = Harness::new();
        harness
            .exporter
            .expect_import()
            .return_once(|_| Ok(vec![sample_draft(), sample_draft()]));
        let (service, _, _dir) = harness.build();

        let created = service
            .import_recipes_from_pdf(Path::new("upload.pdf"))
            .await
            .expect("import");
        assert_eq!(created.len(), 2);
        assert_ne!(created[0].id, created[1].id);
    }

    fn scraped() -> ScrapedRecipe {
        ScrapedRecipe {
            title: "Pancakes".into(),
            total_time: None,
            yields: Some("4 servings".into()),
            ingredients: vec!["flour".into(), "milk".into()],
            instructions: "mix\nfry".into(),
            image: None,
            nutrients: BTreeMap::from([("calories".to_owned(), "200 kcal".to_owned())]),
        }
    }

    #[rstest]
    #[case("https://www.allrecipes.com/recipe/1", "allrecipes")]
    #[case("https://cooking.nytimes.com/recipes/2", "cooking")]
    fn scraped_drafts_are_normalised(#[case] url: &str, #[case] host: &str) {
        let draft = draft_from_scraped(url, scraped()).expect("draft");
        assert_eq!(draft.prep_time, 0.0);
        assert_eq!(draft.cook_time, UNKNOWN_COOK_TIME);
        assert_eq!(draft.servings, Servings::Text("4 servings".into()));
        assert_eq!(draft.directions, vec!["mix".to_owned(), "fry".to_owned()]);
        assert_eq!(draft.tags, vec!["imported".to_owned(), host.to_owned()]);
        assert_eq!(
            draft.notes,
            vec![format!("Imported from: {url}"), "calories: 200 kcal".to_owned()]
        );
    }

    #[tokio::test]
    async fn url_import_keeps_recipe_when_image_download_fails() {
        let mut harness = Harness::new();
        harness.scraper.expect_scrape().return_once(|_| {
            Ok(ScrapedRecipe {
                total_time: Some(25.0),
                image: Some("https://example.com/p.jpg".into()),
                ..scraped()
            })
        });
        harness
            .scraper
            .expect_download_image()
            .return_once(|_, _| Err(RecipeScrapeError::fetch("timeout")));
        harness.images.expect_process().never();
        let (service, _, _dir) = harness.build();

        let recipe = service
            .import_recipe_from_url("https://example.com/pancakes")
            .await
            .expect("import");
        assert_eq!(recipe.cook_time, 25.0);
        assert!(recipe.images.is_empty());
        assert_eq!(recipe.tags, vec!["imported".to_owned(), "example".to_owned()]);
    }

    #[tokio::test]
    async fn url_import_reports_unreachable_pages_as_bad_requests() {
        let mut harness = Harness::new();
        harness
            .scraper
            .expect_scrape()
            .return_once(|_| Err(RecipeScrapeError::fetch("404")));
        let (service, _, _dir) = harness.build();

        let error = service
            .import_recipe_from_url("https://example.com/missing")
            .await
            .expect_err("fetch failure");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }
}
