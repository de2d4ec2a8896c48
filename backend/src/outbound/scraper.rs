//! HTTP recipe scraper reading schema.org `Recipe` JSON-LD blocks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{RecipeScrapeError, RecipeScraper, ScrapedRecipe};

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^P(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("ISO 8601 duration pattern compiles")
});

const USER_AGENT: &str = concat!("recipebox/", env!("CARGO_PKG_VERSION"));

/// Fetches pages and images over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRecipeScraper {
    client: reqwest::Client,
}

impl HttpRecipeScraper {
    /// Build a scraper whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeScrapeError::Fetch`] when the HTTP client cannot be
    /// configured.
    pub fn new(timeout: Duration) -> Result<Self, RecipeScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| RecipeScrapeError::fetch(err.to_string()))?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, RecipeScrapeError> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RecipeScrapeError::fetch(err.to_string()))
    }
}

#[async_trait]
impl RecipeScraper for HttpRecipeScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedRecipe, RecipeScrapeError> {
        let html = self
            .get(url)
            .await?
            .text()
            .await
            .map_err(|err| RecipeScrapeError::fetch(err.to_string()))?;
        debug!(%url, bytes = html.len(), "fetched recipe page");
        parse_recipe_page(&html)
    }

    async fn download_image(&self, url: &str, dir: &Path) -> Result<PathBuf, RecipeScrapeError> {
        let response = self.get(url).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RecipeScrapeError::fetch(err.to_string()))?;

        let ext = image_extension(url, content_type.as_deref());
        let path = dir.join(format!("download-{}.{ext}", Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|err| RecipeScrapeError::io(format!("{}: {err}", dir.display())))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|err| RecipeScrapeError::io(format!("{}: {err}", path.display())))?;
        Ok(path)
    }
}

/// Pick a file extension from the URL path, falling back to the MIME type.
fn image_extension(url: &str, content_type: Option<&str>) -> String {
    let from_path = url::Url::parse(url).ok().and_then(|parsed| {
        let segment = parsed.path_segments()?.next_back()?.to_owned();
        let (_, ext) = segment.rsplit_once('.')?;
        let ext = ext.to_lowercase();
        (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .then_some(ext)
    });
    from_path.unwrap_or_else(|| {
        match content_type.map(|mime| mime.split(';').next().unwrap_or(mime).trim()) {
            Some("image/png") => "png",
            Some("image/gif") => "gif",
            Some("image/webp") => "webp",
            _ => "jpg",
        }
        .to_owned()
    })
}

/// Extract the first schema.org `Recipe` found in the page's JSON-LD.
pub(crate) fn parse_recipe_page(html: &str) -> Result<ScrapedRecipe, RecipeScrapeError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#)
        .map_err(|err| RecipeScrapeError::parse(err.to_string()))?;
    document
        .select(&selector)
        .filter_map(|script| serde_json::from_str::<Value>(&script.inner_html()).ok())
        .find_map(|json| find_recipe(&json).map(recipe_from_json))
        .ok_or_else(|| RecipeScrapeError::parse("no schema.org Recipe found"))?
}

fn find_recipe(json: &Value) -> Option<&Value> {
    match json {
        Value::Object(map) => {
            let is_recipe = match map.get("@type") {
                Some(Value::String(kind)) => kind == "Recipe",
                Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind == "Recipe"),
                _ => false,
            };
            if is_recipe {
                return Some(json);
            }
            map.get("@graph").and_then(find_recipe)
        }
        Value::Array(items) => items.iter().find_map(find_recipe),
        _ => None,
    }
}

fn recipe_from_json(recipe: &Value) -> Result<ScrapedRecipe, RecipeScrapeError> {
    let title = recipe
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| RecipeScrapeError::parse("recipe has no name"))?
        .to_owned();
    let total_time = minutes(recipe.get("totalTime")).or_else(|| {
        let prep = minutes(recipe.get("prepTime"));
        let cook = minutes(recipe.get("cookTime"));
        match (prep, cook) {
            (None, None) => None,
            (prep, cook) => Some(prep.unwrap_or(0.0) + cook.unwrap_or(0.0)),
        }
    });
    Ok(ScrapedRecipe {
        title,
        total_time,
        yields: recipe.get("recipeYield").and_then(yields),
        ingredients: recipe
            .get("recipeIngredient")
            .map(strings)
            .unwrap_or_default(),
        instructions: recipe
            .get("recipeInstructions")
            .map(instructions)
            .unwrap_or_default()
            .join("\n"),
        image: recipe.get("image").and_then(image_url),
        nutrients: recipe
            .get("nutrition")
            .map(nutrients)
            .unwrap_or_default(),
    })
}

/// Minutes in an ISO 8601 duration such as `PT1H30M`.
fn minutes(value: Option<&Value>) -> Option<f64> {
    let caps = ISO_DURATION.captures(value?.as_str()?.trim())?;
    let part = |index: usize| {
        caps.get(index)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let total = part(1) * 1440.0 + part(2) * 60.0 + part(3) + part(4) / 60.0;
    (total > 0.0).then_some(total)
}

fn yields(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(items) => items.iter().find_map(yields),
        _ => None,
    }
    .filter(|text| !text.is_empty())
}

fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => vec![text.trim().to_owned()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|text| text.trim().to_owned())
            .collect(),
        _ => Vec::new(),
    }
    .into_iter()
    .filter(|text| !text.is_empty())
    .collect()
}

/// Flatten plain strings, `HowToStep` objects and `HowToSection` lists.
fn instructions(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect(),
        Value::Array(items) => items.iter().flat_map(instructions).collect(),
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                instructions(&Value::String(text.to_owned()))
            } else if let Some(items) = map.get("itemListElement") {
                instructions(items)
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}

fn nutrients(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(key, _)| !key.starts_with('@'))
                .filter_map(|(key, value)| match value {
                    Value::String(text) => Some((key.clone(), text.clone())),
                    Value::Number(number) => Some((key.clone(), number.to_string())),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn page(json: &Value) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">{json}</script></head><body></body></html>"#
        )
    }

    #[rstest]
    fn reads_a_recipe_from_a_graph() {
        let html = page(&json!({
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "WebPage", "name": "Pancakes page"},
                {
                    "@type": ["Recipe"],
                    "name": " Pancakes ",
                    "totalTime": "PT1H5M",
                    "recipeYield": ["4", "4 servings"],
                    "recipeIngredient": ["1 cup flour", " ", "2 eggs"],
                    "recipeInstructions": [
                        {"@type": "HowToStep", "text": "Mix."},
                        {"@type": "HowToSection", "itemListElement": [
                            {"@type": "HowToStep", "text": "Fry."}
                        ]}
                    ],
                    "image": {"@type": "ImageObject", "url": "https://example.com/p.jpg"},
                    "nutrition": {"@type": "NutritionInformation", "calories": "240 kcal"}
                }
            ]
        }));

        let recipe = parse_recipe_page(&html).expect("recipe");
        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.total_time, Some(65.0));
        assert_eq!(recipe.yields.as_deref(), Some("4"));
        assert_eq!(recipe.ingredients, vec!["1 cup flour", "2 eggs"]);
        assert_eq!(recipe.instructions, "Mix.\nFry.");
        assert_eq!(recipe.image.as_deref(), Some("https://example.com/p.jpg"));
        assert_eq!(
            recipe.nutrients.get("calories").map(String::as_str),
            Some("240 kcal")
        );
        assert_eq!(recipe.nutrients.len(), 1);
    }

    #[rstest]
    fn prep_and_cook_times_sum_when_total_is_absent() {
        let html = page(&json!({
            "@type": "Recipe",
            "name": "Stew",
            "prepTime": "PT15M",
            "cookTime": "PT2H",
            "recipeInstructions": "Chop.\nSimmer."
        }));
        let recipe = parse_recipe_page(&html).expect("recipe");
        assert_eq!(recipe.total_time, Some(135.0));
        assert_eq!(recipe.instructions, "Chop.\nSimmer.");
        assert_eq!(recipe.image, None);
    }

    #[rstest]
    #[case("<html><body>No data</body></html>")]
    #[case(r#"<script type="application/ld+json">{"@type": "Article", "name": "x"}</script>"#)]
    #[case(r#"<script type="application/ld+json">{not json</script>"#)]
    fn pages_without_recipes_are_parse_errors(#[case] html: &str) {
        let error = parse_recipe_page(html).expect_err("no recipe");
        assert!(matches!(error, RecipeScrapeError::Parse { .. }));
    }

    #[rstest]
    #[case("P1DT2H", Some(1560.0))]
    #[case("PT90S", Some(1.5))]
    #[case("pt20m", Some(20.0))]
    #[case("PT0M", None)]
    #[case("20 minutes", None)]
    fn iso_durations_convert_to_minutes(#[case] raw: &str, #[case] expected: Option<f64>) {
        assert_eq!(minutes(Some(&json!(raw))), expected);
    }

    #[rstest]
    #[case("https://cdn.example.com/img/photo.PNG?w=800", None, "png")]
    #[case("https://cdn.example.com/img/photo", Some("image/webp"), "webp")]
    #[case("https://cdn.example.com/img/", Some("text/plain"), "jpg")]
    fn download_extensions_follow_url_then_mime(
        #[case] url: &str,
        #[case] mime: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(image_extension(url, mime), expected);
    }
}
