//! PDF recipe exporter built on `lopdf`.
//!
//! The printable page is plain Helvetica text. The recipe itself travels in
//! the document `Info` dictionary under `dc:` keys so an exported file can be
//! imported again without parsing the page content.
//!
//! Import yields drafts, so the stored `deleted` flag and image names do not
//! come back: an imported recipe is always a fresh, active recipe without
//! pictures. Servings are written as JSON to keep a numeric-looking text yield
//! such as `"4"` distinct from a count.

use std::path::Path;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::domain::ports::{RecipeExportError, RecipeExporter};
use crate::domain::{Recipe, RecipeDraft, Servings};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 54;
const WRAP_COLUMNS: usize = 90;

const VERSION_KEY: &str = "dc:recipebox_version";
const COUNT_KEY: &str = "dc:num_recipes";

/// Writes and reads single-recipe PDF exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRecipeExporter;

impl PdfRecipeExporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecipeExporter for PdfRecipeExporter {
    async fn export(&self, recipe: &Recipe, path: &Path) -> Result<(), RecipeExportError> {
        let recipe = recipe.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || write_document(&[recipe], &path))
            .await
            .map_err(|err| RecipeExportError::io(format!("export task failed: {err}")))?
    }

    async fn import(&self, path: &Path) -> Result<Vec<RecipeDraft>, RecipeExportError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_document(&path))
            .await
            .map_err(|err| RecipeExportError::io(format!("import task failed: {err}")))?
    }
}

fn format_error(err: impl std::fmt::Display) -> RecipeExportError {
    RecipeExportError::format(err.to_string())
}

/// Text style of one printed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Body,
}

impl Style {
    const fn font(self) -> (&'static str, i64, i64) {
        match self {
            Self::Title => ("F2", 20, 30),
            Self::Heading => ("F2", 14, 24),
            Self::Body => ("F1", 11, 15),
        }
    }
}

fn page_lines(recipe: &Recipe) -> Vec<(Style, String)> {
    let mut lines = vec![
        (Style::Title, recipe.name.clone()),
        (
            Style::Body,
            format!(
                "prep time: {:.0} minutes  |  cook time: {:.0} minutes",
                recipe.prep_time, recipe.cook_time
            ),
        ),
        (Style::Body, format!("servings: {}", recipe.servings)),
        (Style::Heading, "Ingredients".to_owned()),
    ];
    lines.extend(
        recipe
            .ingredients
            .iter()
            .map(|line| (Style::Body, format!("- {line}"))),
    );
    lines.push((Style::Heading, "Directions".to_owned()));
    lines.extend(
        recipe
            .directions
            .iter()
            .enumerate()
            .map(|(index, step)| (Style::Body, format!("{}.  {step}", index + 1))),
    );
    if !recipe.notes.is_empty() {
        lines.push((Style::Heading, "Notes".to_owned()));
        lines.extend(
            recipe
                .notes
                .iter()
                .map(|note| (Style::Body, format!("- {note}"))),
        );
    }
    lines
}

fn wrap(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > WRAP_COLUMNS {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Lay the lines out over as many pages as needed.
fn paginate(lines: &[(Style, String)]) -> Vec<Vec<Operation>> {
    let mut pages = Vec::new();
    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;
    for (style, text) in lines {
        let (font, size, leading) = style.font();
        for chunk in wrap(text) {
            if y - leading < MARGIN {
                pages.push(std::mem::take(&mut ops));
                y = PAGE_HEIGHT - MARGIN;
            }
            y -= leading;
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font.into(), size.into()]),
                Operation::new("Td", vec![MARGIN.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(chunk)]),
                Operation::new("ET", vec![]),
            ]);
        }
    }
    pages.push(ops);
    pages
}

fn write_document(recipes: &[Recipe], path: &Path) -> Result<(), RecipeExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    });

    let mut kids: Vec<Object> = Vec::new();
    for recipe in recipes {
        for operations in paginate(&page_lines(recipe)) {
            let content = Content { operations }.encode().map_err(format_error)?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
    }
    let count = i64::try_from(kids.len()).map_err(format_error)?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(metadata(recipes)?);
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    doc.save(path)
        .map(drop)
        .map_err(|err| RecipeExportError::io(format!("cannot write {}: {err}", path.display())))
}

fn metadata(recipes: &[Recipe]) -> Result<Dictionary, RecipeExportError> {
    let mut info = Dictionary::new();
    let mut text = |key: String, value: String| {
        info.set(key.into_bytes(), Object::string_literal(value));
    };
    text(VERSION_KEY.to_owned(), env!("CARGO_PKG_VERSION").to_owned());
    text(COUNT_KEY.to_owned(), recipes.len().to_string());
    for (index, recipe) in recipes.iter().enumerate() {
        let base = format!("dc:r{}.", index + 1);
        let json = |values: &[String]| serde_json::to_string(values).map_err(format_error);
        text(format!("{base}name"), recipe.name.clone());
        text(
            format!("{base}num_ingredients"),
            recipe.ingredients.len().to_string(),
        );
        text(format!("{base}directions"), json(&recipe.directions)?);
        text(format!("{base}prep_time"), recipe.prep_time.to_string());
        text(format!("{base}cook_time"), recipe.cook_time.to_string());
        text(
            format!("{base}servings"),
            serde_json::to_string(&recipe.servings).map_err(format_error)?,
        );
        text(format!("{base}tags"), json(&recipe.tags)?);
        text(format!("{base}notes"), json(&recipe.notes)?);
        text(
            format!("{base}rating"),
            recipe.rating.map(|r| r.to_string()).unwrap_or_default(),
        );
        text(format!("{base}favorite"), recipe.favorite.to_string());
        text(format!("{base}deleted"), recipe.deleted.to_string());
        for (number, ingredient) in recipe.ingredients.iter().enumerate() {
            text(format!("{base}i{}", number + 1), ingredient.clone());
        }
    }
    Ok(info)
}

/// Read access to the `Info` dictionary's text entries.
struct Metadata<'a>(&'a Dictionary);

impl Metadata<'_> {
    fn text(&self, key: &str) -> Result<String, RecipeExportError> {
        match self.0.get(key.as_bytes()) {
            Ok(Object::String(bytes, _)) => String::from_utf8(bytes.clone())
                .map_err(|_| RecipeExportError::format(format!("{key} is not UTF-8"))),
            Ok(_) => Err(RecipeExportError::format(format!("{key} is not a string"))),
            Err(_) => Err(RecipeExportError::format(format!("missing {key}"))),
        }
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<T, RecipeExportError> {
        self.text(key)?
            .trim()
            .parse()
            .map_err(|_| RecipeExportError::format(format!("{key} is malformed")))
    }

    fn list(&self, key: &str) -> Result<Vec<String>, RecipeExportError> {
        serde_json::from_str(&self.text(key)?).map_err(format_error)
    }

    /// JSON servings, or bare text for values not written as JSON.
    fn servings(&self, key: &str) -> Result<Servings, RecipeExportError> {
        let raw = self.text(key)?;
        Ok(serde_json::from_str(&raw).unwrap_or_else(|_| Servings::parse(&raw)))
    }
}

fn read_document(path: &Path) -> Result<Vec<RecipeDraft>, RecipeExportError> {
    if !path.is_file() {
        return Err(RecipeExportError::io(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let doc = Document::load(path).map_err(format_error)?;
    let info = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .map_err(|_| RecipeExportError::format("document has no recipe metadata"))?;
    let meta = Metadata(info);
    let count: usize = meta.parsed(COUNT_KEY)?;
    (1..=count).map(|number| read_recipe(&meta, number)).collect()
}

fn read_recipe(meta: &Metadata<'_>, number: usize) -> Result<RecipeDraft, RecipeExportError> {
    let base = format!("dc:r{number}.");
    let num_ingredients: usize = meta.parsed(&format!("{base}num_ingredients"))?;
    let ingredients = (1..=num_ingredients)
        .map(|index| meta.text(&format!("{base}i{index}")))
        .collect::<Result<Vec<_>, _>>()?;
    let rating = meta.text(&format!("{base}rating"))?;
    let rating = if rating.trim().is_empty() {
        None
    } else {
        Some(meta.parsed(&format!("{base}rating"))?)
    };
    Ok(RecipeDraft {
        name: meta.text(&format!("{base}name"))?,
        prep_time: meta.parsed(&format!("{base}prep_time"))?,
        cook_time: meta.parsed(&format!("{base}cook_time"))?,
        servings: meta.servings(&format!("{base}servings"))?,
        ingredients,
        directions: meta.list(&format!("{base}directions"))?,
        tags: meta.list(&format!("{base}tags"))?,
        notes: meta.list(&format!("{base}notes"))?,
        rating,
        favorite: meta.parsed(&format!("{base}favorite"))?,
        images: Vec::new(),
    })
}
