use clap::Args;
use colored::Colorize;
use reqwest::StatusCode;
use serde_json::Value;
use tabled::Table;

use super::{connect, spinner};
use crate::{
    config::AppConfig,
    error,
    types::{ExportRequest, ExportResponse, Recipe, RecipeInput},
    success,
    utils::{self, CUISINES, MEAL_TYPES, RecipeFilter},
    warning,
};

/// Fields of the recipe form. Unset fields keep their current value when
/// editing.
#[derive(Args, Debug, Clone, Default)]
pub struct RecipeForm {
    /// Recipe title
    #[clap(long)]
    pub title: Option<String>,

    /// Number of servings
    #[clap(long)]
    pub servings: Option<u32>,

    /// Preparation time in minutes
    #[clap(long = "prep")]
    pub prep_minutes: Option<u32>,

    /// Cooking time in minutes
    #[clap(long = "cook")]
    pub cook_minutes: Option<u32>,

    #[clap(long)]
    pub cuisine: Option<String>,

    #[clap(long)]
    pub meal_type: Option<String>,

    /// Dietary tag; can be repeated or comma separated
    #[clap(long = "tag")]
    pub tags: Vec<String>,

    /// Ingredient line; can be repeated, order is kept
    #[clap(long = "ingredient")]
    pub ingredients: Vec<String>,

    /// Instruction step; can be repeated, order is kept
    #[clap(long = "step")]
    pub steps: Vec<String>,

    #[clap(long)]
    pub notes: Option<String>,

    #[clap(long)]
    pub photo_url: Option<String>,
}

impl RecipeForm {
    /// Overlays the filled-in fields onto `base`.
    pub fn apply(self, mut base: RecipeInput) -> RecipeInput {
        if let Some(title) = self.title {
            base.title = title.trim().to_string();
        }
        if let Some(servings) = self.servings {
            base.servings = servings;
        }
        if self.prep_minutes.is_some() {
            base.prep_minutes = self.prep_minutes;
        }
        if self.cook_minutes.is_some() {
            base.cook_minutes = self.cook_minutes;
        }
        if self.cuisine.is_some() {
            base.cuisine = self.cuisine;
        }
        if self.meal_type.is_some() {
            base.meal_type = self.meal_type;
        }
        if !self.tags.is_empty() {
            base.dietary_tags = utils::parse_tags(&self.tags.join(","));
        }
        if !self.ingredients.is_empty() {
            base.ingredients = utils::parse_lines(&self.ingredients.join("\n"));
        }
        if !self.steps.is_empty() {
            base.instructions = utils::parse_lines(&self.steps.join("\n"));
        }
        if self.notes.is_some() {
            base.notes = self.notes;
        }
        if self.photo_url.is_some() {
            base.photo_url = self.photo_url;
        }
        base
    }
}

fn check_form(input: &RecipeInput) {
    if let Err(e) = utils::validate_recipe_input(input) {
        error!("{}", e);
    }
    if let Some(cuisine) = &input.cuisine {
        if !utils::is_suggested(cuisine, CUISINES) {
            warning!("'{}' is not one of the suggested cuisines", cuisine);
        }
    }
    if let Some(meal_type) = &input.meal_type {
        if !utils::is_suggested(meal_type, MEAL_TYPES) {
            warning!("'{}' is not one of the suggested meal types", meal_type);
        }
    }
}

pub async fn list_recipes(config: &AppConfig, filter: RecipeFilter) {
    let backend = connect(config).await;

    let pb = spinner("Fetching recipes...");
    let result = backend
        .client
        .get::<Vec<Recipe>>("/recipes", Some(&backend.token))
        .await;
    pb.finish_and_clear();

    let recipes = match result {
        Ok(recipes) => recipes,
        Err(e) => error!("Failed to load recipes. Err: {}", e),
    };

    let total = recipes.len();
    let recipes = utils::filter_recipes(recipes, &filter);
    if recipes.is_empty() {
        warning!("No recipes found ({} in library).", total);
        return;
    }

    let table = Table::new(utils::to_table_rows(&recipes));
    println!("{}", table);
    if recipes.len() != total {
        println!("{} of {} recipes", recipes.len(), total);
    }
}

pub async fn show_recipe(config: &AppConfig, id: &str) {
    let backend = connect(config).await;

    let pb = spinner("Fetching recipe...");
    let result = backend
        .client
        .get::<Recipe>(&format!("/recipes/{}", id), Some(&backend.token))
        .await;
    pb.finish_and_clear();

    match result {
        Ok(recipe) => print_recipe(&recipe),
        Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
            error!("Recipe {} not found.", id)
        }
        Err(e) => error!("Failed to load recipe {}. Err: {}", id, e),
    }
}

fn print_recipe(r: &Recipe) {
    println!("{}", r.title.bold());

    let mut meta = vec![utils::pluralize(r.servings, "serving")];
    let duration = utils::format_duration(r.prep_minutes, r.cook_minutes);
    if !duration.is_empty() {
        meta.push(duration);
    }
    meta.extend(r.cuisine.iter().cloned());
    meta.extend(r.meal_type.iter().cloned());
    println!("{}", meta.join(" • ").dimmed());

    if !r.dietary_tags.is_empty() {
        println!("{} {}", "Tags:".bold(), r.dietary_tags.join(", "));
    }
    if let Some(notes) = &r.notes {
        println!("{} {}", "Notes:".bold(), notes);
    }
    if let Some(photo) = &r.photo_url {
        println!("{} {}", "Photo:".bold(), photo);
    }

    println!("\n{}", "Ingredients".bold());
    for ingredient in &r.ingredients {
        println!("  • {}", ingredient);
    }

    println!("\n{}", "Instructions".bold());
    for (i, step) in r.instructions.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}

pub async fn create_recipe(config: &AppConfig, form: RecipeForm) {
    let input = form.apply(RecipeInput::default());
    check_form(&input);

    let backend = connect(config).await;
    let pb = spinner("Saving recipe...");
    let result = backend
        .client
        .post::<Recipe, _>("/recipes", &input, Some(&backend.token))
        .await;
    pb.finish_and_clear();

    match result {
        Ok(recipe) => success!("Created recipe {} ({})", recipe.title, recipe.id),
        Err(e) => error!("Failed to save recipe. Err: {}", e),
    }
}

/// Loads the recipe, overlays the form and writes the full field set back.
pub async fn edit_recipe(config: &AppConfig, id: &str, form: RecipeForm) {
    let backend = connect(config).await;
    let path = format!("/recipes/{}", id);

    let pb = spinner("Fetching recipe...");
    let current = backend
        .client
        .get::<Recipe>(&path, Some(&backend.token))
        .await;
    let current = match current {
        Ok(recipe) => recipe,
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to load recipe {}. Err: {}", id, e);
        }
    };

    let input = form.apply(RecipeInput::from(current));
    pb.finish_and_clear();
    check_form(&input);

    let pb = spinner("Saving recipe...");
    let result = backend
        .client
        .put::<Recipe, _>(&path, &input, Some(&backend.token))
        .await;
    pb.finish_and_clear();

    match result {
        Ok(recipe) => success!("Updated recipe {}", recipe.title),
        Err(e) => error!("Failed to save recipe {}. Err: {}", id, e),
    }
}

pub async fn delete_recipe(config: &AppConfig, id: &str) {
    let backend = connect(config).await;

    let pb = spinner("Deleting recipe...");
    let result = backend
        .client
        .delete::<Value>(&format!("/recipes/{}", id), Some(&backend.token))
        .await;
    pb.finish_and_clear();

    match result {
        Ok(_) => success!("Deleted recipe {}", id),
        Err(e) => error!("Failed to delete recipe {}. Err: {}", id, e),
    }
}

pub async fn export_recipe(
    config: &AppConfig,
    id: &str,
    style: Option<String>,
    paper: Option<String>,
    open: bool,
) {
    let backend = connect(config).await;
    let request = ExportRequest { style, paper };

    let pb = spinner("Rendering PDF...");
    let result = backend
        .client
        .post::<ExportResponse, _>(
            &format!("/recipes/{}/export-pdf", id),
            &request,
            Some(&backend.token),
        )
        .await;
    pb.finish_and_clear();

    let export = match result {
        Ok(export) => export,
        Err(e) => error!("Failed to export recipe {}. Err: {}", id, e),
    };

    let url = utils::absolutize_url(backend.client.base_url(), &export.url);
    success!("PDF ready: {}", url);

    if open && webbrowser::open(&url).is_err() {
        warning!("Failed to open browser. Please open the URL manually.");
    }
}
