use crate::types::{Recipe, RecipeInput, RecipeTableRow};

/// Cuisines offered as suggestions by the recipe form. Not enforced.
pub const CUISINES: &[&str] = &[
    "American",
    "Chinese",
    "French",
    "Greek",
    "Indian",
    "Italian",
    "Japanese",
    "Korean",
    "Mediterranean",
    "Mexican",
    "Middle Eastern",
    "Spanish",
    "Thai",
    "Vietnamese",
];

/// Meal types offered as suggestions by the recipe form. Not enforced.
pub const MEAL_TYPES: &[&str] = &[
    "Breakfast",
    "Lunch",
    "Dinner",
    "Snack",
    "Dessert",
    "Appetizer",
    "Side",
    "Drink",
];

/// Client-side filter of the library page.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Matched against title, ingredients, notes and tags.
    pub search: Option<String>,
    pub cuisine: Option<String>,
    pub meal_type: Option<String>,
    /// Every tag must be present on the recipe.
    pub tags: Vec<String>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() && !matches_search(recipe, search) {
                return false;
            }
        }
        if !matches_exact(recipe.cuisine.as_deref(), self.cuisine.as_deref()) {
            return false;
        }
        if !matches_exact(recipe.meal_type.as_deref(), self.meal_type.as_deref()) {
            return false;
        }
        self.tags.iter().all(|wanted| {
            recipe
                .dietary_tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(wanted.trim()))
        })
    }
}

fn matches_search(recipe: &Recipe, search: &str) -> bool {
    let needle = search.to_lowercase();
    let contains = |text: &str| text.to_lowercase().contains(&needle);

    contains(&recipe.title)
        || recipe.ingredients.iter().any(|i| contains(i))
        || recipe.dietary_tags.iter().any(|t| contains(t))
        || recipe.notes.as_deref().is_some_and(contains)
}

fn matches_exact(value: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        None => true,
        Some(wanted) => value.is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted)),
    }
}

/// Recipes passing `filter`, in their original order.
pub fn filter_recipes(recipes: Vec<Recipe>, filter: &RecipeFilter) -> Vec<Recipe> {
    recipes.into_iter().filter(|r| filter.matches(r)).collect()
}

/// Splits free text into one entry per non-blank line.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a comma separated tag list, dropping blanks and repeats while
/// keeping insertion order.
pub fn parse_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Checks done by the form before submitting. The backend has the final say.
pub fn validate_recipe_input(input: &RecipeInput) -> Result<(), String> {
    if input.title.trim().is_empty() {
        return Err("Title must not be empty".to_string());
    }
    if input.servings == 0 {
        return Err("Servings must be at least 1".to_string());
    }
    Ok(())
}

/// True when `value` is one of `suggestions`, ignoring case.
pub fn is_suggested(value: &str, suggestions: &[&str]) -> bool {
    suggestions
        .iter()
        .any(|s| s.eq_ignore_ascii_case(value.trim()))
}

/// Makes a backend-relative photo URL (`/photos/...`) absolute against
/// `origin`. Other values are returned unchanged.
pub fn absolutize_photo_url(origin: &str, url: &str) -> String {
    if url.starts_with("/photos/") {
        format!("{}{}", origin.trim_end_matches('/'), url)
    } else {
        url.to_string()
    }
}

/// Makes any root-relative URL absolute against `origin`.
pub fn absolutize_url(origin: &str, url: &str) -> String {
    if url.starts_with('/') && !url.starts_with("//") {
        format!("{}{}", origin.trim_end_matches('/'), url)
    } else {
        url.to_string()
    }
}

/// "10 min prep • 25 min cook", empty when neither is known.
pub fn format_duration(prep: Option<u32>, cook: Option<u32>) -> String {
    let mut parts = Vec::new();
    if let Some(prep) = prep {
        parts.push(format!("{} min prep", prep));
    }
    if let Some(cook) = cook {
        parts.push(format!("{} min cook", cook));
    }
    parts.join(" • ")
}

pub fn pluralize(count: u32, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

pub fn to_table_rows(recipes: &[Recipe]) -> Vec<RecipeTableRow> {
    recipes
        .iter()
        .map(|r| RecipeTableRow {
            id: r.id.clone(),
            title: r.title.clone(),
            servings: r.servings,
            time: format_duration(r.prep_minutes, r.cook_minutes),
            cuisine: r.cuisine.clone().unwrap_or_default(),
            tags: r.dietary_tags.join(", "),
        })
        .collect()
}
