use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// A recipe as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub prep_minutes: Option<u32>,
    #[serde(default)]
    pub cook_minutes: Option<u32>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_token: Option<String>,
}

fn default_servings() -> u32 {
    1
}

/// Body of a create (POST) or full update (PUT).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInput {
    pub title: String,
    pub servings: u32,
    pub prep_minutes: Option<u32>,
    pub cook_minutes: Option<u32>,
    pub cuisine: Option<String>,
    pub meal_type: Option<String>,
    pub dietary_tags: Vec<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Default for RecipeInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            servings: default_servings(),
            prep_minutes: None,
            cook_minutes: None,
            cuisine: None,
            meal_type: None,
            dietary_tags: Vec::new(),
            ingredients: Vec::new(),
            instructions: Vec::new(),
            notes: None,
            photo_url: None,
        }
    }
}

impl From<Recipe> for RecipeInput {
    fn from(r: Recipe) -> Self {
        Self {
            title: r.title,
            servings: r.servings,
            prep_minutes: r.prep_minutes,
            cook_minutes: r.cook_minutes,
            cuisine: r.cuisine,
            meal_type: r.meal_type,
            dietary_tags: r.dietary_tags,
            ingredients: r.ingredients,
            instructions: r.instructions,
            notes: r.notes,
            photo_url: r.photo_url,
        }
    }
}

#[derive(Tabled)]
pub struct RecipeTableRow {
    pub id: String,
    pub title: String,
    pub servings: u32,
    pub time: String,
    pub cuisine: String,
    pub tags: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub url: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoUploadResponse {
    pub photo_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub scope: String,
    /// Audience the token was issued for, if one was requested.
    #[serde(default)]
    pub audience: Option<String>,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    /// True once `margin` seconds or less remain before expiry.
    pub fn expires_within(&self, now: u64, margin: u64) -> bool {
        now.saturating_add(margin) >= self.obtained_at.saturating_add(self.expires_in)
    }
}

/// A PKCE verifier waiting for its authorization callback.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub code_verifier: String,
    pub created_at: u64,
}

/// A signed-in browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub token: Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
