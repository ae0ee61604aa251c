use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use cookbook::{
    cli::{self, RecipeForm},
    config::{self, AppConfig},
    error,
    utils::RecipeFilter,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in through the identity provider
    Login,

    /// Forget the cached access token
    Logout,

    /// Browse and manage recipes
    Recipes(RecipesOptions),

    /// Upload a recipe photo
    Photo(PhotoOptions),

    /// Run the authenticated proxy server
    Serve,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "Browse and manage recipes",
    args_conflicts_with_subcommands = true // disallow mixing filters with subcommands
)]
pub struct RecipesOptions {
    /// Search title, ingredients, notes and tags
    #[clap(long)]
    pub search: Option<String>,

    /// Only recipes of this cuisine
    #[clap(long)]
    pub cuisine: Option<String>,

    /// Only recipes of this meal type
    #[clap(long)]
    pub meal_type: Option<String>,

    /// Only recipes carrying this dietary tag; can be repeated
    #[clap(long = "tag")]
    pub tags: Vec<String>,

    /// Subcommands under `recipes` (e.g., `show`)
    #[command(subcommand)]
    pub command: Option<RecipesSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecipesSubcommand {
    /// Show one recipe
    Show { id: String },

    /// Create a recipe
    Create(RecipeForm),

    /// Edit a recipe; unset fields are kept
    Edit {
        id: String,
        #[command(flatten)]
        form: RecipeForm,
    },

    /// Delete a recipe
    Delete { id: String },

    /// Export a recipe as PDF
    Export(ExportOptions),
}

#[derive(Parser, Debug, Clone)]
pub struct ExportOptions {
    id: String,

    /// minimal or artistic
    #[clap(long)]
    style: Option<String>,

    /// Letter or A4
    #[clap(long)]
    paper: Option<String>,

    /// Open the PDF in the browser
    #[clap(long)]
    open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PhotoOptions {
    file: PathBuf,

    /// Attach the uploaded photo to this recipe
    #[clap(long)]
    recipe: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    match cli.command {
        Command::Login => cli::login(&config).await,
        Command::Logout => cli::logout().await,
        Command::Recipes(opt) => match opt.command {
            Some(RecipesSubcommand::Show { id }) => cli::show_recipe(&config, &id).await,
            Some(RecipesSubcommand::Create(form)) => cli::create_recipe(&config, form).await,
            Some(RecipesSubcommand::Edit { id, form }) => {
                cli::edit_recipe(&config, &id, form).await
            }
            Some(RecipesSubcommand::Delete { id }) => cli::delete_recipe(&config, &id).await,
            Some(RecipesSubcommand::Export(e)) => {
                cli::export_recipe(&config, &e.id, e.style, e.paper, e.open).await
            }
            None => {
                let filter = RecipeFilter {
                    search: opt.search,
                    cuisine: opt.cuisine,
                    meal_type: opt.meal_type,
                    tags: opt.tags,
                };
                cli::list_recipes(&config, filter).await
            }
        },
        Command::Photo(opt) => cli::upload_photo(&config, &opt.file, opt.recipe.as_deref()).await,
        Command::Serve => cli::serve(&config).await,
        Command::Completions(_) => {}
    }
}
