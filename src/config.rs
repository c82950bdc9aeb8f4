use clap::Parser;
use std::path::PathBuf;

pub const API_BASE: &str = "https://pokeapi.co/api/v2/pokemon";
pub const INDEX_LIMIT: usize = 1300;
pub const PAGE_SIZE: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "pokedex_gallery")]
#[command(about = "Browse and search the Pokémon catalog in the terminal", long_about = None)]
pub struct Cli {
    /// Catalog endpoint; the index is `{base}?limit={limit}`
    #[arg(long, env = "DEX_API_BASE", default_value = API_BASE)]
    pub base_url: String,

    /// Number of index entries to request
    #[arg(long, env = "DEX_INDEX_LIMIT", default_value_t = INDEX_LIMIT)]
    pub limit: usize,

    /// Cards resolved and shown at startup
    #[arg(long, env = "DEX_PAGE_SIZE", default_value_t = PAGE_SIZE)]
    pub page_size: usize,

    #[arg(long, env = "DEX_LOG_FILE", default_value = "pokedex_gallery.log")]
    pub log_file: PathBuf,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the gallery to stdout and exit instead of starting the UI
    #[arg(long)]
    pub print: bool,

    /// Search query to apply (with --print)
    #[arg(long, requires = "print")]
    pub query: Option<String>,

    /// Show details of the N-th card, 1-based (with --print)
    #[arg(long, requires = "print")]
    pub show: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub limit: usize,
    pub page_size: usize,
    pub log_file: PathBuf,
    pub verbosity: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: API_BASE.to_string(),
            limit: INDEX_LIMIT,
            page_size: PAGE_SIZE,
            log_file: PathBuf::from("pokedex_gallery.log"),
            verbosity: 0,
        }
    }
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            base_url: cli.base_url.trim_end_matches('/').to_string(),
            limit: cli.limit,
            page_size: cli.page_size,
            log_file: cli.log_file.clone(),
            verbosity: cli.verbose,
        }
    }
}
