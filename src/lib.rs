pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod logger;
pub mod models;
pub mod search;
pub mod ui;
pub mod utils;

pub use error::{CatalogError, Result};
