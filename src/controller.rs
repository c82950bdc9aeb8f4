//! Turns user input into catalog lookups and hands the results back to the
//! view as `Update` messages. Nothing in here draws anything.

use crate::fetch::{CatalogFetcher, Transport};
use crate::models::{DetailRecord, IndexEntry};
use crate::search::{filter_index, Filter};
use crate::utils::SpriteThumb;
use async_trait::async_trait;
use std::sync::Arc;

pub const LOAD_FAILED: &str = "Could not load Pokémon data.";
pub const SEARCH_FAILED: &str = "Search failed.";

/// A gallery card: the index entry it came from and its resolved record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub entry: IndexEntry,
    pub record: DetailRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Restore,
    Cards(Vec<Card>),
    NoResults,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// First page resolved at startup.
    Loaded(Vec<Card>),
    /// Outcome of the query tagged with `generation`.
    Search {
        generation: u64,
        outcome: SearchOutcome,
    },
    Selected(DetailRecord),
    Sprite { id: u32, thumb: SpriteThumb },
    Failed(String),
}

/// The three things a user can do to the gallery.
#[async_trait]
pub trait UserInput {
    async fn on_startup(&self) -> Update;
    async fn on_query_change(&self, generation: u64, query: &str) -> Update;
    async fn on_item_select(&self, entry: &IndexEntry) -> Update;
}

pub struct Controller<T> {
    fetcher: Arc<CatalogFetcher<T>>,
    page_size: usize,
}

impl<T> Clone for Controller<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            page_size: self.page_size,
        }
    }
}

fn cards(entries: Vec<IndexEntry>, records: Vec<DetailRecord>) -> Vec<Card> {
    entries
        .into_iter()
        .zip(records)
        .map(|(entry, record)| Card { entry, record })
        .collect()
}

impl<T: Transport> Controller<T> {
    pub fn new(fetcher: Arc<CatalogFetcher<T>>, page_size: usize) -> Self {
        Self { fetcher, page_size }
    }

    pub fn fetcher(&self) -> &Arc<CatalogFetcher<T>> {
        &self.fetcher
    }

    /// Follow-up to a selection: fetch and decode the record's sprite.
    pub async fn load_sprite(&self, record: &DetailRecord) -> Option<Update> {
        let url = record.sprite.as_deref()?;
        match self.fetcher.fetch_sprite(url).await {
            Ok(bytes) => {
                let thumb = SpriteThumb::decode(&bytes)?;
                Some(Update::Sprite {
                    id: record.id,
                    thumb,
                })
            }
            Err(e) => {
                log::warn!("sprite for #{} unavailable: {}", record.id, e);
                None
            }
        }
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        // Waits on an index fetch already in flight rather than issuing another.
        let index = match self.fetcher.fetch_index().await {
            Ok(index) => index,
            Err(e) => {
                log::error!("search for {:?} without an index: {}", query, e);
                return SearchOutcome::Failed(SEARCH_FAILED.to_string());
            }
        };

        let matches = match filter_index(&index, query) {
            Filter::Restore => return SearchOutcome::Restore,
            Filter::NoMatches => return SearchOutcome::NoResults,
            Filter::Matches(m) => m,
        };

        log::debug!("query {:?} matched {} entries", query, matches.len());
        match self.fetcher.resolve_many(&matches).await {
            Ok(records) => SearchOutcome::Cards(cards(matches, records)),
            Err(e) => {
                log::error!("search for {:?} failed: {}", query, e);
                SearchOutcome::Failed(SEARCH_FAILED.to_string())
            }
        }
    }
}

#[async_trait]
impl<T: Transport> UserInput for Controller<T> {
    async fn on_startup(&self) -> Update {
        let index = match self.fetcher.fetch_index().await {
            Ok(index) => index,
            Err(e) => {
                log::error!("index fetch failed: {}", e);
                return Update::Failed(LOAD_FAILED.to_string());
            }
        };

        let first: Vec<IndexEntry> = index.iter().take(self.page_size).cloned().collect();
        match self.fetcher.resolve_many(&first).await {
            Ok(records) => {
                log::info!("first page of {} cards ready", records.len());
                Update::Loaded(cards(first, records))
            }
            Err(e) => {
                log::error!("first page failed: {}", e);
                Update::Failed(LOAD_FAILED.to_string())
            }
        }
    }

    async fn on_query_change(&self, generation: u64, query: &str) -> Update {
        Update::Search {
            generation,
            outcome: self.search(query).await,
        }
    }

    async fn on_item_select(&self, entry: &IndexEntry) -> Update {
        match self.fetcher.fetch_details(entry).await {
            Ok(record) => Update::Selected(record),
            Err(e) => {
                log::error!("details for {} failed: {}", entry.name, e);
                Update::Failed(LOAD_FAILED.to_string())
            }
        }
    }
}
