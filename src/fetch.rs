//! Catalog fetcher: pulls the index and detail records from the API and
//! memoizes every successfully resolved record for the life of the process.

use crate::error::{CatalogError, Result};
use crate::models::{DetailRecord, IndexEntry, IndexPage, PokemonData};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

/// Raw GET access to the API. `CatalogFetcher` only ever talks through this.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let network = |source| CatalogError::Network {
            url: url.to_string(),
            source,
        };
        let res = self.client.get(url).send().await.map_err(network)?;
        let status = res.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = res.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}

/// Progress of detail lookups, read by the UI to draw its gauge.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchState {
    pub in_progress: bool,
    pub fetched: usize,
    pub total: usize,
}

impl FetchState {
    fn begin(&mut self, n: usize) {
        if !self.in_progress {
            self.fetched = 0;
            self.total = 0;
        }
        self.total += n;
        self.in_progress = self.fetched < self.total;
    }

    fn step(&mut self) {
        self.fetched += 1;
        if self.fetched >= self.total {
            self.in_progress = false;
        }
    }
}

pub struct CatalogFetcher<T = HttpTransport> {
    transport: T,
    base_url: String,
    limit: usize,
    index: OnceCell<Arc<[IndexEntry]>>,
    details: Mutex<HashMap<String, DetailRecord>>,
    sprites: Mutex<HashMap<String, Arc<[u8]>>>,
    state: Arc<Mutex<FetchState>>,
}

fn locked<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn decode<V: DeserializeOwned>(url: &str, body: &[u8]) -> Result<V> {
    serde_json::from_slice(body).map_err(|source| CatalogError::Decode {
        url: url.to_string(),
        source,
    })
}

impl<T: Transport> CatalogFetcher<T> {
    pub fn new(transport: T, base_url: impl Into<String>, limit: usize) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            limit,
            index: OnceCell::new(),
            details: Mutex::new(HashMap::new()),
            sprites: Mutex::new(HashMap::new()),
            state: Arc::new(Mutex::new(FetchState::default())),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn fetch_state(&self) -> Arc<Mutex<FetchState>> {
        self.state.clone()
    }

    /// Fetch the full index in one request. The first successful response is
    /// kept; later calls hand it back without touching the network.
    pub async fn fetch_index(&self) -> Result<Arc<[IndexEntry]>> {
        let index = self
            .index
            .get_or_try_init(|| async {
                let url = format!("{}?limit={}", self.base_url, self.limit);
                log::info!("fetching index from {}", url);
                let body = self.transport.get(&url).await?;
                let page: IndexPage = decode(&url, &body)?;
                log::info!("index holds {} entries", page.results.len());
                Ok::<_, CatalogError>(Arc::from(page.results))
            })
            .await?;
        Ok(index.clone())
    }

    /// The index, once `fetch_index` has succeeded.
    pub fn index(&self) -> Option<Arc<[IndexEntry]>> {
        self.index.get().cloned()
    }

    pub fn cached(&self, url: &str) -> Option<DetailRecord> {
        locked(&self.details).get(url).cloned()
    }

    pub fn is_cached(&self, url: &str) -> bool {
        locked(&self.details).contains_key(url)
    }

    pub fn cached_len(&self) -> usize {
        locked(&self.details).len()
    }

    /// Resolve one entry. Cache hits do no I/O; only successes are stored,
    /// so a failed lookup is retried on the next call.
    pub async fn fetch_details(&self, entry: &IndexEntry) -> Result<DetailRecord> {
        if let Some(hit) = self.cached(&entry.url) {
            log::trace!("cache hit for {}", entry.url);
            return Ok(hit);
        }

        log::debug!("fetching details for {} from {}", entry.name, entry.url);
        let body = self.transport.get(&entry.url).await?;
        let data: PokemonData = decode(&entry.url, &body)?;
        let record = DetailRecord::from(data);
        // Concurrent misses on the same URL both land here; the value is identical.
        locked(&self.details).insert(entry.url.clone(), record.clone());
        Ok(record)
    }

    /// Resolve all entries concurrently. Output order follows input order.
    /// The earliest failure to arrive fails the whole batch; the remaining
    /// lookups still run to completion so their records end up cached.
    pub async fn resolve_many(&self, entries: &[IndexEntry]) -> Result<Vec<DetailRecord>> {
        locked(&*self.state).begin(entries.len());
        let mut lookups: FuturesUnordered<_> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| async move { (i, self.fetch_details(entry).await) })
            .collect();

        let mut slots: Vec<Option<DetailRecord>> = vec![None; entries.len()];
        let mut first_err: Option<CatalogError> = None;
        while let Some((i, res)) = lookups.next().await {
            locked(&*self.state).step();
            match res {
                Ok(record) => slots[i] = Some(record),
                Err(e) if first_err.is_none() => first_err = Some(e),
                Err(e) => log::debug!("further failure in batch: {}", e),
            }
        }

        if let Some(err) = first_err {
            log::warn!(
                "batch of {} lookups failed at {}: {}",
                entries.len(),
                err.url(),
                err
            );
            return Err(err);
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Sprite image bytes, memoized per sprite URL under the same rules as details.
    pub async fn fetch_sprite(&self, url: &str) -> Result<Arc<[u8]>> {
        let hit = locked(&self.sprites).get(url).cloned();
        if let Some(hit) = hit {
            return Ok(hit);
        }
        log::debug!("fetching sprite {}", url);
        let bytes: Arc<[u8]> = Arc::from(self.transport.get(url).await?);
        locked(&self.sprites).insert(url.to_string(), bytes.clone());
        Ok(bytes)
    }
}
