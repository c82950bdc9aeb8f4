//! In-memory stand-in for the HTTP API.
#![allow(dead_code)]

use async_trait::async_trait;
use pokedex_gallery::fetch::{CatalogFetcher, Transport};
use pokedex_gallery::models::IndexEntry;
use pokedex_gallery::{CatalogError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub const BASE: &str = "https://pokeapi.test/api/v2/pokemon";

#[derive(Debug, Clone)]
pub enum Reply {
    Body(Vec<u8>),
    Status(u16),
}

impl Reply {
    pub fn json(s: impl Into<String>) -> Self {
        Reply::Body(s.into().into_bytes())
    }
}

struct Route {
    queue: VecDeque<Reply>,
    fallback: Reply,
    delay: Duration,
}

#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `reply` from now on.
    pub fn route(&self, url: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        let route = routes.entry(url.to_string()).or_insert_with(|| Route {
            queue: VecDeque::new(),
            fallback: Reply::Status(404),
            delay: Duration::ZERO,
        });
        route.fallback = reply;
    }

    /// Answer the next request to `url` with `reply`, then fall back.
    pub fn route_once(&self, url: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        routes
            .entry(url.to_string())
            .or_insert_with(|| Route {
                queue: VecDeque::new(),
                fallback: Reply::Status(404),
                delay: Duration::ZERO,
            })
            .queue
            .push_back(reply);
    }

    pub fn delay(&self, url: &str, delay: Duration) {
        if let Some(route) = self.routes.lock().unwrap().get_mut(url) {
            route.delay = delay;
        }
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        let (reply, delay) = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(url) {
                Some(route) => (
                    route.queue.pop_front().unwrap_or_else(|| route.fallback.clone()),
                    route.delay,
                ),
                None => (Reply::Status(404), Duration::ZERO),
            }
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Reply::Body(b) => Ok(b),
            Reply::Status(status) => Err(CatalogError::Status {
                url: url.to_string(),
                status,
            }),
        }
    }
}

pub fn index_url(limit: usize) -> String {
    format!("{}?limit={}", BASE, limit)
}

pub fn detail_url(id: u32) -> String {
    format!("{}/{}/", BASE, id)
}

pub fn entry(name: &str, id: u32) -> IndexEntry {
    IndexEntry::new(name, detail_url(id))
}

pub fn index_json(entries: &[IndexEntry]) -> String {
    let results: Vec<String> = entries
        .iter()
        .map(|e| format!(r#"{{"name":"{}","url":"{}"}}"#, e.name, e.url))
        .collect();
    format!(r#"{{"count":{},"next":null,"previous":null,"results":[{}]}}"#, entries.len(), results.join(","))
}

pub fn sprite_url(id: u32) -> String {
    format!("https://sprites.test/pokemon/{}.png", id)
}

pub fn pokemon_json(id: u32, name: &str) -> String {
    format!(
        r#"{{
            "id": {id}, "name": "{name}", "height": 7, "weight": 69, "base_experience": 64,
            "sprites": {{ "front_default": "{sprite}", "back_default": null }},
            "types": [
                {{ "slot": 1, "type": {{ "name": "grass", "url": "https://pokeapi.test/api/v2/type/12/" }} }},
                {{ "slot": 2, "type": {{ "name": "poison", "url": "https://pokeapi.test/api/v2/type/4/" }} }}
            ],
            "stats": [
                {{ "base_stat": 45, "effort": 0, "stat": {{ "name": "hp", "url": "u" }} }},
                {{ "base_stat": 49, "effort": 0, "stat": {{ "name": "attack", "url": "u" }} }},
                {{ "base_stat": 45, "effort": 0, "stat": {{ "name": "speed", "url": "u" }} }}
            ]
        }}"#,
        id = id,
        name = name,
        sprite = sprite_url(id),
    )
}

/// Route an index of `entries` plus a detail body for each of them.
pub fn catalog(entries: &[IndexEntry], limit: usize) -> CatalogFetcher<FakeTransport> {
    let transport = FakeTransport::new();
    transport.route(&index_url(limit), Reply::json(index_json(entries)));
    for e in entries {
        if let Some(id) = e.id() {
            transport.route(&e.url, Reply::json(pokemon_json(id, &e.name)));
        }
    }
    CatalogFetcher::new(transport, BASE, limit)
}
