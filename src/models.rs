use serde::{Deserialize, Serialize};

/// One row of the catalog index: a name plus the URL of its detail resource.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    pub name: String,
    pub url: String,
}

impl IndexEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Numeric id taken from the last-but-one path segment,
    /// e.g. `https://pokeapi.co/api/v2/pokemon/25/` -> `25`.
    pub fn id(&self) -> Option<u32> {
        self.url.rsplit('/').nth(1)?.parse().ok()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct DetailRecord {
    pub id: u32,
    pub name: String,
    pub types: Vec<String>,
    /// Decimetres.
    pub height: u32,
    /// Hectograms.
    pub weight: u32,
    pub stats: Vec<Stat>,
    pub sprite: Option<String>,
}

impl DetailRecord {
    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct Stat {
    pub name: String,
    pub base: u32,
}

// Wire shapes of the upstream API. Only the fields the gallery shows are kept.

#[derive(Debug, Deserialize)]
pub struct IndexPage {
    #[serde(default)]
    pub results: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NamedResource {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct StatSlot {
    pub base_stat: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct PokemonData {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub stats: Vec<StatSlot>,
}

impl From<PokemonData> for DetailRecord {
    fn from(data: PokemonData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            types: data.types.into_iter().map(|t| t.kind.name).collect(),
            height: data.height,
            weight: data.weight,
            stats: data
                .stats
                .into_iter()
                .map(|s| Stat {
                    name: s.stat.name,
                    base: s.base_stat,
                })
                .collect(),
            sprite: data.sprites.front_default,
        }
    }
}
