//! A fixture-backed client.
//!
//! Serves canned records instead of talking to the network, and records
//! every request it receives so tests can assert on network usage.
//! Fixtures can be built in code or read from a JSON file.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientTrait;
use crate::error::{PokedexClientError, Resource};
use crate::types::*;

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file pointed at by `mock_data`
    #[error("failed to read mock data file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// Canned upstream records.
///
/// Pokemon and species are looked up by key first, then by name or id.
/// Evolution chains are keyed by their URL, video results by the exact query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockFixtures {
    /// Listing response; derived from `pokemon` when absent.
    #[serde(default)]
    pub pokemon_list: Option<ResourceList>,
    #[serde(default)]
    pub pokemon: IndexMap<String, Pokemon>,
    #[serde(default)]
    pub species: IndexMap<String, Species>,
    #[serde(default)]
    pub evolution_chains: IndexMap<String, EvolutionChain>,
    #[serde(default)]
    pub moves: IndexMap<String, MoveDetail>,
    #[serde(default)]
    pub cards: IndexMap<String, Vec<Card>>,
    #[serde(default)]
    pub videos: IndexMap<String, Vec<VideoSearchItem>>,
}

/// A request received by a [MockClient].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub resource: Resource,
    pub ident: String,
}

/// A client that can be seeded with mock responses
#[derive(Debug, Default)]
pub struct MockClient {
    fixtures: MockFixtures,
    failing: HashSet<Resource>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockClient {
    pub fn new(fixtures: MockFixtures) -> Self {
        Self {
            fixtures,
            ..Default::default()
        }
    }

    /// Read fixtures from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
        let fixtures = serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
        Ok(Self::new(fixtures))
    }

    pub fn with_pokemon(mut self, pokemon: Pokemon) -> Self {
        self.fixtures.pokemon.insert(pokemon.id.to_string(), pokemon);
        self
    }

    pub fn with_species(mut self, species: Species) -> Self {
        self.fixtures.species.insert(species.id.to_string(), species);
        self
    }

    pub fn with_evolution_chain(mut self, url: impl Into<String>, chain: EvolutionChain) -> Self {
        self.fixtures.evolution_chains.insert(url.into(), chain);
        self
    }

    pub fn with_move(mut self, detail: MoveDetail) -> Self {
        self.fixtures.moves.insert(detail.name.clone(), detail);
        self
    }

    pub fn with_cards(mut self, name: impl Into<String>, cards: Vec<Card>) -> Self {
        self.fixtures.cards.insert(name.into(), cards);
        self
    }

    pub fn with_videos(mut self, query: impl Into<String>, items: Vec<VideoSearchItem>) -> Self {
        self.fixtures.videos.insert(query.into(), items);
        self
    }

    /// Respond to every request for `resource` with a server error.
    pub fn failing(mut self, resource: Resource) -> Self {
        self.failing.insert(resource);
        self
    }

    /// A handle on the request log that stays valid after the client is
    /// moved into a [crate::Pokedex].
    pub fn request_log(&self) -> MockRequestLog {
        MockRequestLog(self.requests.clone())
    }

    fn record(&self, resource: Resource, ident: &str) -> Result<(), PokedexClientError> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(MockRequest {
                resource,
                ident: ident.to_string(),
            });

        if self.failing.contains(&resource) {
            return Err(PokedexClientError::Status {
                url: format!("mock://{resource}/{ident}"),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        Ok(())
    }
}

/// Shared view of the requests a [MockClient] received.
#[derive(Debug, Clone)]
pub struct MockRequestLog(Arc<Mutex<Vec<MockRequest>>>);

impl MockRequestLog {
    pub fn requests(&self) -> Vec<MockRequest> {
        self.0.lock().expect("couldn't acquire mock lock").clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().expect("couldn't acquire mock lock").len()
    }

    pub fn count_for(&self, resource: Resource) -> usize {
        self.0
            .lock()
            .expect("couldn't acquire mock lock")
            .iter()
            .filter(|request| request.resource == resource)
            .count()
    }
}

fn not_found(resource: Resource, ident: &str) -> PokedexClientError {
    PokedexClientError::NotFound {
        resource,
        ident: ident.to_string(),
    }
}

/// Find a record by key, falling back to a match on name or id.
fn lookup<'a, T>(
    records: &'a IndexMap<String, T>,
    ident: &str,
    name_and_id: impl Fn(&T) -> (&str, u32),
) -> Option<&'a T> {
    records.get(ident).or_else(|| {
        records.values().find(|record| {
            let (name, id) = name_and_id(record);
            name == ident || id.to_string() == ident
        })
    })
}

impl ClientTrait for MockClient {
    async fn list_pokemon(&self, limit: u32) -> Result<ResourceList, PokedexClientError> {
        self.record(Resource::PokemonList, &limit.to_string())?;

        let mut list = match &self.fixtures.pokemon_list {
            Some(list) => list.clone(),
            None => ResourceList {
                count: Some(self.fixtures.pokemon.len() as u64),
                results: self
                    .fixtures
                    .pokemon
                    .values()
                    .map(|pokemon| NamedResource {
                        name: pokemon.name.clone(),
                        url: format!("mock://pokemon/{}/", pokemon.id),
                    })
                    .collect(),
            },
        };
        list.results.truncate(limit as usize);
        Ok(list)
    }

    async fn get_pokemon(&self, ident: &str) -> Result<Pokemon, PokedexClientError> {
        self.record(Resource::Pokemon, ident)?;
        lookup(&self.fixtures.pokemon, ident, |p| (p.name.as_str(), p.id))
            .cloned()
            .ok_or_else(|| not_found(Resource::Pokemon, ident))
    }

    async fn get_species(&self, ident: &str) -> Result<Species, PokedexClientError> {
        self.record(Resource::Species, ident)?;
        lookup(&self.fixtures.species, ident, |s| (s.name.as_str(), s.id))
            .cloned()
            .ok_or_else(|| not_found(Resource::Species, ident))
    }

    async fn get_evolution_chain(&self, url: &str) -> Result<EvolutionChain, PokedexClientError> {
        self.record(Resource::EvolutionChain, url)?;
        self.fixtures
            .evolution_chains
            .get(url)
            .cloned()
            .ok_or_else(|| not_found(Resource::EvolutionChain, url))
    }

    async fn get_move(&self, name: &str) -> Result<MoveDetail, PokedexClientError> {
        self.record(Resource::Move, name)?;
        self.fixtures
            .moves
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(Resource::Move, name))
    }

    async fn search_cards(&self, name: &str) -> Result<Vec<Card>, PokedexClientError> {
        self.record(Resource::Cards, name)?;
        Ok(self.fixtures.cards.get(name).cloned().unwrap_or_default())
    }

    async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoSearchItem>, PokedexClientError> {
        self.record(Resource::Videos, query)?;
        let mut items = self.fixtures.videos.get(query).cloned().unwrap_or_default();
        items.truncate(max_results as usize);
        Ok(items)
    }
}
