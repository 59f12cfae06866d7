//! Data layer for a Pokémon encyclopedia.
//!
//! This crate provides:
//! - HTTP clients for the Pokémon data, trading card and video search APIs
//! - the cached catalog feeding the list view, with in-memory filter and sort
//! - the detail aggregator and evolution walker feeding the detail view
//! - a fixture-backed mock client for testing
//!
//! ## Usage
//!
//! ```ignore
//! use pokedex_client::{ListQuery, Pokedex, PokedexClientConfig};
//!
//! let pokedex = Pokedex::new(PokedexClientConfig::default())?;
//!
//! let catalog = pokedex.catalog.catalog(151).await?;
//! let fire = ListQuery {
//!     type_: Some("fire".to_string()),
//!     sort: Some("weight-desc".parse()?),
//!     ..Default::default()
//! }
//! .apply(&catalog);
//!
//! let view = pokedex.details.load("25").await?;
//! let moves = pokedex.details.moves(&view.pokemon).await;
//! let evolutions = pokedex.evolution.chain("25").await?;
//! ```

pub mod cache;
mod catalog;
mod client;
mod config;
mod detail;
mod error;
mod evolution;
mod filter;
pub mod gallery;
pub mod mock;
pub mod pool;
pub mod types;

use std::sync::Arc;

pub use catalog::{CatalogFetcher, available_types};
pub use client::{Client, ClientTrait, HttpClient};
pub use config::*;
pub use detail::{DetailAggregator, DetailView, RELATED_VIDEO_LIMIT, SEARCH_VIDEO_LIMIT};
pub use error::{LoadError, PokedexClientError, Resource};
pub use evolution::{EvolutionWalker, species_id};
pub use filter::{Direction, ListQuery, ParseSortError, SortKey, SortOrder};

/// All data components, sharing one upstream client.
///
/// Construct once and pass to consumers; caches live as long as this value.
#[derive(Debug)]
pub struct Pokedex {
    pub catalog: CatalogFetcher,
    pub details: DetailAggregator,
    pub evolution: EvolutionWalker,
}

impl Pokedex {
    pub fn new(config: PokedexClientConfig) -> Result<Self, PokedexClientError> {
        let client = Client::new(&config)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: PokedexClientConfig, client: impl Into<Client>) -> Self {
        let client = Arc::new(client.into());
        Self {
            catalog: CatalogFetcher::new(client.clone(), config.fetch_concurrency),
            details: DetailAggregator::new(client.clone(), config),
            evolution: EvolutionWalker::new(client),
        }
    }
}
