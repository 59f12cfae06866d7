//! The full listing of pokemon, normalized into [CatalogEntry] summaries.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, instrument, trace};

use crate::client::{Client, ClientTrait, normalize_ident};
use crate::error::PokedexClientError;
use crate::pool;
use crate::types::CatalogEntry;

/// Fetches the catalog once and serves it from memory afterwards.
#[derive(Debug)]
pub struct CatalogFetcher {
    client: Arc<Client>,
    concurrency: NonZeroUsize,
    entries: OnceCell<Arc<[CatalogEntry]>>,
}

impl CatalogFetcher {
    pub fn new(client: Arc<Client>, concurrency: NonZeroUsize) -> Self {
        Self {
            client,
            concurrency,
            entries: OnceCell::new(),
        }
    }

    /// The first `limit` pokemon of the listing, in listing order.
    ///
    /// Only the first successful call touches the network; later calls
    /// return the same entries whatever `limit` they pass.
    /// A failed detail request fails the call and nothing is cached.
    #[instrument(skip(self))]
    pub async fn catalog(&self, limit: u32) -> Result<Arc<[CatalogEntry]>, PokedexClientError> {
        if let Some(entries) = self.entries.get() {
            trace!(count = entries.len(), "catalog cache hit");
            return Ok(entries.clone());
        }

        let entries = self
            .entries
            .get_or_try_init(|| self.fetch_catalog(limit))
            .await?;
        Ok(entries.clone())
    }

    async fn fetch_catalog(&self, limit: u32) -> Result<Arc<[CatalogEntry]>, PokedexClientError> {
        let listing = self.client.list_pokemon(limit).await?;
        debug!(summaries = listing.results.len(), "fetched listing");

        let client = &self.client;
        let entries = pool::fetch_all(listing.results, self.concurrency, |summary| async move {
            let pokemon = client.get_pokemon(&summary.name).await?;
            Ok::<_, PokedexClientError>(CatalogEntry::from(&pokemon))
        })
        .await?;

        debug!(count = entries.len(), "catalog populated");
        Ok(entries.into())
    }

    /// Whether the catalog has been populated.
    pub fn is_loaded(&self) -> bool {
        self.entries.initialized()
    }

    /// Fetch a single pokemon by name or id, bypassing the catalog.
    ///
    /// The term is trimmed and lower-cased. Results are not cached.
    #[instrument(skip(self))]
    pub async fn lookup(&self, term: &str) -> Result<CatalogEntry, PokedexClientError> {
        let ident = normalize_ident(term);
        if ident.is_empty() {
            return Err(PokedexClientError::Other(
                "search term must not be empty".to_string(),
            ));
        }
        let pokemon = self.client.get_pokemon(&ident).await?;
        Ok(CatalogEntry::from(&pokemon))
    }
}

/// Distinct type tags across `entries`, sorted.
pub fn available_types(entries: &[CatalogEntry]) -> Vec<String> {
    entries
        .iter()
        .flat_map(CatalogEntry::type_tags)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
