//! Evolution sequences.
//!
//! A species links to an evolution chain tree. The walker follows the first
//! child at every level and resolves each visited species into an
//! [EvolutionNode]. Sibling branches are not visited.

use std::sync::Arc;

use tracing::{debug, instrument};
use url::Url;

use crate::client::{Client, ClientTrait, normalize_ident};
use crate::error::PokedexClientError;
use crate::types::{ChainLink, EvolutionNode};

#[derive(Debug)]
pub struct EvolutionWalker {
    client: Arc<Client>,
}

impl EvolutionWalker {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// The evolution sequence containing the given pokemon.
    ///
    /// Returns an empty sequence when the species or its chain is unknown
    /// upstream, or when the species has no chain at all.
    #[instrument(skip(self))]
    pub async fn chain(&self, ident: &str) -> Result<Vec<EvolutionNode>, PokedexClientError> {
        let ident = normalize_ident(ident);
        let species = match self.client.get_species(&ident).await {
            Ok(species) => species,
            Err(err) if err.is_not_found() => {
                debug!("no species record, no evolution data");
                return Ok(Vec::new());
            },
            Err(err) => return Err(err),
        };

        let Some(link) = species.evolution_chain else {
            debug!(species = %species.name, "species has no evolution chain");
            return Ok(Vec::new());
        };

        let chain = match self.client.get_evolution_chain(&link.url).await {
            Ok(chain) => chain,
            Err(err) if err.is_not_found() => {
                debug!(url = %link.url, "evolution chain not found");
                return Ok(Vec::new());
            },
            Err(err) => return Err(err),
        };

        let mut sequence = Vec::new();
        let mut node: Option<&ChainLink> = Some(&chain.chain);
        while let Some(link) = node {
            let ident = species_id(&link.species.url)
                .map(|id| id.to_string())
                .unwrap_or_else(|| link.species.name.clone());
            let pokemon = self.client.get_pokemon(&ident).await?;
            sequence.push(EvolutionNode::from(&pokemon));
            node = link.evolves_to.first();
        }

        debug!(length = sequence.len(), "walked evolution chain");
        Ok(sequence)
    }
}

/// The numeric id in the last path segment of a species URL,
/// e.g. `.../pokemon-species/25/`.
pub fn species_id(url: &str) -> Option<u32> {
    let url = Url::parse(url).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()?
        .parse()
        .ok()
}
