//! Error handling for upstream API operations.

use derive_more::Display;
use reqwest::StatusCode;
use thiserror::Error;

use crate::mock::MockDataError;

/// The upstream resource a request was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Resource {
    #[display("pokemon list")]
    PokemonList,
    #[display("pokemon")]
    Pokemon,
    #[display("pokemon species")]
    Species,
    #[display("evolution chain")]
    EvolutionChain,
    #[display("move")]
    Move,
    #[display("card search")]
    Cards,
    #[display("video search")]
    Videos,
}

impl Resource {
    /// Message shown to users when a record of this kind does not exist.
    pub fn not_found_message(&self) -> &'static str {
        match self {
            Resource::Pokemon | Resource::PokemonList => "Pokémon not found",
            Resource::Species => "Pokémon species not found",
            Resource::EvolutionChain => "No evolution data available",
            Resource::Move => "Move not found",
            Resource::Cards => "No cards found",
            Resource::Videos => "No videos found",
        }
    }
}

/// Common error type for upstream API operations.
#[derive(Debug, Error)]
pub enum PokedexClientError {
    #[error("{resource} '{ident}' not found")]
    NotFound { resource: Resource, ident: String },
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("request failed")]
    Request(#[source] reqwest::Error),
    #[error("could not decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("no API key configured for {0}")]
    MissingApiKey(Resource),
    #[error(transparent)]
    MockData(#[from] MockDataError),
    #[error("{0}")]
    Other(String),
}

impl PokedexClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PokedexClientError::NotFound { .. })
    }
}

/// Error of the detail load routine.
///
/// Anything that goes wrong while loading the primary content of a detail
/// view is converted into one of these at the top of [crate::DetailAggregator::load].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The record does not exist upstream.
    /// Carries a message suitable for display next to a "go back" action.
    #[error("{0}")]
    NotFound(String),
    #[error("failed to load pokemon '{ident}'")]
    Failed {
        ident: String,
        #[source]
        source: PokedexClientError,
    },
}

impl LoadError {
    pub(crate) fn from_client_error(ident: &str, err: PokedexClientError) -> Self {
        match err {
            PokedexClientError::NotFound { resource, .. } => {
                LoadError::NotFound(resource.not_found_message().to_string())
            },
            source => LoadError::Failed {
                ident: ident.to_string(),
                source,
            },
        }
    }
}
