//! Configuration types for client construction.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const DEFAULT_POKEAPI_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_TCG_URL: &str = "https://api.pokemontcg.io/v2";
pub const DEFAULT_VIDEO_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_CRIES_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/cries/main/cries/pokemon/latest";

pub const DEFAULT_FETCH_CONCURRENCY: NonZeroUsize = NonZeroUsize::new(16).unwrap();
pub const DEFAULT_CARD_LIMIT: usize = 8;

/// Configuration for [crate::Pokedex] and [crate::Client] construction.
#[derive(Debug, Clone)]
pub struct PokedexClientConfig {
    /// Base URL for the Pokémon data API (listing, detail, species, moves).
    pub pokeapi_url: String,
    /// Base URL for the trading card search API.
    pub tcg_url: String,
    /// API key for the trading card search.
    /// Card lookups are skipped entirely without it.
    pub tcg_api_key: Option<String>,
    /// Base URL for the video search API.
    pub video_url: String,
    /// API key for the video search.
    /// Without it a single placeholder video is returned.
    pub video_api_key: Option<String>,
    /// Base URL under which `<id>.ogg` cry recordings are published.
    pub cries_url: String,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Upper bound for in-flight requests when fanning out.
    pub fetch_concurrency: NonZeroUsize,
    /// Maximum number of trading cards appended to a gallery.
    pub card_limit: usize,
    /// Serve responses from a fixture file instead of the network.
    pub mock_data: Option<PathBuf>,
}

impl Default for PokedexClientConfig {
    fn default() -> Self {
        Self {
            pokeapi_url: DEFAULT_POKEAPI_URL.to_string(),
            tcg_url: DEFAULT_TCG_URL.to_string(),
            tcg_api_key: None,
            video_url: DEFAULT_VIDEO_URL.to_string(),
            video_api_key: None,
            cries_url: DEFAULT_CRIES_URL.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            card_limit: DEFAULT_CARD_LIMIT,
            mock_data: None,
        }
    }
}

impl PokedexClientConfig {
    /// Point every upstream service at the same base URL.
    ///
    /// Used with a single mock server in tests.
    pub fn with_base_url(base_url: impl AsRef<str>) -> Self {
        let base_url = base_url.as_ref().trim_end_matches('/');
        Self {
            pokeapi_url: base_url.to_string(),
            tcg_url: base_url.to_string(),
            video_url: base_url.to_string(),
            cries_url: format!("{base_url}/cries"),
            ..Default::default()
        }
    }

    /// URL of the cry recording for the given pokemon id.
    pub fn cry_url(&self, id: u32) -> String {
        format!("{}/{id}.ogg", self.cries_url.trim_end_matches('/'))
    }
}
