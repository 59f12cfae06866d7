//! Aggregation of everything shown on the detail view of one pokemon.
//!
//! Primary and species records are cached per identifier. Cards, videos and
//! moves are best effort: failures are logged and the section comes back
//! empty.

use std::num::NonZeroUsize;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::cache::Cache;
use crate::client::{Client, ClientTrait, normalize_ident};
use crate::config::PokedexClientConfig;
use crate::error::{LoadError, PokedexClientError, Resource};
use crate::gallery::derive_gallery;
use crate::pool;
use crate::types::{GalleryItem, MoveEntry, Pokemon, Species, VideoItem};

pub const RELATED_VIDEO_LIMIT: u32 = 6;
pub const SEARCH_VIDEO_LIMIT: u32 = 5;

/// The primary content of a detail view.
#[derive(Debug, Clone)]
pub struct DetailView {
    pub pokemon: Arc<Pokemon>,
    pub species: Arc<Species>,
    /// Sprites and artwork followed by trading cards.
    pub gallery: Vec<GalleryItem>,
    pub videos: Vec<VideoItem>,
    pub cry_url: String,
}

#[derive(Debug)]
pub struct DetailAggregator {
    client: Arc<Client>,
    config: PokedexClientConfig,
    pokemon: Cache<String, Pokemon>,
    species: Cache<String, Species>,
}

impl DetailAggregator {
    pub fn new(client: Arc<Client>, config: PokedexClientConfig) -> Self {
        Self::with_caches(
            client,
            config,
            Cache::new("pokemon"),
            Cache::new("species"),
        )
    }

    /// Use caches with custom storage.
    pub fn with_caches(
        client: Arc<Client>,
        config: PokedexClientConfig,
        pokemon: Cache<String, Pokemon>,
        species: Cache<String, Species>,
    ) -> Self {
        Self {
            client,
            config,
            pokemon,
            species,
        }
    }

    fn concurrency(&self) -> NonZeroUsize {
        self.config.fetch_concurrency
    }

    /// The primary record for a pokemon id or name.
    pub async fn pokemon(&self, ident: &str) -> Result<Arc<Pokemon>, PokedexClientError> {
        let key = normalize_ident(ident);
        self.pokemon
            .get_or_try_fetch(key.clone(), || async move {
                self.client.get_pokemon(&key).await
            })
            .await
    }

    /// The species record for a pokemon id or name.
    pub async fn species(&self, ident: &str) -> Result<Arc<Species>, PokedexClientError> {
        let key = normalize_ident(ident);
        self.species
            .get_or_try_fetch(key.clone(), || async move {
                self.client.get_species(&key).await
            })
            .await
    }

    /// Sprite and artwork gallery of a pokemon.
    pub fn gallery(&self, pokemon: &Pokemon) -> Vec<GalleryItem> {
        derive_gallery(pokemon)
    }

    /// Trading card images for a pokemon name, at most `card_limit` of them.
    pub async fn cards(&self, name: &str) -> Vec<GalleryItem> {
        match self.client.search_cards(name).await {
            Ok(cards) => cards
                .into_iter()
                .take(self.config.card_limit)
                .filter_map(GalleryItem::from_card)
                .collect(),
            Err(PokedexClientError::MissingApiKey(_)) => {
                debug!("no card API key, skipping card search");
                Vec::new()
            },
            Err(err) => {
                warn!(%name, error = %err, "card search failed");
                Vec::new()
            },
        }
    }

    /// Videos related to a pokemon.
    ///
    /// Without a video API key a single placeholder is returned.
    pub async fn related_videos(&self, name: &str) -> Vec<VideoItem> {
        let query = format!("{name} battle anime");
        self.find_videos(&query, RELATED_VIDEO_LIMIT, || {
            VideoItem::placeholder(format!("{name} battle highlights"))
        })
        .await
    }

    /// Free text video search, as offered on the detail view.
    pub async fn search_videos(&self, term: &str) -> Vec<VideoItem> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        let query = format!("{term} pokemon battle anime");
        self.find_videos(&query, SEARCH_VIDEO_LIMIT, || {
            VideoItem::placeholder(format!("{query} (default)"))
        })
        .await
    }

    async fn find_videos(
        &self,
        query: &str,
        max_results: u32,
        placeholder: impl FnOnce() -> VideoItem,
    ) -> Vec<VideoItem> {
        match self.client.search_videos(query, max_results).await {
            Ok(items) => items
                .into_iter()
                .filter_map(VideoItem::from_search_item)
                .collect(),
            Err(PokedexClientError::MissingApiKey(_)) => {
                debug!("no video API key, using placeholder");
                vec![placeholder()]
            },
            Err(err) => {
                warn!(%query, error = %err, "video search failed");
                Vec::new()
            },
        }
    }

    /// Detail records of every move the pokemon can learn, keyed by move
    /// name in the order of the primary record.
    ///
    /// Moves whose detail can't be fetched are left out.
    #[instrument(skip_all, fields(pokemon = %pokemon.name))]
    pub async fn moves(&self, pokemon: &Pokemon) -> IndexMap<String, MoveEntry> {
        let client = &self.client;
        let entries = pool::fetch_partial(
            &pokemon.moves,
            self.concurrency(),
            |slot| async move {
                let detail = client.get_move(&slot.move_.name).await?;
                Ok::<_, PokedexClientError>(MoveEntry {
                    name: slot.move_.name.clone(),
                    detail,
                    learn_methods: slot.version_group_details.clone(),
                })
            },
            |err: PokedexClientError| debug!(error = %err, "dropping unresolvable move"),
        )
        .await;

        debug!(
            resolved = entries.len(),
            total = pokemon.moves.len(),
            "enriched moves"
        );
        entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect()
    }

    /// Load the primary content of a detail view.
    ///
    /// The species is only requested once the pokemon is known, so an unknown
    /// pokemon always fails as such. Cards and videos are fetched
    /// concurrently afterwards and never fail the load.
    #[instrument(skip(self))]
    pub async fn load(&self, ident: &str) -> Result<DetailView, LoadError> {
        let pokemon = self
            .pokemon(ident)
            .await
            .map_err(|err| LoadError::from_client_error(ident, err))?;
        let species = self
            .species(ident)
            .await
            .map_err(|err| LoadError::from_client_error(ident, err))?;

        let mut gallery = self.gallery(&pokemon);
        let (cards, videos) = futures::join!(
            self.cards(&pokemon.name),
            self.related_videos(&pokemon.name)
        );
        gallery.extend(cards);

        Ok(DetailView {
            cry_url: self.config.cry_url(pokemon.id),
            pokemon,
            species,
            gallery,
            videos,
        })
    }

    /// Whether a record is cached for the identifier.
    pub fn is_cached(&self, resource: Resource, ident: &str) -> bool {
        let key = normalize_ident(ident);
        match resource {
            Resource::Pokemon => self.pokemon.get(&key).is_some(),
            Resource::Species => self.species.get(&key).is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::mock::MockClient;
    use crate::types::{
        Card,
        CardImages,
        MoveDetail,
        MoveSlot,
        Thumbnail,
        VideoSearchId,
        VideoSearchItem,
        VideoSnippet,
    };

    fn pikachu() -> Pokemon {
        serde_json::from_value(json!({
            "id": 25,
            "name": "pikachu",
            "sprites": {
                "front_default": "https://img/front.png",
                "other": {
                    "official-artwork": { "front_default": "https://img/official.png" }
                }
            },
            "moves": [
                { "move": { "name": "thunder-shock", "url": "" }, "version_group_details": [] },
                { "move": { "name": "tail-whip", "url": "" }, "version_group_details": [] },
                { "move": { "name": "unknown-move", "url": "" }, "version_group_details": [] },
                { "move": { "name": "quick-attack", "url": "" }, "version_group_details": [] }
            ]
        }))
        .unwrap()
    }

    fn pikachu_species() -> Species {
        Species {
            id: 25,
            name: "pikachu".to_string(),
            ..Default::default()
        }
    }

    fn card(id: &str) -> Card {
        Card {
            id: id.to_string(),
            name: "Pikachu".to_string(),
            images: CardImages {
                small: Some(format!("https://cards/{id}.png")),
                large: None,
            },
        }
    }

    fn video(id: &str) -> VideoSearchItem {
        VideoSearchItem {
            id: VideoSearchId {
                video_id: Some(id.to_string()),
            },
            snippet: VideoSnippet {
                title: format!("video {id}"),
                thumbnails: [("default".to_string(), Thumbnail {
                    url: format!("https://thumb/{id}.jpg"),
                })]
                .into_iter()
                .collect(),
            },
        }
    }

    fn move_detail(id: u32, name: &str) -> MoveDetail {
        MoveDetail {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn pikachu_client() -> MockClient {
        MockClient::default()
            .with_pokemon(pikachu())
            .with_species(pikachu_species())
            .with_cards("pikachu", (1..=10).map(|n| card(&format!("base-{n}"))).collect())
            .with_videos("pikachu battle anime", vec![video("a"), video("b")])
            .with_move(move_detail(84, "thunder-shock"))
            .with_move(move_detail(39, "tail-whip"))
            .with_move(move_detail(98, "quick-attack"))
    }

    fn aggregator(client: MockClient) -> DetailAggregator {
        DetailAggregator::new(Arc::new(Client::Mock(client)), PokedexClientConfig {
            cries_url: "https://cries.test".to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn cached_records_are_shared() {
        let client = pikachu_client();
        let log = client.request_log();
        let details = aggregator(client);

        let first = details.pokemon("25").await.unwrap();
        let second = details.pokemon("25").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let first = details.species("25").await.unwrap();
        let second = details.species("25").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert_eq!(log.count(), 2);
    }

    #[tokio::test]
    async fn not_found_is_not_cached() {
        let client = pikachu_client();
        let log = client.request_log();
        let details = aggregator(client);

        let err = details.load("9999").await.unwrap_err();
        assert!(
            matches!(&err, LoadError::NotFound(message) if message == "Pokémon not found"),
            "unexpected error: {err:?}"
        );
        assert!(!details.is_cached(Resource::Pokemon, "9999"));
        assert!(!details.is_cached(Resource::Species, "9999"));
        assert_eq!(log.count_for(Resource::Species), 0);

        let before = log.count_for(Resource::Pokemon);
        assert!(details.pokemon("9999").await.is_err());
        assert_eq!(log.count_for(Resource::Pokemon), before + 1);
    }

    #[tokio::test]
    async fn load_assembles_detail_view() {
        let details = aggregator(pikachu_client());

        let view = details.load("25").await.unwrap();
        assert_eq!(view.pokemon.name, "pikachu");
        assert_eq!(view.species.id, 25);
        assert_eq!(view.cry_url, "https://cries.test/25.ogg");

        let ids = view.gallery.iter().map(|item| item.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids[..2].to_vec(), vec![
            "sprite-front_default",
            "other-official-artwork-front_default"
        ]);
        assert_eq!(ids.len(), 2 + 8);
        assert_eq!(ids[2], "card-base-1");
        assert_eq!(view.gallery[2].title, "Card: Pikachu");

        assert_eq!(
            view.videos.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[tokio::test]
    async fn card_and_video_failures_do_not_block_load() {
        let client = pikachu_client()
            .failing(Resource::Cards)
            .failing(Resource::Videos);
        let details = aggregator(client);

        let view = details.load("pikachu").await.unwrap();
        assert_eq!(view.gallery.len(), 2);
        assert!(view.videos.is_empty());
    }

    #[tokio::test]
    async fn missing_species_is_reported_after_pokemon() {
        let details = aggregator(MockClient::default().with_pokemon(pikachu()));

        let err = details.load("25").await.unwrap_err();
        assert!(
            matches!(&err, LoadError::NotFound(message) if message == "Pokémon species not found"),
            "unexpected error: {err:?}"
        );
        assert!(details.is_cached(Resource::Pokemon, "25"));
    }

    /// A slow pokemon 404 still wins over a fast species 404
    #[tokio::test]
    async fn unknown_pokemon_is_reported_regardless_of_timing() {
        let server = MockServer::start_async().await;
        let pokemon = server.mock(|when, then| {
            when.path("/pokemon/missingno");
            then.status(404).delay(Duration::from_millis(200));
        });
        let species = server.mock(|when, then| {
            when.path("/pokemon-species/missingno");
            then.status(404);
        });

        let config = PokedexClientConfig::with_base_url(server.base_url());
        let details = DetailAggregator::new(Arc::new(Client::new(&config).unwrap()), config);

        let err = details.load("MissingNo").await.unwrap_err();
        assert!(
            matches!(&err, LoadError::NotFound(message) if message == "Pokémon not found"),
            "unexpected error: {err:?}"
        );
        pokemon.assert();
        species.assert_hits(0);
    }

    #[tokio::test]
    async fn server_error_is_a_failed_load() {
        let details = aggregator(pikachu_client().failing(Resource::Species));

        let err = details.load("25").await.unwrap_err();
        assert!(
            matches!(&err, LoadError::Failed { ident, .. } if ident == "25"),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn moves_keep_order_and_drop_failures() {
        let details = aggregator(pikachu_client());

        let moves = details.moves(&pikachu()).await;
        assert_eq!(moves.keys().collect::<Vec<_>>(), vec![
            "thunder-shock",
            "tail-whip",
            "quick-attack"
        ]);
        assert_eq!(moves["tail-whip"].detail.id, 39);
    }

    #[tokio::test]
    async fn moves_of_pokemon_without_moves() {
        let details = aggregator(pikachu_client());
        let pokemon = Pokemon {
            moves: Vec::<MoveSlot>::new(),
            ..pikachu()
        };
        assert!(details.moves(&pokemon).await.is_empty());
    }

    #[tokio::test]
    async fn blank_video_search_sends_no_request() {
        let client = pikachu_client();
        let log = client.request_log();
        let details = aggregator(client);

        assert!(details.search_videos("   ").await.is_empty());
        assert_eq!(log.count_for(Resource::Videos), 0);
    }

    #[tokio::test]
    async fn video_search_builds_query() {
        let client = MockClient::default()
            .with_videos("raichu pokemon battle anime", vec![video("r")]);
        let log = client.request_log();
        let details = aggregator(client);

        let videos = details.search_videos(" raichu ").await;
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].embed_url, "https://www.youtube.com/embed/r");
        assert_eq!(log.requests()[0].ident, "raichu pokemon battle anime");
    }

    /// Without API keys the card and video services are never contacted
    #[tokio::test]
    async fn missing_keys_skip_requests() {
        let server = MockServer::start_async().await;
        let cards = server.mock(|when, then| {
            when.path("/cards");
            then.status(200).json_body(json!({ "data": [] }));
        });
        let videos = server.mock(|when, then| {
            when.path("/search");
            then.status(200).json_body(json!({ "items": [] }));
        });

        let config = PokedexClientConfig::with_base_url(server.base_url());
        let client = Client::new(&config).unwrap();
        let details = DetailAggregator::new(Arc::new(client), config);

        assert_eq!(details.cards("pikachu").await, vec![]);
        assert_eq!(details.related_videos("pikachu").await, vec![
            VideoItem::placeholder("pikachu battle highlights")
        ]);
        assert_eq!(details.search_videos("onix").await, vec![
            VideoItem::placeholder("onix pokemon battle anime (default)")
        ]);

        cards.assert_hits(0);
        videos.assert_hits(0);
    }

    #[tokio::test]
    async fn cards_over_http_are_capped() {
        let server = MockServer::start_async().await;
        let data = (1..=12)
            .map(|n| json!({ "id": format!("xy-{n}"), "name": "Pikachu", "images": { "large": format!("https://cards/{n}.png") } }))
            .collect::<Vec<_>>();
        let mock = server.mock(|when, then| {
            when.path("/cards")
                .query_param("q", "name:pikachu")
                .header("x-api-key", "secret");
            then.status(200).json_body(json!({ "data": data }));
        });

        let config = PokedexClientConfig {
            tcg_api_key: Some("secret".to_string()),
            card_limit: 3,
            ..PokedexClientConfig::with_base_url(server.base_url())
        };
        let details = DetailAggregator::new(Arc::new(Client::new(&config).unwrap()), config);

        let cards = details.cards("pikachu").await;
        assert_eq!(
            cards.iter().map(|card| card.id.as_str()).collect::<Vec<_>>(),
            vec!["card-xy-1", "card-xy-2", "card-xy-3"]
        );
        mock.assert();
    }
}
