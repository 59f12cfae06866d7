//! Clients for the upstream REST services.

use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::PokedexClientConfig;
use crate::error::{PokedexClientError, Resource};
use crate::mock::MockClient;
use crate::types::*;

const TCG_API_KEY_HEADER: &str = "x-api-key";

/// The upstream API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the public services via [`HttpClient`]
/// - **Mock**: fixture responses without HTTP via [`MockClient`]
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Fetch the first `limit` entries of the pokemon listing.
    async fn list_pokemon(&self, limit: u32) -> Result<ResourceList, PokedexClientError>;

    /// Fetch the primary record of a pokemon by id or name.
    async fn get_pokemon(&self, ident: &str) -> Result<Pokemon, PokedexClientError>;

    /// Fetch the species record of a pokemon by id or name.
    async fn get_species(&self, ident: &str) -> Result<Species, PokedexClientError>;

    /// Fetch an evolution chain from the absolute URL linked by a species.
    async fn get_evolution_chain(&self, url: &str) -> Result<EvolutionChain, PokedexClientError>;

    /// Fetch the detail record of a move.
    async fn get_move(&self, name: &str) -> Result<MoveDetail, PokedexClientError>;

    /// Search trading cards by pokemon name.
    async fn search_cards(&self, name: &str) -> Result<Vec<Card>, PokedexClientError>;

    /// Search videos by free text.
    async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoSearchItem>, PokedexClientError>;
}

/// Either a client for the actual upstream services,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Http(HttpClient),
    Mock(MockClient),
}

impl Client {
    /// Create a client from configuration.
    ///
    /// A configured `mock_data` file takes precedence over the network.
    pub fn new(config: &PokedexClientConfig) -> Result<Self, PokedexClientError> {
        match &config.mock_data {
            Some(path) => {
                debug!(?path, "using mock client");
                Ok(Client::Mock(MockClient::from_file(path)?))
            },
            None => Ok(Client::Http(HttpClient::new(config.clone())?)),
        }
    }
}

/// A client for the public REST services.
pub struct HttpClient {
    client: reqwest::Client,
    config: PokedexClientConfig,
}

impl Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("pokeapi_url", &self.config.pokeapi_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(config: PokedexClientConfig) -> Result<Self, PokedexClientError> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    fn pokeapi(&self, path: &str) -> String {
        format!("{}/{path}", self.config.pokeapi_url.trim_end_matches('/'))
    }

    /// Send a request and decode a JSON response.
    ///
    /// `404` responses become [PokedexClientError::NotFound] for `resource`.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: Resource,
        ident: &str,
    ) -> Result<T, PokedexClientError> {
        let response = request.send().await.map_err(PokedexClientError::Request)?;
        let url = response.url().to_string();
        let status = response.status();
        debug!(%url, %status, %resource, "received response");

        if status == StatusCode::NOT_FOUND {
            return Err(PokedexClientError::NotFound {
                resource,
                ident: ident.to_string(),
            });
        }
        if !status.is_success() {
            return Err(PokedexClientError::Status { url, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| PokedexClientError::Decode { url, source })
    }
}

impl ClientTrait for HttpClient {
    #[instrument(skip(self))]
    async fn list_pokemon(&self, limit: u32) -> Result<ResourceList, PokedexClientError> {
        let request = self
            .client
            .get(self.pokeapi("pokemon"))
            .query(&[("limit", limit)]);
        self.fetch_json(request, Resource::PokemonList, &limit.to_string())
            .await
    }

    #[instrument(skip(self))]
    async fn get_pokemon(&self, ident: &str) -> Result<Pokemon, PokedexClientError> {
        let request = self.client.get(self.pokeapi(&format!("pokemon/{ident}")));
        self.fetch_json(request, Resource::Pokemon, ident).await
    }

    #[instrument(skip(self))]
    async fn get_species(&self, ident: &str) -> Result<Species, PokedexClientError> {
        let request = self
            .client
            .get(self.pokeapi(&format!("pokemon-species/{ident}")));
        self.fetch_json(request, Resource::Species, ident).await
    }

    #[instrument(skip(self))]
    async fn get_evolution_chain(&self, url: &str) -> Result<EvolutionChain, PokedexClientError> {
        let request = self.client.get(url);
        self.fetch_json(request, Resource::EvolutionChain, url).await
    }

    #[instrument(skip(self))]
    async fn get_move(&self, name: &str) -> Result<MoveDetail, PokedexClientError> {
        let request = self.client.get(self.pokeapi(&format!("move/{name}")));
        self.fetch_json(request, Resource::Move, name).await
    }

    #[instrument(skip(self))]
    async fn search_cards(&self, name: &str) -> Result<Vec<Card>, PokedexClientError> {
        let Some(api_key) = &self.config.tcg_api_key else {
            return Err(PokedexClientError::MissingApiKey(Resource::Cards));
        };
        let request = self
            .client
            .get(format!(
                "{}/cards",
                self.config.tcg_url.trim_end_matches('/')
            ))
            .header(TCG_API_KEY_HEADER, api_key)
            .query(&[("q", format!("name:{name}"))]);
        let response: CardSearchResponse = self.fetch_json(request, Resource::Cards, name).await?;
        Ok(response.data)
    }

    #[instrument(skip(self))]
    async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoSearchItem>, PokedexClientError> {
        let Some(api_key) = &self.config.video_api_key else {
            return Err(PokedexClientError::MissingApiKey(Resource::Videos));
        };
        let request = self
            .client
            .get(format!(
                "{}/search",
                self.config.video_url.trim_end_matches('/')
            ))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", max_results.to_string().as_str()),
                ("q", query),
                ("key", api_key.as_str()),
            ]);
        let response: VideoSearchResponse =
            self.fetch_json(request, Resource::Videos, query).await?;
        Ok(response.items)
    }
}

/// Upstream identifiers are lower-case names or numeric ids.
pub(crate) fn normalize_ident(ident: &str) -> String {
    ident.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

fn build_http_client(config: &PokedexClientConfig) -> Result<reqwest::Client, PokedexClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| PokedexClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| PokedexClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        pokeapi_url = %config.pokeapi_url,
        has_tcg_key = config.tcg_api_key.is_some(),
        has_video_key = config.video_api_key.is_some(),
        extra_headers = config.extra_headers.len(),
        "building HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder.user_agent(concat!("pokedex/", env!("CARGO_PKG_VERSION")))
    };

    client_builder
        .build()
        .map_err(|e| PokedexClientError::Other(e.to_string()))
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeMap;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_config(url: &str) -> PokedexClientConfig {
        PokedexClientConfig::with_base_url(url)
    }

    #[tokio::test]
    async fn list_sends_limit() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pokemon").query_param("limit", "2");
            then.status(200).json_body(json!({
                "count": 1302,
                "results": [
                    { "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" },
                    { "name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon/2/" }
                ]
            }));
        });

        let client = HttpClient::new(client_config(&server.base_url())).unwrap();
        let list = client.list_pokemon(2).await.unwrap();

        assert_eq!(list.count, Some(1302));
        assert_eq!(
            list.results.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["bulbasaur", "ivysaur"]
        );
        mock.assert();
    }

    /// 404 errors are mapped to [PokedexClientError::NotFound],
    /// so consumers dont need to inspect the raw response
    #[tokio::test]
    async fn pokemon_not_found() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/pokemon/missingno");
            then.status(404).body("Not Found");
        });

        let client = HttpClient::new(client_config(&server.base_url())).unwrap();
        let result = client.get_pokemon("missingno").await;

        assert!(
            matches!(
                &result,
                Err(PokedexClientError::NotFound { resource: Resource::Pokemon, ident }) if ident == "missingno"
            ),
            "expected NotFound, found: {result:?}"
        );
        mock.assert();
    }

    /// Other unsuccessful responses keep their status
    #[tokio::test]
    async fn species_unexpected_status() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/pokemon-species/25");
            then.status(503);
        });

        let client = HttpClient::new(client_config(&server.base_url())).unwrap();
        let result = client.get_species("25").await;

        assert!(
            matches!(
                result,
                Err(PokedexClientError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    ..
                })
            ),
            "expected Status, found: {result:?}"
        );
        mock.assert();
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.path("/move/thunderbolt");
            then.status(200)
                .header("content-type", "application/json")
                .body("<html>oops</html>");
        });

        let client = HttpClient::new(client_config(&server.base_url())).unwrap();
        let result = client.get_move("thunderbolt").await;

        assert!(
            matches!(result, Err(PokedexClientError::Decode { .. })),
            "expected Decode, found: {result:?}"
        );
    }

    #[tokio::test]
    async fn card_search_sends_api_key_and_name_query() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/cards")
                .header(TCG_API_KEY_HEADER, "tcg-key")
                .query_param("q", "name:pikachu");
            then.status(200).json_body(json!({
                "data": [
                    { "id": "base1-58", "name": "Pikachu", "images": { "small": "s.png", "large": "l.png" } }
                ]
            }));
        });

        let config = PokedexClientConfig {
            tcg_api_key: Some("tcg-key".to_string()),
            ..client_config(&server.base_url())
        };
        let client = HttpClient::new(config).unwrap();
        let cards = client.search_cards("pikachu").await.unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "base1-58");
        mock.assert();
    }

    #[tokio::test]
    async fn card_search_without_key_does_not_send_request() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/cards");
            then.status(200).json_body(json!({ "data": [] }));
        });

        let client = HttpClient::new(client_config(&server.base_url())).unwrap();
        let result = client.search_cards("pikachu").await;

        assert!(matches!(
            result,
            Err(PokedexClientError::MissingApiKey(Resource::Cards))
        ));
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn video_search_query_parameters() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/search")
                .query_param("part", "snippet")
                .query_param("type", "video")
                .query_param("maxResults", "6")
                .query_param("q", "pikachu battle anime")
                .query_param("key", "yt-key");
            then.status(200).json_body(json!({
                "items": [
                    { "id": { "videoId": "abc" }, "snippet": { "title": "Pikachu!" } }
                ]
            }));
        });

        let config = PokedexClientConfig {
            video_api_key: Some("yt-key".to_string()),
            ..client_config(&server.base_url())
        };
        let client = HttpClient::new(config).unwrap();
        let items = client.search_videos("pikachu battle anime", 6).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.video_id.as_deref(), Some("abc"));
        mock.assert();
    }

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();
        extra_headers.insert("pokedex-test".to_string(), "test-value".to_string());

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.header("pokedex-test", "test-value");
            then.status(200).json_body(json!({ "id": 1, "name": "tackle" }));
        });

        let config = PokedexClientConfig {
            extra_headers,
            ..client_config(&server.base_url())
        };
        let client = HttpClient::new(config).unwrap();
        let _ = client.get_move("tackle").await;
        mock.assert();
    }

    #[tokio::test]
    async fn user_agent_set_on_all_requests() {
        let expected_agent = "my-custom-user-agent";

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.header("user-agent", expected_agent);
            then.status(200).json_body(json!({ "results": [] }));
        });

        let config = PokedexClientConfig {
            user_agent: Some(expected_agent.to_owned()),
            ..client_config(&server.base_url())
        };
        let client = HttpClient::new(config).unwrap();
        let _ = client.list_pokemon(1).await;
        mock.assert();
    }

    #[test]
    fn invalid_extra_header_is_rejected() {
        let config = PokedexClientConfig {
            extra_headers: BTreeMap::from([("bad header".to_string(), "x".to_string())]),
            ..Default::default()
        };
        assert!(matches!(
            HttpClient::new(config),
            Err(PokedexClientError::Other(_))
        ));
    }
}
