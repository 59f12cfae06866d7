use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::{env, fs};

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use pokedex_client::PokedexClientConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of pokedex managed directories
const POKEDEX_DIR_NAME: &str = "pokedex";
const POKEDEX_CONFIG_DIR_VAR: &str = "POKEDEX_CONFIG_DIR";
const POKEDEX_ENV_PREFIX: &str = "POKEDEX_";
pub const POKEDEX_CONFIG_FILE: &str = "pokedex.toml";

/// Number of listing entries fetched by `pokedex list` unless configured
/// otherwise.
pub const DEFAULT_CATALOG_LIMIT: u32 = 1000;

#[derive(Clone, Debug, Deserialize, Default, Serialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub pokedex: PokedexConfig,
}

/// User facing configuration of the pokedex CLI.
///
/// Every field can be set in `pokedex.toml` or via a `POKEDEX_<FIELD>`
/// environment variable, e.g. `POKEDEX_TCG_API_KEY`.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PokedexConfig {
    /// Directory the configuration file is read from (default:
    /// `$XDG_CONFIG_HOME/pokedex`)
    pub config_dir: PathBuf,

    /// Base URL of the Pokémon data API
    pub pokeapi_url: Option<String>,
    /// Base URL of the trading card API
    pub tcg_url: Option<String>,
    /// API key for the trading card API
    pub tcg_api_key: Option<String>,
    /// Base URL of the video search API
    pub video_url: Option<String>,
    /// API key for the video search API
    pub video_api_key: Option<String>,
    /// Base URL of the cry recordings
    pub cries_url: Option<String>,
    pub user_agent: Option<String>,
    /// Headers added to every request
    pub extra_headers: BTreeMap<String, String>,

    /// Maximum number of concurrent requests when fetching many records
    pub fetch_concurrency: Option<NonZeroUsize>,
    /// Maximum number of trading cards shown per pokemon
    pub card_limit: Option<usize>,
    /// Number of pokemon fetched for the catalog
    pub catalog_limit: Option<u32>,

    /// Serve all data from a JSON fixture file instead of the network
    pub mock_data: Option<PathBuf>,
}

impl PokedexConfig {
    pub fn catalog_limit(&self) -> u32 {
        self.catalog_limit.unwrap_or(DEFAULT_CATALOG_LIMIT)
    }
}

impl Config {
    fn read_raw_config() -> Result<HierarchicalConfig> {
        let pokedex_dirs = BaseDirectories::with_prefix(POKEDEX_DIR_NAME);

        let config_dir = match env::var(POKEDEX_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${POKEDEX_CONFIG_DIR_VAR}` set: {v}");
                PathBuf::from(v)
            },
            Err(_) => {
                let config_dir = pokedex_dirs
                    .get_config_home()
                    .context("Could not determine the user's config directory")?;
                debug!("`${POKEDEX_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Could not create config directory: {config_dir:?}"))?;

        let config_dir_str = config_dir
            .to_str()
            .context("Config directory is not valid unicode")?;

        // the config file cannot change the config dir
        let mut builder = HierarchicalConfig::builder()
            .set_override("config_dir", config_dir_str)?;

        // look for files in XDG_CONFIG_DIRS locations
        for file in pokedex_dirs.find_config_files(POKEDEX_CONFIG_FILE) {
            if file.parent() == Some(config_dir.as_path()) {
                continue;
            }
            builder =
                builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
        }

        // add explicit POKEDEX_CONFIG_DIR file last
        builder = builder.add_source(
            config::File::from(config_dir.join(POKEDEX_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // override via env variables
        let pokedex_envs = env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(POKEDEX_ENV_PREFIX)
                    .filter(|k| *k != "CONFIG_DIR")
                    .map(|k| (k.to_owned(), v))
            })
            .collect::<HashMap<_, _>>();

        let builder = builder.add_source(
            Environment::default()
                .source(Some(pokedex_envs))
                .try_parsing(true),
        );

        Ok(builder.build()?)
    }

    /// Creates a [Config] from the environment and config files
    pub fn parse() -> Result<Config> {
        let raw_config = Self::read_raw_config()?;
        let config: Config = raw_config
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(config)
    }

    /// Configuration for the data client, defaults filled in
    pub fn client_config(&self) -> PokedexClientConfig {
        let defaults = PokedexClientConfig::default();
        let config = &self.pokedex;
        PokedexClientConfig {
            pokeapi_url: config.pokeapi_url.clone().unwrap_or(defaults.pokeapi_url),
            tcg_url: config.tcg_url.clone().unwrap_or(defaults.tcg_url),
            tcg_api_key: config.tcg_api_key.clone(),
            video_url: config.video_url.clone().unwrap_or(defaults.video_url),
            video_api_key: config.video_api_key.clone(),
            cries_url: config.cries_url.clone().unwrap_or(defaults.cries_url),
            user_agent: config.user_agent.clone(),
            extra_headers: config.extra_headers.clone(),
            fetch_concurrency: config
                .fetch_concurrency
                .unwrap_or(defaults.fetch_concurrency),
            card_limit: config.card_limit.unwrap_or(defaults.card_limit),
            mock_data: config.mock_data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pokedex_client::{DEFAULT_CARD_LIMIT, DEFAULT_POKEAPI_URL};
    use pretty_assertions::assert_eq;

    use super::*;

    /// Run `f` with an isolated config directory holding `contents`
    fn with_config_file<T>(
        contents: &str,
        vars: &[(&str, Option<&str>)],
        f: impl FnOnce() -> T,
    ) -> T {
        let tempdir = tempfile::tempdir().unwrap();
        let config_dir = tempdir.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(POKEDEX_CONFIG_FILE), contents).unwrap();

        let xdg_dirs = tempdir.path().join("xdg");
        let mut env = vec![
            (
                POKEDEX_CONFIG_DIR_VAR.to_string(),
                Some(config_dir.to_string_lossy().into_owned()),
            ),
            (
                "XDG_CONFIG_DIRS".to_string(),
                Some(xdg_dirs.to_string_lossy().into_owned()),
            ),
            (
                "XDG_CONFIG_HOME".to_string(),
                Some(xdg_dirs.to_string_lossy().into_owned()),
            ),
        ];
        env.extend(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string))),
        );

        temp_env::with_vars(env, f)
    }

    #[test]
    fn defaults_without_config() {
        let config = with_config_file("", &[], Config::parse).unwrap();
        let client_config = config.client_config();

        assert_eq!(client_config.pokeapi_url, DEFAULT_POKEAPI_URL);
        assert_eq!(client_config.card_limit, DEFAULT_CARD_LIMIT);
        assert_eq!(client_config.tcg_api_key, None);
        assert_eq!(config.pokedex.catalog_limit(), DEFAULT_CATALOG_LIMIT);
        assert!(config.pokedex.config_dir.ends_with("config"));
    }

    #[test]
    fn values_from_config_file() {
        let contents = indoc! {r#"
            pokeapi_url = "http://localhost:8080"
            card_limit = 3
            catalog_limit = 151

            [extra_headers]
            x-trace = "on"
        "#};
        let config = with_config_file(contents, &[], Config::parse).unwrap();
        let client_config = config.client_config();

        assert_eq!(client_config.pokeapi_url, "http://localhost:8080");
        assert_eq!(client_config.card_limit, 3);
        assert_eq!(config.pokedex.catalog_limit(), 151);
        assert_eq!(
            client_config.extra_headers.get("x-trace").map(String::as_str),
            Some("on")
        );
    }

    #[test]
    fn environment_overrides_config_file() {
        let contents = indoc! {r#"
            tcg_api_key = "from-file"
            card_limit = 3
        "#};
        let config = with_config_file(
            contents,
            &[
                ("POKEDEX_TCG_API_KEY", Some("from-env")),
                ("POKEDEX_VIDEO_API_KEY", Some("video-key")),
                ("POKEDEX_CARD_LIMIT", Some("5")),
            ],
            Config::parse,
        )
        .unwrap();
        let client_config = config.client_config();

        assert_eq!(client_config.tcg_api_key.as_deref(), Some("from-env"));
        assert_eq!(client_config.video_api_key.as_deref(), Some("video-key"));
        assert_eq!(client_config.card_limit, 5);
    }

    #[test]
    fn invalid_value_is_an_error() {
        let result = with_config_file("fetch_concurrency = 0", &[], Config::parse);
        assert!(result.is_err());
    }
}
