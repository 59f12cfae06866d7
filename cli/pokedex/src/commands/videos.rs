use anyhow::Result;
use bpaf::Bpaf;
use pokedex_client::Pokedex;
use tracing::instrument;

use super::print_json;
use crate::config::Config;
use crate::utils::message;

// Search battle videos
#[derive(Debug, Bpaf, Clone)]
pub struct Videos {
    /// Display the results as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// What to search for, e.g. a Pokémon name
    #[bpaf(positional("TERM"))]
    pub term: String,
}

impl Videos {
    #[instrument(name = "videos", skip_all, fields(term = self.term))]
    pub async fn handle(self, config: &Config, pokedex: &Pokedex) -> Result<()> {
        if config.pokedex.video_api_key.is_none() && config.pokedex.mock_data.is_none() {
            message::warning("No video API key configured, set POKEDEX_VIDEO_API_KEY to search videos");
        }

        let videos = pokedex.details.search_videos(&self.term).await;

        if self.json {
            return print_json(&videos);
        }
        if videos.is_empty() {
            message::plain("No videos found");
            return Ok(());
        }
        for video in videos {
            println!("{}", video.title);
            println!("  {}", video.embed_url);
        }
        Ok(())
    }
}
