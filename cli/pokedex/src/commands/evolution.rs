use anyhow::{Context, Result};
use bpaf::Bpaf;
use itertools::Itertools;
use pokedex_client::Pokedex;
use pokedex_client::types::EvolutionNode;
use tracing::instrument;

use super::{display_id, print_json};
use crate::utils::message;

// Show the evolution line of a pokemon
#[derive(Debug, Bpaf, Clone)]
pub struct Evolution {
    /// Display the evolution line as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// Name or id of the Pokémon
    #[bpaf(positional("ID"))]
    pub ident: String,
}

impl Evolution {
    #[instrument(name = "evolution", skip_all, fields(ident = self.ident))]
    pub async fn handle(self, pokedex: &Pokedex) -> Result<()> {
        let sequence = pokedex
            .evolution
            .chain(&self.ident)
            .await
            .context("Failed to load the evolution chain")?;

        if self.json {
            return print_json(&sequence);
        }

        if sequence.is_empty() {
            message::plain("No evolution data available");
            return Ok(());
        }
        println!("{}", render_sequence(&sequence));
        Ok(())
    }
}

fn render_sequence(sequence: &[EvolutionNode]) -> String {
    sequence
        .iter()
        .map(|node| {
            format!(
                "{} {} ({})",
                display_id(node.id),
                node.name,
                node.types.join(", ")
            )
        })
        .join(" → ")
}
