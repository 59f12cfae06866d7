use std::fmt::{self, Display};

use anyhow::Result;
use bpaf::Bpaf;
use indexmap::IndexMap;
use itertools::Itertools;
use pokedex_client::types::{MoveEntry, NamedResource, Pokemon, Species};
use pokedex_client::{DetailView, Pokedex};
use serde_json::json;
use tracing::instrument;

use super::{display_id, print_json};

const LANGUAGE: &str = "en";

// Show the detail view of a pokemon
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// Also list the moves the Pokémon can learn
    #[bpaf(long)]
    pub moves: bool,

    /// Display the detail view as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Name or id of the Pokémon
    #[bpaf(positional("ID"))]
    pub ident: String,
}

impl Show {
    #[instrument(name = "show", skip_all, fields(ident = self.ident))]
    pub async fn handle(self, pokedex: &Pokedex) -> Result<()> {
        let view = pokedex.details.load(&self.ident).await?;

        if self.json {
            let moves = if self.moves {
                Some(pokedex.details.moves(&view.pokemon).await)
            } else {
                None
            };
            return print_json(&json!({
                "pokemon": &*view.pokemon,
                "species": &*view.species,
                "gallery": view.gallery,
                "videos": view.videos,
                "cry_url": view.cry_url,
                "moves": moves,
            }));
        }

        print!("{}", DisplayDetail(&view));

        // moves are enriched after the rest of the view is on screen
        if self.moves {
            let moves = pokedex.details.moves(&view.pokemon).await;
            print!("{}", DisplayMoves {
                pokemon: &view.pokemon,
                moves: &moves,
            });
        }
        Ok(())
    }
}

/// Height in decimetres as metres
fn metres(height: u32) -> String {
    format!("{:.1} m", f64::from(height) / 10.0)
}

/// Weight in hectograms as kilograms
fn kilograms(weight: u32) -> String {
    format!("{:.1} kg", f64::from(weight) / 10.0)
}

/// Everything in the detail view except moves
struct DisplayDetail<'a>(&'a DetailView);

impl Display for DisplayDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;
        let pokemon = &view.pokemon;
        let species = &view.species;

        writeln!(
            f,
            "{} {} ({})",
            display_id(pokemon.id),
            pokemon.name,
            pokemon.type_names().join(", ")
        )?;
        if let Some(genus) = species.genus(LANGUAGE) {
            writeln!(f, "{genus}")?;
        }
        if let Some(text) = species.flavor_text(LANGUAGE) {
            writeln!(f, "\n{}", text.replace('\n', " "))?;
        }

        writeln!(f, "\nAbout")?;
        writeln!(f, "  Height:    {}", metres(pokemon.height))?;
        writeln!(f, "  Weight:    {}", kilograms(pokemon.weight))?;
        writeln!(
            f,
            "  Abilities: {}",
            pokemon
                .abilities
                .iter()
                .map(|slot| if slot.is_hidden {
                    format!("{} (hidden)", slot.ability.name)
                } else {
                    slot.ability.name.clone()
                })
                .join(", ")
        )?;
        write_species(f, species)?;
        write_stats(f, pokemon)?;

        writeln!(f, "\nCry: {}", view.cry_url)?;

        writeln!(f, "\nGallery ({})", view.gallery.len())?;
        for item in &view.gallery {
            writeln!(f, "  {}: {}", item.title, item.url)?;
        }

        writeln!(f, "\nVideos")?;
        if view.videos.is_empty() {
            writeln!(f, "  No videos found")?;
        }
        for video in &view.videos {
            writeln!(f, "  {}: {}", video.title, video.embed_url)?;
        }
        Ok(())
    }
}

fn write_species(f: &mut fmt::Formatter<'_>, species: &Species) -> fmt::Result {
    let name = |resource: &Option<NamedResource>| {
        resource
            .as_ref()
            .map(|r| r.name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    };

    writeln!(f, "\nSpecies")?;
    writeln!(f, "  Color:          {}", name(&species.color))?;
    writeln!(f, "  Habitat:        {}", name(&species.habitat))?;
    writeln!(f, "  Shape:          {}", name(&species.shape))?;
    writeln!(f, "  Generation:     {}", name(&species.generation))?;
    writeln!(f, "  Growth rate:    {}", name(&species.growth_rate))?;
    writeln!(f, "  Capture rate:   {}", species.capture_rate)?;
    if let Some(happiness) = species.base_happiness {
        writeln!(f, "  Base happiness: {happiness}")?;
    }
    writeln!(
        f,
        "  Egg groups:     {}",
        species.egg_group_names().join(", ")
    )?;

    let flags = [
        (species.is_legendary, "legendary"),
        (species.is_mythical, "mythical"),
        (species.is_ultra_beast, "ultra beast"),
    ]
    .into_iter()
    .filter_map(|(set, label)| set.then_some(label))
    .join(", ");
    if !flags.is_empty() {
        writeln!(f, "  Status:         {flags}")?;
    }
    Ok(())
}

fn write_stats(f: &mut fmt::Formatter<'_>, pokemon: &Pokemon) -> fmt::Result {
    writeln!(f, "\nBase stats")?;
    for entry in &pokemon.stats {
        writeln!(f, "  {:<16}{:>4}", entry.stat.name, entry.base_stat)?;
    }
    let total: u32 = pokemon.stats.iter().map(|entry| entry.base_stat).sum();
    writeln!(f, "  {:<16}{:>4}", "total", total)
}

/// Resolved moves, with the number the pokemon can learn in total
struct DisplayMoves<'a> {
    pokemon: &'a Pokemon,
    moves: &'a IndexMap<String, MoveEntry>,
}

impl Display for DisplayMoves<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\nMoves ({} of {})",
            self.moves.len(),
            self.pokemon.moves.len()
        )?;
        for (name, entry) in self.moves {
            let detail = &entry.detail;
            let value =
                |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "  {name:<20}{type_:<10}{class:<10}pow {power:>3}  acc {accuracy:>3}  pp {pp:>2}",
                type_ = detail.type_.as_ref().map(|t| t.name.as_str()).unwrap_or("-"),
                class = detail
                    .damage_class
                    .as_ref()
                    .map(|c| c.name.as_str())
                    .unwrap_or("-"),
                power = value(detail.power),
                accuracy = value(detail.accuracy),
                pp = value(detail.pp),
            )?;
            if let Some(effect) = detail.short_effect(LANGUAGE) {
                writeln!(f, "    {effect}")?;
            }
        }
        Ok(())
    }
}
