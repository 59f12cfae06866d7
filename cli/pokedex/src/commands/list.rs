use std::fmt::{self, Display};

use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use itertools::Itertools;
use pokedex_client::types::CatalogEntry;
use pokedex_client::{ListQuery, Pokedex, SortOrder, available_types};
use tracing::instrument;

use super::{display_id, print_json};
use crate::config::Config;
use crate::utils::message;

// List pokemon from the catalog
#[derive(Debug, Bpaf, Clone)]
pub struct List {
    /// Only show Pokémon whose name contains TEXT
    #[bpaf(long, short, argument("TEXT"))]
    pub search: Option<String>,

    /// Only show Pokémon of TYPE, e.g. 'fire'
    #[bpaf(long("type"), short('t'), argument("TYPE"))]
    pub type_: Option<String>,

    /// Sort by id, name, type, abilities, height or weight,
    /// ascending or descending, e.g. 'weight-desc'
    #[bpaf(long, argument("FIELD-DIR"))]
    pub sort: Option<SortOrder>,

    /// Number of Pokémon to fetch
    #[bpaf(long, argument("N"))]
    pub limit: Option<u32>,

    /// Display the list as a JSON array
    #[bpaf(long)]
    pub json: bool,
}

impl List {
    #[instrument(name = "list", skip_all, fields(search = self.search, type_ = self.type_))]
    pub async fn handle(self, config: &Config, pokedex: &Pokedex) -> Result<()> {
        let limit = self.limit.unwrap_or(config.pokedex.catalog_limit());
        let catalog = pokedex
            .catalog
            .catalog(limit)
            .await
            .context("Failed to fetch the list of Pokémon")?;

        let query = ListQuery {
            search: self.search,
            type_: self.type_,
            sort: self.sort,
        };
        let entries = query.apply(&catalog);

        if self.json {
            return print_json(&entries);
        }

        if entries.is_empty() {
            message::plain("No Pokémon match your filters.");
            return Ok(());
        }

        print!("{}", DisplayCatalog(&entries));
        if entries.len() < catalog.len() {
            message::plain(format!("Showing {} of {} Pokémon", entries.len(), catalog.len()));
        }
        Ok(())
    }
}

// List the types of all catalog pokemon
#[derive(Debug, Bpaf, Clone)]
pub struct Types {
    /// Number of Pokémon to fetch
    #[bpaf(long, argument("N"))]
    pub limit: Option<u32>,
}

impl Types {
    #[instrument(name = "types", skip_all)]
    pub async fn handle(self, config: &Config, pokedex: &Pokedex) -> Result<()> {
        let limit = self.limit.unwrap_or(config.pokedex.catalog_limit());
        let catalog = pokedex
            .catalog
            .catalog(limit)
            .await
            .context("Failed to fetch the list of Pokémon")?;

        for type_ in available_types(&catalog) {
            println!("{type_}");
        }
        Ok(())
    }
}

// Fetch a single pokemon directly
#[derive(Debug, Bpaf, Clone)]
pub struct Lookup {
    /// Display the result as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Name or id of the Pokémon
    #[bpaf(positional("NAME"))]
    pub name: String,
}

impl Lookup {
    #[instrument(name = "lookup", skip_all, fields(name = self.name))]
    pub async fn handle(self, pokedex: &Pokedex) -> Result<()> {
        let entry = match pokedex.catalog.lookup(&self.name).await {
            Ok(entry) => entry,
            Err(err) if err.is_not_found() => {
                bail!("Pokémon '{}' not found", self.name.trim())
            },
            Err(err) => Err(err)?,
        };

        if self.json {
            return print_json(&entry);
        }
        print!("{}", DisplayCatalog(std::slice::from_ref(&entry)));
        Ok(())
    }
}

/// One line per entry: id, name, types, abilities
struct DisplayCatalog<'a>(&'a [CatalogEntry]);

impl Display for DisplayCatalog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self.0.iter().map(|e| e.name.len()).max().unwrap_or(0);
        let type_width = self.0.iter().map(|e| e.type_.len()).max().unwrap_or(0);

        for entry in self.0 {
            writeln!(
                f,
                "{id:<6}{name:<name_width$}  {type_:<type_width$}  {abilities}",
                id = display_id(entry.id),
                name = entry.name,
                type_ = entry.type_,
                abilities = entry.abilities.iter().join(", "),
            )?;
        }
        Ok(())
    }
}
