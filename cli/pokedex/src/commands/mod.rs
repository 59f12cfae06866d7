mod evolution;
mod list;
mod show;
mod videos;

use std::fmt;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use indoc::indoc;
use pokedex_client::Pokedex;
use tracing::debug;

use crate::config::Config;

const POKEDEX_DESCRIPTION: &str = indoc! {"
    Browse the Pokédex from your terminal.

    List and filter every Pokémon, look at stats, artwork, trading cards and
    evolutions, and find battle videos."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(POKEDEX_DESCRIPTION))]
pub struct PokedexCli(#[bpaf(external(pokedex_args))] pub PokedexArgs);

/// Main pokedex args parser
///
/// To parse the pokedex CLI, use [`PokedexCli`] instead using [`pokedex_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct PokedexArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl PokedexArgs {
    /// Build the data client from `config` and run the selected command
    pub async fn handle(self, config: Config) -> Result<()> {
        let client_config = config.client_config();
        debug!(
            pokeapi_url = %client_config.pokeapi_url,
            mock = client_config.mock_data.is_some(),
            "creating pokedex"
        );
        let pokedex = Pokedex::new(client_config).context("could not create the data client")?;

        match self.command {
            Commands::List(args) => args.handle(&config, &pokedex).await,
            Commands::Types(args) => args.handle(&config, &pokedex).await,
            Commands::Lookup(args) => args.handle(&pokedex).await,
            Commands::Show(args) => args.handle(&pokedex).await,
            Commands::Evolution(args) => args.handle(&pokedex).await,
            Commands::Videos(args) => args.handle(&config, &pokedex).await,
        }
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// List Pokémon, optionally filtered and sorted
    #[bpaf(command, short('l'))]
    List(#[bpaf(external(list::list))] list::List),

    /// List the types present in the catalog
    #[bpaf(command)]
    Types(#[bpaf(external(list::types))] list::Types),

    /// Look up a single Pokémon by exact name or id
    #[bpaf(command)]
    Lookup(#[bpaf(external(list::lookup))] list::Lookup),

    /// Show the detail view of a Pokémon
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// Show the evolution line of a Pokémon
    #[bpaf(command)]
    Evolution(#[bpaf(external(evolution::evolution))] evolution::Evolution),

    /// Search battle videos
    #[bpaf(command)]
    Videos(#[bpaf(external(videos::videos))] videos::Videos),
}

/// Print `value` as pretty JSON on stdout
fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `#025`
fn display_id(id: u32) -> String {
    format!("#{id:03}")
}
