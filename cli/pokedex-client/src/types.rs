//! Upstream response types and the derived view types built from them.
//!
//! Response types only model the fields this crate reads.
//! Unknown fields are ignored and most known ones default when absent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// A `{name, url}` pair as used throughout the Pokémon data API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A bare link to another resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub url: String,
}

/// A page of the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}

// ---------------------------------------------------------------------------
// Primary record
// ---------------------------------------------------------------------------

/// Full primary record for one pokemon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub moves: Vec<MoveSlot>,
}

impl Pokemon {
    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.type_.name.clone()).collect()
    }

    pub fn ability_names(&self) -> Vec<String> {
        self.abilities.iter().map(|a| a.ability.name.clone()).collect()
    }

    pub fn move_names(&self) -> Vec<String> {
        self.moves.iter().map(|m| m.move_.name.clone()).collect()
    }

    /// The first listed type, used to pick the accent of a detail view.
    pub fn primary_type(&self) -> &str {
        self.types
            .first()
            .map(|t| t.type_.name.as_str())
            .unwrap_or("normal")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeSlot {
    #[serde(default)]
    pub slot: u8,
    #[serde(rename = "type")]
    pub type_: NamedResource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub slot: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveSlot {
    #[serde(rename = "move")]
    pub move_: NamedResource,
    #[serde(default)]
    pub version_group_details: Vec<VersionGroupDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionGroupDetail {
    #[serde(default)]
    pub level_learned_at: u32,
    pub move_learn_method: NamedResource,
    pub version_group: NamedResource,
}

/// A node of the sprite tree.
///
/// Sprite collections are arbitrarily nested mappings whose leaves are image
/// URLs or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpriteNode {
    Url(String),
    Nested(IndexMap<String, SpriteNode>),
    /// `null` or any other non-URL leaf.
    Empty(Option<serde_json::Value>),
}

/// The sprite tree of a pokemon, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sprites(pub IndexMap<String, SpriteNode>);

impl Sprites {
    /// Look up the URL at a path of keys, if the path ends in a URL leaf.
    pub fn url_at(&self, path: &[&str]) -> Option<&str> {
        let (first, rest) = path.split_first()?;
        let mut node = self.0.get(*first)?;
        for key in rest {
            match node {
                SpriteNode::Nested(children) => node = children.get(*key)?,
                _ => return None,
            }
        }
        match node {
            SpriteNode::Url(url) => Some(url.as_str()),
            _ => None,
        }
    }

    /// The nested mapping at a path of keys.
    pub fn nested_at(&self, path: &[&str]) -> Option<&IndexMap<String, SpriteNode>> {
        let mut current = &self.0;
        for key in path {
            match current.get(*key)? {
                SpriteNode::Nested(children) => current = children,
                _ => return None,
            }
        }
        Some(current)
    }

    pub fn front_default(&self) -> Option<&str> {
        self.url_at(&["front_default"])
    }

    /// Dream world artwork, falling back to the default front sprite.
    pub fn dream_world_or_default(&self) -> Option<&str> {
        self.url_at(&["other", "dream_world", "front_default"])
            .or_else(|| self.front_default())
    }

    /// Official artwork, falling back to the default front sprite.
    pub fn official_artwork_or_default(&self) -> Option<&str> {
        self.url_at(&["other", "official-artwork", "front_default"])
            .or_else(|| self.front_default())
    }
}

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,
    #[serde(default)]
    pub genera: Vec<Genus>,
    #[serde(default)]
    pub color: Option<NamedResource>,
    #[serde(default)]
    pub habitat: Option<NamedResource>,
    #[serde(default)]
    pub shape: Option<NamedResource>,
    #[serde(default)]
    pub capture_rate: u32,
    #[serde(default)]
    pub base_happiness: Option<u32>,
    #[serde(default)]
    pub growth_rate: Option<NamedResource>,
    #[serde(default)]
    pub generation: Option<NamedResource>,
    #[serde(default)]
    pub egg_groups: Vec<NamedResource>,
    #[serde(default)]
    pub is_legendary: bool,
    #[serde(default)]
    pub is_mythical: bool,
    #[serde(default)]
    pub is_ultra_beast: bool,
    #[serde(default)]
    pub evolution_chain: Option<ResourceLink>,
}

impl Species {
    /// First flavor text in the given language, with form feeds turned into
    /// spaces.
    pub fn flavor_text(&self, language: &str) -> Option<String> {
        self.flavor_text_entries
            .iter()
            .find(|entry| entry.language.name == language)
            .map(|entry| entry.flavor_text.replace('\u{c}', " "))
    }

    pub fn genus(&self, language: &str) -> Option<&str> {
        self.genera
            .iter()
            .find(|genus| genus.language.name == language)
            .map(|genus| genus.genus.as_str())
    }

    pub fn egg_group_names(&self) -> Vec<String> {
        self.egg_groups.iter().map(|g| g.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlavorText {
    pub flavor_text: String,
    pub language: NamedResource,
    #[serde(default)]
    pub version: Option<NamedResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genus {
    pub genus: String,
    pub language: NamedResource,
}

// ---------------------------------------------------------------------------
// Evolution chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionChain {
    #[serde(default)]
    pub id: u32,
    pub chain: ChainLink,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

/// One step in an evolution sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionNode {
    pub id: u32,
    pub name: String,
    pub image: Option<String>,
    pub types: Vec<String>,
}

impl From<&Pokemon> for EvolutionNode {
    fn from(pokemon: &Pokemon) -> Self {
        Self {
            id: pokemon.id,
            name: pokemon.name.clone(),
            image: pokemon
                .sprites
                .official_artwork_or_default()
                .map(str::to_string),
            types: pokemon.type_names(),
        }
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveDetail {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub accuracy: Option<u32>,
    #[serde(default)]
    pub power: Option<u32>,
    #[serde(default)]
    pub pp: Option<u32>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, rename = "type")]
    pub type_: Option<NamedResource>,
    #[serde(default)]
    pub damage_class: Option<NamedResource>,
    #[serde(default)]
    pub effect_entries: Vec<EffectEntry>,
}

impl MoveDetail {
    pub fn short_effect(&self, language: &str) -> Option<&str> {
        self.effect_entries
            .iter()
            .find(|entry| entry.language.name == language)
            .map(|entry| entry.short_effect.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectEntry {
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub short_effect: String,
    pub language: NamedResource,
}

/// A move of a pokemon, enriched with its detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveEntry {
    pub name: String,
    pub detail: MoveDetail,
    pub learn_methods: Vec<VersionGroupDetail>,
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardSearchResponse {
    #[serde(default)]
    pub data: Vec<Card>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: CardImages,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardImages {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSearchResponse {
    #[serde(default)]
    pub items: Vec<VideoSearchItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSearchItem {
    #[serde(default)]
    pub id: VideoSearchId,
    #[serde(default)]
    pub snippet: VideoSnippet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSearchId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnails: IndexMap<String, Thumbnail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

pub const VIDEO_EMBED_URL: &str = "https://www.youtube.com/embed";
pub const VIDEO_THUMBNAIL_URL: &str = "https://img.youtube.com/vi";
/// Video shown when no search API key is configured.
pub const PLACEHOLDER_VIDEO_ID: &str = "dQw4w9WgXcQ";

/// One related video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub embed_url: String,
}

impl VideoItem {
    /// The single result returned in place of a search without an API key.
    pub fn placeholder(title: impl Into<String>) -> Self {
        Self {
            id: "1".to_string(),
            title: title.into(),
            thumbnail: Some(format!(
                "{VIDEO_THUMBNAIL_URL}/{PLACEHOLDER_VIDEO_ID}/mqdefault.jpg"
            )),
            embed_url: format!("{VIDEO_EMBED_URL}/{PLACEHOLDER_VIDEO_ID}"),
        }
    }

    /// Convert a search hit, skipping hits that are not videos.
    pub fn from_search_item(item: VideoSearchItem) -> Option<Self> {
        let id = item.id.video_id?;
        let thumbnail = item
            .snippet
            .thumbnails
            .get("medium")
            .or_else(|| item.snippet.thumbnails.get("default"))
            .map(|thumbnail| thumbnail.url.clone());
        Some(Self {
            embed_url: format!("{VIDEO_EMBED_URL}/{id}"),
            id,
            title: item.snippet.title,
            thumbnail,
        })
    }
}

// ---------------------------------------------------------------------------
// List and gallery views
// ---------------------------------------------------------------------------

/// One summary record of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    pub image: Option<String>,
    /// Type tags joined by `", "`, in source order.
    #[serde(rename = "type")]
    pub type_: String,
    pub height: u32,
    pub weight: u32,
    pub abilities: Vec<String>,
}

impl CatalogEntry {
    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.type_
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }
}

impl From<&Pokemon> for CatalogEntry {
    fn from(pokemon: &Pokemon) -> Self {
        Self {
            id: pokemon.id,
            name: pokemon.name.clone(),
            image: pokemon.sprites.dream_world_or_default().map(str::to_string),
            type_: pokemon.type_names().join(", "),
            height: pokemon.height,
            weight: pokemon.weight,
            abilities: pokemon.ability_names(),
        }
    }
}

/// One displayable media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    pub url: String,
    pub title: String,
}

impl GalleryItem {
    /// Convert a card search hit, skipping cards without any image.
    pub fn from_card(card: Card) -> Option<Self> {
        let url = card.images.large.or(card.images.small)?;
        Some(Self {
            id: format!("card-{}", card.id),
            url,
            title: format!("Card: {}", card.name),
        })
    }
}
