//! Gallery derivation from a pokemon's sprite tree.
//!
//! The sprite tree is walked in a fixed order:
//!
//! 1. top level URL fields (`front_default`, `back_shiny`, ...)
//! 2. every artwork section under `other`, flattening nested mappings
//! 3. the animated generation V sprites
//!
//! Source order is kept within each step and duplicate URLs are not removed.

use indexmap::IndexMap;

use crate::types::{GalleryItem, Pokemon, SpriteNode};

const OTHER_SECTION: &str = "other";
const ANIMATED_PATH: [&str; 4] = ["versions", "generation-v", "black-white", "animated"];

/// A URL leaf of the sprite tree together with the keys leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteLeaf {
    pub path: Vec<String>,
    pub url: String,
}

/// Flatten a nested sprite mapping into its URL leaves, depth first, in
/// source order.
///
/// Empty leaves are skipped.
pub fn flatten(node: &IndexMap<String, SpriteNode>) -> Vec<SpriteLeaf> {
    fn walk(node: &IndexMap<String, SpriteNode>, prefix: &mut Vec<String>, out: &mut Vec<SpriteLeaf>) {
        for (key, child) in node {
            prefix.push(key.clone());
            match child {
                SpriteNode::Url(url) if !url.is_empty() => out.push(SpriteLeaf {
                    path: prefix.clone(),
                    url: url.clone(),
                }),
                SpriteNode::Nested(children) => walk(children, prefix, out),
                SpriteNode::Url(_) | SpriteNode::Empty(_) => {},
            }
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    walk(node, &mut Vec::new(), &mut out);
    out
}

fn humanize(segment: &str) -> String {
    segment.replace(['_', '-'], " ")
}

/// Derive the ordered gallery of a pokemon.
pub fn derive_gallery(pokemon: &Pokemon) -> Vec<GalleryItem> {
    let name = &pokemon.name;
    let sprites = &pokemon.sprites.0;
    let mut gallery = Vec::new();

    for (key, node) in sprites {
        if let SpriteNode::Url(url) = node {
            if url.is_empty() {
                continue;
            }
            gallery.push(GalleryItem {
                id: format!("sprite-{key}"),
                url: url.clone(),
                title: format!("{name} sprite {}", key.replace('_', " ")),
            });
        }
    }

    if let Some(SpriteNode::Nested(sections)) = sprites.get(OTHER_SECTION) {
        for (section, node) in sections {
            let SpriteNode::Nested(artwork) = node else {
                continue;
            };
            for leaf in flatten(artwork) {
                let path = leaf.path.join("-");
                gallery.push(GalleryItem {
                    id: format!("other-{section}-{path}"),
                    url: leaf.url,
                    title: format!(
                        "{name} artwork {} - {}",
                        section.replace('_', " "),
                        humanize(&leaf.path.join(" "))
                    ),
                });
            }
        }
    }

    if let Some(animated) = pokemon.sprites.nested_at(&ANIMATED_PATH) {
        for (key, node) in animated {
            if let SpriteNode::Url(url) = node {
                if url.is_empty() {
                    continue;
                }
                gallery.push(GalleryItem {
                    id: format!("animated-{key}"),
                    url: url.clone(),
                    title: format!("{name} animated sprite {}", key.replace('_', " ")),
                });
            }
        }
    }

    gallery
}
