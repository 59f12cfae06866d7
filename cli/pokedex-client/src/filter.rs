//! In-memory search, type filter and ordering over the catalog.

use std::cmp::Ordering;
use std::str::FromStr;

use derive_more::Display;
use thiserror::Error;

use crate::types::CatalogEntry;

/// Field to order catalog entries by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SortKey {
    #[display("id")]
    Id,
    #[display("name")]
    Name,
    #[display("type")]
    Type,
    /// Number of abilities.
    #[display("abilities")]
    Abilities,
    #[display("height")]
    Height,
    #[display("weight")]
    Weight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Direction {
    #[display("asc")]
    Ascending,
    #[display("desc")]
    Descending,
}

/// A sort key and direction, written as `<field>-<dir>`, e.g. `weight-desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{key}-{direction}")]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: Direction,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSortError {
    #[error("expected <field>-<asc|desc>, got '{0}'")]
    Format(String),
    #[error("unknown sort field '{0}'")]
    Field(String),
    #[error("unknown sort direction '{0}'")]
    Direction(String),
}

impl FromStr for SortOrder {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, direction) = s
            .rsplit_once('-')
            .ok_or_else(|| ParseSortError::Format(s.to_string()))?;

        let key = match key {
            "id" => SortKey::Id,
            "name" => SortKey::Name,
            "type" => SortKey::Type,
            "abilities" => SortKey::Abilities,
            "height" => SortKey::Height,
            "weight" => SortKey::Weight,
            other => return Err(ParseSortError::Field(other.to_string())),
        };
        let direction = match direction {
            "asc" => Direction::Ascending,
            "desc" => Direction::Descending,
            other => return Err(ParseSortError::Direction(other.to_string())),
        };
        Ok(SortOrder { key, direction })
    }
}

impl SortOrder {
    fn compare(&self, a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
        let ordering = match self.key {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Type => a.type_.cmp(&b.type_),
            SortKey::Abilities => a.abilities.len().cmp(&b.abilities.len()),
            SortKey::Height => a.height.cmp(&b.height),
            SortKey::Weight => a.weight.cmp(&b.weight),
        };
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Criteria selected on the list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive name substring, surrounding whitespace ignored.
    pub search: Option<String>,
    /// Case-insensitive type tag.
    pub type_: Option<String>,
    pub sort: Option<SortOrder>,
}

impl ListQuery {
    /// Filter and order `entries`.
    ///
    /// Empty criteria are ignored; sorting is stable.
    pub fn apply(&self, entries: &[CatalogEntry]) -> Vec<CatalogEntry> {
        let search = non_empty(&self.search).map(str::to_lowercase);
        let type_ = non_empty(&self.type_).map(str::to_lowercase);

        let mut result = entries
            .iter()
            .filter(|entry| {
                search
                    .as_deref()
                    .is_none_or(|term| entry.name.to_lowercase().contains(term))
            })
            .filter(|entry| {
                type_
                    .as_deref()
                    .is_none_or(|wanted| entry.type_tags().any(|tag| tag.to_lowercase() == wanted))
            })
            .cloned()
            .collect::<Vec<_>>();

        if let Some(order) = &self.sort {
            result.sort_by(|a, b| order.compare(a, b));
        }
        result
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
