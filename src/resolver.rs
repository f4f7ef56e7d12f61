//! Reference resolution for the ratings stage.
//!
//! The ratings stage is the only one that reads back from the store: each
//! source row is enriched with four point lookups against state committed
//! by earlier stages (genre set, parent series, crew set, release year).
//! A missing title dimension row means the stage ordering contract was
//! violated and is fatal for the row, never defaulted.

use crate::error::EtlError;
use crate::normalize::RatingRecord;
use crate::warehouse::models::{CrewPerformanceRow, RatingRow, WarehouseRow};
use crate::warehouse::WarehouseStore;

/// Everything known about a title after the four lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRefs {
    pub genre_keys: Vec<i64>,
    /// The parent series key when the title is an episode.
    pub parent_title_key: Option<String>,
    pub crew_keys: Vec<String>,
    pub release_year: i64,
}

pub struct ReferenceResolver<'a> {
    store: &'a WarehouseStore,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(store: &'a WarehouseStore) -> Self {
        ReferenceResolver { store }
    }

    pub fn resolve(&self, title_key: &str) -> Result<TitleRefs, EtlError> {
        let release_year = self.store.title_release_year(title_key)?.ok_or_else(|| {
            EtlError::MissingPrerequisite {
                entity: "dim_title",
                key: title_key.to_string(),
            }
        })?;

        // Rating facts for an episode land on the parent series row, so
        // the parent must have been loaded by the titles stage too.
        let parent_title_key = self.store.episode_parent(title_key)?;
        if let Some(parent) = &parent_title_key {
            if self.store.title_release_year(parent)?.is_none() {
                return Err(EtlError::MissingPrerequisite {
                    entity: "dim_title",
                    key: parent.clone(),
                });
            }
        }

        Ok(TitleRefs {
            genre_keys: self.store.genre_keys_for_title(title_key)?,
            parent_title_key,
            crew_keys: self.store.crew_keys_for_title(title_key)?,
            release_year,
        })
    }
}

/// Fan a ratings source row out into fact rows: one rating fact per genre
/// and one crew-performance fact per (genre, crew member) pair.
///
/// Ratings for episodes are attributed to the parent series row; the
/// episode's own key is kept on the fact for traceability.
pub fn fan_out(rating: &RatingRecord, refs: &TitleRefs) -> Vec<WarehouseRow> {
    let (rating_title_key, episode_key) = match &refs.parent_title_key {
        Some(parent) => (parent.clone(), Some(rating.title_key.clone())),
        None => (rating.title_key.clone(), None),
    };

    let mut rows = Vec::with_capacity(refs.genre_keys.len() * (1 + refs.crew_keys.len()));
    for &genre_key in &refs.genre_keys {
        rows.push(WarehouseRow::Rating(RatingRow {
            title_key: rating_title_key.clone(),
            genre_key,
            episode_key: episode_key.clone(),
            average_rating: rating.average_rating,
            num_votes: rating.num_votes,
        }));
        for crew_key in &refs.crew_keys {
            rows.push(WarehouseRow::CrewPerformance(CrewPerformanceRow {
                title_key: rating.title_key.clone(),
                person_key: crew_key.clone(),
                genre_key,
                average_rating: rating.average_rating,
                num_votes: rating.num_votes,
                release_year: refs.release_year,
            }));
        }
    }
    rows
}
