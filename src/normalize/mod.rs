//! Per-dataset field normalization.
//!
//! Every function here is pure and deterministic: it takes one projected
//! source record (fields in the order of the matching `*_COLUMNS` const)
//! and produces canonical row tuples tagged by destination table, or a
//! row-level error.
//!
//! Sentinel policy, applied uniformly:
//! - `\N` in a string dimension field becomes the literal `"Unknown"`.
//! - `\N` in a required numeric field becomes `0`; in a nullable numeric
//!   field (death year, end year) it becomes NULL, distinct from `0`.
//! - Multi-valued fields are split on `,` and each element is checked
//!   against `\N` and the unknown-identifier marker `?` individually.
//! - Genre and profession literals must resolve against the fixed
//!   enumerations; an unrecognized literal fails the row.

pub mod enums;

use crate::awards::AwardTriple;
use crate::error::EtlError;
use crate::source::Record;
use crate::warehouse::models::{
    CrewRow, EpisodeRow, GenreRow, PersonProfessionRow, PersonRow, PersonTopTitleRow,
    ProfessionRow, TitleGenreRow, TitleRow, WarehouseRow,
};
use enums::{genre_key, profession_key, GENRES, GENRE_NOT_APPLICABLE, PROFESSIONS};

/// The source's "no value" marker.
pub const SENTINEL: &str = "\\N";
/// Marker for an identifier the source knows exists but cannot name.
pub const UNKNOWN_ID: &str = "?";
/// Literal stored for absent string dimension fields.
pub const UNKNOWN_LITERAL: &str = "Unknown";

pub const TITLE_BASICS_COLUMNS: &[&str] = &[
    "tconst",
    "titleType",
    "primaryTitle",
    "originalTitle",
    "isAdult",
    "startYear",
    "endYear",
    "runtimeMinutes",
    "genres",
];

pub const NAME_BASICS_COLUMNS: &[&str] = &[
    "nconst",
    "primaryName",
    "birthYear",
    "deathYear",
    "primaryProfession",
    "knownForTitles",
];

pub const TITLE_PRINCIPALS_COLUMNS: &[&str] =
    &["tconst", "nconst", "category", "job", "characters"];

pub const TITLE_CREW_COLUMNS: &[&str] = &["tconst", "directors", "writers"];

pub const TITLE_EPISODE_COLUMNS: &[&str] =
    &["tconst", "parentTconst", "seasonNumber", "episodeNumber"];

pub const TITLE_RATINGS_COLUMNS: &[&str] = &["tconst", "averageRating", "numVotes"];

pub const AWARD_CATEGORY_COLUMNS: &[&str] = &["Class", "CanonicalCategory", "Category"];

pub const AWARD_FACT_COLUMNS: &[&str] = &[
    "Year",
    "Class",
    "CanonicalCategory",
    "Category",
    "FilmId",
    "NomineeIds",
    "Win",
];

fn is_absent(field: &str) -> bool {
    field.is_empty() || field == SENTINEL
}

fn string_or_unknown(field: &str) -> String {
    if is_absent(field) {
        UNKNOWN_LITERAL.to_string()
    } else {
        field.to_string()
    }
}

/// Required numeric field: sentinel maps to 0, anything unparsable is a
/// mapping error.
fn int_or_zero(name: &'static str, field: &str) -> Result<i64, EtlError> {
    if is_absent(field) {
        return Ok(0);
    }
    field.parse().map_err(|_| EtlError::FieldMapping {
        field: name,
        value: field.to_string(),
    })
}

/// Nullable numeric field: sentinel maps to NULL, distinct from 0.
fn int_or_null(name: &'static str, field: &str) -> Result<Option<i64>, EtlError> {
    if is_absent(field) {
        return Ok(None);
    }
    field
        .parse()
        .map(Some)
        .map_err(|_| EtlError::FieldMapping {
            field: name,
            value: field.to_string(),
        })
}

fn opt_string(field: &str) -> Option<String> {
    if is_absent(field) {
        None
    } else {
        Some(field.to_string())
    }
}

/// Split a comma-delimited multi-value field, dropping sentinel and
/// unknown-identifier elements individually.
fn split_multi(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty() && *e != SENTINEL && *e != UNKNOWN_ID)
}

/// Rows for the fixed genre and profession dimensions.
pub fn reference_rows() -> Vec<WarehouseRow> {
    let mut rows = Vec::with_capacity(GENRES.len() + PROFESSIONS.len());
    for (name, key) in GENRES {
        rows.push(WarehouseRow::Genre(GenreRow {
            genre_key: *key,
            genre_name: name.to_string(),
        }));
    }
    for (name, key) in PROFESSIONS {
        rows.push(WarehouseRow::Profession(ProfessionRow {
            profession_key: *key,
            profession_name: name.to_string(),
        }));
    }
    rows
}

/// title.basics record -> one dim_title row plus its genre bridge rows.
///
/// A title with no genre literals still gets exactly one bridge row,
/// pointed at the sentinel genre key.
pub fn normalize_title(record: &Record) -> Result<Vec<WarehouseRow>, EtlError> {
    let title_key = record[0].clone();
    let mut rows = vec![WarehouseRow::Title(TitleRow {
        title_key: title_key.clone(),
        primary_title: string_or_unknown(&record[2]),
        original_title: string_or_unknown(&record[3]),
        title_type: record[1].clone(),
        release_year: int_or_zero("startYear", &record[5])?,
        end_year: int_or_null("endYear", &record[6])?,
        runtime_minutes: int_or_zero("runtimeMinutes", &record[7])?,
        is_adult: record[4] == "1",
    })];

    let mut genre_count = 0;
    for literal in split_multi(&record[8]) {
        let genre_key = genre_key(literal).ok_or(EtlError::FieldMapping {
            field: "genres",
            value: literal.to_string(),
        })?;
        rows.push(WarehouseRow::TitleGenre(TitleGenreRow {
            title_key: title_key.clone(),
            genre_key,
        }));
        genre_count += 1;
    }
    if genre_count == 0 {
        rows.push(WarehouseRow::TitleGenre(TitleGenreRow {
            title_key,
            genre_key: GENRE_NOT_APPLICABLE,
        }));
    }
    Ok(rows)
}

/// name.basics record -> one dim_person row plus profession and
/// known-for-title bridge rows.
pub fn normalize_person(record: &Record) -> Result<Vec<WarehouseRow>, EtlError> {
    let person_key = record[0].clone();
    let mut rows = vec![WarehouseRow::Person(PersonRow {
        person_key: person_key.clone(),
        full_name: string_or_unknown(&record[1]),
        birth_year: int_or_zero("birthYear", &record[2])?,
        death_year: int_or_null("deathYear", &record[3])?,
    })];

    for literal in split_multi(&record[4]) {
        let profession_key = profession_key(literal).ok_or(EtlError::FieldMapping {
            field: "primaryProfession",
            value: literal.to_string(),
        })?;
        rows.push(WarehouseRow::PersonProfession(PersonProfessionRow {
            person_key: person_key.clone(),
            profession_key,
        }));
    }

    for title_key in split_multi(&record[5]) {
        rows.push(WarehouseRow::PersonTopTitle(PersonTopTitleRow {
            person_key: person_key.clone(),
            title_key: title_key.to_string(),
        }));
    }
    Ok(rows)
}

/// title.principals record -> one bridge_crew row with job/character detail.
pub fn normalize_principal(record: &Record) -> Result<Vec<WarehouseRow>, EtlError> {
    Ok(vec![WarehouseRow::Crew(CrewRow {
        title_key: record[0].clone(),
        person_key: record[1].clone(),
        role_category: record[2].clone(),
        job: opt_string(&record[3]),
        characters: opt_string(&record[4]),
    })])
}

/// title.crew record -> bridge_crew rows with synthesized director/writer
/// role literals, no job/character detail.
pub fn normalize_crew(record: &Record) -> Result<Vec<WarehouseRow>, EtlError> {
    let title_key = &record[0];
    let mut rows = Vec::new();
    for (field_index, role) in [(1usize, "director"), (2, "writer")] {
        for person_key in split_multi(&record[field_index]) {
            rows.push(WarehouseRow::Crew(CrewRow {
                title_key: title_key.clone(),
                person_key: person_key.to_string(),
                role_category: role.to_string(),
                job: None,
                characters: None,
            }));
        }
    }
    Ok(rows)
}

/// title.episode record -> one dim_episode row.
pub fn normalize_episode(record: &Record) -> Result<Vec<WarehouseRow>, EtlError> {
    Ok(vec![WarehouseRow::Episode(EpisodeRow {
        episode_key: record[0].clone(),
        parent_title_key: record[1].clone(),
        season_number: int_or_zero("seasonNumber", &record[2])?,
        episode_number: int_or_zero("episodeNumber", &record[3])?,
    })])
}

/// A ratings source row before reference resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRecord {
    pub title_key: String,
    pub average_rating: f64,
    pub num_votes: i64,
}

pub fn normalize_rating(record: &Record) -> Result<RatingRecord, EtlError> {
    let average_rating = record[1].parse().map_err(|_| EtlError::FieldMapping {
        field: "averageRating",
        value: record[1].clone(),
    })?;
    let num_votes = record[2].parse().map_err(|_| EtlError::FieldMapping {
        field: "numVotes",
        value: record[2].clone(),
    })?;
    Ok(RatingRecord {
        title_key: record[0].clone(),
        average_rating,
        num_votes,
    })
}

/// Award category triple from a scan-pass record.
pub fn normalize_award_triple(record: &Record) -> AwardTriple {
    AwardTriple {
        class: record[0].clone(),
        canonical_category: record[1].clone(),
        category: record[2].clone(),
    }
}

/// An award source row from the fact pass, before category key lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct AwardEvent {
    pub triple: AwardTriple,
    pub ceremony_year: i64,
    pub title_key: String,
    /// Person keys; empty when the nominee is not a person (or unknown).
    pub nominee_keys: Vec<String>,
    pub is_winner: bool,
}

/// Ceremony year fields may embed season detail ("1927/28 (1st)"); only
/// the leading numeric year counts.
fn leading_year(field: &str) -> Result<i64, EtlError> {
    let digits: String = field
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().map_err(|_| EtlError::FieldMapping {
        field: "Year",
        value: field.to_string(),
    })
}

pub fn normalize_award_event(record: &Record) -> Result<AwardEvent, EtlError> {
    let title_key = &record[4];
    if is_absent(title_key) || title_key == UNKNOWN_ID {
        // Honorary awards with no film attached cannot produce a fact row.
        return Err(EtlError::FieldMapping {
            field: "FilmId",
            value: title_key.clone(),
        });
    }

    // Nominee entries that are not person identifiers (companies, free
    // text) resolve to no person key.
    let nominee_keys = split_multi(&record[5])
        .filter(|id| id.starts_with("nm"))
        .map(str::to_string)
        .collect();

    Ok(AwardEvent {
        triple: AwardTriple {
            class: record[1].clone(),
            canonical_category: record[2].clone(),
            category: record[3].clone(),
        },
        ceremony_year: leading_year(&record[0])?,
        title_key: title_key.clone(),
        nominee_keys,
        is_winner: record[6] == "True",
    })
}
