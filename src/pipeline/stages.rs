//! Stage implementations. Each stage streams one source dataset through
//! its normalizer into the batch loader, committing at chunk boundaries.

use super::RowErrorPolicy;
use crate::awards::AwardCategoryRegistry;
use crate::config::AppConfig;
use crate::error::EtlError;
use crate::loader::{accumulate, BatchLoader};
use crate::normalize::{
    self, normalize_award_event, normalize_award_triple, normalize_crew, normalize_episode,
    normalize_person, normalize_principal, normalize_rating, normalize_title,
    AWARD_CATEGORY_COLUMNS, AWARD_FACT_COLUMNS, NAME_BASICS_COLUMNS, TITLE_BASICS_COLUMNS,
    TITLE_CREW_COLUMNS, TITLE_EPISODE_COLUMNS, TITLE_PRINCIPALS_COLUMNS, TITLE_RATINGS_COLUMNS,
};
use crate::resolver::{fan_out, ReferenceResolver};
use crate::source::{ChunkedReader, Record};
use crate::warehouse::models::{OscarAwardRow, WarehouseRow};
use crate::warehouse::{Table, WarehouseStore};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Every source dataset is tab-delimited, including the award export that
/// carries a .csv extension.
const DELIMITER: u8 = b'\t';

pub(super) struct StageOutcome {
    pub rows_written: BTreeMap<Table, usize>,
    pub rows_failed: usize,
}

pub(super) fn run(
    name: &str,
    store: &mut WarehouseStore,
    config: &AppConfig,
) -> Result<StageOutcome, EtlError> {
    match name {
        "reference_data" => reference_data(store),
        "titles" => dataset_stage(store, config, &config.files.title_basics, TITLE_BASICS_COLUMNS, normalize_title),
        "people" => dataset_stage(store, config, &config.files.name_basics, NAME_BASICS_COLUMNS, normalize_person),
        "principals" => dataset_stage(store, config, &config.files.title_principals, TITLE_PRINCIPALS_COLUMNS, normalize_principal),
        "crew" => dataset_stage(store, config, &config.files.title_crew, TITLE_CREW_COLUMNS, normalize_crew),
        "episodes" => dataset_stage(store, config, &config.files.title_episode, TITLE_EPISODE_COLUMNS, normalize_episode),
        "awards" => awards(store, config),
        "ratings" => ratings(store, config),
        other => Err(EtlError::UnknownStage(other.to_string())),
    }
}

/// Apply the configured tolerance to a row-scoped error. Non-row errors
/// always propagate.
fn tolerate(
    error: EtlError,
    policy: RowErrorPolicy,
    rows_failed: &mut usize,
) -> Result<(), EtlError> {
    if !error.is_row_level() {
        return Err(error);
    }
    match policy {
        RowErrorPolicy::Skip => {
            *rows_failed += 1;
            warn!("Skipping row: {}", error);
            Ok(())
        }
        RowErrorPolicy::Abort => Err(error),
    }
}

fn reference_data(store: &mut WarehouseStore) -> Result<StageOutcome, EtlError> {
    let mut loader = BatchLoader::new();
    loader.extend(normalize::reference_rows());
    let rows_written = loader.flush(store)?;
    Ok(StageOutcome {
        rows_written,
        rows_failed: 0,
    })
}

/// Shared shape of the single-pass dataset stages: read chunks, normalize
/// each record, commit one chunk per source chunk.
fn dataset_stage(
    store: &mut WarehouseStore,
    config: &AppConfig,
    file_name: &str,
    columns: &[&str],
    normalize: impl Fn(&Record) -> Result<Vec<WarehouseRow>, EtlError>,
) -> Result<StageOutcome, EtlError> {
    let path = config.dataset_path(file_name);
    let reader = ChunkedReader::open(&path, DELIMITER, columns, config.chunk_size)?;
    debug!("Reading {:?} in chunks of {}", path, config.chunk_size);

    let mut loader = BatchLoader::new();
    let mut totals = BTreeMap::new();
    let mut rows_failed = 0;
    for chunk in reader {
        for record in chunk {
            match record.and_then(|r| normalize(&r)) {
                Ok(rows) => loader.extend(rows),
                Err(e) => tolerate(e, config.on_row_error, &mut rows_failed)?,
            }
        }
        accumulate(&mut totals, loader.flush(store)?);
    }
    Ok(StageOutcome {
        rows_written: totals,
        rows_failed,
    })
}

/// Two-pass award load. The scan pass registers every category triple in
/// first-seen order and writes the dimension; the load pass re-reads the
/// file and emits one fact row per nominee (or a single personless fact).
/// The passes must observe the same row count or the stage fails.
fn awards(store: &mut WarehouseStore, config: &AppConfig) -> Result<StageOutcome, EtlError> {
    let path = config.dataset_path(&config.files.awards);
    let mut registry = AwardCategoryRegistry::new();

    let scan = ChunkedReader::open(&path, DELIMITER, AWARD_CATEGORY_COLUMNS, config.chunk_size)?;
    for chunk in scan {
        for record in chunk {
            match record {
                Ok(record) => {
                    registry.register(normalize_award_triple(&record));
                }
                // Counted once, in the load pass; both passes must skip the
                // same records for the row-count assertion to hold.
                Err(e) => match config.on_row_error {
                    RowErrorPolicy::Skip => debug!("Skipping malformed award row: {}", e),
                    RowErrorPolicy::Abort => return Err(e),
                },
            }
        }
    }
    debug!(
        "Registered {} award categories over {} source rows",
        registry.len(),
        registry.scanned_rows()
    );

    let mut loader = BatchLoader::new();
    loader.extend(
        registry
            .dimension_rows()
            .into_iter()
            .map(WarehouseRow::AwardCategory),
    );
    let mut totals = loader.flush(store)?;

    let mut rows_failed = 0;
    let mut loaded_rows = 0;
    let load = ChunkedReader::open(&path, DELIMITER, AWARD_FACT_COLUMNS, config.chunk_size)?;
    for chunk in load {
        for record in chunk {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    tolerate(e, config.on_row_error, &mut rows_failed)?;
                    continue;
                }
            };
            loaded_rows += 1;
            let event = match normalize_award_event(&record) {
                Ok(event) => event,
                Err(e) => {
                    tolerate(e, config.on_row_error, &mut rows_failed)?;
                    continue;
                }
            };
            let award_category_key = registry.lookup(&event.triple)?;
            if event.nominee_keys.is_empty() {
                loader.push(WarehouseRow::OscarAward(OscarAwardRow {
                    title_key: event.title_key.clone(),
                    person_key: None,
                    is_winner: event.is_winner,
                    award_category_key,
                    ceremony_year: event.ceremony_year,
                }));
            } else {
                for nominee in &event.nominee_keys {
                    loader.push(WarehouseRow::OscarAward(OscarAwardRow {
                        title_key: event.title_key.clone(),
                        person_key: Some(nominee.clone()),
                        is_winner: event.is_winner,
                        award_category_key,
                        ceremony_year: event.ceremony_year,
                    }));
                }
            }
        }
        accumulate(&mut totals, loader.flush(store)?);
    }
    registry.assert_consistent_scans(loaded_rows)?;

    Ok(StageOutcome {
        rows_written: totals,
        rows_failed,
    })
}

/// Ratings fan-out. Each source row resolves its title's references and
/// emits one rating fact per genre and one crew-performance fact per
/// (genre, crew member) pair. Flushing is keyed on pending row count since
/// a single source row can produce many fact rows.
fn ratings(store: &mut WarehouseStore, config: &AppConfig) -> Result<StageOutcome, EtlError> {
    let path = config.dataset_path(&config.files.title_ratings);
    let reader = ChunkedReader::open(&path, DELIMITER, TITLE_RATINGS_COLUMNS, config.chunk_size)?;

    let mut loader = BatchLoader::new();
    let mut totals = BTreeMap::new();
    let mut rows_failed = 0;
    for chunk in reader {
        for record in chunk {
            let rating = match record.and_then(|r| normalize_rating(&r)) {
                Ok(rating) => rating,
                Err(e) => {
                    tolerate(e, config.on_row_error, &mut rows_failed)?;
                    continue;
                }
            };
            let rows = {
                let resolver = ReferenceResolver::new(store);
                match resolver.resolve(&rating.title_key) {
                    Ok(refs) => fan_out(&rating, &refs),
                    // An unmatched title key fails this row, not the run.
                    Err(e @ EtlError::MissingPrerequisite { .. }) => {
                        match config.on_row_error {
                            RowErrorPolicy::Skip => {
                                rows_failed += 1;
                                warn!("Skipping row: {}", e);
                                continue;
                            }
                            RowErrorPolicy::Abort => return Err(e),
                        }
                    }
                    Err(e) => return Err(e),
                }
            };
            loader.extend(rows);
            if loader.pending_rows() >= config.chunk_size {
                accumulate(&mut totals, loader.flush(store)?);
            }
        }
    }
    accumulate(&mut totals, loader.flush(store)?);
    Ok(StageOutcome {
        rows_written: totals,
        rows_failed,
    })
}
