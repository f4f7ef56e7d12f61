//! SQLite-backed warehouse store.
//!
//! The pipeline talks to the store through two narrow surfaces: one bulk
//! write per table per chunk (a prepared statement driven inside a single
//! transaction, committed at the chunk boundary) and the four point
//! lookups the ratings stage needs against already-committed state.

use super::models::{ConflictPolicy, Table, WarehouseRow};
use super::schema::WAREHOUSE_SCHEMA;
use crate::error::EtlError;
use anyhow::{Context, Result};
use rusqlite::{ffi, params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub struct WarehouseStore {
    conn: Connection,
}

impl WarehouseStore {
    /// Open (or create) the warehouse database file.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open warehouse database")?;

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);

        if table_count == 0 {
            info!("Creating warehouse schema");
            WAREHOUSE_SCHEMA.create(&conn)?;
        } else {
            WAREHOUSE_SCHEMA.validate(&conn)?;
        }

        conn.pragma_update(None, "journal_mode", "WAL")?;

        let title_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM dim_title", [], |r| r.get(0))
            .unwrap_or(0);
        let person_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM dim_person", [], |r| r.get(0))
            .unwrap_or(0);
        info!(
            "Opened warehouse: {} titles, {} people",
            title_count, person_count
        );

        Ok(WarehouseStore { conn })
    }

    /// In-memory store with the full schema, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        WAREHOUSE_SCHEMA.create(&conn)?;
        Ok(WarehouseStore { conn })
    }

    // =========================================================================
    // Bulk writes
    // =========================================================================

    /// Write one chunk's worth of rows, one bulk insert per table, inside a
    /// single transaction. Either every bucket commits or none does.
    ///
    /// Returns the number of rows actually written per table; under the
    /// `Ignore` policy conflicting rows are dropped and not counted.
    pub fn write_chunk(
        &mut self,
        buckets: &BTreeMap<Table, Vec<WarehouseRow>>,
        policy_for: impl Fn(Table) -> ConflictPolicy,
    ) -> Result<BTreeMap<Table, usize>, EtlError> {
        let tx = self.conn.transaction()?;
        let mut written = BTreeMap::new();

        for (&table, rows) in buckets {
            let policy = policy_for(table);
            let sql = insert_sql(table, policy);
            let mut stmt = tx.prepare_cached(&sql)?;

            let mut count = 0usize;
            for row in rows {
                debug_assert_eq!(row.table(), table);
                // Only uniqueness conflicts are duplicates; other constraint
                // failures (NOT NULL, CHECK) stay as raw store errors.
                count += bind_and_execute(&mut stmt, row).map_err(|e| match &e {
                    rusqlite::Error::SqliteFailure(failure, detail)
                        if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                            || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                    {
                        EtlError::DuplicateKey {
                            table: table.name(),
                            detail: detail.clone().unwrap_or_default(),
                        }
                    }
                    _ => EtlError::Store(e),
                })?;
            }
            written.insert(table, count);
        }

        tx.commit()?;
        Ok(written)
    }

    // =========================================================================
    // Point lookups (ratings stage)
    // =========================================================================

    /// Release year of a title, `None` when the dimension row is missing.
    pub fn title_release_year(&self, title_key: &str) -> Result<Option<i64>, EtlError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT release_year FROM dim_title WHERE title_key = ?1")?;
        match stmt.query_row(params![title_key], |r| r.get(0)) {
            Ok(year) => Ok(Some(year)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All genre keys linked to a title, sentinel included.
    pub fn genre_keys_for_title(&self, title_key: &str) -> Result<Vec<i64>, EtlError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT genre_key FROM bridge_title_genre WHERE title_key = ?1 ORDER BY genre_key",
        )?;
        let keys = stmt
            .query_map(params![title_key], |r| r.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(keys)
    }

    /// The parent series key if the given title is an episode.
    pub fn episode_parent(&self, title_key: &str) -> Result<Option<String>, EtlError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT parent_title_key FROM dim_episode WHERE episode_key = ?1")?;
        match stmt.query_row(params![title_key], |r| r.get(0)) {
            Ok(parent) => Ok(Some(parent)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Distinct crew member keys linked to a title.
    pub fn crew_keys_for_title(&self, title_key: &str) -> Result<Vec<String>, EtlError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT person_key FROM bridge_crew WHERE title_key = ?1 ORDER BY person_key",
        )?;
        let keys = stmt
            .query_map(params![title_key], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    // =========================================================================
    // Counts
    // =========================================================================

    pub fn table_count(&self, table: Table) -> Result<i64, EtlError> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |r| r.get(0),
        )?;
        Ok(count)
    }
}

fn insert_sql(table: Table, policy: ConflictPolicy) -> String {
    let verb = match policy {
        ConflictPolicy::Fail => "INSERT",
        ConflictPolicy::Ignore => "INSERT OR IGNORE",
    };
    let (columns, placeholders) = match table {
        Table::DimGenre => ("genre_key, genre_name", "?1, ?2"),
        Table::DimProfession => ("profession_key, profession_name", "?1, ?2"),
        Table::DimTitle => (
            "title_key, primary_title, original_title, title_type, release_year, end_year, runtime_minutes, is_adult",
            "?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8",
        ),
        Table::DimPerson => (
            "person_key, full_name, birth_year, death_year",
            "?1, ?2, ?3, ?4",
        ),
        Table::DimAwardCategory => (
            "award_category_key, class, canonical_category, category",
            "?1, ?2, ?3, ?4",
        ),
        Table::DimEpisode => (
            "episode_key, parent_title_key, season_number, episode_number",
            "?1, ?2, ?3, ?4",
        ),
        Table::BridgeTitleGenre => ("title_key, genre_key", "?1, ?2"),
        Table::BridgePersonProfession => ("person_key, profession_key", "?1, ?2"),
        Table::BridgePersonTopTitles => ("person_key, title_key", "?1, ?2"),
        Table::BridgeCrew => (
            "title_key, person_key, role_category, job, characters",
            "?1, ?2, ?3, ?4, ?5",
        ),
        Table::FactOscarAward => (
            "title_key, person_key, is_winner, award_category_key, ceremony_year",
            "?1, ?2, ?3, ?4, ?5",
        ),
        Table::FactRating => (
            "title_key, genre_key, episode_key, average_rating, num_votes",
            "?1, ?2, ?3, ?4, ?5",
        ),
        Table::FactCrewPerformance => (
            "title_key, person_key, genre_key, average_rating, num_votes, release_year",
            "?1, ?2, ?3, ?4, ?5, ?6",
        ),
    };
    format!(
        "{} INTO {} ({}) VALUES ({})",
        verb,
        table.name(),
        columns,
        placeholders
    )
}

fn bind_and_execute(
    stmt: &mut rusqlite::CachedStatement<'_>,
    row: &WarehouseRow,
) -> rusqlite::Result<usize> {
    match row {
        WarehouseRow::Genre(r) => stmt.execute(params![r.genre_key, r.genre_name]),
        WarehouseRow::Profession(r) => stmt.execute(params![r.profession_key, r.profession_name]),
        WarehouseRow::Title(r) => stmt.execute(params![
            r.title_key,
            r.primary_title,
            r.original_title,
            r.title_type,
            r.release_year,
            r.end_year,
            r.runtime_minutes,
            r.is_adult as i64,
        ]),
        WarehouseRow::Person(r) => stmt.execute(params![
            r.person_key,
            r.full_name,
            r.birth_year,
            r.death_year
        ]),
        WarehouseRow::AwardCategory(r) => stmt.execute(params![
            r.award_category_key,
            r.class,
            r.canonical_category,
            r.category
        ]),
        WarehouseRow::Episode(r) => stmt.execute(params![
            r.episode_key,
            r.parent_title_key,
            r.season_number,
            r.episode_number
        ]),
        WarehouseRow::TitleGenre(r) => stmt.execute(params![r.title_key, r.genre_key]),
        WarehouseRow::PersonProfession(r) => stmt.execute(params![r.person_key, r.profession_key]),
        WarehouseRow::PersonTopTitle(r) => stmt.execute(params![r.person_key, r.title_key]),
        WarehouseRow::Crew(r) => stmt.execute(params![
            r.title_key,
            r.person_key,
            r.role_category,
            r.job,
            r.characters
        ]),
        WarehouseRow::OscarAward(r) => stmt.execute(params![
            r.title_key,
            r.person_key,
            r.is_winner as i64,
            r.award_category_key,
            r.ceremony_year
        ]),
        WarehouseRow::Rating(r) => stmt.execute(params![
            r.title_key,
            r.genre_key,
            r.episode_key,
            r.average_rating,
            r.num_votes
        ]),
        WarehouseRow::CrewPerformance(r) => stmt.execute(params![
            r.title_key,
            r.person_key,
            r.genre_key,
            r.average_rating,
            r.num_votes,
            r.release_year
        ]),
    }
}
