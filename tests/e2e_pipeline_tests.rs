//! End-to-end pipeline tests
//!
//! Runs the full stage sequence over a small cross-referenced fixture set
//! and asserts on the resulting warehouse contents.

mod common;

use common::{
    TestWarehouse, ASTAIRE_ID, BACALL_ID, CARMENCITA_ID, CLOWN_ID, EPISODE_ID, SERIES_ID,
};
use filmdepot::error::EtlError;
use filmdepot::pipeline::{RowErrorPolicy, StageStatus};
use filmdepot::warehouse::Table;

#[test]
fn run_all_commits_every_stage() {
    let mut warehouse = TestWarehouse::new();
    let results = warehouse.pipeline.run_all().unwrap();

    let names: Vec<_> = results.iter().map(|r| r.name).collect();
    assert_eq!(
        names,
        vec![
            "reference_data",
            "titles",
            "people",
            "principals",
            "crew",
            "episodes",
            "awards",
            "ratings",
        ]
    );
    assert!(results.iter().all(|r| r.rows_failed == 0));
    assert!(results.iter().all(|r| r.status == StageStatus::Committed));

    let store = warehouse.pipeline.store();
    assert_eq!(store.table_count(Table::DimGenre).unwrap(), 29);
    assert_eq!(store.table_count(Table::DimProfession).unwrap(), 46);
    assert_eq!(store.table_count(Table::DimTitle).unwrap(), 4);
    assert_eq!(store.table_count(Table::DimPerson).unwrap(), 2);
    assert_eq!(store.table_count(Table::DimEpisode).unwrap(), 1);
    assert_eq!(store.table_count(Table::DimAwardCategory).unwrap(), 1);
    assert_eq!(store.table_count(Table::BridgeTitleGenre).unwrap(), 5);
    assert_eq!(store.table_count(Table::BridgePersonProfession).unwrap(), 3);
    assert_eq!(store.table_count(Table::BridgePersonTopTitles).unwrap(), 2);
    assert_eq!(store.table_count(Table::BridgeCrew).unwrap(), 3);
    assert_eq!(store.table_count(Table::FactOscarAward).unwrap(), 2);
    assert_eq!(store.table_count(Table::FactRating).unwrap(), 3);
    assert_eq!(store.table_count(Table::FactCrewPerformance).unwrap(), 4);
}

#[test]
fn carmencita_gets_sentinel_defaults_and_two_genre_links() {
    let mut warehouse = TestWarehouse::new();
    warehouse.pipeline.run_all().unwrap();

    let store = warehouse.pipeline.store();
    assert_eq!(store.title_release_year(CARMENCITA_ID).unwrap(), Some(1894));
    assert_eq!(
        store.genre_keys_for_title(CARMENCITA_ID).unwrap(),
        vec![1, 2]
    );

    let (_dir, conn) = warehouse.into_connection();
    let (primary_title, runtime_minutes, end_year): (String, i64, Option<i64>) = conn
        .query_row(
            "SELECT primary_title, runtime_minutes, end_year FROM dim_title WHERE title_key = ?1",
            [CARMENCITA_ID],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(primary_title, "Carmencita");
    assert_eq!(runtime_minutes, 1);
    assert_eq!(end_year, None);
}

#[test]
fn ratings_fan_out_per_genre_and_crew_member() {
    let mut warehouse = TestWarehouse::new();
    warehouse.pipeline.run_all().unwrap();
    let (_dir, conn) = warehouse.into_connection();

    // Two genres for Carmencita: one rating fact per genre
    let rating_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM fact_rating WHERE title_key = ?1",
            [CARMENCITA_ID],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(rating_rows, 2);

    // Two genres times two crew members
    let performance_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM fact_crew_performance WHERE title_key = ?1",
            [CARMENCITA_ID],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(performance_rows, 4);

    let performers: Vec<String> = conn
        .prepare(
            "SELECT DISTINCT person_key FROM fact_crew_performance \
             WHERE title_key = ?1 ORDER BY person_key",
        )
        .unwrap()
        .query_map([CARMENCITA_ID], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(performers, vec![ASTAIRE_ID, BACALL_ID]);
}

#[test]
fn episode_rating_is_attributed_to_parent_series() {
    let mut warehouse = TestWarehouse::new();
    warehouse.pipeline.run_all().unwrap();
    let (_dir, conn) = warehouse.into_connection();

    let (title_key, episode_key, average_rating): (String, String, f64) = conn
        .query_row(
            "SELECT title_key, episode_key, average_rating FROM fact_rating \
             WHERE episode_key IS NOT NULL",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(title_key, SERIES_ID);
    assert_eq!(episode_key, EPISODE_ID);
    assert_eq!(average_rating, 8.1);
}

#[test]
fn duplicate_award_triples_share_one_category_row() {
    let mut warehouse = TestWarehouse::new();
    warehouse.pipeline.run_all().unwrap();
    let (_dir, conn) = warehouse.into_connection();

    let (facts, categories): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), COUNT(DISTINCT award_category_key) FROM fact_oscar_award",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(facts, 2);
    assert_eq!(categories, 1);

    let winner: bool = conn
        .query_row(
            "SELECT is_winner FROM fact_oscar_award WHERE person_key = ?1",
            [ASTAIRE_ID],
            |r| r.get(0),
        )
        .unwrap();
    assert!(winner);
    let loser: bool = conn
        .query_row(
            "SELECT is_winner FROM fact_oscar_award WHERE person_key = ?1",
            [BACALL_ID],
            |r| r.get(0),
        )
        .unwrap();
    assert!(!loser);

    // Ceremony year comes from the leading numeric year only
    let year: i64 = conn
        .query_row(
            "SELECT ceremony_year FROM fact_oscar_award WHERE title_key = ?1",
            [CARMENCITA_ID],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(year, 1927);
}

#[test]
fn rating_for_unknown_title_is_counted_as_failed() {
    let mut warehouse = TestWarehouse::new();
    warehouse.overwrite_dataset(
        "title.ratings.tsv",
        &[
            "tconst\taverageRating\tnumVotes",
            "tt0000001\t5.7\t2043",
            "tt9999999\t6.0\t10",
        ],
    );

    let results = warehouse.pipeline.run_all().unwrap();
    let ratings = results.last().unwrap();
    assert_eq!(ratings.name, "ratings");
    assert_eq!(ratings.rows_failed, 1);

    let store = warehouse.pipeline.store();
    assert_eq!(store.table_count(Table::FactRating).unwrap(), 2);
}

#[test]
fn episode_rating_with_unloaded_parent_is_counted_as_failed() {
    let mut warehouse = TestWarehouse::new();
    warehouse.overwrite_dataset(
        "title.episode.tsv",
        &[
            "tconst\tparentTconst\tseasonNumber\tepisodeNumber",
            "tt0041951\ttt7777777\t1\t1",
        ],
    );

    let results = warehouse.pipeline.run_all().unwrap();
    let ratings = results.last().unwrap();
    assert_eq!(ratings.name, "ratings");
    assert_eq!(ratings.rows_failed, 1);

    let (_dir, conn) = warehouse.into_connection();
    let facts: i64 = conn
        .query_row("SELECT COUNT(*) FROM fact_rating", [], |row| row.get(0))
        .unwrap();
    assert_eq!(facts, 2);
    let dangling: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM fact_rating f \
             LEFT JOIN dim_title t ON t.title_key = f.title_key \
             WHERE t.title_key IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(dangling, 0);
}

#[test]
fn abort_policy_halts_on_unknown_title() {
    let mut warehouse = TestWarehouse::with_policy(RowErrorPolicy::Abort);
    warehouse.overwrite_dataset(
        "title.ratings.tsv",
        &[
            "tconst\taverageRating\tnumVotes",
            "tt9999999\t6.0\t10",
        ],
    );

    let err = warehouse.pipeline.run_all().unwrap_err();
    assert!(matches!(err, EtlError::MissingPrerequisite { .. }));
    assert_eq!(warehouse.pipeline.status("ratings"), StageStatus::Failed);
    assert_eq!(warehouse.pipeline.status("titles"), StageStatus::Committed);
}

#[test]
fn unknown_genre_literal_fails_only_that_row() {
    let mut warehouse = TestWarehouse::new();
    warehouse.overwrite_dataset(
        "title.basics.tsv",
        &[
            "tconst\ttitleType\tprimaryTitle\toriginalTitle\tisAdult\tstartYear\tendYear\truntimeMinutes\tgenres",
            "tt0000001\tshort\tCarmencita\tCarmencita\t0\t1894\t\\N\t1\tDocumentary,Short",
            "tt0000002\tmovie\tThe Clown\tThe Clown\t0\t1906\t\\N\t70\tZombies",
        ],
    );

    warehouse.pipeline.run_stage("reference_data").unwrap();
    let titles = warehouse.pipeline.run_stage("titles").unwrap();
    assert_eq!(titles.rows_failed, 1);

    let store = warehouse.pipeline.store();
    assert_eq!(store.table_count(Table::DimTitle).unwrap(), 1);
    assert_eq!(store.title_release_year(CLOWN_ID).unwrap(), None);
}

#[test]
fn stages_require_committed_prerequisites() {
    let mut warehouse = TestWarehouse::new();

    let err = warehouse.pipeline.run_stage("ratings").unwrap_err();
    assert!(matches!(
        err,
        EtlError::PrerequisiteNotCommitted {
            stage: "ratings",
            ..
        }
    ));

    let err = warehouse.pipeline.run_stage("bogus").unwrap_err();
    assert!(matches!(err, EtlError::UnknownStage(_)));
}

#[test]
fn crew_stage_rerun_writes_no_new_bridge_rows() {
    let mut warehouse = TestWarehouse::new();
    warehouse.pipeline.run_all().unwrap();

    let before = warehouse
        .pipeline
        .store()
        .table_count(Table::BridgeCrew)
        .unwrap();
    let rerun = warehouse.pipeline.run_stage("crew").unwrap();
    assert_eq!(rerun.total_written(), 0);
    assert_eq!(
        warehouse
            .pipeline
            .store()
            .table_count(Table::BridgeCrew)
            .unwrap(),
        before
    );
}
