//! Star schema for the film warehouse.
//!
//! Dimension tables carry descriptive attributes and are written once per
//! load. Bridge tables carry many-to-many relationships and are unique
//! over the full tuple so a rerun can re-derive them without duplication.
//! Fact tables are append-only.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, Schema, SqlType, Table};

const DIM_GENRE: Table = Table {
    name: "dim_genre",
    columns: &[
        sqlite_column!("genre_key", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("genre_name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["genre_name"]],
};

const DIM_PROFESSION: Table = Table {
    name: "dim_profession",
    columns: &[
        sqlite_column!("profession_key", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("profession_name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["profession_name"]],
};

const DIM_TITLE: Table = Table {
    name: "dim_title",
    columns: &[
        sqlite_column!("title_key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("primary_title", &SqlType::Text, non_null = true),
        sqlite_column!("original_title", &SqlType::Text, non_null = true),
        sqlite_column!("title_type", &SqlType::Text, non_null = true),
        sqlite_column!("release_year", &SqlType::Integer, non_null = true), // 0 = unknown
        sqlite_column!("end_year", &SqlType::Integer),
        sqlite_column!("runtime_minutes", &SqlType::Integer, non_null = true), // 0 = unknown
        sqlite_column!("is_adult", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const DIM_PERSON: Table = Table {
    name: "dim_person",
    columns: &[
        sqlite_column!("person_key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("full_name", &SqlType::Text, non_null = true),
        sqlite_column!("birth_year", &SqlType::Integer, non_null = true), // 0 = unknown
        sqlite_column!("death_year", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

const DIM_AWARD_CATEGORY: Table = Table {
    name: "dim_award_category",
    columns: &[
        sqlite_column!("award_category_key", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("class", &SqlType::Text, non_null = true),
        sqlite_column!("canonical_category", &SqlType::Text, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["class", "canonical_category", "category"]],
};

const DIM_EPISODE: Table = Table {
    name: "dim_episode",
    columns: &[
        sqlite_column!("episode_key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("parent_title_key", &SqlType::Text, non_null = true),
        sqlite_column!("season_number", &SqlType::Integer, non_null = true), // 0 = unknown
        sqlite_column!("episode_number", &SqlType::Integer, non_null = true), // 0 = unknown
    ],
    indices: &[("idx_episode_parent", "parent_title_key")],
    unique_constraints: &[],
};

const BRIDGE_TITLE_GENRE: Table = Table {
    name: "bridge_title_genre",
    columns: &[
        sqlite_column!("title_key", &SqlType::Text, non_null = true),
        sqlite_column!("genre_key", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_title_genre_title", "title_key")],
    unique_constraints: &[&["title_key", "genre_key"]],
};

const BRIDGE_PERSON_PROFESSION: Table = Table {
    name: "bridge_person_profession",
    columns: &[
        sqlite_column!("person_key", &SqlType::Text, non_null = true),
        sqlite_column!("profession_key", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_person_profession_person", "person_key")],
    unique_constraints: &[&["person_key", "profession_key"]],
};

const BRIDGE_PERSON_TOP_TITLES: Table = Table {
    name: "bridge_person_top_titles",
    columns: &[
        sqlite_column!("person_key", &SqlType::Text, non_null = true),
        sqlite_column!("title_key", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_person_top_titles_person", "person_key")],
    unique_constraints: &[&["person_key", "title_key"]],
};

const BRIDGE_CREW: Table = Table {
    name: "bridge_crew",
    columns: &[
        sqlite_column!("title_key", &SqlType::Text, non_null = true),
        sqlite_column!("person_key", &SqlType::Text, non_null = true),
        sqlite_column!("role_category", &SqlType::Text, non_null = true),
        sqlite_column!("job", &SqlType::Text),
        sqlite_column!("characters", &SqlType::Text),
    ],
    indices: &[("idx_crew_title", "title_key")],
    unique_constraints: &[&["title_key", "person_key", "role_category"]],
};

const FACT_OSCAR_AWARD: Table = Table {
    name: "fact_oscar_award",
    columns: &[
        sqlite_column!("title_key", &SqlType::Text, non_null = true),
        sqlite_column!("person_key", &SqlType::Text),
        sqlite_column!("is_winner", &SqlType::Integer, non_null = true),
        sqlite_column!("award_category_key", &SqlType::Integer, non_null = true),
        sqlite_column!("ceremony_year", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_oscar_title", "title_key")],
    unique_constraints: &[],
};

const FACT_RATING: Table = Table {
    name: "fact_rating",
    columns: &[
        sqlite_column!("title_key", &SqlType::Text, non_null = true),
        sqlite_column!("genre_key", &SqlType::Integer, non_null = true),
        sqlite_column!("episode_key", &SqlType::Text),
        sqlite_column!("average_rating", &SqlType::Real, non_null = true),
        sqlite_column!("num_votes", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_rating_title", "title_key")],
    unique_constraints: &[],
};

const FACT_CREW_PERFORMANCE: Table = Table {
    name: "fact_crew_performance",
    columns: &[
        sqlite_column!("title_key", &SqlType::Text, non_null = true),
        sqlite_column!("person_key", &SqlType::Text, non_null = true),
        sqlite_column!("genre_key", &SqlType::Integer, non_null = true),
        sqlite_column!("average_rating", &SqlType::Real, non_null = true),
        sqlite_column!("num_votes", &SqlType::Integer, non_null = true),
        sqlite_column!("release_year", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_crew_performance_person", "person_key")],
    unique_constraints: &[],
};

pub const WAREHOUSE_SCHEMA: Schema = Schema {
    tables: &[
        DIM_GENRE,
        DIM_PROFESSION,
        DIM_TITLE,
        DIM_PERSON,
        DIM_AWARD_CATEGORY,
        DIM_EPISODE,
        BRIDGE_TITLE_GENRE,
        BRIDGE_PERSON_PROFESSION,
        BRIDGE_PERSON_TOP_TITLES,
        BRIDGE_CREW,
        FACT_OSCAR_AWARD,
        FACT_RATING,
        FACT_CREW_PERFORMANCE,
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        WAREHOUSE_SCHEMA.create(&conn).unwrap();
        WAREHOUSE_SCHEMA.validate(&conn).unwrap();
    }

    #[test]
    fn bridge_rows_are_unique_over_full_tuple() {
        let conn = Connection::open_in_memory().unwrap();
        WAREHOUSE_SCHEMA.create(&conn).unwrap();

        conn.execute(
            "INSERT INTO bridge_title_genre (title_key, genre_key) VALUES ('tt0000001', 1)",
            [],
        )
        .unwrap();

        // Same pair again violates the unique constraint
        let dup = conn.execute(
            "INSERT INTO bridge_title_genre (title_key, genre_key) VALUES ('tt0000001', 1)",
            [],
        );
        assert!(dup.is_err());

        // Different genre for the same title is fine
        conn.execute(
            "INSERT INTO bridge_title_genre (title_key, genre_key) VALUES ('tt0000001', 2)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn award_category_triple_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        WAREHOUSE_SCHEMA.create(&conn).unwrap();

        conn.execute(
            "INSERT INTO dim_award_category (award_category_key, class, canonical_category, category)
             VALUES (1, 'Acting', 'ACTOR', 'ACTOR')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO dim_award_category (award_category_key, class, canonical_category, category)
             VALUES (2, 'Acting', 'ACTOR', 'ACTOR')",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn fact_tables_allow_repeated_rows() {
        let conn = Connection::open_in_memory().unwrap();
        WAREHOUSE_SCHEMA.create(&conn).unwrap();

        for _ in 0..2 {
            conn.execute(
                "INSERT INTO fact_rating (title_key, genre_key, episode_key, average_rating, num_votes)
                 VALUES ('tt0000001', 1, NULL, 5.7, 2043)",
                [],
            )
            .unwrap();
        }
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM fact_rating", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
