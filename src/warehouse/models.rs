//! Canonical row types for every warehouse table.
//!
//! Normalizers emit these; the batch loader buckets them by destination
//! table and the store turns each bucket into one bulk write.

/// Destination tables of the star schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    DimGenre,
    DimProfession,
    DimTitle,
    DimPerson,
    DimAwardCategory,
    DimEpisode,
    BridgeTitleGenre,
    BridgePersonProfession,
    BridgePersonTopTitles,
    BridgeCrew,
    FactOscarAward,
    FactRating,
    FactCrewPerformance,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::DimGenre => "dim_genre",
            Table::DimProfession => "dim_profession",
            Table::DimTitle => "dim_title",
            Table::DimPerson => "dim_person",
            Table::DimAwardCategory => "dim_award_category",
            Table::DimEpisode => "dim_episode",
            Table::BridgeTitleGenre => "bridge_title_genre",
            Table::BridgePersonProfession => "bridge_person_profession",
            Table::BridgePersonTopTitles => "bridge_person_top_titles",
            Table::BridgeCrew => "bridge_crew",
            Table::FactOscarAward => "fact_oscar_award",
            Table::FactRating => "fact_rating",
            Table::FactCrewPerformance => "fact_crew_performance",
        }
    }

    /// Dimension rows are written once: a duplicate key is a logic error.
    /// Bridge rows may legitimately be re-derived on a rerun, so duplicate
    /// relationship rows are dropped instead of failing the chunk.
    pub fn default_conflict_policy(self) -> ConflictPolicy {
        match self {
            Table::DimGenre
            | Table::DimProfession
            | Table::DimTitle
            | Table::DimPerson
            | Table::DimAwardCategory
            | Table::DimEpisode => ConflictPolicy::Fail,
            Table::BridgeTitleGenre
            | Table::BridgePersonProfession
            | Table::BridgePersonTopTitles
            | Table::BridgeCrew => ConflictPolicy::Ignore,
            // Facts are append-only with no uniqueness to violate.
            Table::FactOscarAward | Table::FactRating | Table::FactCrewPerformance => {
                ConflictPolicy::Fail
            }
        }
    }
}

/// What a bulk write does when it violates a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail the whole chunk.
    Fail,
    /// Drop the conflicting row and keep counting (INSERT OR IGNORE).
    Ignore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenreRow {
    pub genre_key: i64,
    pub genre_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfessionRow {
    pub profession_key: i64,
    pub profession_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleRow {
    pub title_key: String,
    pub primary_title: String,
    pub original_title: String,
    pub title_type: String,
    /// 0 = unknown.
    pub release_year: i64,
    pub end_year: Option<i64>,
    /// 0 = unknown.
    pub runtime_minutes: i64,
    pub is_adult: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonRow {
    pub person_key: String,
    pub full_name: String,
    /// 0 = unknown.
    pub birth_year: i64,
    pub death_year: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwardCategoryRow {
    pub award_category_key: i64,
    pub class: String,
    pub canonical_category: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRow {
    pub episode_key: String,
    pub parent_title_key: String,
    /// 0 = unknown.
    pub season_number: i64,
    /// 0 = unknown.
    pub episode_number: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleGenreRow {
    pub title_key: String,
    pub genre_key: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonProfessionRow {
    pub person_key: String,
    pub profession_key: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonTopTitleRow {
    pub person_key: String,
    pub title_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrewRow {
    pub title_key: String,
    pub person_key: String,
    pub role_category: String,
    pub job: Option<String>,
    pub characters: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscarAwardRow {
    pub title_key: String,
    pub person_key: Option<String>,
    pub is_winner: bool,
    pub award_category_key: i64,
    pub ceremony_year: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingRow {
    /// The series key when the rated title is an episode.
    pub title_key: String,
    pub genre_key: i64,
    /// The episode's own key when attribution was re-pointed to the series.
    pub episode_key: Option<String>,
    pub average_rating: f64,
    pub num_votes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrewPerformanceRow {
    pub title_key: String,
    pub person_key: String,
    pub genre_key: i64,
    pub average_rating: f64,
    pub num_votes: i64,
    pub release_year: i64,
}

/// A normalized row tagged by destination table.
#[derive(Debug, Clone, PartialEq)]
pub enum WarehouseRow {
    Genre(GenreRow),
    Profession(ProfessionRow),
    Title(TitleRow),
    Person(PersonRow),
    AwardCategory(AwardCategoryRow),
    Episode(EpisodeRow),
    TitleGenre(TitleGenreRow),
    PersonProfession(PersonProfessionRow),
    PersonTopTitle(PersonTopTitleRow),
    Crew(CrewRow),
    OscarAward(OscarAwardRow),
    Rating(RatingRow),
    CrewPerformance(CrewPerformanceRow),
}

impl WarehouseRow {
    pub fn table(&self) -> Table {
        match self {
            WarehouseRow::Genre(_) => Table::DimGenre,
            WarehouseRow::Profession(_) => Table::DimProfession,
            WarehouseRow::Title(_) => Table::DimTitle,
            WarehouseRow::Person(_) => Table::DimPerson,
            WarehouseRow::AwardCategory(_) => Table::DimAwardCategory,
            WarehouseRow::Episode(_) => Table::DimEpisode,
            WarehouseRow::TitleGenre(_) => Table::BridgeTitleGenre,
            WarehouseRow::PersonProfession(_) => Table::BridgePersonProfession,
            WarehouseRow::PersonTopTitle(_) => Table::BridgePersonTopTitles,
            WarehouseRow::Crew(_) => Table::BridgeCrew,
            WarehouseRow::OscarAward(_) => Table::FactOscarAward,
            WarehouseRow::Rating(_) => Table::FactRating,
            WarehouseRow::CrewPerformance(_) => Table::FactCrewPerformance,
        }
    }
}
