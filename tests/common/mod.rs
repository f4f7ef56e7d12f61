//! Common test infrastructure
//!
//! Builds a temporary data directory with a small but fully cross-referenced
//! set of source datasets, plus a pipeline wired to a warehouse database in
//! the same directory.

use filmdepot::config::{AppConfig, DatasetFiles};
use filmdepot::pipeline::{Pipeline, RowErrorPolicy};
use filmdepot::warehouse::WarehouseStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const CARMENCITA_ID: &str = "tt0000001";
pub const CLOWN_ID: &str = "tt0000002";
pub const SERIES_ID: &str = "tt0041038";
pub const EPISODE_ID: &str = "tt0041951";
pub const ASTAIRE_ID: &str = "nm0000001";
pub const BACALL_ID: &str = "nm0000002";

pub struct TestWarehouse {
    pub dir: TempDir,
    pub pipeline: Pipeline,
}

fn write_dataset(dir: &Path, name: &str, lines: &[&str]) {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(dir.join(name), content).unwrap();
}

fn write_fixture_datasets(dir: &Path) {
    write_dataset(
        dir,
        "title.basics.tsv",
        &[
            "tconst\ttitleType\tprimaryTitle\toriginalTitle\tisAdult\tstartYear\tendYear\truntimeMinutes\tgenres",
            "tt0000001\tshort\tCarmencita\tCarmencita\t0\t1894\t\\N\t1\tDocumentary,Short",
            "tt0000002\tmovie\tThe Clown\tThe Clown\t0\t1906\t\\N\t70\tDrama",
            "tt0041038\ttvSeries\tThe Lone Ranger\tThe Lone Ranger\t0\t1949\t1957\t30\tWestern",
            "tt0041951\ttvEpisode\tEnter the Lone Ranger\tEnter the Lone Ranger\t0\t1949\t\\N\t30\tWestern",
        ],
    );
    write_dataset(
        dir,
        "name.basics.tsv",
        &[
            "nconst\tprimaryName\tbirthYear\tdeathYear\tprimaryProfession\tknownForTitles",
            "nm0000001\tFred Astaire\t1899\t1987\tactor,soundtrack\ttt0000001",
            "nm0000002\tLauren Bacall\t1924\t2014\tactress\ttt0000002",
        ],
    );
    write_dataset(
        dir,
        "title.principals.tsv",
        &[
            "tconst\tnconst\tcategory\tjob\tcharacters",
            "tt0000001\tnm0000001\tself\t\\N\t[\"Self\"]",
            "tt0000002\tnm0000002\tactress\t\\N\t\\N",
        ],
    );
    write_dataset(
        dir,
        "title.crew.tsv",
        &[
            "tconst\tdirectors\twriters",
            "tt0000001\tnm0000002\t\\N",
            "tt0000002\t\\N\t\\N",
        ],
    );
    write_dataset(
        dir,
        "title.episode.tsv",
        &[
            "tconst\tparentTconst\tseasonNumber\tepisodeNumber",
            "tt0041951\ttt0041038\t1\t1",
        ],
    );
    write_dataset(
        dir,
        "title.ratings.tsv",
        &[
            "tconst\taverageRating\tnumVotes",
            "tt0000001\t5.7\t2043",
            "tt0041951\t8.1\t514",
        ],
    );
    write_dataset(
        dir,
        "full_data.csv",
        &[
            "Year\tClass\tCanonicalCategory\tCategory\tFilmId\tNomineeIds\tWin",
            "1927/28 (1st)\tActing\tACTOR\tACTOR\ttt0000001\tnm0000001\tTrue",
            "1929\tActing\tACTOR\tACTOR\ttt0000002\tnm0000002\tFalse",
        ],
    );
}

impl TestWarehouse {
    pub fn new() -> Self {
        Self::with_policy(RowErrorPolicy::Skip)
    }

    pub fn with_policy(policy: RowErrorPolicy) -> Self {
        let dir = TempDir::new().unwrap();
        write_fixture_datasets(dir.path());

        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            warehouse_db: dir.path().join("warehouse.db"),
            // Small chunks so multi-chunk paths are exercised
            chunk_size: 2,
            on_row_error: policy,
            files: DatasetFiles::default(),
        };
        let store = WarehouseStore::open(&config.warehouse_db).unwrap();
        let pipeline = Pipeline::new(store, config);
        Self { dir, pipeline }
    }

    /// Replace one dataset file in place; the header must match the real one.
    pub fn overwrite_dataset(&self, name: &str, lines: &[&str]) {
        write_dataset(self.dir.path(), name, lines);
    }

    /// Close the pipeline and reopen the warehouse file for raw SQL asserts.
    /// The `TempDir` is handed back so the file outlives the call.
    pub fn into_connection(self) -> (TempDir, rusqlite::Connection) {
        let TestWarehouse { dir, pipeline } = self;
        drop(pipeline);
        let conn = rusqlite::Connection::open(dir.path().join("warehouse.db")).unwrap();
        (dir, conn)
    }
}
