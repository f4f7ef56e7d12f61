//! Fixed genre and profession enumerations.
//!
//! Both enumerations are externally fixed: the key assignments are part of
//! the warehouse contract and the literal sets are considered exhaustive.
//! An unrecognized literal in the source is a mapping error, never a new
//! entry.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Reserved genre key for titles with no known genre.
pub const GENRE_NOT_APPLICABLE: i64 = 0;

pub const GENRES: &[(&str, i64)] = &[
    ("Documentary", 1),
    ("Short", 2),
    ("Animation", 3),
    ("Comedy", 4),
    ("Romance", 5),
    ("Sport", 6),
    ("News", 7),
    ("Drama", 8),
    ("Fantasy", 9),
    ("Horror", 10),
    ("Biography", 11),
    ("Music", 12),
    ("War", 13),
    ("Crime", 14),
    ("Western", 15),
    ("Family", 16),
    ("Adventure", 17),
    ("Action", 18),
    ("History", 19),
    ("Mystery", 20),
    ("Sci-Fi", 21),
    ("Musical", 22),
    ("Thriller", 23),
    ("Film-Noir", 24),
    ("Talk-Show", 25),
    ("Game-Show", 26),
    ("Reality-TV", 27),
    ("Adult", 28),
    ("N/A", GENRE_NOT_APPLICABLE),
];

pub const PROFESSIONS: &[(&str, i64)] = &[
    ("actor", 1),
    ("miscellaneous", 2),
    ("producer", 3),
    ("actress", 4),
    ("soundtrack", 5),
    ("archive_footage", 6),
    ("music_department", 7),
    ("writer", 8),
    ("director", 9),
    ("stunts", 10),
    ("make_up_department", 11),
    ("composer", 12),
    ("assistant_director", 13),
    ("camera_department", 14),
    ("music_artist", 15),
    ("art_department", 16),
    ("editor", 17),
    ("cinematographer", 18),
    ("executive", 19),
    ("visual_effects", 20),
    ("costume_designer", 21),
    ("script_department", 22),
    ("art_director", 23),
    ("editorial_department", 24),
    ("costume_department", 25),
    ("animation_department", 26),
    ("talent_agent", 27),
    ("archive_sound", 28),
    ("production_designer", 29),
    ("special_effects", 30),
    ("manager", 31),
    ("production_manager", 32),
    ("sound_department", 33),
    ("casting_department", 34),
    ("location_management", 35),
    ("casting_director", 36),
    ("set_decorator", 37),
    ("transportation_department", 38),
    ("choreographer", 39),
    ("legal", 40),
    ("accountant", 41),
    ("podcaster", 42),
    ("publicist", 43),
    ("assistant", 44),
    ("production_department", 45),
    ("electrical_department", 46),
];

lazy_static! {
    static ref GENRE_KEYS: HashMap<&'static str, i64> = GENRES.iter().copied().collect();
    static ref PROFESSION_KEYS: HashMap<&'static str, i64> = PROFESSIONS.iter().copied().collect();
}

pub fn genre_key(literal: &str) -> Option<i64> {
    GENRE_KEYS.get(literal).copied()
}

pub fn profession_key(literal: &str) -> Option<i64> {
    PROFESSION_KEYS.get(literal).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_literals_resolve() {
        assert_eq!(genre_key("Documentary"), Some(1));
        assert_eq!(genre_key("Short"), Some(2));
        assert_eq!(genre_key("N/A"), Some(GENRE_NOT_APPLICABLE));
        assert_eq!(profession_key("actor"), Some(1));
        assert_eq!(profession_key("electrical_department"), Some(46));
    }

    #[test]
    fn unknown_literals_are_rejected() {
        assert_eq!(genre_key("documentary"), None);
        assert_eq!(genre_key("Zombies"), None);
        assert_eq!(profession_key("wizard"), None);
    }

    #[test]
    fn keys_are_distinct() {
        use std::collections::HashSet;
        let genre_keys: HashSet<i64> = GENRES.iter().map(|(_, k)| *k).collect();
        assert_eq!(genre_keys.len(), GENRES.len());
        let profession_keys: HashSet<i64> = PROFESSIONS.iter().map(|(_, k)| *k).collect();
        assert_eq!(profession_keys.len(), PROFESSIONS.len());
    }
}
