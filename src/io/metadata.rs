//! Track tag extraction

use serde::{Deserialize, Serialize};
use symphonia::core::meta::{StandardTagKey, Tag};

/// Placeholder for a missing artist tag
pub const NO_ARTIST: &str = "<no artist>";
/// Placeholder for a missing title tag
pub const NO_TITLE: &str = "<no title>";
/// Placeholder for a missing album tag
pub const NO_ALBUM: &str = "<no album>";
/// Placeholder for a missing genre tag
pub const NO_GENRE: &str = "<no genre>";

/// Descriptive tags of a track, with placeholders for absent ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    /// Artist name
    pub artist: String,
    /// Track title
    pub title: String,
    /// Album name
    pub album: String,
    /// Track number, without the "/total" suffix; empty when absent
    pub track_number: String,
    /// Genre
    pub genre: String,
}

impl Default for TrackTags {
    fn default() -> Self {
        Self {
            artist: NO_ARTIST.to_string(),
            title: NO_TITLE.to_string(),
            album: NO_ALBUM.to_string(),
            track_number: String::new(),
            genre: NO_GENRE.to_string(),
        }
    }
}

impl TrackTags {
    /// Build tags from metadata tags, earlier entries taking precedence
    ///
    /// A tag matches either by its standard key or, for formats symphonia
    /// does not map, by its raw key compared case-insensitively.
    pub fn from_tags(tags: &[Tag]) -> Self {
        let defaults = Self::default();

        let track_number = lookup(tags, StandardTagKey::TrackNumber, "track")
            .map(|n| match n.find('/') {
                Some(slash) => n[..slash].to_string(),
                None => n,
            })
            .unwrap_or(defaults.track_number);

        Self {
            artist: lookup(tags, StandardTagKey::Artist, "artist").unwrap_or(defaults.artist),
            title: lookup(tags, StandardTagKey::TrackTitle, "title").unwrap_or(defaults.title),
            album: lookup(tags, StandardTagKey::Album, "album").unwrap_or(defaults.album),
            track_number,
            genre: lookup(tags, StandardTagKey::Genre, "genre").unwrap_or(defaults.genre),
        }
    }
}

// RIFF INFO strings keep their NUL terminator and padding
fn lookup(tags: &[Tag], std_key: StandardTagKey, raw_key: &str) -> Option<String> {
    tags.iter()
        .find(|tag| tag.std_key == Some(std_key) || tag.key.eq_ignore_ascii_case(raw_key))
        .map(|tag| tag.value.to_string().trim_end_matches('\0').to_string())
}
