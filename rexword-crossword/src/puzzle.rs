//! Puzzle records as published by regexcrossword.com.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// A group of puzzles of similar difficulty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Challenge {
    pub id: String,
    /// RFC 3339 timestamp, kept as published.
    pub date: String,
    pub name: String,
    #[serde(rename = "descr")]
    pub description: String,
    pub achievement_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub puzzles: Vec<Puzzle>,
}

/// A regular-expression crossword. Each axis holds one list of patterns per
/// side of the grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Puzzle {
    pub id: String,
    pub player_no: i64,
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub patterns_x: Vec<Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub patterns_y: Vec<Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub patterns_z: Vec<Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub solution_map: Vec<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub characters: Vec<String>,
    pub size: usize,
    pub hexagonal: bool,
    pub mobile: bool,
    pub published: bool,
    pub date_created: UnixTime,
    pub date_updated: UnixTime,
    pub rating_avg: f64,
    pub votes: i64,
    pub solved: UnixTime,
    pub ambiguous: bool,
}

/// Whole seconds since the Unix epoch, encoded as a JSON integer. An unset
/// time is `null`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTime(pub Option<i64>);

impl UnixTime {
    pub fn seconds(&self) -> Option<i64> {
        self.0
    }

    pub fn to_system_time(&self) -> Option<SystemTime> {
        let seconds = self.0?;
        let offset = Duration::from_secs(seconds.unsigned_abs());
        if seconds >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
    }
}

impl Puzzle {
    /// Every pattern of the puzzle, axis by axis.
    pub fn patterns(&self) -> impl Iterator<Item = &str> + '_ {
        [&self.patterns_x, &self.patterns_y, &self.patterns_z]
            .into_iter()
            .flatten()
            .flatten()
            .map(String::as_str)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a JSON array of puzzles.
pub fn load_puzzles(path: impl AsRef<Path>) -> Result<Vec<Puzzle>, Error> {
    let puzzles: Vec<Puzzle> = load_json(path.as_ref())?;
    debug!("loaded {} puzzles from {}", puzzles.len(), path.as_ref().display());
    Ok(puzzles)
}

/// Reads a JSON array of challenges.
pub fn load_challenges(path: impl AsRef<Path>) -> Result<Vec<Challenge>, Error> {
    let challenges: Vec<Challenge> = load_json(path.as_ref())?;
    debug!(
        "loaded {} challenges from {}",
        challenges.len(),
        path.as_ref().display()
    );
    Ok(challenges)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })
}
