use std::io::Write;
use std::time::{Duration, UNIX_EPOCH};

use rexword_crossword::{Error, Puzzle, UnixTime, load_challenges, load_puzzles};
use rstest::rstest;
use tempfile::NamedTempFile;

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write fixture");
    file
}

const PUZZLES: &str = r#"[
  {
    "id": "0fa8a2bb-bd1d-4a6f-9ab1-3b7c2bc00b1e",
    "playerNo": 42,
    "name": "Backwards",
    "patternsX": [["[NOTAD]*", "WEL|BAL|EAR"]],
    "patternsY": [["UB|IE|AW", "[TUBE]*", "[BORF]."]],
    "patternsZ": null,
    "solutionMap": null,
    "characters": null,
    "size": 2,
    "hexagonal": false,
    "mobile": true,
    "published": true,
    "dateCreated": 1388923200,
    "dateUpdated": null,
    "ratingAvg": 3.5,
    "votes": 12,
    "solved": null,
    "ambiguous": false
  }
]"#;

#[test]
fn loads_puzzles_with_nulls() {
    let file = json_file(PUZZLES);
    let puzzles = load_puzzles(file.path()).expect("loads");
    assert_eq!(puzzles.len(), 1);
    let puzzle = &puzzles[0];
    assert_eq!(puzzle.player_no, 42);
    assert_eq!(puzzle.name, "Backwards");
    assert!(puzzle.patterns_z.is_empty());
    assert!(puzzle.solution_map.is_empty());
    assert_eq!(puzzle.date_created, UnixTime(Some(1_388_923_200)));
    assert_eq!(puzzle.date_updated, UnixTime(None));
    assert_eq!(
        puzzle.patterns().collect::<Vec<_>>(),
        vec!["[NOTAD]*", "WEL|BAL|EAR", "UB|IE|AW", "[TUBE]*", "[BORF]."]
    );
}

#[test]
fn loads_challenges() {
    let file = json_file(&format!(
        r#"[{{"id": "beginner", "date": "2014-01-01T00:00:00Z", "name": "Beginner",
             "descr": "Start here", "achievement_id": "beginner", "puzzles": {}}}]"#,
        PUZZLES
    ));
    let challenges = load_challenges(file.path()).expect("loads");
    assert_eq!(challenges.len(), 1);
    assert_eq!(challenges[0].description, "Start here");
    assert_eq!(challenges[0].puzzles.len(), 1);
    assert_eq!(challenges[0].puzzles[0].votes, 12);
}

#[test]
fn missing_fields_take_defaults() {
    let file = json_file(r#"[{"id": "bare"}]"#);
    let puzzles = load_puzzles(file.path()).expect("loads");
    assert_eq!(puzzles[0].id, "bare");
    assert_eq!(puzzles[0].size, 0);
    assert_eq!(puzzles[0].patterns().count(), 0);
}

#[test]
fn load_errors_name_the_file() {
    let file = json_file("{ not json");
    let err = load_puzzles(file.path()).expect_err("malformed");
    assert!(matches!(err, Error::Json { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));

    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_puzzles(dir.path().join("absent.json")).expect_err("missing");
    assert!(matches!(err, Error::Io { .. }));
}

#[rstest]
#[case(UnixTime(None), "null")]
#[case(UnixTime(Some(1_700_000_000)), "1700000000")]
fn unix_time_is_an_integer_or_null(#[case] time: UnixTime, #[case] json: &str) {
    assert_eq!(serde_json::to_string(&time).expect("serializes"), json);
    assert_eq!(serde_json::from_str::<UnixTime>(json).expect("deserializes"), time);
}

#[test]
fn unix_time_converts_to_system_time() {
    assert_eq!(UnixTime(None).to_system_time(), None);
    assert_eq!(
        UnixTime(Some(60)).to_system_time(),
        Some(UNIX_EPOCH + Duration::from_secs(60))
    );
}

#[test]
fn puzzle_serializes_camel_case() {
    let puzzle = Puzzle {
        rating_avg: 4.0,
        ..Puzzle::default()
    };
    let json = serde_json::to_value(&puzzle).expect("serializes");
    assert_eq!(json["ratingAvg"], 4.0);
    assert!(json["dateCreated"].is_null());
}
