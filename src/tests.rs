use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

const ALICE_T0: &str = r#"{"username":"alice","gameName":"Boggle game","timestamp":"2025-03-01T10:00:00Z","wordsFound":0,"score":null,"emotion":"happy"}"#;
const ALICE_T30: &str = r#"{"username":"alice","gameName":"Boggle game","timestamp":"2025-03-01T10:00:30Z","wordsFound":2,"emotion":"sad","age":8}"#;
const ALICE_T270: &str = r#"{"username":"alice","gameName":"Boggle game","timestamp":"2025-03-01T10:04:30Z","wordsFound":0}"#;
const BOB_T0: &str = r#"{"username":"bob","gameName":"Memory game","timestamp":"2025-03-01T09:00:00.500Z","score":3,"emotion":"angry"}"#;

#[test]
fn test_read_event_lines() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{}", ALICE_T0).unwrap();
    writeln!(temp_file).unwrap(); // Empty line
    writeln!(temp_file, "{}", ALICE_T30).unwrap();

    let events = event_log::read_events(temp_file.path()).unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].words_found, Some(0.0));
    assert_eq!(events[0].score, None);
    assert_eq!(events[1].emotion.as_deref(), Some("sad"));
}

#[test]
fn test_read_event_array() {
    // Body of the game data endpoint, newest first
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "  [{},\n{},\n{}]", ALICE_T270, BOB_T0, ALICE_T0).unwrap();

    let events = event_log::read_events(temp_file.path()).unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[1].username, "bob");
    assert_eq!(events[2].emotion, Some("happy".to_string()));
    assert_eq!(events[0].emotion, None);
}

#[test]
fn test_malformed_line_skipped() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{}", ALICE_T0).unwrap();
    writeln!(temp_file, "{{\"username\": \"alice\"").unwrap();
    writeln!(temp_file, "{}", BOB_T0).unwrap();

    let events = event_log::read_events(temp_file.path()).unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn test_malformed_array_is_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[{}, {{}}]", ALICE_T0).unwrap();

    let result = event_log::read_events(temp_file.path());
    assert!(matches!(result, Err(ReportError::Json(_))));
}

#[test]
fn test_missing_file_is_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().with_extension("missing");

    let result = event_log::read_events(&path);
    assert!(matches!(result, Err(ReportError::Io { .. })));
}

#[test]
fn test_empty_file() {
    let temp_file = NamedTempFile::new().unwrap();
    let events = event_log::read_events(temp_file.path()).unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_project_file_end_to_end() {
    let mut temp_file = NamedTempFile::new().unwrap();
    for line in [ALICE_T270, ALICE_T0, BOB_T0, ALICE_T30] {
        writeln!(temp_file, "{}", line).unwrap();
    }

    let projector = SessionProjector::new(SegmentationConfig::default());
    let by_child = project_file(&projector, temp_file.path()).unwrap();

    let alice = &by_child["alice"];
    assert_eq!(alice.len(), 2);
    assert_eq!(alice[0].entries.len(), 1);
    assert!(!alice[0].levels[0].completed);
    assert_eq!(alice[1].total_score, 2.0);
    assert_eq!(alice[1].levels[0].total_score, 2.0);

    let rows = summary_rows(&select_child(by_child, Some("alice")).unwrap());
    assert_eq!(
        rows,
        "alice\n  Session #2  Score: 0  Emotion: Neutral\n  Session #1  Score: 2  Emotion: Happy\n"
    );
}

#[test]
fn test_select_unknown_child() {
    let result = select_child(BTreeMap::new(), Some("carol"));
    assert!(matches!(result, Err(ReportError::UnknownChild(name)) if name == "carol"));
}

#[test]
fn test_config_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "session_gap_ms = 300000").unwrap();

    let config = load_config(Some(temp_file.path())).unwrap();
    assert_eq!(config.session_gap_ms, 300_000);

    // Wider gap folds alice's events into one session
    let events = vec![ALICE_T0, ALICE_T30, ALICE_T270]
        .into_iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let sessions = SessionProjector::new(config).project(events);
    assert_eq!(sessions.len(), 1);
}
