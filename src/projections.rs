use std::collections::BTreeMap;

use tracing::debug;

use crate::config::SegmentationConfig;
use crate::models::{EmotionCounts, Level, RawEvent, ScoredEntry, Session};


/// Projects sessions and levels from a child's raw play events
/// Session = run of events with no gap above the configured threshold
pub struct SessionProjector {
    config: SegmentationConfig,
}

impl SessionProjector {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Split a flat multi-child list by username, then project each child.
    pub fn project_by_child(&self, events: Vec<RawEvent>) -> BTreeMap<String, Vec<Session>> {
        let mut by_child: BTreeMap<String, Vec<RawEvent>> = BTreeMap::new();
        for event in events {
            by_child.entry(event.username.clone()).or_default().push(event);
        }

        by_child
            .into_iter()
            .map(|(child, events)| {
                let sessions = self.project(events);
                (child, sessions)
            })
            .collect()
    }

    /// Sessions for one child, most recent first.
    pub fn project(&self, mut events: Vec<RawEvent>) -> Vec<Session> {
        if events.is_empty() {
            return Vec::new();
        }

        // Stable: ties keep their delivery order
        events.sort_by_key(|e| e.timestamp);

        let runs = self.split_sessions(events);
        let mut sessions: Vec<Session> = runs
            .into_iter()
            .enumerate()
            .map(|(idx, run)| self.build_session(idx, run))
            .collect();

        sessions.sort_by(|a, b| b.end_time.cmp(&a.end_time));

        debug!(
            sessions = sessions.len(),
            levels = sessions.iter().map(|s| s.levels.len()).sum::<usize>(),
            "projected sessions"
        );

        sessions
    }

    fn split_sessions(&self, events: Vec<RawEvent>) -> Vec<Vec<RawEvent>> {
        let mut runs = Vec::new();
        let mut current: Vec<RawEvent> = Vec::new();

        for event in events {
            if let Some(previous) = current.last() {
                let gap = (event.timestamp - previous.timestamp).num_milliseconds();
                if gap > self.config.session_gap_ms {
                    runs.push(std::mem::take(&mut current));
                }
            }
            current.push(event);
        }

        if !current.is_empty() {
            runs.push(current);
        }

        runs
    }

    /// `entries` is a non-empty, time-ordered run.
    fn build_session(&self, idx: usize, entries: Vec<RawEvent>) -> Session {
        let is_word_search = self.config.is_word_search(&entries[0].game_name);
        let value = |event: &RawEvent| progress_value(event, is_word_search);

        let mut level_runs: Vec<&[RawEvent]> = Vec::new();
        let mut level_start = 0;
        let mut last_non_zero = value(&entries[0]);
        let mut total_score = last_non_zero;

        for i in 1..entries.len() {
            let is_reset = is_word_search && self.is_level_reset(&entries[i - 1], &entries[i]);

            if is_reset {
                level_runs.push(&entries[level_start..i]);
                level_start = i;
                total_score += value(&entries[i]);
            }

            let current = value(&entries[i]);
            if current != 0.0 {
                last_non_zero = current;
                if !is_reset {
                    total_score = last_non_zero;
                }
            }
        }
        level_runs.push(&entries[level_start..]);

        let levels: Vec<Level> = level_runs
            .iter()
            .enumerate()
            .map(|(level_idx, run)| {
                let (scored, level_score) = carry_forward(run, value);
                Level {
                    id: format!("level-{}", level_idx + 1),
                    name: format!("Level {}", level_idx + 1),
                    entries: scored,
                    words_found: is_word_search.then_some(level_score),
                    total_score: level_score,
                    completed: level_score > 0.0,
                    dominant_emotion: dominant_emotion(run),
                }
            })
            .collect();

        let (scored, _) = carry_forward(&entries, value);
        let dominant = dominant_emotion(&entries);
        let start_time = entries[0].timestamp;
        let end_time = entries[entries.len() - 1].timestamp;

        Session {
            id: format!("session-{}", idx + 1),
            name: format!("Session #{}", idx + 1),
            entries: scored,
            levels,
            total_score,
            dominant_emotion: dominant,
            start_time,
            end_time,
        }
    }

    /// A new word-search level starts on an exact full-level -> 0 transition.
    /// Both readings must be present.
    fn is_level_reset(&self, previous: &RawEvent, current: &RawEvent) -> bool {
        match (previous.words_found, current.words_found) {
            (Some(prev), Some(cur)) => prev == self.config.words_per_level && cur == 0.0,
            _ => false,
        }
    }
}

/// Progress reading for an event: words found for the word search game,
/// score otherwise. Missing values read as 0.
fn progress_value(event: &RawEvent, is_word_search: bool) -> f64 {
    let reading = if is_word_search {
        event.words_found
    } else {
        event.score
    };
    reading.unwrap_or(0.0)
}

/// Attach the last non-zero reading to each event. Returns the scored
/// events and the final carried value.
fn carry_forward<F>(events: &[RawEvent], value: F) -> (Vec<ScoredEntry>, f64)
where
    F: Fn(&RawEvent) -> f64,
{
    let mut last_non_zero = events.first().map(|e| value(e)).unwrap_or(0.0);

    let scored: Vec<ScoredEntry> = events
        .iter()
        .map(|event| {
            let reading = value(event);
            if reading != 0.0 {
                last_non_zero = reading;
            }
            ScoredEntry {
                event: event.clone(),
                score: last_non_zero,
            }
        })
        .collect();

    (scored, last_non_zero)
}

/// Most frequent emotion over `events`, capitalised for display.
pub fn dominant_emotion(events: &[RawEvent]) -> String {
    EmotionCounts::tally(events.iter().map(RawEvent::emotion))
        .dominant()
        .label()
}

/// Look up a session by `session-N` id or bare number.
pub fn find_session<'a>(sessions: &'a [Session], id: &str) -> Option<&'a Session> {
    let wanted = if id.starts_with("session-") {
        id.to_string()
    } else {
        format!("session-{}", id)
    };
    sessions.iter().find(|s| s.id == wanted)
}
