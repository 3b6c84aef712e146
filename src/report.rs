//! Per-session report for the emotion tracking charts.
//!
//! A pure projection of one [`Session`]: nothing here mutates the session
//! or depends on anything but its contents.

use chrono::{DateTime, Utc};

use crate::models::{EmotionCounts, EmotionMark, LevelSummary, Session, SessionReport};

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_SECOND: i64 = 1_000;

pub fn build_report(child: &str, session: &Session) -> SessionReport {
    let events = || session.entries.iter().map(|entry| &entry.event);

    let emotion_counts = EmotionCounts::tally(events().map(|e| e.emotion()));
    let score = session.total_score;

    let timestamps = events()
        .map(|e| EmotionMark {
            time: e.timestamp,
            emotion: e.emotion(),
        })
        .collect();

    let levels = session
        .levels
        .iter()
        .map(|level| LevelSummary {
            name: level.name.clone(),
            completed: level.completed,
            words_found: level.words_found,
            total_score: level.total_score,
        })
        .collect();

    SessionReport {
        student_name: child.to_string(),
        session_number: session.name.clone(),
        session_date: session_date(session.start_time),
        session_duration: format_duration(session.start_time, session.end_time),
        dominant_emotion: session.dominant_emotion.clone(),
        score,
        engagement_score: engagement_score(emotion_counts.distinct(), score),
        emotion_counts,
        timestamps,
        levels,
    }
}

/// `M/D/YYYY`, no zero padding.
pub fn session_date(start: DateTime<Utc>) -> String {
    start.format("%-m/%-d/%Y").to_string()
}

/// "M min S sec", dropping whichever component is zero.
/// A zero-length session reads "0 sec".
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let duration_ms = (end - start).num_milliseconds();
    let minutes = duration_ms.div_euclid(MS_PER_MINUTE);
    let seconds = duration_ms.rem_euclid(MS_PER_MINUTE) / MS_PER_SECOND;

    if minutes == 0 {
        format!("{} sec", seconds)
    } else if seconds == 0 {
        format!("{} min", minutes)
    } else {
        format!("{} min {} sec", minutes, seconds)
    }
}

/// One decimal place, halves rounded up, clamped to [1, 10].
pub fn engagement_score(distinct_emotions: usize, score: f64) -> f64 {
    let raw = distinct_emotions as f64 * 1.5 + score * 0.5;
    let rounded = (raw * 10.0 + 0.5).floor() / 10.0;
    if rounded.is_nan() {
        return 1.0;
    }
    rounded.clamp(1.0, 10.0)
}
