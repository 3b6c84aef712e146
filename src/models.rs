use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// One gameplay tick as delivered by the game data endpoint.
/// Extra fields (age, gender, colour sequences, ids) are ignored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub username: String,
    pub game_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub words_found: Option<f64>,
    #[serde(default)]
    pub emotion: Option<String>,
}

impl RawEvent {
    pub fn emotion(&self) -> Emotion {
        Emotion::from_tag(self.emotion.as_deref())
    }
}

/// Fixed emotion vocabulary. Declaration order is the tie-break order.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Disgust,
    Neutral,
    Fear,
    Angry,
    Surprised,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Disgust,
        Emotion::Neutral,
        Emotion::Fear,
        Emotion::Angry,
        Emotion::Surprised,
    ];

    /// Case-insensitive. Unrecognised (including padded) or missing tags
    /// fold into `Neutral`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::to_lowercase).as_deref() {
            Some("happy") => Emotion::Happy,
            Some("sad") => Emotion::Sad,
            Some("disgust") => Emotion::Disgust,
            Some("fear") => Emotion::Fear,
            Some("angry") => Emotion::Angry,
            Some("surprised") => Emotion::Surprised,
            _ => Emotion::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Disgust => "disgust",
            Emotion::Neutral => "neutral",
            Emotion::Fear => "fear",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
        }
    }

    /// Display form, first letter uppercase.
    pub fn label(&self) -> String {
        let tag = self.as_str();
        let mut chars = tag.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Per-emotion tally. Field order matches the vocabulary so the
/// serialized map keeps it too.
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmotionCounts {
    pub happy: usize,
    pub sad: usize,
    pub disgust: usize,
    pub neutral: usize,
    pub fear: usize,
    pub angry: usize,
    pub surprised: usize,
}

impl EmotionCounts {
    pub fn tally<I>(emotions: I) -> Self
    where
        I: IntoIterator<Item = Emotion>,
    {
        let mut counts = Self::default();
        for emotion in emotions {
            *counts.slot(emotion) += 1;
        }
        counts
    }

    pub fn get(&self, emotion: Emotion) -> usize {
        self.as_array()[emotion.index()]
    }

    /// Number of emotions seen at least once.
    pub fn distinct(&self) -> usize {
        self.as_array().iter().filter(|c| **c > 0).count()
    }

    /// Most frequent emotion; first in vocabulary order wins a tie.
    /// An empty tally resolves to `Neutral`.
    pub fn dominant(&self) -> Emotion {
        let mut best = Emotion::Neutral;
        let mut best_count = 0;
        for emotion in Emotion::ALL {
            let count = self.get(emotion);
            if count > best_count {
                best_count = count;
                best = emotion;
            }
        }
        best
    }

    fn as_array(&self) -> [usize; 7] {
        [
            self.happy,
            self.sad,
            self.disgust,
            self.neutral,
            self.fear,
            self.angry,
            self.surprised,
        ]
    }

    fn slot(&mut self, emotion: Emotion) -> &mut usize {
        match emotion {
            Emotion::Happy => &mut self.happy,
            Emotion::Sad => &mut self.sad,
            Emotion::Disgust => &mut self.disgust,
            Emotion::Neutral => &mut self.neutral,
            Emotion::Fear => &mut self.fear,
            Emotion::Angry => &mut self.angry,
            Emotion::Surprised => &mut self.surprised,
        }
    }
}

/// A raw event with its carried-forward display score.
/// Serializes as the event's own fields, `score` replaced by the carried value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub event: RawEvent,
    pub score: f64,
}

impl Serialize for ScoredEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Flat<'a> {
            username: &'a str,
            game_name: &'a str,
            timestamp: &'a DateTime<Utc>,
            #[serde(serialize_with = "whole_number")]
            score: f64,
            #[serde(serialize_with = "optional_whole_number")]
            words_found: Option<f64>,
            emotion: Option<&'a str>,
        }

        Flat {
            username: &self.event.username,
            game_name: &self.event.game_name,
            timestamp: &self.event.timestamp,
            score: self.score,
            words_found: self.event.words_found,
            emotion: self.event.emotion.as_deref(),
        }
        .serialize(serializer)
    }
}

/// Sub-run of a session bounded by level resets.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: String,
    pub name: String,
    pub entries: Vec<ScoredEntry>,
    #[serde(serialize_with = "optional_whole_number")]
    pub words_found: Option<f64>,
    #[serde(serialize_with = "whole_number")]
    pub total_score: f64,
    pub completed: bool,
    pub dominant_emotion: String,
}

/// Session projection (derived from events)
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub entries: Vec<ScoredEntry>,
    pub levels: Vec<Level>,
    #[serde(serialize_with = "whole_number")]
    pub total_score: f64,
    pub dominant_emotion: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One point on the emotion timeline.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EmotionMark {
    pub time: DateTime<Utc>,
    pub emotion: Emotion,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    pub name: String,
    pub completed: bool,
    #[serde(serialize_with = "optional_whole_number")]
    pub words_found: Option<f64>,
    #[serde(serialize_with = "whole_number")]
    pub total_score: f64,
}

/// Flattened per-session report handed to the charting layer.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub student_name: String,
    pub session_number: String,
    pub session_date: String,
    pub session_duration: String,
    pub dominant_emotion: String,
    #[serde(serialize_with = "whole_number")]
    pub score: f64,
    #[serde(serialize_with = "out_of_ten")]
    pub engagement_score: f64,
    pub emotion_counts: EmotionCounts,
    pub timestamps: Vec<EmotionMark>,
    pub levels: Vec<LevelSummary>,
}

fn out_of_ten<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{}/10", value))
}

/// Integral values go out as JSON integers (`2`, not `2.0`).
fn whole_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn optional_whole_number<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => whole_number(v, serializer),
        None => serializer.serialize_none(),
    }
}
