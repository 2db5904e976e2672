//! Articles and workout programs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Average reading speed used for the "N min read" label
const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Article {
    pub fn reading_minutes(&self) -> usize {
        let words = self.body.split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
}

impl Exercise {
    /// "4 x 8", "3 x 45s" or just the name's prescription when unspecified
    pub fn prescription(&self) -> String {
        match (self.sets, self.reps, self.duration_seconds) {
            (Some(sets), Some(reps), _) => format!("{} x {}", sets, reps),
            (Some(sets), None, Some(secs)) => format!("{} x {}s", sets, secs),
            (None, None, Some(secs)) => format!("{}s", secs),
            _ => "as prescribed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}
