//! Training performance log and dashboard summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default)]
    pub weight_kg: f64,
    pub performed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PerformanceEntry {
    /// Total load moved: sets x reps x weight
    pub fn volume_kg(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.reps) * self.weight_kg
    }

    /// Epley one-rep-max estimate, `None` for bodyweight or zero-rep entries.
    pub fn estimated_one_rep_max(&self) -> Option<f64> {
        if self.weight_kg <= 0.0 || self.reps == 0 {
            return None;
        }
        if self.reps == 1 {
            return Some(self.weight_kg);
        }
        Some(self.weight_kg * (1.0 + f64::from(self.reps) / 30.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub exercise: String,
    pub weight_kg: f64,
    pub reps: u32,
    #[serde(default)]
    pub achieved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub total_volume_kg: f64,
    #[serde(default)]
    pub personal_records: Vec<PersonalRecord>,
}

impl PerformanceSummary {
    pub fn best_for(&self, exercise: &str) -> Option<&PersonalRecord> {
        self.personal_records
            .iter()
            .filter(|r| r.exercise.eq_ignore_ascii_case(exercise))
            .max_by(|a, b| a.weight_kg.total_cmp(&b.weight_kg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sets: u32, reps: u32, weight_kg: f64) -> PerformanceEntry {
        PerformanceEntry {
            exercise: "Squat".to_string(),
            sets,
            reps,
            weight_kg,
            performed_at: Utc::now(),
            notes: None,
        }
    }

    #[test]
    fn test_volume() {
        assert_eq!(entry(5, 5, 100.0).volume_kg(), 2500.0);
        assert_eq!(entry(3, 10, 0.0).volume_kg(), 0.0);
    }

    #[test]
    fn test_one_rep_max() {
        assert_eq!(entry(1, 1, 140.0).estimated_one_rep_max(), Some(140.0));
        let estimate = entry(1, 10, 90.0).estimated_one_rep_max().unwrap();
        assert!((estimate - 120.0).abs() < 1e-9);
        assert_eq!(entry(3, 12, 0.0).estimated_one_rep_max(), None);
        assert_eq!(entry(3, 0, 50.0).estimated_one_rep_max(), None);
    }

    #[test]
    fn test_best_for_is_case_insensitive() {
        let summary: PerformanceSummary = serde_json::from_str(
            r#"{"total_sessions": 12, "personal_records": [
                {"exercise": "Squat", "weight_kg": 120.0, "reps": 1},
                {"exercise": "squat", "weight_kg": 125.5, "reps": 1},
                {"exercise": "Bench", "weight_kg": 90.0, "reps": 3}
            ]}"#,
        )
        .unwrap();
        assert_eq!(summary.best_for("SQUAT").map(|r| r.weight_kg), Some(125.5));
        assert!(summary.best_for("Deadlift").is_none());
        assert_eq!(summary.total_volume_kg, 0.0);
    }
}
