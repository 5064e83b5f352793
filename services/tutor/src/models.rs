//! Database Models
//!
//! Rows of the learning database and the aggregates shown to parents.
//! List-valued columns are stored as JSON text.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(sqlx::Type, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonStatus::Pending => write!(f, "pending"),
            LessonStatus::InProgress => write!(f, "in_progress"),
            LessonStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for LessonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "pending" => Ok(LessonStatus::Pending),
            "in_progress" => Ok(LessonStatus::InProgress),
            "completed" => Ok(LessonStatus::Completed),
            other => Err(format!(
                "unknown lesson status '{}' (expected pending, in_progress or completed)",
                other
            )),
        }
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub id: i64,
    pub name: String,
    pub age: i64,
    #[sqlx(json)]
    pub interests: Vec<String>,
    pub learning_style: String,
    pub current_level: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct LearningAnalytics {
    pub preferred_teaching_style: String,
    #[sqlx(json)]
    pub effective_strategies: Vec<String>,
    #[sqlx(json)]
    pub challenging_areas: Vec<String>,
    #[sqlx(json)]
    pub motivation_triggers: Vec<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Accomplishment {
    pub id: i64,
    pub student_name: String,
    pub achievement: String,
    pub skill_category: String,
    pub confidence_level: i64,
    pub date_achieved: NaiveDateTime,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct LearningSession {
    pub id: i64,
    pub student_name: String,
    pub lesson_topic: String,
    pub agent_used: String,
    pub conversation_summary: String,
    pub learning_effectiveness: i64,
    pub notes: String,
    pub session_date: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewLearningSession {
    pub student_name: String,
    pub lesson_topic: String,
    pub agent_used: String,
    pub conversation_summary: String,
    /// How well the session went, 1 to 5.
    pub effectiveness: i64,
    pub notes: String,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct LessonPlan {
    pub id: i64,
    pub student_name: String,
    pub learning_objective: String,
    #[sqlx(json)]
    pub lesson_steps: Vec<String>,
    #[sqlx(json)]
    pub target_skills: Vec<String>,
    pub personalization_notes: String,
    pub status: LessonStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewLessonPlan {
    pub student_name: String,
    pub learning_objective: String,
    pub lesson_steps: Vec<String>,
    pub target_skills: Vec<String>,
    pub personalization_notes: String,
}

/// A partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub age: Option<i64>,
    pub interests: Option<Vec<String>>,
    pub learning_style: Option<String>,
    pub current_level: Option<String>,
    pub preferred_teaching_style: Option<String>,
    pub effective_strategies: Option<Vec<String>>,
    pub challenging_areas: Option<Vec<String>>,
    pub motivation_triggers: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn touches_profile(&self) -> bool {
        self.age.is_some()
            || self.interests.is_some()
            || self.learning_style.is_some()
            || self.current_level.is_some()
    }

    pub fn touches_analytics(&self) -> bool {
        self.preferred_teaching_style.is_some()
            || self.effective_strategies.is_some()
            || self.challenging_areas.is_some()
            || self.motivation_triggers.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_profile() && !self.touches_analytics()
    }
}

/// A profile together with what has been learned about the student.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StudentOverview {
    pub profile: StudentProfile,
    pub analytics: Option<LearningAnalytics>,
    pub recent_accomplishments: Vec<Accomplishment>,
}

impl StudentOverview {
    /// A plain-text description of the student for the teaching personas.
    pub fn teaching_context(&self) -> String {
        let profile = &self.profile;
        let mut lines = vec![
            format!("Name: {}", profile.name),
            format!("Age: {}", profile.age),
            format!("Current level: {}", profile.current_level),
            format!("Learning style: {}", profile.learning_style),
        ];
        if !profile.interests.is_empty() {
            lines.push(format!("Interests: {}", profile.interests.join(", ")));
        }
        if let Some(analytics) = &self.analytics {
            if !analytics.preferred_teaching_style.is_empty() {
                lines.push(format!(
                    "Prefers: {}",
                    analytics.preferred_teaching_style
                ));
            }
            if !analytics.effective_strategies.is_empty() {
                lines.push(format!(
                    "What works: {}",
                    analytics.effective_strategies.join(", ")
                ));
            }
            if !analytics.challenging_areas.is_empty() {
                lines.push(format!(
                    "Finds hard: {}",
                    analytics.challenging_areas.join(", ")
                ));
            }
            if !analytics.motivation_triggers.is_empty() {
                lines.push(format!(
                    "Motivated by: {}",
                    analytics.motivation_triggers.join(", ")
                ));
            }
        }
        if !self.recent_accomplishments.is_empty() {
            let recent: Vec<&str> = self
                .recent_accomplishments
                .iter()
                .map(|a| a.achievement.as_str())
                .collect();
            lines.push(format!("Recently achieved: {}", recent.join("; ")));
        }
        lines.join("\n")
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct SkillProgress {
    pub category: String,
    pub achievements_count: i64,
    /// Mean confidence rounded to one decimal place.
    pub average_confidence: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ParentDashboard {
    pub student_name: String,
    pub overview: StudentOverview,
    pub recent_sessions: Vec<LearningSession>,
    pub skill_progress: Vec<SkillProgress>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_lesson_status_serialization() {
        assert_eq!(
            serde_json::to_string(&LessonStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let status: LessonStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, LessonStatus::Completed);
    }

    #[test]
    fn test_lesson_status_display_and_parse() {
        for status in [
            LessonStatus::Pending,
            LessonStatus::InProgress,
            LessonStatus::Completed,
        ] {
            assert_eq!(status.to_string().parse::<LessonStatus>().unwrap(), status);
        }
        assert_eq!(
            "In Progress".parse::<LessonStatus>().unwrap(),
            LessonStatus::InProgress
        );
        assert!("done".parse::<LessonStatus>().is_err());
    }

    #[test]
    fn test_profile_update_flags() {
        let empty = ProfileUpdate::default();
        assert!(empty.is_empty());

        let profile_only = ProfileUpdate {
            age: Some(5),
            ..Default::default()
        };
        assert!(profile_only.touches_profile());
        assert!(!profile_only.touches_analytics());

        let analytics_only = ProfileUpdate {
            challenging_areas: Some(vec!["b and d".to_string()]),
            ..Default::default()
        };
        assert!(!analytics_only.touches_profile());
        assert!(analytics_only.touches_analytics());
    }

    #[test]
    fn test_teaching_context() {
        let overview = StudentOverview {
            profile: StudentProfile {
                id: 1,
                name: "Emma".to_string(),
                age: 4,
                interests: vec!["animals".to_string(), "colors".to_string()],
                learning_style: "visual".to_string(),
                current_level: "beginner".to_string(),
                created_at: timestamp(),
                updated_at: timestamp(),
            },
            analytics: Some(LearningAnalytics {
                preferred_teaching_style: "songs".to_string(),
                effective_strategies: vec![],
                challenging_areas: vec!["b and d".to_string()],
                motivation_triggers: vec![],
                updated_at: timestamp(),
            }),
            recent_accomplishments: vec![Accomplishment {
                id: 1,
                student_name: "Emma".to_string(),
                achievement: "Said the B sound".to_string(),
                skill_category: "phonics".to_string(),
                confidence_level: 4,
                date_achieved: timestamp(),
            }],
        };

        let context = overview.teaching_context();
        assert!(context.contains("Name: Emma"));
        assert!(context.contains("Interests: animals, colors"));
        assert!(context.contains("Prefers: songs"));
        assert!(context.contains("Finds hard: b and d"));
        assert!(!context.contains("What works"));
        assert!(context.contains("Recently achieved: Said the B sound"));
    }
}
