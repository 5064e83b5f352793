use crate::content;
use anyhow::{Result, ensure};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A child's reading progress as reported to the teaching agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReadingProgress {
    pub child_name: String,
    pub level: String,
    pub words_learned: u32,
    pub books_completed: u32,
    pub next_milestone: String,
}

impl ReadingProgress {
    /// Progress for a child the system has never seen before.
    pub fn new_student(child_name: &str) -> Self {
        Self {
            child_name: child_name.to_string(),
            level: "New Student".to_string(),
            words_learned: 0,
            books_completed: 0,
            next_milestone: "Welcome! Let's start your reading journey!".to_string(),
        }
    }
}

/// Confidence and effectiveness ratings are on a 1 to 5 scale.
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

pub fn check_rating(field: &str, value: i64) -> Result<()> {
    ensure!(
        RATING_RANGE.contains(&value),
        "{field} must be between 1 and 5, got {value}"
    );
    Ok(())
}

/// The student data the teaching tools read and write.
///
/// Implemented by the learning database in the tutor service and by
/// `RosterRecords` for runs without storage.
#[async_trait]
pub trait StudentRecords: Send + Sync {
    async fn reading_progress(&self, child_name: &str) -> Result<ReadingProgress>;

    async fn record_accomplishment(
        &self,
        child_name: &str,
        achievement: &str,
        skill_category: &str,
        confidence_level: i64,
    ) -> Result<()>;
}

/// `StudentRecords` backed only by the built-in demo roster.
///
/// Accomplishments are logged and otherwise discarded.
pub struct RosterRecords;

#[async_trait]
impl StudentRecords for RosterRecords {
    async fn reading_progress(&self, child_name: &str) -> Result<ReadingProgress> {
        Ok(roster_progress(child_name).unwrap_or_else(|| ReadingProgress::new_student(child_name)))
    }

    async fn record_accomplishment(
        &self,
        child_name: &str,
        achievement: &str,
        skill_category: &str,
        confidence_level: i64,
    ) -> Result<()> {
        check_rating("confidence_level", confidence_level)?;
        tracing::info!(
            child_name,
            achievement,
            skill_category,
            confidence_level,
            "Accomplishment noted (not persisted)"
        );
        Ok(())
    }
}

/// Progress for a child on the demo roster.
pub fn roster_progress(child_name: &str) -> Option<ReadingProgress> {
    content::roster_profile(child_name).map(|profile| ReadingProgress {
        child_name: profile.name,
        level: profile.level,
        words_learned: profile.progress.words_learned,
        books_completed: profile.progress.books_completed,
        next_milestone: "Great job! Keep reading to reach the next level!".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roster_records_known_child() {
        let progress = RosterRecords.reading_progress("Sophia").await.unwrap();
        assert_eq!(progress.level, "Developing Reader");
        assert_eq!(progress.words_learned, 120);
        assert_eq!(progress.books_completed, 22);
    }

    #[tokio::test]
    async fn test_roster_records_unknown_child() {
        let progress = RosterRecords.reading_progress("Noah").await.unwrap();
        assert_eq!(progress, ReadingProgress::new_student("Noah"));
        assert_eq!(progress.level, "New Student");
    }

    #[tokio::test]
    async fn test_roster_records_rejects_bad_confidence() {
        let err = RosterRecords
            .record_accomplishment("Emma", "Read 'cat'", "phonics", 9)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("between 1 and 5"));
        assert!(
            RosterRecords
                .record_accomplishment("Emma", "Read 'cat'", "phonics", 5)
                .await
                .is_ok()
        );
    }
}
