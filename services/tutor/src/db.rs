//! Data Access Layer
//!
//! All reads and writes of the local SQLite learning database. Each operation
//! stands on its own; nothing spans tables in a transaction.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use preschool_core::progress::{ReadingProgress, StudentRecords, check_rating, roster_progress};
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use tracing::{debug, info};

use crate::models::{
    Accomplishment, LearningAnalytics, LearningSession, LessonPlan, LessonStatus,
    NewLearningSession, NewLessonPlan, ParentDashboard, ProfileUpdate, SkillProgress,
    StudentOverview, StudentProfile,
};

const DEFAULT_AGE: i64 = 4;
const DEFAULT_INTERESTS: [&str; 2] = ["learning", "stories"];
const DEFAULT_LEARNING_STYLE: &str = "visual";
const DEFAULT_LEVEL: &str = "beginner";

const RECENT_ACCOMPLISHMENTS: i64 = 5;
const RECENT_SESSIONS: i64 = 10;

const PROFILE_COLUMNS: &str =
    "id, name, age, interests, learning_style, current_level, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, student_name, lesson_topic, agent_used, conversation_summary, learning_effectiveness, notes, session_date";
const PLAN_COLUMNS: &str = "id, student_name, learning_objective, lesson_steps, target_skills, personalization_notes, status, created_at";

/// A wrapper around the `SqlitePool` to provide a clear data access interface.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Creates a new `Db` instance.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL '{}'", database_url))?
            .create_if_missing(true);

        // Every connection to an in-memory database is a separate database.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };
        Ok(Self::new(pool))
    }

    /// Runs all pending `sqlx` migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Checks that the database answers queries.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts the default profile for `name` unless one exists.
    async fn ensure_profile(&self, name: &str) -> Result<()> {
        let interests = serde_json::to_string(&DEFAULT_INTERESTS)?;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO student_profiles (name, age, interests, learning_style, current_level)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(DEFAULT_AGE)
        .bind(interests)
        .bind(DEFAULT_LEARNING_STYLE)
        .bind(DEFAULT_LEVEL)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            info!(student = name, "Created default student profile");
        }
        Ok(())
    }

    async fn find_profile(&self, name: &str) -> Result<Option<StudentProfile>> {
        let profile = sqlx::query_as::<_, StudentProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM student_profiles WHERE name = ?"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Returns the student's profile, latest analytics and most recent
    /// accomplishments, creating a default profile for new students.
    pub async fn get_student_profile(&self, name: &str) -> Result<StudentOverview> {
        self.ensure_profile(name).await?;
        let profile = self
            .find_profile(name)
            .await?
            .with_context(|| format!("Profile for '{}' disappeared", name))?;

        let analytics = sqlx::query_as::<_, LearningAnalytics>(
            r#"
            SELECT preferred_teaching_style, effective_strategies, challenging_areas,
                   motivation_triggers, updated_at
            FROM learning_analytics
            WHERE student_name = ?
            ORDER BY updated_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let recent_accomplishments = sqlx::query_as::<_, Accomplishment>(
            r#"
            SELECT id, student_name, achievement, skill_category, confidence_level, date_achieved
            FROM accomplishments
            WHERE student_name = ?
            ORDER BY date_achieved DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(name)
        .bind(RECENT_ACCOMPLISHMENTS)
        .fetch_all(&self.pool)
        .await?;

        Ok(StudentOverview {
            profile,
            analytics,
            recent_accomplishments,
        })
    }

    /// Applies a partial update to the profile and, when analytics fields are
    /// present, to the student's analytics row (inserting one if needed).
    pub async fn update_student_profile(&self, name: &str, update: &ProfileUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        self.ensure_profile(name).await?;

        if update.touches_profile() {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE student_profiles SET ");
            let mut set = query.separated(", ");
            if let Some(age) = update.age {
                set.push("age = ").push_bind_unseparated(age);
            }
            if let Some(interests) = &update.interests {
                set.push("interests = ")
                    .push_bind_unseparated(serde_json::to_string(interests)?);
            }
            if let Some(style) = &update.learning_style {
                set.push("learning_style = ")
                    .push_bind_unseparated(style.clone());
            }
            if let Some(level) = &update.current_level {
                set.push("current_level = ")
                    .push_bind_unseparated(level.clone());
            }
            set.push("updated_at = CURRENT_TIMESTAMP");
            query.push(" WHERE name = ").push_bind(name);
            query.build().execute(&self.pool).await?;
            debug!(student = name, "Updated student profile");
        }

        if update.touches_analytics() {
            let existing: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM learning_analytics WHERE student_name = ? ORDER BY updated_at DESC, id DESC LIMIT 1",
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

            match existing {
                Some(id) => {
                    let mut query: QueryBuilder<Sqlite> =
                        QueryBuilder::new("UPDATE learning_analytics SET ");
                    let mut set = query.separated(", ");
                    if let Some(style) = &update.preferred_teaching_style {
                        set.push("preferred_teaching_style = ")
                            .push_bind_unseparated(style.clone());
                    }
                    for (column, values) in [
                        ("effective_strategies", &update.effective_strategies),
                        ("challenging_areas", &update.challenging_areas),
                        ("motivation_triggers", &update.motivation_triggers),
                    ] {
                        if let Some(values) = values {
                            set.push(format!("{column} = "))
                                .push_bind_unseparated(serde_json::to_string(values)?);
                        }
                    }
                    set.push("updated_at = CURRENT_TIMESTAMP");
                    query.push(" WHERE id = ").push_bind(id);
                    query.build().execute(&self.pool).await?;
                }
                None => {
                    let empty: Vec<String> = Vec::new();
                    sqlx::query(
                        r#"
                        INSERT INTO learning_analytics
                            (student_name, preferred_teaching_style, effective_strategies,
                             challenging_areas, motivation_triggers)
                        VALUES (?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(name)
                    .bind(update.preferred_teaching_style.clone().unwrap_or_default())
                    .bind(serde_json::to_string(
                        update.effective_strategies.as_ref().unwrap_or(&empty),
                    )?)
                    .bind(serde_json::to_string(
                        update.challenging_areas.as_ref().unwrap_or(&empty),
                    )?)
                    .bind(serde_json::to_string(
                        update.motivation_triggers.as_ref().unwrap_or(&empty),
                    )?)
                    .execute(&self.pool)
                    .await?;
                }
            }
            debug!(student = name, "Updated learning analytics");
        }
        Ok(())
    }

    /// Records a finished learning session and returns its id.
    pub async fn add_learning_session(&self, session: &NewLearningSession) -> Result<i64> {
        check_rating("learning_effectiveness", session.effectiveness)?;
        let result = sqlx::query(
            r#"
            INSERT INTO learning_sessions
                (student_name, lesson_topic, agent_used, conversation_summary,
                 learning_effectiveness, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.student_name)
        .bind(&session.lesson_topic)
        .bind(&session.agent_used)
        .bind(&session.conversation_summary)
        .bind(session.effectiveness)
        .bind(&session.notes)
        .execute(&self.pool)
        .await?;
        info!(
            student = %session.student_name,
            topic = %session.lesson_topic,
            agent = %session.agent_used,
            "Learning session recorded"
        );
        Ok(result.last_insert_rowid())
    }

    /// Records an accomplishment and returns its id.
    pub async fn add_accomplishment(
        &self,
        student_name: &str,
        achievement: &str,
        skill_category: &str,
        confidence_level: i64,
    ) -> Result<i64> {
        check_rating("confidence_level", confidence_level)?;
        let result = sqlx::query(
            r#"
            INSERT INTO accomplishments (student_name, achievement, skill_category, confidence_level)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(student_name)
        .bind(achievement)
        .bind(skill_category)
        .bind(confidence_level)
        .execute(&self.pool)
        .await?;
        info!(
            student = student_name,
            skill_category, confidence_level, "Accomplishment recorded"
        );
        Ok(result.last_insert_rowid())
    }

    /// Stores a new pending lesson plan and returns its id.
    pub async fn create_lesson_plan(&self, plan: &NewLessonPlan) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO lesson_plans
                (student_name, learning_objective, lesson_steps, target_skills,
                 personalization_notes, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&plan.student_name)
        .bind(&plan.learning_objective)
        .bind(serde_json::to_string(&plan.lesson_steps)?)
        .bind(serde_json::to_string(&plan.target_skills)?)
        .bind(&plan.personalization_notes)
        .bind(LessonStatus::Pending)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// The most recent plan that is still pending or in progress.
    pub async fn get_current_lesson_plan(&self, student_name: &str) -> Result<Option<LessonPlan>> {
        let plan = sqlx::query_as::<_, LessonPlan>(&format!(
            r#"
            SELECT {PLAN_COLUMNS}
            FROM lesson_plans
            WHERE student_name = ? AND status IN ('pending', 'in_progress')
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(student_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(plan)
    }

    pub async fn update_lesson_plan_status(&self, plan_id: i64, status: LessonStatus) -> Result<()> {
        let result = sqlx::query("UPDATE lesson_plans SET status = ? WHERE id = ?")
            .bind(status)
            .bind(plan_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("Lesson plan {} not found", plan_id);
        }
        info!(plan_id, %status, "Lesson plan status updated");
        Ok(())
    }

    /// Everything a parent sees for one student.
    pub async fn get_parent_dashboard(&self, student_name: &str) -> Result<ParentDashboard> {
        let overview = self.get_student_profile(student_name).await?;

        let recent_sessions = sqlx::query_as::<_, LearningSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM learning_sessions
            WHERE student_name = ?
            ORDER BY session_date DESC, id DESC
            LIMIT ?
            "#
        ))
        .bind(student_name)
        .bind(RECENT_SESSIONS)
        .fetch_all(&self.pool)
        .await?;

        let skill_progress = sqlx::query_as::<_, SkillProgress>(
            r#"
            SELECT skill_category AS category,
                   COUNT(*) AS achievements_count,
                   ROUND(AVG(confidence_level), 1) AS average_confidence
            FROM accomplishments
            WHERE student_name = ?
            GROUP BY skill_category
            ORDER BY skill_category
            "#,
        )
        .bind(student_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(ParentDashboard {
            student_name: student_name.to_string(),
            overview,
            recent_sessions,
            skill_progress,
        })
    }

    /// Names of every student with a stored profile.
    pub async fn list_students(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM student_profiles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn count_accomplishments(&self, student_name: &str, skill_category: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM accomplishments WHERE student_name = ? AND skill_category = ?",
        )
        .bind(student_name)
        .bind(skill_category)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

/// Roster children keep their demo progress; stored students report their
/// level and counts derived from recorded accomplishments.
#[async_trait]
impl StudentRecords for Db {
    async fn reading_progress(&self, child_name: &str) -> Result<ReadingProgress> {
        if let Some(progress) = roster_progress(child_name) {
            return Ok(progress);
        }
        let Some(profile) = self.find_profile(child_name).await? else {
            return Ok(ReadingProgress::new_student(child_name));
        };
        let words_learned = self.count_accomplishments(child_name, "sight_words").await?;
        let books_completed = self.count_accomplishments(child_name, "stories").await?;
        Ok(ReadingProgress {
            child_name: profile.name,
            level: profile.current_level,
            words_learned: u32::try_from(words_learned).unwrap_or(u32::MAX),
            books_completed: u32::try_from(books_completed).unwrap_or(u32::MAX),
            next_milestone: "Great job! Keep reading to reach the next level!".to_string(),
        })
    }

    async fn record_accomplishment(
        &self,
        child_name: &str,
        achievement: &str,
        skill_category: &str,
        confidence_level: i64,
    ) -> Result<()> {
        self.add_accomplishment(child_name, achievement, skill_category, confidence_level)
            .await?;
        Ok(())
    }
}
