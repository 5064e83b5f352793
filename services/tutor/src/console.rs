//! Interactive Console
//!
//! The numeric menu a parent and child use to run demos, talk to the teacher,
//! and look after student records. Input and output are generic so the whole
//! menu can be driven from a script.

use crate::{
    models::{
        LessonPlan, LessonStatus, NewLearningSession, NewLessonPlan, ParentDashboard,
        ProfileUpdate, StudentOverview,
    },
    state::AppState,
};
use anyhow::{Result, anyhow};
use preschool_core::{
    content::roster_names,
    runner::{Conversation, RunResult},
};
use std::fmt::Write as _;
use std::io::{BufRead, Write};
use tracing::{error, info, warn};

pub const DEFAULT_STUDENT: &str = "Emma";

/// Child utterances run by the text demo.
pub const DEMO_QUERIES: [&str; 4] = [
    "Hi! I want to practice the letter B sound",
    "Can you check Emma's reading progress?",
    "I need help with sight words for beginners",
    "Let's work on phonics with the letter M",
];

const DEFAULT_RATING: i64 = 3;
const DIVIDER: &str = "--------------------------------------------------";

const MENU: &str = "
What would you like to do?
  1. Text demo
  2. Chat with the teacher
  3. Voice mode
  4. Parent dashboard
  5. Student profile
  6. Lesson plans
  7. Record an accomplishment
  8. System check
  0. Quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    TextDemo,
    Chat,
    Voice,
    Dashboard,
    Profile,
    LessonPlans,
    Accomplishment,
    SystemCheck,
    Quit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::TextDemo),
            "2" => Some(MenuChoice::Chat),
            "3" => Some(MenuChoice::Voice),
            "4" => Some(MenuChoice::Dashboard),
            "5" => Some(MenuChoice::Profile),
            "6" => Some(MenuChoice::LessonPlans),
            "7" => Some(MenuChoice::Accomplishment),
            "8" => Some(MenuChoice::SystemCheck),
            "0" => Some(MenuChoice::Quit),
            _ => None,
        }
    }
}

/// Counts failed turns in a row.
#[derive(Debug)]
pub struct ErrorStreak {
    count: u32,
    limit: u32,
}

impl ErrorStreak {
    pub fn new(limit: u32) -> Self {
        Self { count: 0, limit }
    }

    /// Records a failure; returns true (and starts over) when the limit is hit.
    pub fn record(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.limit {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

pub struct Console<R, W> {
    state: AppState,
    student: String,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(state: AppState, student: impl Into<String>, input: R, out: W) -> Self {
        Self {
            state,
            student: student.into(),
            input,
            out,
        }
    }

    pub fn student(&self) -> &str {
        &self.student
    }

    /// Asks who is learning today; Enter keeps the current student.
    pub fn choose_student(&mut self) -> Result<()> {
        let roster: Vec<&str> = roster_names().collect();
        let prompt = format!(
            "Who is learning today? ({} or a new name) [{}]: ",
            roster.join(", "),
            self.student
        );
        if let Some(name) = self.prompt_optional(&prompt)? {
            self.student = name;
        }
        Ok(())
    }

    /// Shows the menu until the user quits or input ends.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.out, "PRESCHOOL READING TEACHER")?;
        writeln!(self.out, "Learning with {} today.", self.student)?;
        loop {
            writeln!(self.out, "{}", MENU)?;
            let Some(line) = self.prompt("Choose an option: ")? else {
                break;
            };
            let Some(choice) = MenuChoice::parse(&line) else {
                writeln!(
                    self.out,
                    "'{}' is not an option. Please pick a number from the menu.",
                    line
                )?;
                continue;
            };
            info!(?choice, student = %self.student, "Menu choice");
            let result = match choice {
                MenuChoice::Quit => break,
                MenuChoice::TextDemo => self.text_demo().await,
                MenuChoice::Chat => self.chat().await,
                MenuChoice::Voice => self.voice_mode().await,
                MenuChoice::Dashboard => self.dashboard().await,
                MenuChoice::Profile => self.profile().await,
                MenuChoice::LessonPlans => self.lesson_plans().await,
                MenuChoice::Accomplishment => self.accomplishment().await,
                MenuChoice::SystemCheck => self.system_check().await,
            };
            if let Err(e) = result {
                error!(error = ?e, ?choice, "Menu action failed");
                writeln!(self.out, "Something went wrong: {:#}", e)?;
            }
        }
        writeln!(self.out, "Goodbye! Keep practicing your reading!")?;
        Ok(())
    }

    /// Prints `prompt` and reads one trimmed line; `None` at end of input.
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Reads a 1 to 5 rating, re-asking on bad input; Enter gives the default.
    fn prompt_rating(&mut self, prompt: &str) -> Result<i64> {
        loop {
            let Some(line) = self.prompt(prompt)? else {
                return Ok(DEFAULT_RATING);
            };
            if line.is_empty() {
                return Ok(DEFAULT_RATING);
            }
            match line.parse::<i64>() {
                Ok(rating) if (1..=5).contains(&rating) => return Ok(rating),
                _ => writeln!(self.out, "Please enter a number from 1 to 5.")?,
            }
        }
    }

    /// Reads an optional field; Enter leaves it unset.
    fn prompt_optional(&mut self, prompt: &str) -> Result<Option<String>> {
        Ok(self.prompt(prompt)?.filter(|s| !s.is_empty()))
    }

    async fn ask_teacher(&self, conversation: &mut Conversation, input: &str) -> Result<RunResult> {
        let timeout = self.state.config.response_timeout;
        match tokio::time::timeout(timeout, self.state.runner.run(conversation, input)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "The teacher took longer than {} seconds to answer",
                timeout.as_secs()
            )),
        }
    }

    async fn start_lesson(&self) -> Result<Conversation> {
        let overview = self.state.db.get_student_profile(&self.student).await?;
        Ok(self
            .state
            .runner
            .start_conversation()
            .with_student_context(overview.teaching_context()))
    }

    async fn text_demo(&mut self) -> Result<()> {
        writeln!(self.out, "=== PRESCHOOL READING TEACHER - TEXT DEMO ===")?;
        for query in DEMO_QUERIES {
            let mut conversation = self.state.runner.start_conversation();
            writeln!(self.out, "Child: {}", query)?;
            match self.ask_teacher(&mut conversation, query).await {
                Ok(reply) => writeln!(
                    self.out,
                    "Teacher ({}): {}",
                    reply.last_agent, reply.final_output
                )?,
                Err(e) => {
                    warn!(error = ?e, query, "Demo query failed");
                    writeln!(self.out, "The teacher could not answer: {:#}", e)?;
                }
            }
            writeln!(self.out, "{}", DIVIDER)?;
        }
        Ok(())
    }

    async fn chat(&mut self) -> Result<()> {
        let mut conversation = self.start_lesson().await?;
        writeln!(
            self.out,
            "Say hello to your teacher, {}! Type 'quit' when you are done.",
            self.student
        )?;
        let mut errors = ErrorStreak::new(self.state.config.max_consecutive_errors);
        loop {
            let prompt = format!("{}: ", self.student);
            let Some(line) = self.prompt(&prompt)? else {
                break;
            };
            if line.eq_ignore_ascii_case("quit") {
                break;
            }
            if line.is_empty() {
                continue;
            }
            match self.ask_teacher(&mut conversation, &line).await {
                Ok(reply) => {
                    errors.reset();
                    writeln!(self.out, "Teacher: {}", reply.final_output)?;
                }
                Err(e) => {
                    warn!(error = ?e, "Chat turn failed");
                    writeln!(self.out, "Oops, the teacher got confused: {:#}", e)?;
                    if errors.record() {
                        self.suggest_break()?;
                    }
                }
            }
        }
        self.finish_session(&conversation).await
    }

    fn suggest_break(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "We keep running into trouble. Maybe it's time for a little break? You can try again later."
        )?;
        Ok(())
    }

    #[cfg(feature = "voice")]
    async fn voice_mode(&mut self) -> Result<()> {
        use crate::voice::{device, pipeline::VoicePipeline};

        let pipeline = VoicePipeline::new(
            self.state.runner.clone(),
            self.state.speech.clone(),
            self.state.config.max_response_length,
        );
        let mut conversation = self.start_lesson().await?;
        writeln!(self.out, "=== PRESCHOOL READING TEACHER - VOICE MODE ===")?;
        writeln!(
            self.out,
            "Press Enter to speak, then press Enter again to stop recording. Type 'quit' to exit."
        )?;
        let mut errors = ErrorStreak::new(self.state.config.max_consecutive_errors);
        let timeout = self.state.config.response_timeout;

        loop {
            let Some(line) =
                self.prompt("Press Enter to speak to the teacher (or type 'quit' to exit): ")?
            else {
                break;
            };
            if line.eq_ignore_ascii_case("quit") {
                break;
            }

            let recording = match device::start_recording(self.state.config.sample_rate) {
                Ok(active) => {
                    writeln!(self.out, "Listening... (press Enter when done speaking)")?;
                    self.prompt("")?;
                    active.finish()
                }
                Err(e) => {
                    warn!(error = ?e, "Could not start recording");
                    writeln!(self.out, "I couldn't open the microphone: {:#}", e)?;
                    if errors.record() {
                        self.suggest_break()?;
                    }
                    continue;
                }
            };

            writeln!(self.out, "The teacher is thinking...")?;
            let turn = match tokio::time::timeout(
                timeout,
                pipeline.run(&mut conversation, &recording),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "The teacher took longer than {} seconds to answer",
                    timeout.as_secs()
                )),
            };

            match turn {
                Ok(Some(turn)) => {
                    errors.reset();
                    writeln!(self.out, "You said: {}", turn.transcript)?;
                    writeln!(self.out, "Teacher: {}", turn.reply.final_output)?;
                    let audio = turn.audio;
                    match tokio::task::spawn_blocking(move || device::play(&audio)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            warn!(error = ?e, "Playback failed");
                            writeln!(self.out, "I couldn't play the answer: {:#}", e)?;
                        }
                        Err(e) => error!(error = ?e, "Playback task panicked"),
                    }
                }
                Ok(None) => writeln!(self.out, "I didn't hear anything. Please try again.")?,
                Err(e) => {
                    warn!(error = ?e, "Voice turn failed");
                    writeln!(self.out, "Error processing voice: {:#}", e)?;
                    if errors.record() {
                        self.suggest_break()?;
                    }
                }
            }
            writeln!(self.out, "{}", DIVIDER)?;
        }
        self.finish_session(&conversation).await
    }

    #[cfg(not(feature = "voice"))]
    async fn voice_mode(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "Voice mode needs microphone support. Rebuild with `cargo run --features voice` to use it."
        )?;
        Ok(())
    }

    /// Saves a finished conversation as a learning session.
    async fn finish_session(&mut self, conversation: &Conversation) -> Result<()> {
        if !self.state.config.save_sessions || conversation.is_empty() {
            return Ok(());
        }
        let effectiveness =
            self.prompt_rating("Grown-ups: how well did that session go? (1-5, Enter for 3): ")?;
        let notes = self
            .prompt_optional("Any notes for next time? (Enter to skip): ")?
            .unwrap_or_default();

        let fallback = conversation.opening_line().unwrap_or_default().to_string();
        let summary = match tokio::time::timeout(
            self.state.config.response_timeout,
            self.state.runner.summarize(conversation),
        )
        .await
        {
            Ok(Ok(summary)) if !summary.is_empty() => summary,
            Ok(Err(e)) => {
                warn!(error = ?e, "Could not summarize session");
                fallback
            }
            _ => fallback,
        };
        let lesson_topic = self
            .state
            .runner
            .personas()
            .get(&conversation.agent)
            .map(|p| p.topic.clone())
            .unwrap_or_else(|| "general".to_string());

        self.state
            .db
            .add_learning_session(&NewLearningSession {
                student_name: self.student.clone(),
                lesson_topic,
                agent_used: conversation.agent.clone(),
                conversation_summary: summary,
                effectiveness,
                notes,
            })
            .await?;
        writeln!(self.out, "Session saved for {}.", self.student)?;
        Ok(())
    }

    async fn dashboard(&mut self) -> Result<()> {
        let dashboard = self.state.db.get_parent_dashboard(&self.student).await?;
        write!(self.out, "{}", render_dashboard(&dashboard))?;
        Ok(())
    }

    async fn profile(&mut self) -> Result<()> {
        let overview = self.state.db.get_student_profile(&self.student).await?;
        write!(self.out, "{}", render_profile(&overview))?;

        let answer = self.prompt("Update this profile? (y/N): ")?.unwrap_or_default();
        if !answer.eq_ignore_ascii_case("y") {
            return Ok(());
        }
        writeln!(self.out, "Press Enter to keep a field as it is.")?;

        let mut update = ProfileUpdate::default();
        if let Some(age) = self.prompt_optional("Age: ")? {
            match age.parse::<i64>() {
                Ok(age) if (1..=12).contains(&age) => update.age = Some(age),
                _ => writeln!(self.out, "'{}' is not an age I can use; keeping the old one.", age)?,
            }
        }
        update.interests = self
            .prompt_optional("Interests (comma separated): ")?
            .map(|s| split_list(&s));
        update.learning_style =
            self.prompt_optional("Learning style (visual, auditory, kinesthetic): ")?;
        update.current_level = self.prompt_optional("Current level: ")?;
        update.preferred_teaching_style = self.prompt_optional("Preferred teaching style: ")?;
        update.effective_strategies = self
            .prompt_optional("What works well (comma separated): ")?
            .map(|s| split_list(&s));
        update.challenging_areas = self
            .prompt_optional("What is hard (comma separated): ")?
            .map(|s| split_list(&s));
        update.motivation_triggers = self
            .prompt_optional("What motivates them (comma separated): ")?
            .map(|s| split_list(&s));

        if update.is_empty() {
            writeln!(self.out, "Nothing to change.")?;
            return Ok(());
        }
        self.state
            .db
            .update_student_profile(&self.student, &update)
            .await?;
        writeln!(self.out, "Profile updated.")?;
        Ok(())
    }

    async fn lesson_plans(&mut self) -> Result<()> {
        loop {
            writeln!(
                self.out,
                "
Lesson plans for {}:
  1. Create a lesson plan
  2. Show the current plan
  3. Change the current plan's status
  0. Back",
                self.student
            )?;
            let Some(line) = self.prompt("Choose an option: ")? else {
                return Ok(());
            };
            match line.as_str() {
                "0" => return Ok(()),
                "1" => self.create_lesson_plan().await?,
                "2" => match self.state.db.get_current_lesson_plan(&self.student).await? {
                    Some(plan) => write!(self.out, "{}", render_lesson_plan(&plan))?,
                    None => writeln!(self.out, "{} has no active lesson plan.", self.student)?,
                },
                "3" => self.change_lesson_plan_status().await?,
                other => writeln!(
                    self.out,
                    "'{}' is not an option. Please pick a number from the menu.",
                    other
                )?,
            }
        }
    }

    async fn create_lesson_plan(&mut self) -> Result<()> {
        let Some(objective) = self.prompt_optional("Learning objective: ")? else {
            writeln!(self.out, "A lesson plan needs an objective.")?;
            return Ok(());
        };
        let mut lesson_steps = Vec::new();
        loop {
            let prompt = format!("Step {} (Enter to finish): ", lesson_steps.len() + 1);
            match self.prompt_optional(&prompt)? {
                Some(step) => lesson_steps.push(step),
                None => break,
            }
        }
        let target_skills = self
            .prompt_optional("Target skills (comma separated): ")?
            .map(|s| split_list(&s))
            .unwrap_or_default();
        let personalization_notes = self
            .prompt_optional("Personalization notes: ")?
            .unwrap_or_default();

        let id = self
            .state
            .db
            .create_lesson_plan(&NewLessonPlan {
                student_name: self.student.clone(),
                learning_objective: objective,
                lesson_steps,
                target_skills,
                personalization_notes,
            })
            .await?;
        writeln!(self.out, "Created lesson plan #{}.", id)?;
        Ok(())
    }

    async fn change_lesson_plan_status(&mut self) -> Result<()> {
        let Some(plan) = self.state.db.get_current_lesson_plan(&self.student).await? else {
            writeln!(self.out, "{} has no active lesson plan.", self.student)?;
            return Ok(());
        };
        writeln!(
            self.out,
            "Plan #{} '{}' is {}.",
            plan.id, plan.learning_objective, plan.status
        )?;
        let Some(answer) =
            self.prompt_optional("New status (pending, in_progress, completed): ")?
        else {
            return Ok(());
        };
        match answer.parse::<LessonStatus>() {
            Ok(status) => {
                self.state
                    .db
                    .update_lesson_plan_status(plan.id, status)
                    .await?;
                writeln!(self.out, "Plan #{} is now {}.", plan.id, status)?;
            }
            Err(e) => writeln!(self.out, "{}", e)?,
        }
        Ok(())
    }

    async fn accomplishment(&mut self) -> Result<()> {
        let Some(achievement) = self.prompt_optional("What did they achieve? ")? else {
            writeln!(self.out, "Nothing recorded.")?;
            return Ok(());
        };
        let skill_category = self
            .prompt_optional("Skill category (alphabet, phonics, sight_words, stories): ")?
            .unwrap_or_else(|| "general".to_string());
        let confidence = self.prompt_rating("Confidence (1-5, Enter for 3): ")?;
        self.state
            .db
            .add_accomplishment(&self.student, &achievement, &skill_category, confidence)
            .await?;
        writeln!(self.out, "Great! Saved '{}' for {}.", achievement, self.student)?;
        Ok(())
    }

    async fn system_check(&mut self) -> Result<()> {
        let config = self.state.config.clone();
        writeln!(self.out, "=== SYSTEM CHECK ===")?;
        writeln!(self.out, "API key: {}", mask_secret(&config.openai_api_key))?;
        writeln!(
            self.out,
            "Chat model: {} (via {})",
            config.chat_model, config.openai_api_base
        )?;
        writeln!(
            self.out,
            "Speech: {} voice {:?} at {}x, transcription {}",
            config.tts_model, config.tts_voice, config.tts_speed, config.transcription_model
        )?;

        match self.state.db.ping().await {
            Ok(()) => {
                let students = self.state.db.list_students().await?;
                writeln!(
                    self.out,
                    "Database: OK ({}), {} student(s)",
                    config.database_url,
                    students.len()
                )?;
            }
            Err(e) => writeln!(self.out, "Database: FAILED ({:#})", e)?,
        }

        if self.state.prompt_overrides.is_empty() {
            writeln!(self.out, "Prompts: built-in")?;
        } else {
            writeln!(
                self.out,
                "Prompts: overrides for {}",
                self.state.prompt_overrides.join(", ")
            )?;
        }
        writeln!(self.out, "Teaching tools: {}", self.state.tool_count)?;
        writeln!(
            self.out,
            "Sessions are {}",
            if config.save_sessions { "saved" } else { "not saved" }
        )?;
        self.audio_check()?;
        Ok(())
    }

    #[cfg(feature = "voice")]
    fn audio_check(&mut self) -> Result<()> {
        let devices = crate::voice::device::default_devices();
        writeln!(
            self.out,
            "Microphone: {}",
            devices.input.as_deref().unwrap_or("not found")
        )?;
        writeln!(
            self.out,
            "Speaker: {}",
            devices.output.as_deref().unwrap_or("not found")
        )?;
        Ok(())
    }

    #[cfg(not(feature = "voice"))]
    fn audio_check(&mut self) -> Result<()> {
        writeln!(self.out, "Audio: disabled (build with --features voice)")?;
        Ok(())
    }
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shows only the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none yet".to_string()
    } else {
        items.join(", ")
    }
}

pub fn render_profile(overview: &StudentOverview) -> String {
    let profile = &overview.profile;
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", profile.name);
    let _ = writeln!(out, "Age: {}", profile.age);
    let _ = writeln!(out, "Level: {}", profile.current_level);
    let _ = writeln!(out, "Learning style: {}", profile.learning_style);
    let _ = writeln!(out, "Interests: {}", or_none(&profile.interests));
    if let Some(analytics) = &overview.analytics {
        if !analytics.preferred_teaching_style.is_empty() {
            let _ = writeln!(
                out,
                "Preferred teaching style: {}",
                analytics.preferred_teaching_style
            );
        }
        let _ = writeln!(
            out,
            "What works well: {}",
            or_none(&analytics.effective_strategies)
        );
        let _ = writeln!(out, "What is hard: {}", or_none(&analytics.challenging_areas));
        let _ = writeln!(
            out,
            "Motivated by: {}",
            or_none(&analytics.motivation_triggers)
        );
    }
    if overview.recent_accomplishments.is_empty() {
        let _ = writeln!(out, "No accomplishments yet.");
    } else {
        let _ = writeln!(out, "Recent accomplishments:");
        for a in &overview.recent_accomplishments {
            let _ = writeln!(
                out,
                "  - {} [{}] confidence {}/5 ({})",
                a.achievement,
                a.skill_category,
                a.confidence_level,
                a.date_achieved.format("%Y-%m-%d")
            );
        }
    }
    out
}

pub fn render_dashboard(dashboard: &ParentDashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== PARENT DASHBOARD: {} ===", dashboard.student_name);
    out.push_str(&render_profile(&dashboard.overview));

    let _ = writeln!(out, "Recent sessions:");
    if dashboard.recent_sessions.is_empty() {
        let _ = writeln!(out, "  No sessions yet.");
    }
    for s in &dashboard.recent_sessions {
        let _ = writeln!(
            out,
            "  - {} {} with {} (rated {}/5)",
            s.session_date.format("%Y-%m-%d %H:%M"),
            s.lesson_topic,
            s.agent_used,
            s.learning_effectiveness
        );
        if !s.conversation_summary.is_empty() {
            let _ = writeln!(out, "      {}", s.conversation_summary);
        }
        if !s.notes.is_empty() {
            let _ = writeln!(out, "      Notes: {}", s.notes);
        }
    }

    let _ = writeln!(out, "Skill progress:");
    if dashboard.skill_progress.is_empty() {
        let _ = writeln!(out, "  No skills recorded yet.");
    }
    for skill in &dashboard.skill_progress {
        let _ = writeln!(
            out,
            "  - {}: {} achievement(s), average confidence {:.1}",
            skill.category, skill.achievements_count, skill.average_confidence
        );
    }
    out
}

pub fn render_lesson_plan(plan: &LessonPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Lesson plan #{} ({}): {}",
        plan.id, plan.status, plan.learning_objective
    );
    for (i, step) in plan.lesson_steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }
    let _ = writeln!(out, "Target skills: {}", or_none(&plan.target_skills));
    if !plan.personalization_notes.is_empty() {
        let _ = writeln!(out, "Notes: {}", plan.personalization_notes);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse(" 1 "), Some(MenuChoice::TextDemo));
        assert_eq!(MenuChoice::parse("8"), Some(MenuChoice::SystemCheck));
        assert_eq!(MenuChoice::parse("0"), Some(MenuChoice::Quit));
        assert_eq!(MenuChoice::parse("9"), None);
        assert_eq!(MenuChoice::parse("chat"), None);
    }

    #[test]
    fn test_error_streak() {
        let mut streak = ErrorStreak::new(3);
        assert!(!streak.record());
        assert!(!streak.record());
        assert!(streak.record());
        // Starts over after suggesting a break.
        assert!(!streak.record());
        streak.reset();
        assert!(!streak.record());
        assert!(!streak.record());
        assert!(streak.record());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" animals, , colors ,stories"),
            vec!["animals", "colors", "stories"]
        );
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-test-abcd1234"), "****1234");
        assert_eq!(mask_secret("abc"), "****");
    }
}
