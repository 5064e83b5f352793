use anyhow::{Result, bail};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
    ChatCompletionToolType, FunctionCall, Voice,
};
use async_trait::async_trait;
use preschool_core::llm_client::{LLMAction, LLMClient};
use preschool_tutor::{
    config::Config,
    console::Console,
    db::Db,
    models::LessonStatus,
    state::AppState,
    voice::speech::{SpeechAudio, SpeechClient},
};
use std::{
    collections::VecDeque,
    io::Cursor,
    sync::{Arc, Mutex},
    time::Duration,
};

const REPLY: &str = "Great job reading!";

/// Plays back scripted actions, then answers with [`REPLY`].
#[derive(Default)]
struct ScriptedTeacher {
    script: Mutex<VecDeque<LLMAction>>,
}

impl ScriptedTeacher {
    fn with_script(actions: Vec<LLMAction>) -> Self {
        Self {
            script: Mutex::new(actions.into()),
        }
    }
}

#[async_trait]
impl LLMClient for ScriptedTeacher {
    async fn decide_action(
        &self,
        _messages: Vec<ChatCompletionRequestMessage>,
        _tools: Vec<ChatCompletionTool>,
    ) -> Result<LLMAction> {
        let next = self.script.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| LLMAction::TextResponse(REPLY.to_string())))
    }
}

struct BrokenTeacher;

#[async_trait]
impl LLMClient for BrokenTeacher {
    async fn decide_action(
        &self,
        _messages: Vec<ChatCompletionRequestMessage>,
        _tools: Vec<ChatCompletionTool>,
    ) -> Result<LLMAction> {
        bail!("model unavailable")
    }
}

/// Never answers before the console's time limit.
struct SlowTeacher;

#[async_trait]
impl LLMClient for SlowTeacher {
    async fn decide_action(
        &self,
        _messages: Vec<ChatCompletionRequestMessage>,
        _tools: Vec<ChatCompletionTool>,
    ) -> Result<LLMAction> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(LLMAction::TextResponse(REPLY.to_string()))
    }
}

struct NoSpeech;

#[async_trait]
impl SpeechClient for NoSpeech {
    async fn transcribe(&self, _wav: Vec<u8>) -> Result<String> {
        bail!("no speech in tests")
    }

    async fn synthesize(&self, _text: &str) -> Result<SpeechAudio> {
        bail!("no speech in tests")
    }
}

fn test_config() -> Config {
    Config {
        openai_api_key: "sk-test-key-9876".to_string(),
        openai_api_base: "http://localhost:9/v1".to_string(),
        chat_model: "test-model".to_string(),
        database_url: "sqlite::memory:".to_string(),
        log_level: tracing::Level::WARN,
        prompts_path: None,
        tts_model: "tts-1".to_string(),
        tts_voice: Voice::Alloy,
        tts_speed: 0.9,
        transcription_model: "whisper-1".to_string(),
        sample_rate: 44_100,
        max_turns: 5,
        response_timeout: Duration::from_secs(5),
        max_response_length: 200,
        max_consecutive_errors: 2,
        save_sessions: true,
        student: None,
    }
}

async fn setup(llm: Arc<dyn LLMClient>) -> (AppState, Arc<Db>) {
    setup_with_config(llm, test_config()).await
}

async fn setup_with_config(llm: Arc<dyn LLMClient>, config: Config) -> (AppState, Arc<Db>) {
    let db = Arc::new(Db::connect("sqlite::memory:").await.unwrap());
    db.run_migrations().await.unwrap();
    let state = AppState::build(config, db.clone(), llm, Arc::new(NoSpeech))
        .await
        .unwrap();
    (state, db)
}

async fn run_script(state: AppState, script: &str) -> String {
    let mut out = Vec::new();
    {
        let mut console = Console::new(state, "Emma", Cursor::new(script.as_bytes()), &mut out);
        console.run().await.unwrap();
    }
    String::from_utf8(out).unwrap()
}

fn handoff(tool_name: &str) -> LLMAction {
    LLMAction::ToolCall(vec![ChatCompletionMessageToolCall {
        id: "call_1".to_string(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: tool_name.to_string(),
            arguments: "{}".to_string(),
        },
    }])
}

#[tokio::test]
async fn test_invalid_choice_reprompts_and_quit_says_goodbye() {
    let (state, _db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let output = run_script(state, "9\nhello\n0\n").await;

    assert!(output.contains("'9' is not an option"));
    assert!(output.contains("'hello' is not an option"));
    assert!(output.ends_with("Goodbye! Keep practicing your reading!\n"));
}

#[tokio::test]
async fn test_end_of_input_quits() {
    let (state, _db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let output = run_script(state, "").await;
    assert!(output.contains("Goodbye!"));
}

#[tokio::test]
async fn test_text_demo_runs_every_query() {
    let (state, _db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let output = run_script(state, "1\n0\n").await;

    assert_eq!(output.matches("Teacher (MainTeacher): Great job reading!").count(), 4);
    assert!(output.contains("Child: Hi! I want to practice the letter B sound"));
}

#[tokio::test]
async fn test_chat_saves_session_after_handoff() {
    let teacher = ScriptedTeacher::with_script(vec![
        handoff("transfer_to_phonics_teacher"),
        LLMAction::TextResponse("Buh, buh, ball!".to_string()),
    ]);
    let (state, db) = setup(Arc::new(teacher)).await;

    // Chat one turn, quit, accept the default rating, add a note, open the dashboard.
    let output = run_script(
        state,
        "2\nI want to learn B\nquit\n\nLoved bouncing the ball\n4\n0\n",
    )
    .await;
    assert!(output.contains("Teacher: Buh, buh, ball!"));
    assert!(output.contains("Session saved for Emma."));
    assert!(output.contains("phonics with PhonicsTeacher (rated 3/5)"));
    assert!(output.contains("Notes: Loved bouncing the ball"));

    let dashboard = db.get_parent_dashboard("Emma").await.unwrap();
    assert_eq!(dashboard.recent_sessions.len(), 1);
    let session = &dashboard.recent_sessions[0];
    assert_eq!(session.agent_used, "PhonicsTeacher");
    assert_eq!(session.lesson_topic, "phonics");
    assert_eq!(session.learning_effectiveness, 3);
    // The summary comes from the model once the scripted turns run out.
    assert_eq!(session.conversation_summary, REPLY);
    assert_eq!(session.notes, "Loved bouncing the ball");
}

#[tokio::test]
async fn test_slow_answer_is_cut_off_and_chat_continues() {
    let mut config = test_config();
    config.response_timeout = Duration::from_secs(1);
    let (state, db) = setup_with_config(Arc::new(SlowTeacher), config).await;

    let output = run_script(state, "2\nhello\nquit\n8\n0\n").await;
    assert!(output.contains("The teacher took longer than 1 seconds to answer"));
    // The menu is still usable after the timed-out turn.
    assert!(output.contains("=== SYSTEM CHECK ==="));
    assert!(output.contains("Goodbye!"));

    let dashboard = db.get_parent_dashboard("Emma").await.unwrap();
    assert!(dashboard.recent_sessions.is_empty());
}

#[tokio::test]
async fn test_sessions_not_saved_when_disabled() {
    let mut config = test_config();
    config.save_sessions = false;
    let (state, db) = setup_with_config(Arc::new(ScriptedTeacher::default()), config).await;

    let output = run_script(state, "2\nhello\nquit\n4\n0\n").await;
    assert!(output.contains(&format!("Teacher: {}", REPLY)));
    assert!(!output.contains("how well did that session go"));
    assert!(!output.contains("Session saved"));
    assert!(output.contains("No sessions yet."));

    let dashboard = db.get_parent_dashboard("Emma").await.unwrap();
    assert!(dashboard.recent_sessions.is_empty());
}

#[tokio::test]
async fn test_chat_failures_suggest_a_break_and_save_nothing() {
    let (state, db) = setup(Arc::new(BrokenTeacher)).await;
    let output = run_script(state, "2\nhello\nhello again\nquit\n0\n").await;

    assert_eq!(output.matches("Oops, the teacher got confused").count(), 2);
    assert!(output.contains("time for a little break"));
    assert!(!output.contains("Session saved"));

    let dashboard = db.get_parent_dashboard("Emma").await.unwrap();
    assert!(dashboard.recent_sessions.is_empty());
}

#[tokio::test]
async fn test_profile_update_through_menu() {
    let (state, db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let output = run_script(
        state,
        "5\ny\n6\ndinosaurs, trains\n\n\n\n\nbig letters\n\n0\n",
    )
    .await;
    assert!(output.contains("Profile updated."));

    let overview = db.get_student_profile("Emma").await.unwrap();
    assert_eq!(overview.profile.age, 6);
    assert_eq!(overview.profile.interests, vec!["dinosaurs", "trains"]);
    assert_eq!(overview.profile.learning_style, "visual");
    let analytics = overview.analytics.unwrap();
    assert_eq!(analytics.challenging_areas, vec!["big letters"]);
}

#[tokio::test]
async fn test_bad_age_is_ignored() {
    let (state, db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let output = run_script(state, "5\ny\nforty\n\n\n\n\n\n\n\n0\n").await;

    assert!(output.contains("'forty' is not an age I can use"));
    assert!(output.contains("Nothing to change."));
    assert_eq!(db.get_student_profile("Emma").await.unwrap().profile.age, 4);
}

#[tokio::test]
async fn test_lesson_plan_lifecycle() {
    let (state, db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let script = "6\n\
        1\nLearn the letter B\nSay the B sound\nFind three B things\n\nalphabet, phonics\nLoves bees\n\
        2\n\
        3\nin progress\n\
        0\n0\n";
    let output = run_script(state, script).await;

    assert!(output.contains("Created lesson plan #1."));
    assert!(output.contains("Lesson plan #1 (pending): Learn the letter B"));
    assert!(output.contains("  2. Find three B things"));
    assert!(output.contains("Plan #1 is now in_progress."));

    let plan = db.get_current_lesson_plan("Emma").await.unwrap().unwrap();
    assert_eq!(plan.status, LessonStatus::InProgress);
    assert_eq!(plan.target_skills, vec!["alphabet", "phonics"]);
}

#[tokio::test]
async fn test_completed_plan_is_no_longer_current() {
    let (state, db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let script = "6\n1\nRhyme time\n\n\n\n3\ncompleted\n2\n3\n0\n0\n";
    let output = run_script(state, script).await;

    assert!(output.contains("Plan #1 is now completed."));
    assert_eq!(output.matches("Emma has no active lesson plan.").count(), 2);
    assert!(db.get_current_lesson_plan("Emma").await.unwrap().is_none());
}

#[tokio::test]
async fn test_accomplishment_shows_on_dashboard() {
    let (state, _db) = setup(Arc::new(ScriptedTeacher::default())).await;
    // Rating 9 is rejected, then 5 is accepted.
    let output = run_script(state, "7\nRead the word cat\nphonics\n9\n5\n4\n0\n").await;

    assert!(output.contains("Please enter a number from 1 to 5."));
    assert!(output.contains("Great! Saved 'Read the word cat' for Emma."));
    assert!(output.contains("=== PARENT DASHBOARD: Emma ==="));
    assert!(output.contains("Read the word cat [phonics] confidence 5/5"));
    assert!(output.contains("phonics: 1 achievement(s), average confidence 5.0"));
}

#[tokio::test]
async fn test_system_check_masks_key() {
    let (state, _db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let output = run_script(state, "8\n0\n").await;

    assert!(output.contains("API key: ****9876"));
    assert!(!output.contains("sk-test-key"));
    assert!(output.contains("Database: OK"));
    assert!(output.contains("Prompts: built-in"));
    assert!(output.contains("Teaching tools:"));
}

#[tokio::test]
async fn test_choose_student() {
    let (state, _db) = setup(Arc::new(ScriptedTeacher::default())).await;
    let mut out = Vec::new();
    let mut console = Console::new(state, "Emma", Cursor::new(&b"Liam\n"[..]), &mut out);
    console.choose_student().unwrap();
    assert_eq!(console.student(), "Liam");
    drop(console);
    let prompt = String::from_utf8(out).unwrap();
    assert!(prompt.contains("(Emma, Liam, Sophia or a new name) [Emma]"));
}
