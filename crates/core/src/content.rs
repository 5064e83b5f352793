//! Static Teaching Content
//!
//! Reading levels, sight-word sets, the phonics progression, the demo roster and
//! the story and pronunciation material the teaching tools draw from. Every lookup
//! falls back to a fixed default instead of failing.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use rand::seq::IndexedRandom;
use serde::Serialize;

// --- Reading Levels ---

/// A named stage of early reading with the skills and sight words it targets.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReadingLevel {
    pub name: &'static str,
    pub age_range: &'static str,
    pub skills: &'static [&'static str],
    pub sight_words: &'static [&'static str],
}

pub const DEFAULT_LEVEL: &str = "Beginning Reader";

pub const READING_LEVELS: [ReadingLevel; 4] = [
    ReadingLevel {
        name: "Pre-Reader",
        age_range: "3-4 years",
        skills: &["letter recognition", "phonemic awareness", "print concepts"],
        sight_words: &["I", "me", "my", "you", "the", "a"],
    },
    ReadingLevel {
        name: "Beginning Reader",
        age_range: "4-5 years",
        skills: &["letter sounds", "simple words", "basic phonics"],
        sight_words: &[
            "and", "to", "said", "you", "of", "we", "my", "be", "have", "from",
        ],
    },
    ReadingLevel {
        name: "Early Reader",
        age_range: "5-6 years",
        skills: &["word families", "simple sentences", "reading fluency"],
        sight_words: &[
            "they", "know", "want", "been", "good", "much", "some", "time", "very", "when",
        ],
    },
    ReadingLevel {
        name: "Developing Reader",
        age_range: "6-7 years",
        skills: &["complex words", "reading comprehension", "story structure"],
        sight_words: &[
            "would", "there", "each", "which", "their", "called", "first", "water", "after",
            "back",
        ],
    },
];

/// Finds a reading level by its exact name.
pub fn reading_level(name: &str) -> Option<&'static ReadingLevel> {
    READING_LEVELS.iter().find(|level| level.name == name)
}

/// Returns the sight words for a reading level, or the Beginning Reader list.
pub fn sight_words_for_level(level: &str) -> &'static [&'static str] {
    reading_level(level)
        .or_else(|| reading_level(DEFAULT_LEVEL))
        .map(|level| level.sight_words)
        .unwrap_or_default()
}

// --- Sight Word Sets ---

/// Sight words grouped by the difficulty names the teaching tools accept.
pub const SIGHT_WORD_SETS: [(&str, [&str; 10]); 3] = [
    (
        "beginner",
        ["the", "and", "a", "to", "said", "you", "of", "we", "my", "be"],
    ),
    (
        "intermediate",
        [
            "have", "from", "they", "know", "want", "been", "good", "much", "some", "time",
        ],
    ),
    (
        "advanced",
        [
            "would", "there", "each", "which", "their", "called", "first", "water", "after",
            "back",
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SightWordSet {
    pub level: String,
    pub words: Vec<String>,
    pub practice_tip: String,
}

/// Looks up a sight-word set by difficulty, case-insensitively.
pub fn sight_words(difficulty: &str) -> SightWordSet {
    let level = difficulty.trim().to_lowercase();
    match SIGHT_WORD_SETS.iter().find(|(name, _)| *name == level) {
        Some((name, words)) => SightWordSet {
            level: name.to_string(),
            words: words.iter().map(|w| w.to_string()).collect(),
            practice_tip: format!("Practice these {name} sight words by saying them out loud!"),
        },
        None => SightWordSet {
            level: "beginner".to_string(),
            words: SIGHT_WORD_SETS[0].1.iter().map(|w| w.to_string()).collect(),
            practice_tip: "Let's start with beginner words!".to_string(),
        },
    }
}

// --- Phonics ---

/// The order in which letter sounds are introduced: single consonants, more
/// single sounds, consonant blends, then vowel teams.
pub const PHONICS_SEQUENCE: [&str; 57] = [
    "m", "s", "t", "a", "n", "p", "i", "c", "k", "e", "r", "d", //
    "h", "u", "l", "f", "b", "j", "o", "g", "w", "v", "x", "y", "z", "q", //
    "bl", "br", "cl", "cr", "dr", "fl", "fr", "gl", "gr", "pl", "pr", "sl", "sm", "sn", "sp",
    "st", "sw", "tr", //
    "ai", "ay", "ea", "ee", "ey", "ie", "oa", "oe", "oo", "ou", "ow", "ue", "ui",
];

/// Returns the sound after `current` in the progression.
///
/// The final sound returns itself and an unknown sound restarts at the first one.
pub fn next_phonics_sound(current: &str) -> &'static str {
    match PHONICS_SEQUENCE.iter().position(|s| *s == current) {
        Some(idx) if idx + 1 < PHONICS_SEQUENCE.len() => PHONICS_SEQUENCE[idx + 1],
        Some(idx) => PHONICS_SEQUENCE[idx],
        None => PHONICS_SEQUENCE[0],
    }
}

const PHONICS_EXERCISES: [(&str, [&str; 4], &str); 5] = [
    (
        "b",
        ["ball", "bear", "book", "banana"],
        "Big brown bears bounce balls.",
    ),
    (
        "c",
        ["cat", "car", "cake", "cup"],
        "Curious cats catch colorful cars.",
    ),
    (
        "d",
        ["dog", "duck", "door", "dance"],
        "Dancing dogs dive through doors.",
    ),
    (
        "f",
        ["fish", "frog", "flower", "family"],
        "Funny frogs find fresh flowers.",
    ),
    (
        "m",
        ["mouse", "moon", "milk", "music"],
        "Mice make merry music under the moon.",
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhonicsExercise {
    pub letter_sound: String,
    pub practice_words: Vec<String>,
    pub practice_sentence: String,
    pub instruction: String,
}

/// Builds a practice exercise for a letter sound, defaulting to "b".
pub fn phonics_exercise(letter_sound: &str) -> PhonicsExercise {
    let sound = letter_sound.trim().to_lowercase();
    let (key, words, sentence) = PHONICS_EXERCISES
        .iter()
        .find(|(key, _, _)| *key == sound)
        .unwrap_or(&PHONICS_EXERCISES[0]);
    let shown = if *key == sound { sound.clone() } else { key.to_uppercase() };
    PhonicsExercise {
        letter_sound: key.to_uppercase(),
        practice_words: words.iter().map(|w| w.to_string()).collect(),
        practice_sentence: sentence.to_string(),
        instruction: format!("Let's practice the '{shown}' sound together! Repeat after me."),
    }
}

// --- Child Roster ---

/// Where a child currently is in their reading journey.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingProgressSnapshot {
    pub words_learned: u32,
    pub books_completed: u32,
    pub current_phonics: String,
    pub last_session: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildProfile {
    pub name: String,
    pub age: u32,
    pub level: String,
    pub interests: Vec<String>,
    pub learning_style: String,
    pub progress: ReadingProgressSnapshot,
}

struct RosterEntry {
    name: &'static str,
    age: u32,
    level: &'static str,
    interests: [&'static str; 3],
    learning_style: &'static str,
    words_learned: u32,
    books_completed: u32,
    current_phonics: &'static str,
    last_session: &'static str,
}

const ROSTER: [RosterEntry; 3] = [
    RosterEntry {
        name: "Emma",
        age: 4,
        level: "Beginning Reader",
        interests: ["animals", "stories", "colors"],
        learning_style: "visual",
        words_learned: 45,
        books_completed: 8,
        current_phonics: "b",
        last_session: "2024-01-15",
    },
    RosterEntry {
        name: "Liam",
        age: 5,
        level: "Early Reader",
        interests: ["dinosaurs", "cars", "adventure"],
        learning_style: "kinesthetic",
        words_learned: 78,
        books_completed: 15,
        current_phonics: "tr",
        last_session: "2024-01-16",
    },
    RosterEntry {
        name: "Sophia",
        age: 6,
        level: "Developing Reader",
        interests: ["fairy tales", "friendship", "art"],
        learning_style: "auditory",
        words_learned: 120,
        books_completed: 22,
        current_phonics: "oa",
        last_session: "2024-01-17",
    },
];

/// Names of the children that ship with the demo.
pub fn roster_names() -> impl Iterator<Item = &'static str> {
    ROSTER.iter().map(|entry| entry.name)
}

/// Returns the roster profile for `name`, if the child is part of the demo roster.
pub fn roster_profile(name: &str) -> Option<ChildProfile> {
    ROSTER.iter().find(|entry| entry.name == name).map(|entry| ChildProfile {
        name: entry.name.to_string(),
        age: entry.age,
        level: entry.level.to_string(),
        interests: entry.interests.iter().map(|i| i.to_string()).collect(),
        learning_style: entry.learning_style.to_string(),
        progress: ReadingProgressSnapshot {
            words_learned: entry.words_learned,
            books_completed: entry.books_completed,
            current_phonics: entry.current_phonics.to_string(),
            last_session: Some(entry.last_session.to_string()),
        },
    })
}

/// Returns a child's profile, or a fresh Beginning Reader profile under that name.
pub fn child_profile(name: &str) -> ChildProfile {
    roster_profile(name).unwrap_or_else(|| ChildProfile {
        name: name.to_string(),
        age: 4,
        level: DEFAULT_LEVEL.to_string(),
        interests: vec!["learning".to_string(), "stories".to_string()],
        learning_style: "visual".to_string(),
        progress: ReadingProgressSnapshot {
            words_learned: 0,
            books_completed: 0,
            current_phonics: PHONICS_SEQUENCE[0].to_string(),
            last_session: None,
        },
    })
}

// --- Encouragement ---

pub const ENCOURAGEMENT_PHRASES: [&str; 10] = [
    "Great job!",
    "You're doing wonderful!",
    "Keep it up!",
    "Excellent work!",
    "You're such a good reader!",
    "I'm so proud of you!",
    "Amazing progress!",
    "You're getting better every day!",
    "Fantastic effort!",
    "Well done!",
];

pub const CORRECTION_PHRASES: [&str; 6] = [
    "Let's try that again together.",
    "Almost there! Let's practice once more.",
    "That's okay, let's sound it out.",
    "You're learning! Let's try again.",
    "Good try! Let's break it down.",
    "Nearly got it! One more time.",
];

pub fn encouragement() -> &'static str {
    ENCOURAGEMENT_PHRASES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(ENCOURAGEMENT_PHRASES[0])
}

pub fn correction() -> &'static str {
    CORRECTION_PHRASES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(CORRECTION_PHRASES[0])
}

// --- Stories ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryTemplate {
    pub theme: String,
    pub title: String,
    pub beats: Vec<String>,
    pub featured_words: Vec<String>,
    pub question: String,
}

const STORY_TEMPLATES: [(&str, &str, [&str; 4], [&str; 4], &str); 6] = [
    (
        "animals",
        "The Little Red Hen's Big Day",
        [
            "A little red hen finds a seed in the sun.",
            "She asks her friends the cat and the dog to help her plant it.",
            "The seed grows and grows into tall wheat.",
            "Everyone shares warm bread at the end of the day.",
        ],
        ["hen", "cat", "dog", "sun"],
        "Who helped the hen at the end?",
    ),
    (
        "dinosaurs",
        "Dino Looks for a Friend",
        [
            "A big green dino stomps through the tall grass.",
            "He sees a tiny bird sitting on a rock.",
            "The bird sings a song and the dino hums along.",
            "Now the dino and the bird play every day.",
        ],
        ["big", "green", "rock", "play"],
        "What did the bird do on the rock?",
    ),
    (
        "friendship",
        "Two Friends and One Kite",
        [
            "Mia and Sam have one red kite.",
            "The wind is big and the kite goes up, up, up.",
            "Sam lets Mia hold the string.",
            "Sharing makes the kite fly even higher.",
        ],
        ["red", "up", "wind", "fly"],
        "How did Sam show he was a good friend?",
    ),
    (
        "adventure",
        "The Map in the Sand",
        [
            "A boy finds a map in the sand.",
            "He follows the map past a tree and a pond.",
            "At the end he finds a box with a shell inside.",
            "The shell sings the sound of the sea.",
        ],
        ["map", "sand", "tree", "box"],
        "What was inside the box?",
    ),
    (
        "fairy tales",
        "The Kind Little Dragon",
        [
            "Once upon a time a little dragon lived in a castle.",
            "The dragon could not breathe fire, only bubbles.",
            "A princess laughed and played with the bubbles.",
            "The kind little dragon was the best friend in the land.",
        ],
        ["once", "upon", "time", "land"],
        "What came out when the dragon tried to breathe fire?",
    ),
    (
        "colors",
        "The Rainbow Walk",
        [
            "Ava walks past a red apple and a blue bird.",
            "She sees a yellow sun and green grass.",
            "A purple flower waves in the wind.",
            "When the rain stops, all the colors make a rainbow.",
        ],
        ["red", "blue", "yellow", "green"],
        "What color was the bird?",
    ),
];

fn build_story(index: usize) -> StoryTemplate {
    let (theme, title, beats, words, question) = &STORY_TEMPLATES[index];
    StoryTemplate {
        theme: theme.to_string(),
        title: title.to_string(),
        beats: beats.iter().map(|b| b.to_string()).collect(),
        featured_words: words.iter().map(|w| w.to_string()).collect(),
        question: question.to_string(),
    }
}

/// Picks the story template whose theme best matches `theme`.
///
/// Matching is fuzzy so that "dinosaur" or "fairy" still land on a story.
/// Anything that does not match falls back to the animals story.
pub fn story_template(theme: &str) -> StoryTemplate {
    let wanted = theme.trim().to_lowercase();
    let matcher = SkimMatcherV2::default();
    let best = STORY_TEMPLATES
        .iter()
        .enumerate()
        .filter_map(|(idx, (name, ..))| {
            matcher
                .fuzzy_match(name, &wanted)
                .or_else(|| matcher.fuzzy_match(&wanted, name))
                .map(|score| (idx, score))
        })
        .max_by_key(|(_, score)| *score);
    match best {
        Some((idx, _)) if !wanted.is_empty() => build_story(idx),
        _ => build_story(0),
    }
}

/// The story themes that have a template.
pub fn story_themes() -> impl Iterator<Item = &'static str> {
    STORY_TEMPLATES.iter().map(|(theme, ..)| *theme)
}

// --- Pronunciation ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PronunciationGuide {
    pub word: String,
    pub sounds: Vec<String>,
    pub tip: String,
    pub rhymes_with: Option<String>,
}

const PRONUNCIATION_GUIDES: [(&str, &[&str], &str, Option<&str>); 12] = [
    ("the", &["th", "uh"], "Put your tongue between your teeth and blow gently.", None),
    ("said", &["s", "eh", "d"], "It looks like 'say-d' but we say 'sed'.", Some("red")),
    ("was", &["w", "uh", "z"], "The 'a' sounds like 'uh' and the 's' buzzes like a bee.", Some("fuzz")),
    ("of", &["uh", "v"], "The 'f' sounds like a 'v' in this word.", None),
    ("you", &["y", "oo"], "Start with a smile for 'y', then round your lips for 'oo'.", Some("two")),
    ("they", &["th", "ay"], "The 'ey' says 'ay' like in 'hay'.", Some("day")),
    ("there", &["th", "air"], "The 'ere' makes the 'air' sound.", Some("chair")),
    ("water", &["w", "aw", "t", "er"], "Clap two beats: wa-ter.", None),
    ("would", &["w", "oo", "d"], "The 'l' is silent, so we say 'wood'.", Some("could")),
    ("come", &["k", "uh", "m"], "The 'o' says 'uh' and the 'e' is quiet.", Some("some")),
    ("one", &["w", "uh", "n"], "It starts with a 'w' sound even though we see an 'o'.", Some("sun")),
    ("what", &["w", "uh", "t"], "Blow out a little air for 'wh', then say 'ut'.", Some("hut")),
];

/// Returns a sound-it-out guide for `word`.
///
/// Unknown words get a generic guide that splits the word into its letters.
pub fn pronunciation_guide(word: &str) -> PronunciationGuide {
    let wanted = word.trim().to_lowercase();
    match PRONUNCIATION_GUIDES.iter().find(|(w, ..)| *w == wanted) {
        Some((w, sounds, tip, rhyme)) => PronunciationGuide {
            word: w.to_string(),
            sounds: sounds.iter().map(|s| s.to_string()).collect(),
            tip: tip.to_string(),
            rhymes_with: rhyme.map(str::to_string),
        },
        None => PronunciationGuide {
            word: wanted.clone(),
            sounds: wanted
                .chars()
                .filter(|c| c.is_alphabetic())
                .map(|c| c.to_string())
                .collect(),
            tip: "Let's say each sound slowly, then blend them together.".to_string(),
            rhymes_with: None,
        },
    }
}

// --- Quizzes ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizItem {
    pub prompt: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingQuiz {
    pub level: String,
    pub items: Vec<QuizItem>,
}

/// Draws up to `count` distinct sight words from a difficulty set as quiz items.
pub fn reading_quiz(difficulty: &str, count: usize) -> ReadingQuiz {
    let set = sight_words(difficulty);
    let picked: Vec<&String> = set
        .words
        .choose_multiple(&mut rand::rng(), count.min(set.words.len()))
        .collect();
    ReadingQuiz {
        level: set.level,
        items: picked
            .into_iter()
            .map(|word| QuizItem {
                prompt: format!("Can you read this word? {}", word.to_uppercase()),
                answer: word.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_child_profile() {
        let liam = child_profile("Liam");
        assert_eq!(liam.age, 5);
        assert_eq!(liam.level, "Early Reader");
        assert_eq!(liam.progress.current_phonics, "tr");
        assert_eq!(liam.interests, vec!["dinosaurs", "cars", "adventure"]);
    }

    #[test]
    fn test_unknown_child_gets_default_profile() {
        let profile = child_profile("Zoe");
        assert_eq!(profile.name, "Zoe");
        assert_eq!(profile.age, 4);
        assert_eq!(profile.level, "Beginning Reader");
        assert_eq!(profile.interests, vec!["learning", "stories"]);
        assert_eq!(profile.progress.words_learned, 0);
        assert_eq!(profile.progress.current_phonics, "m");
        assert!(profile.progress.last_session.is_none());
    }

    #[test]
    fn test_sight_words_for_level() {
        assert_eq!(
            sight_words_for_level("Pre-Reader"),
            &["I", "me", "my", "you", "the", "a"]
        );
        assert_eq!(
            sight_words_for_level("Expert Reader"),
            sight_words_for_level("Beginning Reader")
        );
    }

    #[test]
    fn test_next_phonics_sound() {
        assert_eq!(next_phonics_sound("m"), "s");
        assert_eq!(next_phonics_sound("d"), "h");
        assert_eq!(next_phonics_sound("q"), "bl");
        assert_eq!(next_phonics_sound("oa"), "oe");
        assert_eq!(next_phonics_sound("ui"), "ui");
        assert_eq!(next_phonics_sound("zz"), "m");
    }

    #[test]
    fn test_sight_word_set_lookup_is_case_insensitive() {
        let set = sight_words("Advanced");
        assert_eq!(set.level, "advanced");
        assert_eq!(set.words[0], "would");
        assert!(set.practice_tip.contains("advanced"));
    }

    #[test]
    fn test_unknown_sight_word_level_falls_back_to_beginner() {
        let set = sight_words("expert");
        assert_eq!(set.level, "beginner");
        assert_eq!(set.words.len(), 10);
        assert_eq!(set.practice_tip, "Let's start with beginner words!");
    }

    #[test]
    fn test_phonics_exercise() {
        let exercise = phonics_exercise("M");
        assert_eq!(exercise.letter_sound, "M");
        assert_eq!(exercise.practice_words, vec!["mouse", "moon", "milk", "music"]);
        assert!(exercise.instruction.contains("'m'"));

        let fallback = phonics_exercise("zh");
        assert_eq!(fallback.letter_sound, "B");
        assert_eq!(fallback.practice_sentence, "Big brown bears bounce balls.");
        assert!(fallback.instruction.contains("'B'"));
    }

    #[test]
    fn test_story_template_matching() {
        assert_eq!(story_template("dinosaur").theme, "dinosaurs");
        assert_eq!(story_template("Fairy").theme, "fairy tales");
        assert_eq!(story_template("").theme, "animals");
        assert_eq!(story_template("quantum").theme, "animals");
        assert_eq!(story_template("colors").beats.len(), 4);
    }

    #[test]
    fn test_pronunciation_guide() {
        let said = pronunciation_guide("Said");
        assert_eq!(said.sounds, vec!["s", "eh", "d"]);
        assert_eq!(said.rhymes_with.as_deref(), Some("red"));

        let unknown = pronunciation_guide("cat");
        assert_eq!(unknown.sounds, vec!["c", "a", "t"]);
        assert!(unknown.rhymes_with.is_none());
    }

    #[test]
    fn test_phrases_come_from_tables() {
        assert!(ENCOURAGEMENT_PHRASES.contains(&encouragement()));
        assert!(CORRECTION_PHRASES.contains(&correction()));
    }

    #[test]
    fn test_reading_quiz_draws_distinct_words() {
        let quiz = reading_quiz("intermediate", 3);
        assert_eq!(quiz.level, "intermediate");
        assert_eq!(quiz.items.len(), 3);
        let set = sight_words("intermediate");
        for item in &quiz.items {
            assert!(set.words.contains(&item.answer));
        }
        assert_ne!(quiz.items[0].answer, quiz.items[1].answer);

        assert_eq!(reading_quiz("beginner", 50).items.len(), 10);
    }
}
