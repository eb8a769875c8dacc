//! Multiple-choice quiz sessions over the words of a set of lessons.
//!
//! A session is built from in-memory lessons and never writes anything back
//! to the store: attempt counters live on the session's flashcards and are
//! gone once the engine is dropped or restarted.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, dispatcher, Dispatch};

use crate::lesson::{Lesson, Word};
use crate::{Error, Result};

/// Maximum amount of options per question, as they are labeled from 'a' to
/// 'z'.
pub const MAX_OPTIONS: usize = 26;

/// Selects which field of a word is used, either as the prompt or as the
/// expected answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordType {
    /// The translation of the word.
    #[default]
    #[serde(rename = "translation")]
    BaseWord,
    #[serde(rename = "kana")]
    Kana,
    #[serde(rename = "romaji")]
    Romaji,
}

impl WordType {
    /// Returns the field of `word` selected by this type. A missing romaji is
    /// returned as an empty string.
    pub fn field<'a>(&self, word: &'a Word) -> &'a str {
        match self {
            Self::BaseWord => &word.translation,
            Self::Kana => &word.kana,
            Self::Romaji => word.romaji.as_deref().unwrap_or(""),
        }
    }
}

impl std::fmt::Display for WordType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::BaseWord => write!(f, "translation"),
            Self::Kana => write!(f, "kana"),
            Self::Romaji => write!(f, "romaji"),
        }
    }
}

impl TryFrom<&str> for WordType {
    type Error = &'static str;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value {
            "translation" => Ok(Self::BaseWord),
            "kana" => Ok(Self::Kana),
            "romaji" => Ok(Self::Romaji),
            _ => Err("unknown word type. Available: translation, kana and romaji"),
        }
    }
}

/// A word as seen by a quiz session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flashcard {
    pub word: Word,
    pub lesson_id: i64,
    pub bad_attempts: u32,
    pub good_attempts: u32,
    pub learned: bool,
    /// Field shown as the question.
    pub word_type: WordType,
    /// Field expected as the answer.
    pub correct_word_type: WordType,
}

impl Flashcard {
    pub fn new(
        word: Word,
        lesson_id: i64,
        word_type: WordType,
        correct_word_type: WordType,
    ) -> Flashcard {
        Flashcard {
            word,
            lesson_id,
            bad_attempts: 0,
            good_attempts: 0,
            learned: false,
            word_type,
            correct_word_type,
        }
    }

    pub fn question(&self) -> &str {
        self.word_type.field(&self.word)
    }

    pub fn correct_answer(&self) -> &str {
        self.correct_word_type.field(&self.word)
    }

    pub fn attempts(&self) -> u32 {
        self.bad_attempts + self.good_attempts
    }

    fn record(&mut self, correct: bool) {
        if correct {
            self.good_attempts += 1;
            self.learned = true;
        } else {
            self.bad_attempts += 1;
        }
    }
}

/// How questions are asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    /// Number of options for each question, the correct one included.
    pub options: usize,
    pub prompt: WordType,
    pub answer: WordType,
}

impl Default for QuizSettings {
    fn default() -> Self {
        QuizSettings {
            options: 4,
            prompt: WordType::BaseWord,
            answer: WordType::Romaji,
        }
    }
}

impl QuizSettings {
    pub fn validate(&self) -> Result<()> {
        if self.options < 2 || self.options > MAX_OPTIONS {
            return Err(Error::Config(format!(
                "the number of options has to be between 2 and {MAX_OPTIONS}, got {}",
                self.options
            )));
        }
        if self.prompt == self.answer {
            return Err(Error::Config(format!(
                "the prompt and the answer cannot both be the {}",
                self.prompt
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizState {
    NotStarted,
    InProgress,
    Finished,
}

/// Returns the label for the option at `index`: 'a' for the first one, 'b' for
/// the second one and so on.
pub fn option_label(index: usize) -> char {
    match u8::try_from(index) {
        Ok(i) if index < MAX_OPTIONS => char::from(b'a' + i),
        _ => '?',
    }
}

// Inverse of `option_label`.
fn option_index(label: char) -> Option<usize> {
    let label = label.to_ascii_lowercase();
    if label.is_ascii_lowercase() {
        Some(usize::from(label as u8 - b'a'))
    } else {
        None
    }
}

/// Runs a single quiz session over a fixed pool of flashcards. The engine
/// holds no timers: a caller may poll the current question and its options as
/// many times as needed, and they only change on `advance` or `start`.
pub struct QuizEngine<R = StdRng> {
    pool: Vec<Flashcard>,
    settings: QuizSettings,
    flashcards: Vec<Flashcard>,
    current: usize,
    state: QuizState,
    options: Vec<String>,
    correct_index: Option<usize>,
    rng: R,
    logger: Dispatch,
}

impl QuizEngine<StdRng> {
    /// Creates a session over the words of `lessons`. Nothing is asked until
    /// `start` is called.
    pub fn new(lessons: &[Lesson], settings: QuizSettings, logger: Dispatch) -> Self {
        Self::with_rng(lessons, settings, logger, StdRng::from_os_rng())
    }
}

impl<R: Rng> QuizEngine<R> {
    /// Same as `new` but with the given random number generator, which is used
    /// for the question order and the position of each option.
    pub fn with_rng(lessons: &[Lesson], settings: QuizSettings, logger: Dispatch, rng: R) -> Self {
        let settings = QuizSettings {
            options: settings.options.clamp(1, MAX_OPTIONS),
            ..settings
        };
        let pool = lessons
            .iter()
            .flat_map(|lesson| {
                lesson.words.iter().map(|word| {
                    Flashcard::new(word.clone(), lesson.id, settings.prompt, settings.answer)
                })
            })
            .filter(|card| !card.question().is_empty() && !card.correct_answer().is_empty())
            .collect();

        QuizEngine {
            pool,
            settings,
            flashcards: vec![],
            current: 0,
            state: QuizState::NotStarted,
            options: vec![],
            correct_index: None,
            rng,
            logger,
        }
    }

    /// Starts the session from scratch: fresh flashcards in a new random order,
    /// and the first question ready. An empty pool finishes right away.
    pub fn start(&mut self) {
        self.flashcards = self.pool.clone();
        self.flashcards.shuffle(&mut self.rng);
        self.current = 0;
        self.state = QuizState::InProgress;
        self.prepare_question();

        dispatcher::with_default(&self.logger, || {
            debug!(questions = self.flashcards.len(), "quiz started");
        });
    }

    // Build the options for the current flashcard, or finish the session if
    // there are no flashcards left.
    fn prepare_question(&mut self) {
        let Some(card) = self.flashcards.get(self.current) else {
            self.state = QuizState::Finished;
            self.options.clear();
            self.correct_index = None;
            return;
        };

        let (options, index) =
            build_options(card, &self.flashcards, self.settings.options, &mut self.rng);
        self.options = options;
        self.correct_index = Some(index);
    }

    /// Returns the prompt for the current flashcard, if any.
    pub fn get_current_question(&self) -> Option<&str> {
        if self.state != QuizState::InProgress {
            return None;
        }
        self.flashcards.get(self.current).map(Flashcard::question)
    }

    /// Returns the options for the current question. Empty when there is no
    /// current question.
    pub fn get_current_options(&self) -> &[String] {
        &self.options
    }

    pub fn get_correct_answer_index(&self) -> Option<usize> {
        self.correct_index
    }

    /// Records the answer given through the option `label` ('a', 'b', ...)
    /// and moves on to the next question. Returns whether the answer was
    /// correct, or None if there was no question to answer. Labels that do not
    /// match any option count as wrong answers.
    pub fn advance(&mut self, label: char) -> Option<bool> {
        if self.state != QuizState::InProgress {
            return None;
        }
        let correct_index = self.correct_index?;
        let correct = option_index(label) == Some(correct_index);

        let card = self.flashcards.get_mut(self.current)?;
        card.record(correct);

        dispatcher::with_default(&self.logger, || {
            debug!(
                question = self.current + 1,
                kana = %card.word.kana,
                correct,
                "answered"
            );
        });

        self.current += 1;
        self.prepare_question();

        if self.state == QuizState::Finished {
            dispatcher::with_default(&self.logger, || debug!("quiz finished"));
        }
        Some(correct)
    }

    /// Returns a summary of the answers given so far, listing the words that
    /// were missed.
    pub fn get_results(&self) -> String {
        let total = self.get_total_questions();
        let good: u32 = self.flashcards.iter().map(|c| c.good_attempts).sum();
        let bad: u32 = self.flashcards.iter().map(|c| c.bad_attempts).sum();

        let mut res = String::new();
        match self.state {
            QuizState::NotStarted => {
                res.push_str(format!("Quiz not started ({total} questions).\n").as_str())
            }
            QuizState::InProgress => res.push_str(
                format!(
                    "Quiz in progress (question {} of {total}).\n",
                    self.current + 1
                )
                .as_str(),
            ),
            QuizState::Finished => {}
        }
        res.push_str(format!("Correct answers: {good}/{total}\n").as_str());
        res.push_str(format!("Incorrect answers: {bad}\n").as_str());

        let missed: Vec<&Flashcard> = self
            .flashcards
            .iter()
            .filter(|c| c.bad_attempts > 0)
            .collect();
        if !missed.is_empty() {
            res.push_str("\nWords to review:\n");
            for card in missed {
                let line = format!("- {}: {}\n", card.question(), card.correct_answer());
                res.push_str(line.as_str());
            }
        }

        res
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == QuizState::Finished
    }

    /// Index of the current question, which equals the total amount of
    /// questions once the session is finished.
    pub fn get_current_question_index(&self) -> usize {
        self.current
    }

    pub fn get_total_questions(&self) -> usize {
        self.pool.len()
    }

    /// Flashcards of the current session in the order they are asked.
    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }
}

// Returns the options for `card` together with the position of the correct
// one. Distractors are the distinct answers of the other flashcards.
fn build_options<R: Rng>(
    card: &Flashcard,
    flashcards: &[Flashcard],
    count: usize,
    rng: &mut R,
) -> (Vec<String>, usize) {
    let correct = card.correct_answer();

    let mut distractors: Vec<&str> = flashcards
        .iter()
        .map(Flashcard::correct_answer)
        .filter(|answer| *answer != correct)
        .collect();
    distractors.sort_unstable();
    distractors.dedup();
    distractors.shuffle(rng);
    distractors.truncate(count.saturating_sub(1));

    let mut options: Vec<String> = distractors.into_iter().map(String::from).collect();
    let index = rng.random_range(0..=options.len());
    options.insert(index, correct.to_string());

    (options, index)
}
