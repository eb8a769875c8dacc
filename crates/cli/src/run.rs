use inquire::{Confirm, Select};
use kotoba::quiz::option_label;
use kotoba::{LessonManager, QuizEngine, QuizSettings, WordType};

#[derive(clap::Args, Default)]
pub struct Args {
    /// Only ask for words from the lesson with the given ID. It can be given
    /// multiple times.
    #[arg(short, long = "lesson")]
    lessons: Vec<i64>,

    /// Field shown as the question: translation, kana or romaji.
    #[arg(short, long, value_parser = parse_word_type)]
    prompt: Option<WordType>,

    /// Field expected as the answer: translation, kana or romaji.
    #[arg(short, long, value_parser = parse_word_type)]
    answer: Option<WordType>,
}

fn parse_word_type(value: &str) -> Result<WordType, String> {
    WordType::try_from(value.trim().to_lowercase().as_str()).map_err(String::from)
}

// Ask every question of the session. Returns false if the user aborted it.
fn ask_questions(engine: &mut QuizEngine) -> bool {
    while let Some(question) = engine.get_current_question().map(String::from) {
        println!(
            "\nProgress: {}/{}",
            engine.get_current_question_index() + 1,
            engine.get_total_questions()
        );

        let options: Vec<String> = engine
            .get_current_options()
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}) {option}", option_label(i)))
            .collect();
        let expected = engine
            .get_correct_answer_index()
            .and_then(|i| engine.get_current_options().get(i))
            .cloned()
            .unwrap_or_default();

        let Ok(choice) = Select::new(format!("{question}:").as_str(), options).raw_prompt() else {
            return false;
        };

        match engine.advance(option_label(choice.index)) {
            Some(true) => println!("\x1b[92m✓ {expected}\x1b[0m"),
            Some(false) => println!("\x1b[91m❌{expected}\x1b[0m"),
            None => break,
        }
    }

    true
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let cfg = kotoba::configuration()?;
    let store = crate::open_store(&cfg)?;

    let mut lessons = LessonManager::new(&store).get_all_lessons()?;
    if !args.lessons.is_empty() {
        lessons.retain(|lesson| args.lessons.contains(&lesson.id));
    }

    let settings = QuizSettings {
        prompt: args.prompt.unwrap_or(cfg.quiz.prompt),
        answer: args.answer.unwrap_or(cfg.quiz.answer),
        ..cfg.quiz
    };
    settings.validate()?;

    let mut engine = QuizEngine::new(&lessons, settings, crate::logger());
    engine.start();
    if engine.is_finished() {
        println!("quiz: no words to ask for!");
        return Ok(());
    }

    while ask_questions(&mut engine) {
        println!("\n{}", engine.get_results());

        match Confirm::new("Do you want to restart the quiz?")
            .with_default(false)
            .prompt()
        {
            Ok(true) => engine.start(),
            _ => break,
        }
    }

    Ok(())
}
