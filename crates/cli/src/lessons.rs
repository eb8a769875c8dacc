use anyhow::anyhow;
use clap::Subcommand;
use inquire::Confirm;
use kotoba::{Lesson, LessonManager, LessonStore, SqliteStore, Word};

#[derive(Subcommand)]
pub enum Command {
    /// List the lessons from the database.
    Ls,
    /// Show the words from a lesson.
    Show { id: i64 },
    /// Rename a lesson.
    Rename {
        id: i64,
        main_name: String,
        sub_name: String,
    },
    /// Remove a lesson and its words from the database.
    Rm { id: i64 },
}

fn find_lesson(manager: &LessonManager<SqliteStore>, id: i64) -> anyhow::Result<Lesson> {
    manager
        .get_all_lessons()?
        .into_iter()
        .find(|lesson| lesson.id == id)
        .ok_or_else(|| anyhow!("lessons: no lesson with ID {id}"))
}

fn ls(manager: &LessonManager<SqliteStore>) -> anyhow::Result<()> {
    for lesson in manager.get_all_lessons()? {
        println!("{}\t{} ({} words)", lesson.id, lesson, lesson.words.len());
    }
    Ok(())
}

fn print_word(word: &Word) {
    match &word.romaji {
        Some(romaji) => println!("{} ({}): {}", word.kana, romaji, word.translation),
        None => println!("{}: {}", word.kana, word.translation),
    }
    if let Some(sentence) = &word.example_sentence {
        println!("\t{sentence}");
    }
    if !word.tags.is_empty() {
        println!("\ttags: {}", word.tags.join(", "));
    }
}

fn show(store: &SqliteStore, id: i64) -> anyhow::Result<()> {
    let words = store.get_words_in_lesson(id)?;
    if words.is_empty() {
        println!("No words in this lesson.");
    }
    for word in &words {
        print_word(word);
    }
    Ok(())
}

fn rename(
    manager: &LessonManager<SqliteStore>,
    id: i64,
    main_name: String,
    sub_name: String,
) -> anyhow::Result<()> {
    let mut lesson = find_lesson(manager, id)?;
    let old = lesson.display_name();

    lesson.main_name = main_name;
    lesson.sub_name = sub_name;
    manager.rename_lessons(std::slice::from_ref(&lesson))?;

    println!("Renamed '{old}' to '{lesson}'.");
    Ok(())
}

fn rm(manager: &LessonManager<SqliteStore>, id: i64) -> anyhow::Result<()> {
    let lesson = find_lesson(manager, id)?;

    let ans = Confirm::new(
        format!("Do you really want to remove '{lesson}' from the database?").as_str(),
    )
    .with_default(false)
    .prompt()?;

    if ans {
        manager.delete_lessons(std::slice::from_ref(&lesson))?;
        println!("Removed '{lesson}' from the database!");
    } else {
        println!("Doing nothing...");
    }
    Ok(())
}

pub fn run(command: Command) -> anyhow::Result<()> {
    let cfg = kotoba::configuration()?;
    let store = crate::open_store(&cfg)?;
    let manager = LessonManager::new(&store);

    match command {
        Command::Ls => ls(&manager),
        Command::Show { id } => show(&store, id),
        Command::Rename {
            id,
            main_name,
            sub_name,
        } => rename(&manager, id, main_name, sub_name),
        Command::Rm { id } => rm(&manager, id),
    }
}
