//! Durable storage for lessons, words and tags.
//!
//! The database has three tables:
//! - lessons(id, main_name, sub_name)
//! - words(id, lesson_id, kana, translation, romaji, example_sentence)
//! - tags(id, word_id, tag)

use std::path::Path;

use rusqlite::{params, Connection, Row};
use tracing::{dispatcher, error, info, warn, Dispatch};

use crate::lesson::{display_name, Lesson, Word};
use crate::{migrate, Result};

/// Row-level operations over lessons, words and tags. Every mutation is its
/// own unit of work; nothing spans multiple calls.
pub trait LessonStore {
    /// Inserts a new lesson and returns the ID assigned to it.
    fn add_lesson(&self, main_name: &str, sub_name: &str) -> Result<i64>;

    /// Inserts `word` under `lesson_id` and returns the ID assigned to it. The
    /// tags of `word` are not stored; see `add_tag`. The existence of the
    /// lesson is not checked.
    fn add_word(&self, lesson_id: i64, word: &Word) -> Result<i64>;

    /// Attaches `tag` to the word identified by `word_id`.
    fn add_tag(&self, word_id: i64, tag: &str) -> Result<()>;

    fn update_lesson(&self, lesson_id: i64, main_name: &str, sub_name: &str) -> Result<()>;

    /// Replaces the columns of the word identified by `word_id` with the ones
    /// from `word`. Tags are left untouched.
    fn update_word(&self, word_id: i64, word: &Word) -> Result<()>;

    /// Removes the lesson together with its words and their tags.
    fn delete_lesson(&self, lesson_id: i64) -> Result<()>;

    /// Removes the word together with its tags.
    fn delete_word(&self, word_id: i64) -> Result<()>;

    /// Returns the "main - sub" name of every lesson in insertion order.
    fn get_lesson_names(&self) -> Result<Vec<String>>;

    /// Returns the words of the given lesson with all their tags. An unknown
    /// lesson simply has no words.
    fn get_words_in_lesson(&self, lesson_id: i64) -> Result<Vec<Word>>;

    /// Returns every lesson with its words and their tags.
    fn get_all_lessons(&self) -> Result<Vec<Lesson>>;
}

/// SQLite-backed lesson store. It is meant to be opened once and used from a
/// single thread for the lifetime of the process.
pub struct SqliteStore {
    conn: Connection,
    logger: Dispatch,
}

impl SqliteStore {
    /// Open the database at `path`, creating both the file and its schema if
    /// needed. Every event from this store is sent to `logger`.
    pub fn open(path: &Path, logger: Dispatch) -> Result<Self> {
        dispatcher::with_default(&logger, || {
            let conn = match Connection::open(path) {
                Ok(conn) => conn,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "could not open the database");
                    return Err(e.into());
                }
            };
            info!(path = %path.display(), "opened database");

            Self::initialize(conn, logger.clone())
        })
    }

    /// Open an in-memory database.
    pub fn open_in_memory(logger: Dispatch) -> Result<Self> {
        dispatcher::with_default(&logger, || {
            let conn = match Connection::open_in_memory() {
                Ok(conn) => conn,
                Err(e) => {
                    error!(error = %e, "could not open an in-memory database");
                    return Err(e.into());
                }
            };

            Self::initialize(conn, logger.clone())
        })
    }

    fn initialize(conn: Connection, logger: Dispatch) -> Result<Self> {
        // References between tables are logical only: words may point to a
        // lesson that does not exist, and deletes cascade by hand.
        if let Err(e) = conn.pragma_update(None, "foreign_keys", false) {
            error!(error = %e, "could not disable foreign key enforcement");
            return Err(e.into());
        }
        info!("foreign key enforcement disabled");

        match migrate::init(&conn) {
            Ok(_) => info!("initialized database schema"),
            Err(e) => {
                error!(error = %e, "could not initialize the database schema");
                return Err(e.into());
            }
        }

        Ok(Self { conn, logger })
    }

    // Run `f` with this store's logger as the default dispatcher.
    fn logged<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        dispatcher::with_default(&self.logger, || f(&self.conn))
    }
}

impl LessonStore for SqliteStore {
    fn add_lesson(&self, main_name: &str, sub_name: &str) -> Result<i64> {
        self.logged(|conn| {
            match conn.execute(
                "INSERT INTO lessons (main_name, sub_name) VALUES (?1, ?2)",
                params![main_name, sub_name],
            ) {
                Ok(_) => {
                    let id = conn.last_insert_rowid();
                    info!(lesson_id = id, main_name, sub_name, "added lesson");
                    Ok(id)
                }
                Err(e) => {
                    error!(main_name, sub_name, error = %e, "could not add lesson");
                    Err(e.into())
                }
            }
        })
    }

    fn add_word(&self, lesson_id: i64, word: &Word) -> Result<i64> {
        self.logged(|conn| {
            match conn.execute(
                "INSERT INTO words (lesson_id, kana, translation, romaji, example_sentence) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    lesson_id,
                    word.kana,
                    word.translation,
                    word.romaji,
                    word.example_sentence
                ],
            ) {
                Ok(_) => {
                    let id = conn.last_insert_rowid();
                    info!(word_id = id, lesson_id, "added word");
                    Ok(id)
                }
                Err(e) => {
                    error!(lesson_id, kana = %word.kana, error = %e, "could not add word");
                    Err(e.into())
                }
            }
        })
    }

    fn add_tag(&self, word_id: i64, tag: &str) -> Result<()> {
        self.logged(|conn| {
            match conn.execute(
                "INSERT INTO tags (word_id, tag) VALUES (?1, ?2)",
                params![word_id, tag],
            ) {
                Ok(_) => {
                    info!(word_id, tag, "added tag");
                    Ok(())
                }
                Err(e) => {
                    error!(word_id, tag, error = %e, "could not add tag");
                    Err(e.into())
                }
            }
        })
    }

    fn update_lesson(&self, lesson_id: i64, main_name: &str, sub_name: &str) -> Result<()> {
        self.logged(|conn| {
            let res = conn.execute(
                "UPDATE lessons SET main_name = ?2, sub_name = ?3 WHERE id = ?1",
                params![lesson_id, main_name, sub_name],
            );
            check_affected("update lesson", lesson_id, res)
        })
    }

    fn update_word(&self, word_id: i64, word: &Word) -> Result<()> {
        self.logged(|conn| {
            let res = conn.execute(
                "UPDATE words \
                 SET kana = ?2, translation = ?3, romaji = ?4, example_sentence = ?5 \
                 WHERE id = ?1",
                params![
                    word_id,
                    word.kana,
                    word.translation,
                    word.romaji,
                    word.example_sentence
                ],
            );
            check_affected("update word", word_id, res)
        })
    }

    fn delete_lesson(&self, lesson_id: i64) -> Result<()> {
        self.logged(|conn| match delete_lesson_rows(conn, lesson_id) {
            Ok((0, _, _)) => {
                warn!(op = "delete lesson", id = lesson_id, "no rows affected");
                Ok(())
            }
            Ok((_, words, tags)) => {
                info!(id = lesson_id, words, tags, "deleted lesson");
                Ok(())
            }
            Err(e) => {
                error!(op = "delete lesson", id = lesson_id, error = %e, "failed");
                Err(e.into())
            }
        })
    }

    fn delete_word(&self, word_id: i64) -> Result<()> {
        self.logged(|conn| {
            let res = delete_word_rows(conn, word_id);
            check_affected("delete word", word_id, res)
        })
    }

    fn get_lesson_names(&self) -> Result<Vec<String>> {
        self.logged(|conn| {
            select_lesson_names(conn).map_err(|e| {
                error!(error = %e, "could not fetch lesson names");
                e.into()
            })
        })
    }

    fn get_words_in_lesson(&self, lesson_id: i64) -> Result<Vec<Word>> {
        self.logged(|conn| {
            select_words_in_lesson(conn, lesson_id).map_err(|e| {
                error!(lesson_id, error = %e, "could not fetch words");
                e.into()
            })
        })
    }

    fn get_all_lessons(&self) -> Result<Vec<Lesson>> {
        self.logged(|conn| {
            select_all_lessons(conn).map_err(|e| {
                error!(error = %e, "could not fetch lessons");
                e.into()
            })
        })
    }
}

// Log the outcome of a statement which targets a single row by its ID. Zero
// affected rows is not an error.
fn check_affected(op: &'static str, id: i64, result: rusqlite::Result<usize>) -> Result<()> {
    match result {
        Ok(0) => {
            warn!(op, id, "no rows affected");
            Ok(())
        }
        Ok(_) => {
            info!(op, id, "succeeded");
            Ok(())
        }
        Err(e) => {
            error!(op, id, error = %e, "failed");
            Err(e.into())
        }
    }
}

// Returns how many (lessons, words, tags) rows were removed.
fn delete_lesson_rows(
    conn: &Connection,
    lesson_id: i64,
) -> rusqlite::Result<(usize, usize, usize)> {
    let tx = conn.unchecked_transaction()?;
    let tags = tx.execute(
        "DELETE FROM tags WHERE word_id IN (SELECT id FROM words WHERE lesson_id = ?1)",
        [lesson_id],
    )?;
    let words = tx.execute("DELETE FROM words WHERE lesson_id = ?1", [lesson_id])?;
    let lessons = tx.execute("DELETE FROM lessons WHERE id = ?1", [lesson_id])?;
    tx.commit()?;

    Ok((lessons, words, tags))
}

// Returns how many word rows were removed.
fn delete_word_rows(conn: &Connection, word_id: i64) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM tags WHERE word_id = ?1", [word_id])?;
    let words = tx.execute("DELETE FROM words WHERE id = ?1", [word_id])?;
    tx.commit()?;

    Ok(words)
}

fn select_lesson_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT main_name, sub_name FROM lessons ORDER BY id")?;
    let names = stmt
        .query_map([], |row| {
            let main_name: String = row.get(0)?;
            let sub_name: String = row.get(1)?;
            Ok(display_name(&main_name, &sub_name))
        })?
        .collect();
    names
}

fn select_words_in_lesson(conn: &Connection, lesson_id: i64) -> rusqlite::Result<Vec<Word>> {
    let mut stmt = conn.prepare(
        "SELECT w.id, w.kana, w.translation, w.romaji, w.example_sentence, t.tag \
         FROM words w \
         LEFT JOIN tags t ON t.word_id = w.id \
         WHERE w.lesson_id = ?1 \
         ORDER BY w.id, t.id",
    )?;

    let mut words = vec![];
    for row in stmt.query_map([lesson_id], |row| joined_word(row, 0))? {
        push_joined(&mut words, row?);
    }
    Ok(words)
}

fn select_all_lessons(conn: &Connection) -> rusqlite::Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.main_name, l.sub_name, \
                w.id, w.kana, w.translation, w.romaji, w.example_sentence, t.tag \
         FROM lessons l \
         LEFT JOIN words w ON w.lesson_id = l.id \
         LEFT JOIN tags t ON t.word_id = w.id \
         ORDER BY l.id, w.id, t.id",
    )?;
    let rows = stmt.query_map([], |row| {
        let lesson = Lesson {
            id: row.get(0)?,
            main_name: row.get(1)?,
            sub_name: row.get(2)?,
            words: vec![],
        };
        Ok((lesson, joined_word(row, 3)?))
    })?;

    let mut lessons: Vec<Lesson> = vec![];
    for row in rows {
        let (lesson, word) = row?;
        if lessons.last().map(|l| l.id) != Some(lesson.id) {
            lessons.push(lesson);
        }
        if let Some(current) = lessons.last_mut() {
            push_joined(&mut current.words, word);
        }
    }
    Ok(lessons)
}

// A word/tag pair as returned by a LEFT JOIN. Every column may be NULL when
// the lesson has no words or the word has no tags.
struct JoinedWord {
    id: Option<i64>,
    kana: Option<String>,
    translation: Option<String>,
    romaji: Option<String>,
    example_sentence: Option<String>,
    tag: Option<String>,
}

fn joined_word(row: &Row<'_>, offset: usize) -> rusqlite::Result<JoinedWord> {
    Ok(JoinedWord {
        id: row.get(offset)?,
        kana: row.get(offset + 1)?,
        translation: row.get(offset + 2)?,
        romaji: row.get(offset + 3)?,
        example_sentence: row.get(offset + 4)?,
        tag: row.get(offset + 5)?,
    })
}

// Fold a joined row into `words`. Rows are expected to be sorted by word ID so
// all the tags of a word come together.
fn push_joined(words: &mut Vec<Word>, row: JoinedWord) {
    let Some(id) = row.id else {
        return;
    };

    if words.last().map(|w| w.id) != Some(id) {
        words.push(Word {
            id,
            kana: row.kana.unwrap_or_default(),
            translation: row.translation.unwrap_or_default(),
            romaji: row.romaji,
            example_sentence: row.example_sentence,
            tags: vec![],
        });
    }
    if let (Some(tag), Some(word)) = (row.tag, words.last_mut()) {
        word.tags.push(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capturing_logger() -> (Dispatch, Captured) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();

        (Dispatch::new(subscriber), captured)
    }

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory(Dispatch::none()).unwrap()
    }

    fn hello() -> Word {
        Word::new("こんにちは", "hello")
            .with_romaji("konnichiwa")
            .with_tags(&["greeting"])
    }

    fn count(store: &SqliteStore, table: &str) -> i64 {
        store
            .conn
            .query_row(format!("SELECT COUNT(*) FROM {table}").as_str(), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_add_lesson() {
        let store = store();

        let id = store.add_lesson("Greetings", "Basics").unwrap();
        assert!(id > 0);

        let lessons = store.get_all_lessons().unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].id, id);
        assert_eq!(lessons[0].main_name, "Greetings");
        assert_eq!(lessons[0].sub_name, "Basics");
        assert!(lessons[0].words.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let store = store();

        let first = store.add_lesson("a", "b").unwrap();
        let second = store.add_lesson("a", "b").unwrap();
        assert_ne!(first, second);

        let w1 = store.add_word(first, &hello()).unwrap();
        let w2 = store.add_word(first, &hello()).unwrap();
        assert_ne!(w1, w2);
    }

    #[test]
    fn test_greetings_lesson() {
        let store = store();

        let lesson_id = store.add_lesson("Greetings", "Basics").unwrap();
        let word = hello();
        let word_id = store.add_word(lesson_id, &word).unwrap();
        for tag in &word.tags {
            store.add_tag(word_id, tag).unwrap();
        }

        let lessons = store.get_all_lessons().unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(
            lessons[0].words,
            vec![Word {
                id: word_id,
                ..hello()
            }]
        );
        assert_eq!(lessons[0].words[0].tags, vec!["greeting"]);
    }

    #[test]
    fn test_words_in_lesson() {
        let store = store();

        let lesson_id = store.add_lesson("Food", "Fruit").unwrap();
        let other_id = store.add_lesson("Food", "Vegetables").unwrap();

        let apple = Word::new("りんご", "apple")
            .with_romaji("ringo")
            .with_example("りんごを食べます。");
        let apple_id = store.add_word(lesson_id, &apple).unwrap();
        store.add_tag(apple_id, "fruit").unwrap();
        store.add_tag(apple_id, "red").unwrap();

        let peach = Word::new("もも", "peach");
        let peach_id = store.add_word(lesson_id, &peach).unwrap();

        store
            .add_word(other_id, &Word::new("だいこん", "radish"))
            .unwrap();

        let words = store.get_words_in_lesson(lesson_id).unwrap();
        assert_eq!(
            words,
            vec![
                Word {
                    id: apple_id,
                    tags: vec!["fruit".to_string(), "red".to_string()],
                    ..apple
                },
                Word {
                    id: peach_id,
                    ..peach
                },
            ]
        );
    }

    #[test]
    fn test_words_in_unknown_lesson() {
        let store = store();
        assert!(store.get_words_in_lesson(42).unwrap().is_empty());
    }

    #[test]
    fn test_lesson_names() {
        let store = store();

        store.add_lesson("Greetings", "Basics").unwrap();
        store.add_lesson("Numbers", "1-10").unwrap();

        assert_eq!(
            store.get_lesson_names().unwrap(),
            vec!["Greetings - Basics", "Numbers - 1-10"]
        );
    }

    #[test]
    fn test_update_lesson() {
        let store = store();

        let id = store.add_lesson("Greetings", "Basics").unwrap();
        let word_id = store.add_word(id, &hello()).unwrap();

        store.update_lesson(id, "Hello", "Advanced").unwrap();

        let lessons = store.get_all_lessons().unwrap();
        assert_eq!(lessons[0].main_name, "Hello");
        assert_eq!(lessons[0].sub_name, "Advanced");
        assert_eq!(lessons[0].words[0].id, word_id);
    }

    #[test]
    fn test_update_word() {
        let store = store();

        let lesson_id = store.add_lesson("Greetings", "Basics").unwrap();
        let word_id = store.add_word(lesson_id, &hello()).unwrap();
        store.add_tag(word_id, "greeting").unwrap();

        let updated = Word::new("こんばんは", "good evening").with_romaji("konbanwa");
        store.update_word(word_id, &updated).unwrap();

        let words = store.get_words_in_lesson(lesson_id).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].kana, "こんばんは");
        assert_eq!(words[0].translation, "good evening");
        assert_eq!(words[0].romaji.as_deref(), Some("konbanwa"));
        assert_eq!(words[0].example_sentence, None);
        assert_eq!(words[0].tags, vec!["greeting"]);
    }

    #[test]
    fn test_missing_rows_are_not_errors() {
        let (logger, captured) = capturing_logger();
        let store = SqliteStore::open_in_memory(logger).unwrap();

        store.update_lesson(7, "a", "b").unwrap();
        store.update_word(7, &hello()).unwrap();
        store.delete_word(7).unwrap();
        store.delete_lesson(7).unwrap();

        let logs = captured.contents();
        assert_eq!(logs.matches("no rows affected").count(), 4);
        assert!(logs.contains("WARN"));
    }

    #[test]
    fn test_delete_lesson_cascades() {
        let store = store();

        let lesson_id = store.add_lesson("Greetings", "Basics").unwrap();
        let kept_id = store.add_lesson("Numbers", "1-10").unwrap();
        let word_id = store.add_word(lesson_id, &hello()).unwrap();
        store.add_tag(word_id, "greeting").unwrap();
        let kept_word = store.add_word(kept_id, &Word::new("いち", "one")).unwrap();
        store.add_tag(kept_word, "number").unwrap();

        store.delete_lesson(lesson_id).unwrap();

        let lessons = store.get_all_lessons().unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].id, kept_id);
        assert_eq!(count(&store, "words"), 1);
        assert_eq!(count(&store, "tags"), 1);
    }

    #[test]
    fn test_delete_word_cascades() {
        let store = store();

        let lesson_id = store.add_lesson("Greetings", "Basics").unwrap();
        let word_id = store.add_word(lesson_id, &hello()).unwrap();
        store.add_tag(word_id, "greeting").unwrap();
        store.add_tag(word_id, "polite").unwrap();

        store.delete_word(word_id).unwrap();

        assert!(store.get_words_in_lesson(lesson_id).unwrap().is_empty());
        assert_eq!(count(&store, "tags"), 0);
        assert_eq!(store.get_all_lessons().unwrap().len(), 1);
    }

    #[test]
    fn test_failures_are_logged_and_returned() {
        let (logger, captured) = capturing_logger();
        let store = SqliteStore::open_in_memory(logger).unwrap();
        let lesson_id = store.add_lesson("Greetings", "Basics").unwrap();
        let word_id = store.add_word(lesson_id, &hello()).unwrap();

        store.conn.execute("DROP TABLE tags", []).unwrap();

        assert!(store.add_tag(word_id, "greeting").is_err());
        assert!(store.get_all_lessons().is_err());

        let logs = captured.contents();
        assert!(logs.contains("added lesson"));
        assert!(logs.contains("could not add tag"));
        assert!(logs.contains("could not fetch lessons"));
        assert!(logs.contains("ERROR"));
    }

    #[test]
    fn test_add_word_to_unknown_lesson() {
        let store = store();

        let enforced: bool = store
            .conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert!(!enforced);

        let word_id = store.add_word(99, &hello()).unwrap();
        assert!(word_id > 0);
        store.add_tag(word_id, "greeting").unwrap();
        store.add_tag(12345, "orphan").unwrap();
        assert_eq!(store.get_words_in_lesson(99).unwrap().len(), 1);
        assert!(store.get_all_lessons().unwrap().is_empty());
    }
}
