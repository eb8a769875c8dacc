use rusqlite::{Connection, Result};

/// Use the given `connection` in order to initialize the database. Calling it
/// on an already initialized database is a no-op.
pub fn init(connection: &Connection) -> Result<()> {
    connection.execute(
        r#"
CREATE TABLE IF NOT EXISTS "lessons" (
       "id" integer PRIMARY KEY AUTOINCREMENT NOT NULL,
       "main_name" text NOT NULL,
       "sub_name" text NOT NULL
);
"#,
        (),
    )?;

    connection.execute(
        r#"
CREATE TABLE IF NOT EXISTS "words" (
       "id" integer PRIMARY KEY AUTOINCREMENT NOT NULL,
       "lesson_id" integer,
       "kana" text NOT NULL,
       "translation" text NOT NULL,
       "romaji" text,
       "example_sentence" text,

       FOREIGN KEY ("lesson_id") REFERENCES "lessons" ("id")
);
"#,
        (),
    )?;

    connection.execute(
        r#"
CREATE INDEX IF NOT EXISTS "index_words_on_lesson_id" ON "words" ("lesson_id");
"#,
        (),
    )?;

    connection.execute(
        r#"
CREATE TABLE IF NOT EXISTS "tags" (
       "id" integer PRIMARY KEY AUTOINCREMENT NOT NULL,
       "word_id" integer,
       "tag" text NOT NULL,

       FOREIGN KEY ("word_id") REFERENCES "words" ("id")
);
"#,
        (),
    )?;

    connection.execute(
        r#"
CREATE INDEX IF NOT EXISTS "index_tags_on_word_id" ON "tags" ("word_id");
"#,
        (),
    )?;

    Ok(())
}
