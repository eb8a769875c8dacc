use serde::{Deserialize, Serialize};

/// A vocabulary entry as represented in the 'words' table, together with the
/// labels stored for it in the 'tags' table.
///
/// An `id` of 0 means that the word has not been stored yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub id: i64,
    pub kana: String,
    pub translation: String,
    #[serde(default)]
    pub romaji: Option<String>,
    #[serde(default)]
    pub example_sentence: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Word {
    pub fn new(kana: &str, translation: &str) -> Word {
        Word {
            kana: kana.to_string(),
            translation: translation.to_string(),
            ..Word::default()
        }
    }

    pub fn with_romaji(mut self, romaji: &str) -> Word {
        self.romaji = Some(romaji.to_string());
        self
    }

    pub fn with_example(mut self, sentence: &str) -> Word {
        self.example_sentence = Some(sentence.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Word {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// A named group of words. The display name is "main - sub".
///
/// An `id` of 0 means that the lesson has not been stored yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default)]
    pub id: i64,
    pub main_name: String,
    pub sub_name: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Lesson {
    pub fn new(main_name: &str, sub_name: &str) -> Lesson {
        Lesson {
            main_name: main_name.to_string(),
            sub_name: sub_name.to_string(),
            ..Lesson::default()
        }
    }

    /// Returns true if this lesson carries an ID assigned by the store.
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    pub fn display_name(&self) -> String {
        display_name(&self.main_name, &self.sub_name)
    }
}

/// Returns the name shown for a lesson given its two name parts.
pub fn display_name(main_name: &str, sub_name: &str) -> String {
    format!("{main_name} - {sub_name}")
}

// Needed for inquire's (Multi)Select.
impl std::fmt::Display for Lesson {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&display_name(&self.main_name, &self.sub_name))
    }
}
