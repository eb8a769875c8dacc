//! Vocabulary lessons for the 'kotoba' application: durable storage of
//! lessons, words and tags, plus the multiple-choice quiz that drills them.

pub mod cfg;
pub mod lesson;
pub mod manager;
mod migrate;
pub mod package;
pub mod quiz;
pub mod store;

pub use cfg::{configuration, get_config_path, Configuration};
pub use lesson::{Lesson, Word};
pub use manager::LessonManager;
pub use package::{LessonPackage, PackageKind};
pub use quiz::{Flashcard, QuizEngine, QuizSettings, QuizState, WordType};
pub use store::{LessonStore, SqliteStore};

/// Result type alias for kotoba operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for kotoba operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad configuration: {0}")]
    Config(String),

    #[error("could not parse the configuration file: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("bad lesson package: {0}")]
    Package(#[from] serde_json::Error),

    /// The given object has no store-assigned ID yet.
    #[error("invalid {0}; seems it has not been created before")]
    NotPersisted(&'static str),
}
