use serde::{Deserialize, Serialize};

use crate::lesson::Lesson;
use crate::Result;

/// What happened to the lessons carried by a package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    LessonCreated,
    LessonModified,
    LessonDeleted,
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::LessonCreated => write!(f, "created"),
            Self::LessonModified => write!(f, "modified"),
            Self::LessonDeleted => write!(f, "deleted"),
        }
    }
}

/// A batch of lessons moved between the front end and the lesson manager, or
/// in and out of the application as a JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPackage {
    pub kind: PackageKind,
    pub lessons: Vec<Lesson>,
}

impl LessonPackage {
    pub fn new(kind: PackageKind, lessons: Vec<Lesson>) -> LessonPackage {
        LessonPackage { kind, lessons }
    }

    pub fn from_json(raw: &str) -> Result<LessonPackage> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_from_json() {
        let raw = r#"{
            "kind": "lesson_created",
            "lessons": [{
                "main_name": "Greetings",
                "sub_name": "Basics",
                "words": [{
                    "kana": "こんにちは",
                    "translation": "hello",
                    "romaji": "konnichiwa",
                    "tags": ["greeting"]
                }]
            }]
        }"#;

        let package = LessonPackage::from_json(raw).unwrap();

        assert_eq!(package.kind, PackageKind::LessonCreated);
        assert_eq!(package.lessons.len(), 1);
        assert_eq!(package.lessons[0].id, 0);
        assert_eq!(package.lessons[0].display_name(), "Greetings - Basics");
        assert_eq!(package.lessons[0].words[0].romaji.as_deref(), Some("konnichiwa"));
        assert_eq!(package.lessons[0].words[0].tags, vec!["greeting"]);
    }

    #[test]
    fn test_to_json_keeps_ids() {
        let mut lesson = Lesson::new("Numbers", "1-10");
        lesson.id = 3;
        let package = LessonPackage::new(PackageKind::LessonDeleted, vec![lesson]);

        let json = package.to_json().unwrap();
        assert!(json.contains(r#""kind": "lesson_deleted""#));
        assert_eq!(LessonPackage::from_json(&json).unwrap(), package);
    }

    #[test]
    fn test_unknown_kind() {
        let res = LessonPackage::from_json(r#"{"kind": "lesson_renamed", "lessons": []}"#);
        assert!(matches!(res, Err(Error::Package(_))));
    }
}
