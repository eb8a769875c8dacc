use crate::lesson::Lesson;
use crate::package::{LessonPackage, PackageKind};
use crate::store::LessonStore;
use crate::{Error, Result};

/// Translates whole lessons into the row operations of a `LessonStore`.
pub struct LessonManager<'a, S: LessonStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LessonStore + ?Sized> LessonManager<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Stores the lesson, then each of its words in order, and then the tags
    /// of each word in order. Returns the ID of the new lesson. Nothing else is
    /// written if the lesson itself could not be stored.
    pub fn add_lesson(&self, lesson: &Lesson) -> Result<i64> {
        let lesson_id = self.store.add_lesson(&lesson.main_name, &lesson.sub_name)?;

        for word in &lesson.words {
            let word_id = self.store.add_word(lesson_id, word)?;
            for tag in &word.tags {
                self.store.add_tag(word_id, tag)?;
            }
        }

        Ok(lesson_id)
    }

    /// Adds the given lessons in order and returns their IDs. On failure the
    /// lessons added before the failing one are kept.
    pub fn add_lessons(&self, lessons: &[Lesson]) -> Result<Vec<i64>> {
        lessons.iter().map(|lesson| self.add_lesson(lesson)).collect()
    }

    /// Renames each lesson after its current `main_name` and `sub_name`. Words
    /// are not touched.
    pub fn rename_lessons(&self, lessons: &[Lesson]) -> Result<()> {
        for lesson in lessons {
            if !lesson.is_persisted() {
                return Err(Error::NotPersisted("lesson to rename"));
            }
            self.store
                .update_lesson(lesson.id, &lesson.main_name, &lesson.sub_name)?;
        }
        Ok(())
    }

    pub fn delete_lessons(&self, lessons: &[Lesson]) -> Result<()> {
        for lesson in lessons {
            if !lesson.is_persisted() {
                return Err(Error::NotPersisted("lesson to delete"));
            }
            self.store.delete_lesson(lesson.id)?;
        }
        Ok(())
    }

    pub fn get_all_lessons(&self) -> Result<Vec<Lesson>> {
        self.store.get_all_lessons()
    }

    /// Applies the change described by `package`. Returns the IDs of the
    /// created lessons, which is empty for any other kind of package.
    pub fn apply_package(&self, package: &LessonPackage) -> Result<Vec<i64>> {
        match package.kind {
            PackageKind::LessonCreated => self.add_lessons(&package.lessons),
            PackageKind::LessonModified => {
                self.rename_lessons(&package.lessons)?;
                Ok(vec![])
            }
            PackageKind::LessonDeleted => {
                self.delete_lessons(&package.lessons)?;
                Ok(vec![])
            }
        }
    }
}
