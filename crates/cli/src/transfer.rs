use std::path::Path;

use anyhow::Context;
use kotoba::{LessonManager, LessonPackage, PackageKind};

/// Read the lesson package at `file` and apply it to the database.
pub fn import(file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("import: could not read '{}'", file.display()))?;
    let package = LessonPackage::from_json(&raw)?;

    let cfg = kotoba::configuration()?;
    let store = crate::open_store(&cfg)?;
    let ids = LessonManager::new(&store).apply_package(&package)?;

    match package.kind {
        PackageKind::LessonCreated => println!("Imported {} lesson(s).", ids.len()),
        kind => println!("Applied {} package on {} lesson(s).", kind, package.lessons.len()),
    }
    Ok(())
}

/// Write every lesson into `file`, or the standard output if None is given.
pub fn export(file: Option<&Path>) -> anyhow::Result<()> {
    let cfg = kotoba::configuration()?;
    let store = crate::open_store(&cfg)?;
    let lessons = LessonManager::new(&store).get_all_lessons()?;

    let json = LessonPackage::new(PackageKind::LessonCreated, lessons).to_json()?;
    match file {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("export: could not write '{}'", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
