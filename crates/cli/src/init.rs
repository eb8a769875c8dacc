use kotoba::LessonStore;

pub fn run() -> anyhow::Result<()> {
    let cfg = kotoba::configuration()?;
    let store = crate::open_store(&cfg)?;
    let names = store.get_lesson_names()?;

    println!(
        "Database ready at '{}' with {} lesson(s).",
        cfg.database_path()?.display(),
        names.len()
    );
    Ok(())
}
