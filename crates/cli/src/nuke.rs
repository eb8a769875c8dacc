use inquire::Confirm;

pub fn run() -> anyhow::Result<()> {
    let path = kotoba::get_config_path()?;

    let ans = Confirm::new(
        format!(
            "Do you really want to remove '{}' and all the lessons in it?",
            path.display()
        )
        .as_str(),
    )
    .with_default(false)
    .prompt()?;

    if ans {
        std::fs::remove_dir_all(&path)?;
        println!("Removed '{}'.", path.display());
    } else {
        println!("Doing nothing...");
    }
    Ok(())
}
