//! `fireside onboard` — First-time setup.

use fireside_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Fireside — First-Time Setup");
    println!("===========================");
    println!();

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("  Config file already exists: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Wrote starter config: {}", config_path.display());
    }

    println!();
    println!("  Next steps:");
    println!("    1. Set FIRESIDE_API_KEY (or OPENAI_API_KEY) in your environment,");
    println!("       or add `api_key` to the config file.");
    println!("    2. Run `fireside chat` to start talking.");
    println!();
    Ok(())
}
