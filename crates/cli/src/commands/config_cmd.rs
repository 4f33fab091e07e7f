//! Show or initialize the configuration file.

use anyhow::Context;

use steward_config::RuntimeConfig;

pub fn run(init: bool) -> anyhow::Result<()> {
    let config_path = RuntimeConfig::config_dir().join("config.toml");

    if init {
        if config_path.exists() {
            println!("Config already exists at {}", config_path.display());
            return Ok(());
        }
        let config = RuntimeConfig::default();
        config.save_to(&config_path).context("writing default config")?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    let config = RuntimeConfig::load().context("loading configuration")?;
    let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
    println!("# {}", config_path.display());
    print!("{rendered}");
    Ok(())
}
