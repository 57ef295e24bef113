use anyhow::Result;
use collate::Config;

pub fn run(action: &crate::ConfigAction) -> Result<()> {
    use crate::ConfigAction;

    match action {
        ConfigAction::Show => show_config(),
        ConfigAction::Set { key, value } => set_config(key, value),
    }
}

fn show_config() -> Result<()> {
    let config = Config::load()?;
    let config_path = Config::default_path()?;
    let packing = &config.packing;

    println!("Config file: {}", config_path.display());
    println!();
    println!("[packing]");
    println!(
        "  mods_dir          = {}",
        packing
            .mods_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(build output directory)".to_string())
    );
    println!("  compression_level = {}", packing.compression_level);
    println!("  min_compress_size = {}", packing.min_compress_size);
    println!(
        "  worker_threads    = {}",
        match packing.worker_threads {
            0 => "0 (one per CPU)".to_string(),
            n => n.to_string(),
        }
    );
    println!();
    println!("Modify settings with: collate config set <key> <value>");

    Ok(())
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    if let Err(e) = config.set(key, value) {
        println!("Available keys:");
        println!("  packing.mods_dir");
        println!("  packing.compression_level");
        println!("  packing.min_compress_size");
        println!("  packing.worker_threads");
        return Err(e.into());
    }

    config.save()?;
    println!("Set {} = {}", key, value);

    Ok(())
}
