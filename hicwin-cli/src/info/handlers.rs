use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use hicwin_core::consts::META_FILE;
use hicwin_storage::StorageMeta;

pub fn run_info(matches: &ArgMatches) -> Result<()> {
    let storage = matches
        .get_one::<String>("storage")
        .context("A storage directory is required.")?;
    let meta_path = Path::new(storage).join(META_FILE);
    let meta = StorageMeta::from_file(&meta_path)
        .with_context(|| format!("No build metadata at {}", meta_path.display()))?;

    println!("archive:     {}", meta.cooler);
    println!("resolution:  {}", meta.resolution);
    println!("window size: {}", meta.window_size);
    println!("windows:     {} of {} slots", meta.length, meta.capacity());
    for entry in &meta.features {
        match &entry.stats {
            Some(stats) => println!(
                "feature {}: min={} max={} mean={} std={}",
                entry.descriptor.name, stats.min, stats.max, stats.mean, stats.std
            ),
            None => println!("feature {}: no statistics", entry.descriptor.name),
        }
    }

    Ok(())
}
