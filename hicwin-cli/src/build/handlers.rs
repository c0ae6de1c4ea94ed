use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use log::info;

use hicwin_core::consts::DEFAULT_WINDOW_SIZE;
use hicwin_core::models::{ContactSource, DenseContactArchive};
use hicwin_features::Feature;
use hicwin_storage::{BuildConfig, DiscStorage, FeatureConfig};

/// Merge the optional config file with the flags given on the command line.
fn resolve_config(matches: &ArgMatches) -> Result<BuildConfig> {
    let base = match matches.get_one::<String>("config") {
        Some(path) => Some(
            BuildConfig::try_from(Path::new(path))
                .with_context(|| format!("Failed to read build config {}", path))?,
        ),
        None => None,
    };

    let archive = match (matches.get_one::<String>("archive"), &base) {
        (Some(archive), _) => archive.clone(),
        (None, Some(config)) => config.archive.clone(),
        (None, None) => bail!("--archive is required without --config"),
    };
    let resolution = match (matches.get_one::<u32>("resolution"), &base) {
        (Some(resolution), _) => *resolution,
        (None, Some(config)) => config.resolution,
        (None, None) => bail!("--resolution is required without --config"),
    };
    let window_size = matches
        .get_one::<usize>("window_size")
        .copied()
        .or(base.as_ref().map(|c| c.window_size))
        .unwrap_or(DEFAULT_WINDOW_SIZE);
    let force_rewrite =
        matches.get_flag("force") || base.as_ref().map(|c| c.force_rewrite).unwrap_or(false);

    let mut features = base.map(|c| c.features).unwrap_or_default();
    if let Some(file) = matches.get_one::<String>("compartments") {
        let Some(resolution) = matches.get_one::<u32>("compartment_resolution") else {
            bail!("--compartments requires --compartment-resolution");
        };
        features.push(FeatureConfig::Compartment {
            eigvec_file: file.clone(),
            compartment_resolution: *resolution,
            component: matches.get_one::<String>("component").cloned(),
        });
    }
    if let Some(file) = matches.get_one::<String>("fountains") {
        features.push(FeatureConfig::Fountains {
            fountains_file: file.clone(),
        });
    }
    if let Some(file) = matches.get_one::<String>("stripes") {
        features.push(FeatureConfig::Stripes {
            stripes_file: file.clone(),
        });
    }
    if let Some(file) = matches.get_one::<String>("insulation") {
        let Some(window) = matches.get_one::<String>("insulation_window") else {
            bail!("--insulation requires --insulation-window");
        };
        features.push(FeatureConfig::Insulation {
            insulation_file: file.clone(),
            insulation_window: window.clone(),
            as_integer: matches.get_flag("insulation_integer"),
            name: None,
        });
    }

    let config = BuildConfig {
        archive,
        resolution,
        window_size,
        force_rewrite,
        features,
    };
    config.validate()?;
    Ok(config)
}

pub fn run_build(matches: &ArgMatches) -> Result<()> {
    let storage_path = matches
        .get_one::<String>("storage")
        .context("A storage directory is required.")?;
    let storage_path = PathBuf::from(storage_path);
    let config = resolve_config(matches)?;

    let mut storage = DiscStorage::new(&storage_path, &config.archive, config.force_rewrite)?;

    let archive = DenseContactArchive::new(storage_path.join(&config.archive));
    let source = archive.open(config.resolution)?;
    info!(
        "Opened {} at {}bp ({} bins)",
        config.archive,
        config.resolution,
        source.n_bins()
    );

    let features = config
        .features
        .iter()
        .map(|f| f.load(&storage_path, source.bins()))
        .collect::<Result<Vec<Box<dyn Feature>>, _>>()?;

    storage.generate(&source, config.window_size, features, config.force_rewrite)?;

    println!(
        "Stored {} windows of {}x{} bins in {}",
        storage.size(),
        config.window_size,
        config.window_size,
        storage_path.display()
    );

    Ok(())
}
