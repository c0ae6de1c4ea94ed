use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde_json::json;

use hicwin_features::NormKind;
use hicwin_storage::DiscStorage;

pub fn run_get(matches: &ArgMatches) -> Result<()> {
    let storage = matches
        .get_one::<String>("storage")
        .context("A storage directory is required.")?;
    let slot = *matches
        .get_one::<usize>("slot")
        .context("A slot is required.")?;
    let norm = match matches.get_one::<String>("norm") {
        Some(norm) => NormKind::from_str(norm)?,
        None => NormKind::None,
    };

    let storage = DiscStorage::open(storage)?;
    let window = storage.get(slot, norm)?;
    let map: Vec<Vec<f64>> = window.map.outer_iter().map(|row| row.to_vec()).collect();

    let out = json!({
        "idx": window.idx,
        "start_position": window.start_position,
        "end_position": window.end_position,
        "norm": norm.to_string(),
        "map": map,
        "features": window.features,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    Ok(())
}
