use anyhow::{Context, Result};
use clap::ArgMatches;

use hicwin_storage::DiscStorage;

pub fn run_verify(matches: &ArgMatches) -> Result<()> {
    let storage = matches
        .get_one::<String>("storage")
        .context("A storage directory is required.")?;
    let storage = DiscStorage::open(storage)?;
    storage
        .verify_all()
        .with_context(|| format!("Verification of {} failed", storage.root().display()))?;

    println!(
        "{} windows and {} features verified",
        storage.size(),
        storage.features().len()
    );
    Ok(())
}
