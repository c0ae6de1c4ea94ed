use clap::{Arg, Command};

pub const VERIFY_CMD: &str = "verify";

pub fn create_verify_cli() -> Command {
    Command::new(VERIFY_CMD)
        .about("Recompute every stored digest and report the first mismatch.")
        .arg(Arg::new("storage").required(true))
}
