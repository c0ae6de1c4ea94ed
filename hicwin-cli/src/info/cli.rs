use clap::{Arg, Command};

pub const INFO_CMD: &str = "info";

pub fn create_info_cli() -> Command {
    Command::new(INFO_CMD)
        .about("Print the metadata of a built storage directory.")
        .arg(Arg::new("storage").required(true))
}
