use clap::{Arg, Command, value_parser};

pub const GET_CMD: &str = "get";

pub fn create_get_cli() -> Command {
    Command::new(GET_CMD)
        .about("Verify one stored window and print it as JSON.")
        .arg(Arg::new("storage").required(true))
        .arg(
            Arg::new("slot")
                .required(true)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("norm")
                .long("norm")
                .value_parser(["none", "minmax", "z"])
                .default_value("none")
                .help("Normalization applied to feature values"),
        )
}
