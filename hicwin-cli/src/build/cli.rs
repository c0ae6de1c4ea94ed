use clap::{Arg, ArgAction, Command, value_parser};

pub const BUILD_CMD: &str = "build";

pub fn create_build_cli() -> Command {
    Command::new(BUILD_CMD)
        .about("Sweep the window grid over a contact map and store accepted windows with their features.")
        .arg(
            Arg::new("storage")
                .required(true)
                .help("Storage directory; must already contain the contact-map archive"),
        )
        .arg(
            Arg::new("archive")
                .long("archive")
                .help("Contact-map archive inside the storage directory"),
        )
        .arg(
            Arg::new("resolution")
                .long("resolution")
                .value_parser(value_parser!(u32))
                .help("Bin size in base pairs"),
        )
        .arg(
            Arg::new("window_size")
                .long("window-size")
                .value_parser(value_parser!(usize))
                .help("Bins per window side"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML build config; flags given here override it"),
        )
        .arg(
            Arg::new("compartments")
                .long("compartments")
                .requires("compartment_resolution")
                .help("Eigenvector table for the compartment feature"),
        )
        .arg(
            Arg::new("compartment_resolution")
                .long("compartment-resolution")
                .value_parser(value_parser!(u32))
                .requires("compartments"),
        )
        .arg(
            Arg::new("component")
                .long("component")
                .requires("compartments")
                .help("Eigenvector column to use [default: E1]"),
        )
        .arg(Arg::new("fountains").long("fountains").help("Fountain score table"))
        .arg(Arg::new("stripes").long("stripes").help("Stripe cross-score table"))
        .arg(
            Arg::new("insulation")
                .long("insulation")
                .requires("insulation_window")
                .help("Insulation score table"),
        )
        .arg(
            Arg::new("insulation_window")
                .long("insulation-window")
                .requires("insulation")
                .help("Insulation column, e.g. log2_insulation_score_50000"),
        )
        .arg(
            Arg::new("insulation_integer")
                .long("insulation-integer")
                .action(ArgAction::SetTrue)
                .requires("insulation"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Replace an existing build"),
        )
}
