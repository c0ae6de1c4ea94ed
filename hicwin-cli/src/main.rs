mod build;
mod get;
mod info;
mod verify;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "hicwin";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Cut a contact map into verified, memory-mapped windows with aligned feature tracks.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase logging verbosity (-v info, -vv debug)"),
        )
        .subcommand(build::cli::create_build_cli())
        .subcommand(info::cli::create_info_cli())
        .subcommand(get::cli::create_get_cli())
        .subcommand(verify::cli::create_verify_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    env_logger::Builder::new()
        .filter_level(match matches.get_count("verbose") {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    match matches.subcommand() {
        //
        // BUILD
        //
        Some((build::cli::BUILD_CMD, matches)) => {
            build::handlers::run_build(matches)?;
        }

        //
        // INFO
        //
        Some((info::cli::INFO_CMD, matches)) => {
            info::handlers::run_info(matches)?;
        }

        //
        // GET
        //
        Some((get::cli::GET_CMD, matches)) => {
            get::handlers::run_get(matches)?;
        }

        //
        // VERIFY
        //
        Some((verify::cli::VERIFY_CMD, matches)) => {
            verify::handlers::run_verify(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_parse_build() {
        let matches = build_parser()
            .try_get_matches_from([
                "hicwin",
                "build",
                "store",
                "--archive",
                "sample.mcool",
                "--resolution",
                "10000",
                "--stripes",
                "stripes.tsv",
                "-vv",
            ])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, build::cli::BUILD_CMD);
        assert_eq!(sub.get_one::<u32>("resolution"), Some(&10000));
        assert_eq!(sub.get_one::<usize>("window_size"), None);
    }

    #[rstest]
    fn test_insulation_window_requires_a_file() {
        let result = build_parser().try_get_matches_from([
            "hicwin",
            "build",
            "store",
            "--insulation-window",
            "log2_insulation_score_50000",
        ]);
        assert!(result.is_err());
    }

    #[rstest]
    #[case("none")]
    #[case("minmax")]
    #[case("z")]
    fn test_parse_get_norm(#[case] norm: &str) {
        let matches = build_parser()
            .try_get_matches_from(["hicwin", "get", "store", "3", "--norm", norm])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<usize>("slot"), Some(&3));
        assert_eq!(sub.get_one::<String>("norm").map(String::as_str), Some(norm));
    }

    #[rstest]
    fn test_unknown_norm_is_refused() {
        let result =
            build_parser().try_get_matches_from(["hicwin", "get", "store", "0", "--norm", "log"]);
        assert!(result.is_err());
    }
}
