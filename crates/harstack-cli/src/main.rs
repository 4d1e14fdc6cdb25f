use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use harstack_cli::pipeline::input::PipelineConfig;
use harstack_cli::pipeline::runner::run_pipeline;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("HARSTACK_LOG", "error,harstack=info"))
        .init();

    let matches = Command::new("harstack")
        .version(clap::crate_version!())
        .author("Justin Sing <justincsing@gmail.com>")
        .about("Stacked-ensemble activity recognition from wearable sensor data")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Clean, reduce, train, stack and predict; writes one file per test row")
                .arg(
                    Arg::new("config")
                        .help("Path to pipeline JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('t')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the labelled training table. Overrides the training data \
                             file specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("test_data")
                        .short('s')
                        .long("test_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the unlabelled test table. Overrides the test data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output_dir")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Directory for prediction files, summary.json and the HTML report.")
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(clap::value_parser!(u64))
                        .help("Random seed for partitioning, resampling and forests."),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .value_parser(clap::value_parser!(usize))
                        .help("Worker threads for model fitting (0 = all cores)."),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config").about("Print the default pipeline configuration as JSON"),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => handle_run(run_matches),
        Some(("config", _)) => {
            println!("{}", serde_json::to_string_pretty(&PipelineConfig::default())?);
            Ok(())
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_run(matches: &ArgMatches) -> Result<()> {
    let config_path = matches.get_one::<PathBuf>("config");
    match config_path {
        Some(path) => log::info!("[harstack] Using config: {:?}", path),
        None => eprintln!("[harstack] No config file provided; using defaults."),
    }

    let config = match PipelineConfig::from_arguments(config_path, matches) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1)
        }
    };

    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[harstack] Effective config:\n{}", default_json);
    }

    match run_pipeline(&config) {
        Ok(output) => {
            eprintln!(
                "[harstack] Wrote {} predictions to {} (ensemble held-out error {:.4}).",
                output.prediction_files.len(),
                config.output_dir,
                output.summary.ensemble.held_out.error
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Pipeline failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
