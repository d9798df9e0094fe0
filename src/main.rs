use clap::{Arg, ArgAction, Command};
use env_logger::{Builder, WriteStyle};
use log::{error, LevelFilter};
use std::process::ExitCode;
use w1vz::config::{AppConfig, DEFAULT_CONFIG_FILE};

const PROJ_NAME: &str = env!("CARGO_PKG_NAME");
const PROJ_VER: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> ExitCode {
    let args = Command::new(PROJ_NAME)
        .version(PROJ_VER)
        .about("Forwards 1-Wire temperature readings to a Volkszaehler middleware")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("config file")
                .num_args(1)
                .default_value(DEFAULT_CONFIG_FILE),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("run a single poll cycle and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_file = args
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_FILE);

    let config = match AppConfig::from_file(config_file) {
        Ok(config) => config,
        Err(e) => {
            init_logger(LevelFilter::Info);
            error!("Config error > {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logger with a configured log level
    init_logger(config.get_log_level());

    if let Err(e) = w1vz::run(config, args.get_flag("once")).await {
        error!("Application error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_logger(level: LevelFilter) {
    Builder::new()
        .filter_level(level)
        .write_style(WriteStyle::Auto)
        .format_timestamp_secs()
        .init();
}
