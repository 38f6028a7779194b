#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod modules;

include_modules!();

use crate::error::TvEpgError;
use crate::model::Config;
use crate::processing::processor::epg_downloader::download_epg_files;
use crate::processing::processor::json_reshape::reshape_json_file;
use crate::processing::processor::lstime::scrape_lstime_epg;
use crate::processing::processor::m3u_generator::generate_m3u;
use crate::processing::processor::name_cleaner::clean_channel_names_file;
use crate::processing::processor::tvking::scrape_tvking_epg;
use crate::utils::{init_logger, resolve_env_var, CONFIG_FILE};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tvepg")]
#[command(version)]
#[command(about = "TV playlist and program guide batch jobs", long_about = None)]
struct Args {
    /// The config file
    #[arg(short = 'c', long = "config", global = true, default_value = CONFIG_FILE)]
    config_file: String,

    /// log level
    #[arg(short = 'l', long = "log-level", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the configured epg files
    DownloadEpg,
    /// Generate m3u playlists from the configured channel lists
    GenerateM3u,
    /// Correct the channel names of a channel list
    CleanNames {
        #[arg(short = 'i', long)]
        input: PathBuf,
        /// Defaults to the input file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Scrape the tvking channel schedules
    TvkingEpg,
    /// Scrape the lstimes channel schedule
    LstimeEpg,
    /// Wrap every value of a json object into an array
    ReshapeJson {
        #[arg(short = 'i', long, default_value = "epg_title_info.json")]
        input: PathBuf,
        #[arg(short = 'o', long, default_value = "epg_title_info_transformed.json")]
        output: PathBuf,
    },
}

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn load_config(config_file: &str) -> Config {
    Config::load(config_file).unwrap_or_else(|err| exit!("{}", err))
}

// fatal errors abort the process, the others are only logged
fn handle_job_error(err: &TvEpgError) {
    if err.is_fatal() {
        exit!("{}", err);
    }
    error!("{err}");
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config_file = resolve_env_var(&args.config_file);

    init_logger(args.log_level.as_ref(), &config_file);
    info!("Version: {VERSION}");

    match args.command {
        Command::DownloadEpg => {
            let cfg = load_config(&config_file);
            if let Err(err) = download_epg_files(&cfg).await {
                handle_job_error(&err);
            }
        }
        Command::GenerateM3u => {
            let cfg = load_config(&config_file);
            match generate_m3u(&cfg).await {
                Ok(0) => exit!("No playlist was generated"),
                Ok(_) => {}
                Err(err) => {
                    handle_job_error(&err);
                    exit!("No playlist was generated");
                }
            }
        }
        Command::CleanNames { input, output } => {
            if let Err(err) = clean_channel_names_file(&input, output.as_deref()).await {
                exit!("{}", err);
            }
        }
        Command::TvkingEpg => {
            let cfg = load_config(&config_file);
            if let Err(err) = scrape_tvking_epg(&cfg.tvking, &cfg.working_dir).await {
                handle_job_error(&err);
            }
        }
        Command::LstimeEpg => {
            let cfg = load_config(&config_file);
            if let Err(err) = scrape_lstime_epg(&cfg.lstime, &cfg.working_dir).await {
                handle_job_error(&err);
            }
        }
        Command::ReshapeJson { input, output } => {
            match reshape_json_file(&input, &output).await {
                Ok(()) => info!("Reshaped json written to {}", output.display()),
                Err(err) => exit!("{}", err),
            }
        }
    }
}
