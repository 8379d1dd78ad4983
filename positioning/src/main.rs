use std::{fs::OpenOptions, io::Write, process::ExitCode};

use env_logger::Env;
use positioning::{
    config::{Config, PositioningConfig},
    replay::{load_replay_records, run_replay},
};

const CONFIG_PATH: &str = "conf/positioning_conf.toml";

pub fn main() -> ExitCode {
    let log_file_path = "positioning.log";
    let log_file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("failed to open log file {}: {}", log_file_path, e);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(move |buf, record| {
            let ts = buf.timestamp();
            writeln!(buf, "{} [{}] - {}", ts, record.level(), record.args())
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    log::info!("positioning starting, logging to {}", log_file_path);

    let config = match Config::from_toml(CONFIG_PATH)
        .map_err(|e| e.to_string())
        .and_then(|config| PositioningConfig::from_config(config).map_err(|e| e.to_string()))
    {
        Ok(config) => config,
        Err(e) => {
            log::error!("load config {} err: {}", CONFIG_PATH, e);
            return ExitCode::FAILURE;
        }
    };

    let Some(replay) = config.replay.clone() else {
        log::error!("no [replay] section in {}", CONFIG_PATH);
        return ExitCode::FAILURE;
    };

    let result = load_replay_records(&replay.path)
        .and_then(|records| run_replay(&config, replay.position_value, &records));
    match result {
        Ok(report) => {
            log::info!(
                "replay finished successfully, final target: {:?}",
                report.targets.last().map(|t| t.data)
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("replay error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
