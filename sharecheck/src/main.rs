mod config;

use clap::{Args, Parser};
use config::Config;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Checks whether the files behind a share link still exist")]
enum CliCommand {
    /// Serve the check API
    Serve(ConfigArgs),
    /// Load and validate the configuration, then exit
    ValidateConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// YAML config file. Built-in defaults are used when omitted.
    #[arg(long)]
    config_file_path: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<Config, Box<dyn Error>> {
        let mut config = match &self.config_file_path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_port_override(std::env::var("PORT").ok())?;
        config.checker.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = CliCommand::parse();

    match cli {
        CliCommand::Serve(args) => {
            let config = args.load()?;
            serve(config)
        }
        CliCommand::ValidateConfig(args) => {
            args.load()?;
            println!("Config is valid");
            Ok(())
        }
    }
}

fn serve(config: Config) -> Result<(), Box<dyn Error>> {
    let _sentry_guard = shared::telemetry::init_logging(config.sentry_dsn())?;

    if let Some(metrics) = &config.metrics {
        shared::telemetry::init_metrics(
            &metrics.statsd_host,
            metrics.statsd_port,
            &metrics.prefix,
        )?;
        shared::metrics_defs::describe_all(checker::metrics_defs::ALL_METRICS);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(checker::run(config.checker))?;
    Ok(())
}
