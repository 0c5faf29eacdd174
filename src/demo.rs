use std::{
    error::Error,
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
};

use clap::Parser;
use eyre::Context;
use labellog::{Config, FileMode, Logger, Registry, Severity, SharedStream};

#[derive(Parser)]
#[command(version, long_version = "")]
#[command(about = "Exercises label-keyed loggers on stderr and an optional log file.", long_about = None)]
pub struct Demo {
    #[arg(index = 1, value_name = "LOG_FILE", help = "Log file shared by the demo loggers.")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        help = "Also route `log` macro records of the demo itself to stderr (-vv for debug).",
    )]
    pub verbose: u8,
}

impl Demo {
    fn facade_level(&self) -> Option<Severity> {
        match self.verbose {
            0 => None,
            1 => Some(Severity::Info),
            _ => Some(Severity::Debug),
        }
    }

    fn setup_logging(&self) -> eyre::Result<()> {
        let Some(level) = self.facade_level() else {
            return Ok(());
        };

        let logger = Logger::builder("labellog-demo")
            .with_registry(&Registry::new())
            .with_config(Config::from_env())
            .build();
        logger.set_level(level)?;
        logger.init()
    }

    pub fn run(self) -> eyre::Result<()> {
        self.setup_logging()?;
        log::info!("labellog demo starting");

        let registry = Registry::new();
        let config = Config::from_env();
        let build = |label: &str| {
            Logger::builder(label)
                .with_registry(&registry)
                .with_config(config.clone())
        };

        let log1 = build("l1").build();
        if let Some(path) = &self.log_file {
            log1.set_log_file(path.as_path(), FileMode::Truncate, Severity::Info)?;
        }
        log1.info("Test1");

        let log2 = build("l2").build();
        if let Some(path) = &self.log_file {
            log2.set_log_file(path.as_path(), FileMode::Append, Severity::Info)?;
        }
        log1.info("Test2");
        log2.info("Test1");
        log2.info("Test2");

        let log2x = build("l2").build();
        log::debug!("'l2' has {} sinks after second handle", log2x.sink_count());
        log2x.info("Test1 X");
        log2x.set_level(Severity::Critical)?;
        log2x.critical("Test2 X");

        log1.close();
        log2.close();
        log2x.close();

        if let Some(path) = &self.log_file {
            self.log_to_open_file(&registry, &config, path)?;
        }

        log::info!("labellog demo finished");
        Ok(())
    }

    fn log_to_open_file(&self, registry: &Registry, config: &Config, path: &Path) -> eyre::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed opening {}", path.display()))?;

        let log3 = Logger::builder("l3")
            .with_registry(registry)
            .with_config(config.clone())
            .without_stream()
            .build();
        log3.set_log_file(
            SharedStream::new(path.display().to_string(), file),
            FileMode::Append,
            Severity::Info,
        )?;
        log3.info("Test1");

        let methods: [fn(&Logger, &str); 6] = [
            Logger::info,
            Logger::debug,
            Logger::warning,
            Logger::error,
            Logger::info,
            Logger::critical,
        ];
        let mut count = 2;
        for method in methods {
            method(&log3, &format!("Test{}", count));
            count += 1;
        }

        let failure = io::Error::other(format!("Test{}", count));
        log3.exception(&format!("Test{}", count), Some(&failure as &(dyn Error + 'static)));

        log3.close();
        Ok(())
    }
}
