//! `owlmail-loadgen`: send a burst of unique test messages to a private SMTP
//! server at a bounded concurrency and an approximate rate ceiling.
//!
//! Exit codes: `0` when every job ran (whatever its outcome), `2` when the
//! target was refused by the private-address gate, `1` for any other error.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;

use owlmail_loadgen::config::LoadConfig;
use owlmail_loadgen::core::{AppResult, JsonSink, LoadError, Scheduler, SmtpExecutor};
use owlmail_loadgen::util::init_tracing;

/// Send bulk test emails to a private SMTP server (no auth, no TLS).
///
/// Unset options fall back to the `--config` file, then to built-in defaults.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with a full or partial run configuration.
    #[arg(long, env = "LOADGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Target SMTP host [default: 192.168.123.200]
    #[arg(long, env = "LOADGEN_HOST")]
    host: Option<String>,

    /// Target SMTP port [default: 1025]
    #[arg(long, env = "LOADGEN_PORT")]
    port: Option<u16>,

    /// Number of messages to send [default: 10000]
    #[arg(long, env = "LOADGEN_COUNT")]
    count: Option<u64>,

    /// Concurrent worker threads [default: 20]
    #[arg(long, env = "LOADGEN_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Max emails per second, approximate [default: 200]
    #[arg(long, env = "LOADGEN_RATE")]
    rate: Option<f64>,

    /// Per-message network timeout in seconds [default: 10]
    #[arg(long, env = "LOADGEN_TIMEOUT")]
    timeout: Option<u64>,

    /// Sender address [default: test@local]
    #[arg(long = "from", env = "LOADGEN_FROM")]
    from_addr: Option<String>,

    /// Recipient address [default: someone@example.com]
    #[arg(long = "to", env = "LOADGEN_TO")]
    to_addr: Option<String>,

    /// DANGEROUS: allow non-private targets.
    #[arg(long, env = "LOADGEN_ALLOW_NON_PRIVATE")]
    allow_non_private: bool,

    /// Print a progress line every N completions, 0 to disable [default: 500]
    #[arg(long, env = "LOADGEN_PROGRESS_EVERY")]
    progress_every: Option<u64>,

    /// Name announced in EHLO/HELO [default: localhost]
    #[arg(long, env = "LOADGEN_HELO_NAME")]
    helo_name: Option<String>,

    /// Emit progress and summary as JSON lines.
    #[arg(long, env = "LOADGEN_JSON")]
    json: bool,
}

impl Args {
    fn into_config(self) -> AppResult<LoadConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("read config file {}", path.display()))?;
                LoadConfig::from_json_str(&raw)
                    .map_err(|e| anyhow!("config file {}: {e}", path.display()))?
            }
            None => LoadConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(rate) = self.rate {
            config.rate = rate;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(from) = self.from_addr {
            config.from = from;
        }
        if let Some(to) = self.to_addr {
            config.to = to;
        }
        if self.allow_non_private {
            config.allow_non_private = true;
        }
        if let Some(every) = self.progress_every {
            config.progress_every = every;
        }
        if let Some(helo_name) = self.helo_name {
            config.helo_name = helo_name;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(LoadError::Validation(host)) = e.downcast_ref::<LoadError>() {
                eprintln!(
                    "Refusing to send to non-private host: {host}\n\
                     Use --allow-non-private only if you own/have permission."
                );
                return ExitCode::from(2);
            }
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> AppResult<()> {
    let json = args.json;
    let config = args.into_config()?;
    let executor = SmtpExecutor::new(config.helo_name.clone());
    let scheduler = Scheduler::new(config, executor)?;

    if json {
        scheduler.run_with_sink(&mut JsonSink)?;
    } else {
        scheduler.run()?;
    }
    Ok(())
}
