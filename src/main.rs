use clap::error::ErrorKind;
use clap::Parser;
use external_secret_watcher::k8s::config::{
    PollConfig, DEFAULT_GROUP, DEFAULT_KIND, DEFAULT_TIMEOUT_SECONDS, DEFAULT_VERSION,
};
use external_secret_watcher::k8s::resource::ResourceReference;
use external_secret_watcher::k8s::{client, USER_AGENT};
use external_secret_watcher::watch::watch_cluster_resource;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "Usage: ./external-secret-watcher -namespace=<namespace> -name=<name>";

/// Exit status for invalid or missing arguments
const USAGE_EXIT_CODE: u8 = 1;

/// Long flags that may also be written with a single dash (`-namespace=apps`)
const LONG_FLAGS: &[&str] = &[
    "namespace",
    "name",
    "timeout",
    "interval",
    "wait-forever",
    "group",
    "api-version",
    "kind",
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Namespace of the ExternalSecret
    #[arg(long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    namespace: String,

    /// Name of the ExternalSecret
    #[arg(long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    name: String,

    /// Seconds to wait for Ready before failing
    #[arg(
        long,
        env = "WATCHER_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Seconds between status polls (default 1, or 5 with --wait-forever)
    #[arg(long, env = "WATCHER_INTERVAL_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Poll until Ready with no deadline
    #[arg(long, env = "WATCHER_WAIT_FOREVER")]
    wait_forever: bool,

    /// API group of the watched resource
    #[arg(long, default_value = DEFAULT_GROUP)]
    group: String,

    /// API version of the watched resource
    #[arg(long = "api-version", default_value = DEFAULT_VERSION)]
    api_version: String,

    /// Kind of the watched resource
    #[arg(long, default_value = DEFAULT_KIND)]
    kind: String,
}

impl Args {
    fn poll_config(&self) -> PollConfig {
        let config = if self.wait_forever {
            PollConfig::unbounded()
        } else {
            PollConfig::bounded(Duration::from_secs(self.timeout))
        };
        self.interval.map_or(config, |secs| {
            config.with_interval(Duration::from_secs(secs))
        })
    }

    fn target(&self) -> ResourceReference {
        ResourceReference::new(
            &self.group,
            &self.api_version,
            &self.kind,
            &self.namespace,
            &self.name,
        )
    }
}

/// Rewrite single-dash long flags (`-namespace=apps`, `-name db`) to the
/// double-dash form clap expects. Anything else passes through untouched.
fn normalize_args<I, T>(argv: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    argv.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(rest) = arg.strip_prefix('-').filter(|r| !r.starts_with('-')) else {
                return arg;
            };
            let flag = rest.split_once('=').map_or(rest, |(flag, _)| flag);
            if LONG_FLAGS.contains(&flag) {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

/// Parse `argv`. On bad input returns the text to print on stdout and the
/// exit status; `--help` and `--version` exit through clap as usual.
fn parse_args_from<I, T>(argv: I) -> Result<Args, (String, u8)>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    match Args::try_parse_from(normalize_args(argv)) {
        Ok(args) => Ok(args),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => Err((format!("{}\n{USAGE}", e.render()), USAGE_EXIT_CODE)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args_from(std::env::args()) {
        Ok(args) => args,
        Err((output, code)) => {
            println!("{output}");
            return ExitCode::from(code);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        error!("Failed to install crypto provider: {:?}", e);
        return ExitCode::FAILURE;
    }

    let client = match client::new(Some(USER_AGENT)).await {
        Ok(client) => client,
        Err(e) => {
            error!("Error creating Kubernetes client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let target = args.target();
    match watch_cluster_resource(client, &target, args.poll_config(), CancellationToken::new()).await
    {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
