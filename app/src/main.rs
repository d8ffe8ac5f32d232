use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use dbq_adapters::ApiClient;
use dbq_core::config::{self, ClientConfig, ConfigError};
use dbq_core::workspace::QueryLimits;
use dbq_tui::{TuiError, TuiOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_FILTER_ENV: &str = "DBQ_LOG";
const LOG_FILE_NAME: &str = "dbq.log";

#[derive(Debug, Parser)]
#[command(name = "dbq")]
#[command(about = "Terminal client for the dbq query service")]
#[command(version)]
struct Cli {
    /// Config file [default: <config dir>/dbq/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Full API base URL, e.g. http://127.0.0.1:8000/api/v1
    #[arg(long)]
    api_base_url: Option<String>,

    /// Log destination; the terminal itself is owned by the UI
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// File (or defaults), then `DBQ_API_BASE_URL`, then `--api-base-url`.
fn load_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    let loaded = match &cli.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load_default()?,
    };

    let config = loaded.with_env_overrides();
    Ok(match &cli.api_base_url {
        Some(base) => config.with_api_base_url(base.clone()),
        None => config,
    })
}

fn tui_options(config: &ClientConfig) -> TuiOptions {
    TuiOptions {
        limits: QueryLimits {
            timeout_seconds: config.query_timeout_seconds,
            max_rows: config.max_rows,
        },
        history_width: config.history_display_width,
    }
}

fn log_path(cli: &Cli) -> PathBuf {
    cli.log_file.clone().unwrap_or_else(|| {
        config::default_config_dir()
            .map_or_else(|_| PathBuf::from(LOG_FILE_NAME), |dir| dir.join(LOG_FILE_NAME))
    })
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| err as Box<dyn Error>)?;
    Ok(())
}

fn run_app(
    cli: &Cli,
    run_tui: impl FnOnce(ApiClient, TuiOptions) -> Result<(), TuiError>,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(cli)?;
    let client = ApiClient::new(&config)?;
    info!(base_url = client.base_url(), "starting dbq");

    run_tui(client, tui_options(&config))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&log_path(&cli))?;
    run_app(&cli, dbq_tui::run)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;

    use clap::Parser;
    use tempfile::TempDir;

    use super::{load_config, log_path, run_app, Cli};

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dbq").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    fn config_file(contents: &str) -> (TempDir, String) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write config");
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn cli_base_url_wins_over_the_file() {
        let (_dir, path) = config_file("api_base_url = \"http://file.example/api/v1\"\n");
        let config = load_config(&cli(&[
            "--config",
            path.as_str(),
            "--api-base-url",
            "http://cli.example/api/v1",
        ]))
        .expect("config should load");

        assert_eq!(config.api_base_url(), "http://cli.example/api/v1");
    }

    #[test]
    fn query_limits_come_from_the_file() {
        let (_dir, path) = config_file("query_timeout_seconds = 15\nmax_rows = 500\n");
        let config = load_config(&cli(&["--config", path.as_str()])).expect("config should load");
        let options = super::tui_options(&config);

        assert_eq!(options.limits.timeout_seconds, Some(15));
        assert_eq!(options.limits.max_rows, Some(500));
        assert_eq!(options.history_width, 80);
    }

    #[test]
    fn explicit_log_file_is_used_verbatim() {
        let parsed = cli(&["--log-file", "/tmp/dbq-test.log"]);
        assert_eq!(log_path(&parsed).to_string_lossy(), "/tmp/dbq-test.log");
    }

    #[test]
    fn run_app_hands_the_configured_client_to_the_tui() {
        let (_dir, path) = config_file("");
        let parsed = cli(&["--config", path.as_str(), "--api-base-url", "http://localhost:9/api/v1"]);

        let result = run_app(&parsed, |client, _options| {
            assert_eq!(client.base_url(), "http://localhost:9/api/v1");
            Ok(())
        });
        assert!(result.is_ok());
    }

    #[test]
    fn run_app_propagates_tui_errors() {
        let (_dir, path) = config_file("");
        let parsed = cli(&["--config", path.as_str()]);

        let result = run_app(&parsed, |_, _| {
            Err(dbq_tui::TuiError::Io(io::Error::other("boom")))
        });
        assert!(result.is_err());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let (_dir, path) = config_file("max_rows = \"lots\"\n");
        let parsed = cli(&["--config", path.as_str()]);
        assert!(run_app(&parsed, |_, _| Ok(())).is_err());
    }
}
