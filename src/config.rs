use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_WEBUI_PORT: u16 = 8501;
pub const BRIDGE_SCRIPT: &str = "bridge/run_hedge_fund.py";

const BACKEND_URL_ENV: &str = "HEDGEFUND_BACKEND_URL";
const BACKEND_CMD_ENV: &str = "HEDGEFUND_BACKEND_CMD";
const CATALOG_ENV: &str = "HEDGEFUND_CATALOG";
const WEBUI_PORT_ENV: &str = "HEDGEFUND_WEBUI_PORT";

/// Where the simulation collaborator lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendTarget {
    /// POST the run request as JSON to this URL.
    Http { url: String },
    /// Spawn `program args...`, request JSON on stdin, result JSON on stdout.
    Command { program: String, args: Vec<String> },
}

impl BackendTarget {
    pub fn describe(&self) -> String {
        match self {
            Self::Http { url } => format!("http {}", url),
            Self::Command { program, args } if args.is_empty() => format!("command {}", program),
            Self::Command { program, args } => format!("command {} {}", program, args.join(" ")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendTarget,
    pub catalog_path: Option<PathBuf>,
    pub webui_port: u16,
}

/// Raw settings before precedence is applied. CLI flags win over env.
#[derive(Clone, Debug, Default)]
pub struct ConfigSources {
    pub backend_url: Option<String>,
    pub backend_cmd: Option<String>,
    pub catalog_path: Option<String>,
    pub webui_port: Option<String>,
}

impl ConfigSources {
    pub fn from_env() -> Self {
        Self {
            backend_url: non_empty_env(BACKEND_URL_ENV),
            backend_cmd: non_empty_env(BACKEND_CMD_ENV),
            catalog_path: non_empty_env(CATALOG_ENV),
            webui_port: non_empty_env(WEBUI_PORT_ENV),
        }
    }

    pub fn overlay(self, cli: ConfigSources) -> Self {
        Self {
            backend_url: cli.backend_url.or(self.backend_url),
            backend_cmd: cli.backend_cmd.or(self.backend_cmd),
            catalog_path: cli.catalog_path.or(self.catalog_path),
            webui_port: cli.webui_port.or(self.webui_port),
        }
    }
}

/// Load `.env` if one exists. Missing files are fine.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
}

pub fn resolve(sources: ConfigSources) -> Result<AppConfig> {
    let backend = match (sources.backend_url, sources.backend_cmd) {
        (Some(url), Some(_)) => {
            warn!(
                "Both {} and {} are set; using the HTTP backend at {}",
                BACKEND_URL_ENV, BACKEND_CMD_ENV, url
            );
            BackendTarget::Http { url }
        }
        (Some(url), None) => BackendTarget::Http { url },
        (None, Some(cmd)) => parse_command_line(&cmd)?,
        (None, None) => default_bridge_command(),
    };

    let webui_port = match sources.webui_port {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("Invalid web UI port '{}'", raw))?,
        None => DEFAULT_WEBUI_PORT,
    };

    info!("Simulation backend: {}", backend.describe());

    Ok(AppConfig {
        backend,
        catalog_path: sources.catalog_path.map(PathBuf::from),
        webui_port,
    })
}

/// Splits a command line on whitespace. Quoting is not supported; point the
/// variable at a wrapper script when arguments contain spaces.
pub fn parse_command_line(raw: &str) -> Result<BackendTarget> {
    let mut parts = raw.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| anyhow!("Backend command is empty"))?;
    Ok(BackendTarget::Command {
        program,
        args: parts.collect(),
    })
}

fn default_bridge_command() -> BackendTarget {
    BackendTarget::Command {
        program: "python3".to_string(),
        args: vec![project_file_path(BRIDGE_SCRIPT).display().to_string()],
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn project_root_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn project_file_path(file_name: impl AsRef<Path>) -> PathBuf {
    project_root_path().join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_bridge_script() {
        let cfg = resolve(ConfigSources::default()).unwrap();
        assert_eq!(cfg.webui_port, DEFAULT_WEBUI_PORT);
        match cfg.backend {
            BackendTarget::Command { program, args } => {
                assert_eq!(program, "python3");
                assert_eq!(args.len(), 1);
                assert!(args[0].ends_with("run_hedge_fund.py"));
            }
            other => panic!("expected command backend, got {:?}", other),
        }
    }

    #[test]
    fn test_url_wins_over_command() {
        let cfg = resolve(ConfigSources {
            backend_url: Some("http://localhost:9000/run".into()),
            backend_cmd: Some("python3 bridge.py".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            cfg.backend,
            BackendTarget::Http {
                url: "http://localhost:9000/run".into()
            }
        );
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = ConfigSources {
            backend_cmd: Some("python3 a.py".into()),
            webui_port: Some("9000".into()),
            ..Default::default()
        };
        let cli = ConfigSources {
            backend_cmd: Some("./run.sh --fast".into()),
            ..Default::default()
        };
        let cfg = resolve(env.overlay(cli)).unwrap();
        assert_eq!(cfg.webui_port, 9000);
        assert_eq!(
            cfg.backend,
            BackendTarget::Command {
                program: "./run.sh".into(),
                args: vec!["--fast".into()],
            }
        );
    }

    #[test]
    fn test_rejects_bad_port_and_empty_command() {
        let bad_port = ConfigSources {
            webui_port: Some("http".into()),
            ..Default::default()
        };
        assert!(resolve(bad_port).is_err());
        assert!(parse_command_line("   ").is_err());
    }
}
