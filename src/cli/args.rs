//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::task::TaskName;

/// Front-end asset pipeline: compile styles, bundle scripts, sprite icons,
/// and serve the result with live reload.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Task to run (default: build everything, then watch and serve)
    #[arg(value_enum)]
    pub task: Option<TaskName>,

    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Project root; every configured path is relative to it
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Config file path, relative to the root (optional)
    #[arg(short = 'C', long, default_value = "assetflow.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// HTTP port number
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Live reload WebSocket port
    #[arg(long)]
    pub ws_port: Option<u16>,

    /// Print debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn task(&self) -> TaskName {
        self.task.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_task_means_default() {
        let cli = Cli::parse_from(["assetflow"]);
        assert_eq!(cli.task(), TaskName::Default);
        assert_eq!(cli.config, PathBuf::from("assetflow.toml"));
    }

    #[test]
    fn test_task_names() {
        let cli = Cli::parse_from(["assetflow", "svg-sprite"]);
        assert_eq!(cli.task(), TaskName::SvgSprite);
        let cli = Cli::parse_from(["assetflow", "scss"]);
        assert_eq!(cli.task(), TaskName::Scss);
    }

    #[test]
    fn test_unknown_task_rejected() {
        assert!(Cli::try_parse_from(["assetflow", "sass"]).is_err());
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::parse_from(["assetflow", "serve", "-p", "8080", "--ws-port", "8081", "-v"]);
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.ws_port, Some(8081));
        assert!(cli.verbose);
    }
}
