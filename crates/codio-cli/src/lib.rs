// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use codio_config::CodioConfig;
use codio_logging::CliLoggingArgs;

pub use clap::Parser;

pub mod frame;
pub mod inspect;
pub mod play;
pub mod record;

#[derive(clap::Parser)]
#[command(
    name = "codio",
    about = "Record and replay coding sessions",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Override a configuration value, e.g. `player.tick-ms=100`
    #[arg(long = "config", value_name = "KEY=VALUE", value_parser = parse_config_flag, global = true)]
    pub config: Vec<(String, String)>,
    #[command(flatten)]
    pub logging: CliLoggingArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a recorded session
    Inspect(inspect::InspectArgs),
    /// Print the editor state at a point in a session
    Frame(frame::FrameArgs),
    /// Replay a session, reading transport commands from stdin
    Play(play::PlayArgs),
    /// Record editor events from stdin into a session
    Record(record::RecordArgs),
}

impl Cli {
    /// Load configuration for a command working in `workspace`.
    pub fn load_config(&self, workspace: Option<&Path>) -> Result<CodioConfig> {
        let paths = codio_config::discover_paths(workspace);
        let flags: Vec<(&str, &str)> = self
            .config
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        codio_config::load(&paths, &flags)
    }
}

fn parse_config_flag(arg: &str) -> Result<(String, String), String> {
    codio_config::parse_flag(arg).map_err(|e| e.to_string())
}

/// Parse `--at`/`--from` values: milliseconds or `m:ss`.
pub fn parse_offset(value: &str) -> Result<u64, String> {
    codio_player::session::parse_offset_ms(value)
        .ok_or_else(|| format!("expected milliseconds or m:ss, got {value:?}"))
}

/// `m:ss` rendering of an offset.
pub fn format_offset(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[codio_test_utils::logged_test]
    fn parses_global_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "codio",
            "play",
            "demo",
            "--from",
            "1:30",
            "--config",
            "player.tick-ms=100",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.config, vec![("player.tick-ms".to_string(), "100".to_string())]);
        assert!(cli.logging.log_level.is_some());
        let Commands::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.session, PathBuf::from("demo"));
        assert_eq!(args.from, 90_000);
    }

    #[codio_test_utils::logged_test]
    fn rejects_malformed_values() {
        assert!(Cli::try_parse_from(["codio", "frame", "demo", "--at", "soon"]).is_err());
        assert!(Cli::try_parse_from(["codio", "--config", "novalue", "inspect", "demo"]).is_err());
        assert!(Cli::try_parse_from(["codio", "record", "ws"]).is_err());
    }

    #[codio_test_utils::logged_test]
    fn record_collects_open_documents() {
        let cli = Cli::try_parse_from([
            "codio", "record", "ws", "--out", "session", "--open", "a.rs", "--open", "b.rs",
            "--no-audio",
        ])
        .unwrap();
        let Commands::Record(args) = cli.command else {
            panic!("expected record");
        };
        assert_eq!(args.open, vec!["a.rs".to_string(), "b.rs".to_string()]);
        assert!(args.no_audio);
        assert_eq!(args.name, None);
    }

    #[codio_test_utils::logged_test]
    fn formats_offsets_as_minutes() {
        assert_eq!(format_offset(0), "0:00");
        assert_eq!(format_offset(9_999), "0:09");
        assert_eq!(format_offset(754_000), "12:34");
    }
}
