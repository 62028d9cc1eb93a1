//! Command-line argument parsing for the demo host.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Runtime mesh proxy demo arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "rtmesh-demo", about = "Runtime mesh scene proxy demo")]
pub struct CliArgs {
    /// Finest LOD the selector may return.
    #[arg(long)]
    pub min_lod: Option<usize>,

    /// Render in wireframe.
    #[arg(long)]
    pub wireframe: bool,

    /// Draw simple collision shapes.
    #[arg(long)]
    pub show_collision: bool,

    /// Draw bounding volumes.
    #[arg(long)]
    pub show_bounds: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 8)]
    pub frames: u32,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config. Switches only ever turn features on.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(min_lod) = args.min_lod {
            self.lod.min_lod = min_lod;
        }
        if args.wireframe {
            self.debug.wireframe_mode = true;
        }
        if args.show_collision {
            self.debug.show_collision = true;
        }
        if args.show_bounds {
            self.debug.show_bounds = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            min_lod: Some(2),
            wireframe: true,
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.lod.min_lod, 2);
        assert!(config.debug.wireframe_mode);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert!(!config.debug.show_collision);
        assert_eq!(config.lod.factor_scale, 1.0);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "rtmesh-demo",
            "--min-lod",
            "1",
            "--show-bounds",
            "--frames",
            "3",
        ]);
        assert_eq!(args.min_lod, Some(1));
        assert!(args.show_bounds);
        assert!(!args.show_collision);
        assert_eq!(args.frames, 3);
    }
}
