//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - generate: generate, render and repair an animation (default)
//! - design: produce a visual metaphor design only

use algoviz::domain::TemplateMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// algoviz - Generate algorithm animations with an LLM and repair them until they render
#[derive(Parser, Debug)]
#[command(name = "algoviz")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate, render and repair an algorithm animation
    Generate(GenerateArgs),

    /// Design a visual metaphor for an algorithm without rendering
    Design {
        /// Algorithm name (prompted when missing)
        #[arg(short, long)]
        algorithm: Option<String>,

        /// Input data, JSON when possible (prompted when missing)
        #[arg(short, long)]
        data: Option<String>,

        /// Write the design JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options for `generate`
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Algorithm name, e.g. "Bubble Sort" (prompted when missing)
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Input data, JSON when possible, e.g. "[8, 2, 6, 4]" (prompted when missing)
    #[arg(short, long)]
    pub data: Option<String>,

    /// Template mode: full (pseudocode + animation + info) or simple
    #[arg(short, long)]
    pub mode: Option<TemplateMode>,

    /// Maximum generate/render attempts
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Visual design specification file handed to the generator
    #[arg(long, conflicts_with = "design")]
    pub visual_spec: Option<PathBuf>,

    /// Design a visual metaphor first and use it as the visual spec
    #[arg(long)]
    pub design: bool,

    /// Run a review pass over each generated draft
    #[arg(long)]
    pub review: bool,

    /// Do not open the video after a successful render
    #[arg(long)]
    pub no_open: bool,

    /// Directory to write the scene source and render into
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["algoviz"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.is_verbose());
    }

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "algoviz",
            "-v",
            "generate",
            "--algorithm",
            "Bubble Sort",
            "--data",
            "[8, 2, 6, 4]",
            "--mode",
            "simple",
            "--max-attempts",
            "5",
            "--review",
            "--no-open",
        ])
        .unwrap();

        assert!(cli.is_verbose());
        match cli.command {
            Some(Commands::Generate(args)) => {
                assert_eq!(args.algorithm.as_deref(), Some("Bubble Sort"));
                assert_eq!(args.data.as_deref(), Some("[8, 2, 6, 4]"));
                assert_eq!(args.mode, Some(TemplateMode::Simple));
                assert_eq!(args.max_attempts, Some(5));
                assert!(args.review);
                assert!(args.no_open);
                assert!(!args.design);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(Cli::try_parse_from(["algoviz", "generate", "--mode", "fancy"]).is_err());
    }

    #[test]
    fn test_visual_spec_conflicts_with_design() {
        let result = Cli::try_parse_from(["algoviz", "generate", "--design", "--visual-spec", "spec.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_design_command() {
        let cli = Cli::try_parse_from(["algoviz", "design", "-a", "BFS", "-o", "bfs.json"]).unwrap();
        match cli.command {
            Some(Commands::Design { algorithm, data, output }) => {
                assert_eq!(algorithm.as_deref(), Some("BFS"));
                assert!(data.is_none());
                assert_eq!(output, Some(PathBuf::from("bfs.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["algoviz", "design", "--config", "my.yml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("my.yml")));
    }
}
