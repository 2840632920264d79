use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gridsearch::{Algorithm, Point};

#[derive(Parser, Debug)]
#[command(name = "frontend")]
#[command(about = "Depth-first and breadth-first search on a grid world", long_about = None)]
pub struct Args {
    /// Session file, created on first use
    #[arg(short, long, default_value = "session.json")]
    pub session: PathBuf,

    /// JSON file with the world configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a new world and start a new session
    New {
        /// Seed for the obstacle placement
        #[arg(long)]
        seed: Option<u64>,

        /// Side length of the grid
        #[arg(long)]
        size: Option<usize>,

        /// Number of obstacle draws
        #[arg(long)]
        obstacles: Option<usize>,

        /// Build the world from an image instead, dark pixels are obstacles
        #[arg(long, conflicts_with_all = ["size", "obstacles"])]
        map: Option<PathBuf>,
    },

    /// Search from start to goal and play the path back
    Run {
        /// dfs or bfs
        algorithm: Algorithm,

        /// Start cell as "row,col"
        #[arg(long)]
        start: Point,

        /// Goal cell as "row,col"
        #[arg(long)]
        goal: Point,

        /// Only report the result, skip the step-by-step playback
        #[arg(long)]
        no_playback: bool,
    },

    /// Compare the latest DFS and BFS runs
    Compare,

    /// Print the world and the live runs
    Show,
}
