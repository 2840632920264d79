pub mod config;
pub mod error;
pub mod find;
pub mod grid;
pub mod metrics;
pub mod playback;
pub mod util;

pub use config::WorldConfig;
pub use error::GridError;
pub use find::{
    search, search_bfs, search_dfs, Algorithm, BreadthFirst, DepthFirst, MapStorage, MapTrait,
    PathFinder, PathFinderState, TraversalResult,
};
pub use grid::{Cell, GridMap, Point};
pub use metrics::{timed_search, Comparison, RunLedger, RunMetrics, SessionStats};
pub use playback::{play_through, LabelAssignment, ObstacleInspector, Playback};
