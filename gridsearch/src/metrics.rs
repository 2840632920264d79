use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::find::{search, Algorithm, TraversalResult};
use crate::grid::{GridMap, Point};

const DEFAULT_TARGET_LABEL: &str = "flower";

/// The outcome of one algorithm run, kept around for the comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub algorithm: Algorithm,
    pub path: Option<Vec<Point>>,
    pub obstacles_encountered: usize,
    pub elapsed: Duration,
    pub start: Point,
    pub goal: Point,
    pub succeeded: bool,
}

impl RunMetrics {
    /// Packs a search result. The elapsed time starts at zero, see [`RunMetrics::set_elapsed`].
    pub fn new(
        algorithm: Algorithm,
        result: TraversalResult<Point>,
        start: Point,
        goal: Point,
    ) -> Self {
        Self {
            algorithm,
            succeeded: result.path.is_some(),
            path: result.path,
            obstacles_encountered: result.obstacles_encountered,
            elapsed: Duration::ZERO,
            start,
            goal,
        }
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Number of cells on the path, start and goal included
    pub fn path_len(&self) -> Option<usize> {
        self.path.as_ref().map(Vec::len)
    }
}

/// Runs a search and measures the wall-clock time it takes
pub fn timed_search(map: &GridMap, algorithm: Algorithm, start: Point, goal: Point) -> RunMetrics {
    let started = Instant::now();
    let result = search(map, algorithm, start, goal);
    let elapsed = started.elapsed();

    let mut metrics = RunMetrics::new(algorithm, result, start, goal);
    metrics.set_elapsed(elapsed);

    match metrics.path_len() {
        Some(len) => info!(
            "{} found a path of {} cells from {} to {} in {:?} ({} obstacle encounters)",
            algorithm, len, start, goal, elapsed, metrics.obstacles_encountered
        ),
        None => info!(
            "{} found no path from {} to {} in {:?} ({} obstacle encounters)",
            algorithm, start, goal, elapsed, metrics.obstacles_encountered
        ),
    }

    metrics
}

/// Detection tally per algorithm, reset explicitly at the start of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    target_label: String,
    dfs: usize,
    bfs: usize,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_LABEL)
    }
}

impl SessionStats {
    pub fn new(target_label: impl Into<String>) -> Self {
        Self {
            target_label: target_label.into(),
            dfs: 0,
            bfs: 0,
        }
    }

    pub fn target_label(&self) -> &str {
        &self.target_label
    }

    /// Records a detection made while `algorithm` was playing back. Only labels matching the
    /// target label score; returns whether this one did.
    pub fn record_detection(&mut self, algorithm: Algorithm, label: &str) -> bool {
        if !label.trim().eq_ignore_ascii_case(&self.target_label) {
            return false;
        }

        let count = match algorithm {
            Algorithm::Dfs => &mut self.dfs,
            Algorithm::Bfs => &mut self.bfs,
        };
        *count += 1;
        info!(
            "{} detected by {}: total {}",
            self.target_label, algorithm, count
        );
        true
    }

    pub fn detections(&self, algorithm: Algorithm) -> usize {
        match algorithm {
            Algorithm::Dfs => self.dfs,
            Algorithm::Bfs => self.bfs,
        }
    }

    pub fn new_session(&mut self) {
        self.dfs = 0;
        self.bfs = 0;
    }
}

/// Holds the live run of each algorithm. A new run replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLedger {
    dfs: Option<RunMetrics>,
    bfs: Option<RunMetrics>,
}

impl RunLedger {
    /// Stores the run under its algorithm and returns the run it replaced, if any
    pub fn record(&mut self, metrics: RunMetrics) -> Option<RunMetrics> {
        self.slot_mut(metrics.algorithm).replace(metrics)
    }

    pub fn get(&self, algorithm: Algorithm) -> Option<&RunMetrics> {
        match algorithm {
            Algorithm::Dfs => self.dfs.as_ref(),
            Algorithm::Bfs => self.bfs.as_ref(),
        }
    }

    pub fn clear(&mut self) {
        self.dfs = None;
        self.bfs = None;
    }

    /// Available once both algorithms have a live run
    pub fn comparison(&self, stats: &SessionStats) -> Option<Comparison> {
        match (&self.dfs, &self.bfs) {
            (Some(dfs), Some(bfs)) => Some(Comparison::new(dfs, bfs, stats)),
            _ => None,
        }
    }

    /// One line describing where an algorithm stands in this session
    pub fn summary_line(&self, algorithm: Algorithm, stats: &SessionStats) -> String {
        match self.get(algorithm) {
            Some(RunMetrics {
                path: Some(path),
                obstacles_encountered,
                elapsed,
                ..
            }) => format!(
                "{}: {} steps, {} obstacles, {:.2}s, score {}",
                algorithm,
                path.len(),
                obstacles_encountered,
                elapsed.as_secs_f64(),
                stats.detections(algorithm)
            ),
            Some(RunMetrics {
                path: None,
                obstacles_encountered,
                elapsed,
                ..
            }) => format!(
                "{}: no path found, {} obstacles, {:.2}s",
                algorithm,
                obstacles_encountered,
                elapsed.as_secs_f64()
            ),
            None => format!("{}: not run yet", algorithm),
        }
    }

    fn slot_mut(&mut self, algorithm: Algorithm) -> &mut Option<RunMetrics> {
        match algorithm {
            Algorithm::Dfs => &mut self.dfs,
            Algorithm::Bfs => &mut self.bfs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub metric: &'static str,
    pub dfs: String,
    pub bfs: String,
}

/// Side by side view of the two live runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    pub fn new(dfs: &RunMetrics, bfs: &RunMetrics, stats: &SessionStats) -> Self {
        let path_len = |m: &RunMetrics| {
            m.path_len()
                .map_or_else(|| "—".to_string(), |len| len.to_string())
        };

        let rows = vec![
            ComparisonRow {
                metric: "Detections",
                dfs: stats.detections(Algorithm::Dfs).to_string(),
                bfs: stats.detections(Algorithm::Bfs).to_string(),
            },
            ComparisonRow {
                metric: "Time",
                dfs: format!("{:.2}s", dfs.elapsed_seconds()),
                bfs: format!("{:.2}s", bfs.elapsed_seconds()),
            },
            ComparisonRow {
                metric: "Obstacles",
                dfs: dfs.obstacles_encountered.to_string(),
                bfs: bfs.obstacles_encountered.to_string(),
            },
            ComparisonRow {
                metric: "Path length",
                dfs: path_len(dfs),
                bfs: path_len(bfs),
            },
        ];

        Self { rows }
    }

    pub fn row(&self, metric: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|row| row.metric == metric)
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<14}{:>10}{:>10}", "Metric", "DFS", "BFS")?;
        for row in &self.rows {
            writeln!(f, "{:<14}{:>10}{:>10}", row.metric, row.dfs, row.bfs)?;
        }
        Ok(())
    }
}
