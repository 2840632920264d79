//! Step-by-step replay of a found path.
//!
//! The replay walks the path one cell at a time and looks around each cell for obstacles. Each
//! physical obstacle is counted once as "revealed", which is a different number from the obstacle
//! encounters counted by the search itself. Every obstacle next to the current cell is handed to
//! an [`ObstacleInspector`], and whatever label it returns is scored against the algorithm being
//! replayed.

use std::collections::HashSet;

use log::warn;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::find::{Algorithm, MapTrait, Neighbor};
use crate::grid::{GridMap, Point};
use crate::metrics::{RunMetrics, SessionStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackFrame {
    /// Zero based index of this step on the path
    pub step: usize,
    pub total_steps: usize,
    pub position: Point,
    /// Obstacles next to `position`, in neighbor order
    pub nearby_obstacles: Vec<Point>,
    /// The subset of `nearby_obstacles` seen for the first time on this step
    pub newly_revealed: Vec<Point>,
    /// Distinct obstacles revealed so far, this step included
    pub revealed: usize,
}

pub struct Playback<'a> {
    map: &'a GridMap,
    algorithm: Algorithm,
    path: &'a [Point],
    goal: Point,
    index: usize,
    revealed: HashSet<Point>,
}

impl<'a> Playback<'a> {
    pub fn new(map: &'a GridMap, algorithm: Algorithm, path: &'a [Point], goal: Point) -> Self {
        Self {
            map,
            algorithm,
            path,
            goal,
            index: 0,
            revealed: HashSet::new(),
        }
    }

    /// A replay of a recorded run, if that run found a path
    pub fn from_metrics(map: &'a GridMap, metrics: &'a RunMetrics) -> Option<Self> {
        metrics
            .path
            .as_deref()
            .map(|path| Self::new(map, metrics.algorithm, path, metrics.goal))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }
}

impl Iterator for Playback<'_> {
    type Item = PlaybackFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let position = *self.path.get(self.index)?;
        let step = self.index;
        self.index += 1;

        // nothing is inspected once the goal is reached
        let nearby_obstacles: Vec<Point> = if position == self.goal {
            Vec::new()
        } else {
            self.map
                .neighbors_of(position)
                .filter_map(|neighbor| match neighbor {
                    Neighbor::Blocked(point) => Some(point),
                    Neighbor::Open(_) => None,
                })
                .collect()
        };

        let newly_revealed: Vec<Point> = nearby_obstacles
            .iter()
            .copied()
            .filter(|point| self.revealed.insert(*point))
            .collect();

        Some(PlaybackFrame {
            step,
            total_steps: self.path.len(),
            position,
            nearby_obstacles,
            newly_revealed,
            revealed: self.revealed.len(),
        })
    }
}

/// Looks at an obstacle and says what it is, if it can tell
pub trait ObstacleInspector {
    fn inspect(&mut self, algorithm: Algorithm, obstacle: Point) -> Option<String>;
}

impl<F> ObstacleInspector for F
where
    F: FnMut(Algorithm, Point) -> Option<String>,
{
    fn inspect(&mut self, algorithm: Algorithm, obstacle: Point) -> Option<String> {
        self(algorithm, obstacle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub obstacle: Point,
    pub label: Option<String>,
    pub scored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub steps: usize,
    pub revealed: usize,
    pub inspections: usize,
    pub detections: usize,
}

/// Drives a playback to the end, inspecting every nearby obstacle on the way and recording the
/// detections under the playback's algorithm. `on_frame` sees every frame after its inspections.
pub fn play_through<I, F>(
    mut playback: Playback<'_>,
    inspector: &mut I,
    stats: &mut SessionStats,
    mut on_frame: F,
) -> PlaybackSummary
where
    I: ObstacleInspector + ?Sized,
    F: FnMut(&PlaybackFrame, &[Inspection]),
{
    let algorithm = playback.algorithm();
    let mut summary = PlaybackSummary {
        steps: 0,
        revealed: 0,
        inspections: 0,
        detections: 0,
    };

    for frame in playback.by_ref() {
        let inspections: Vec<Inspection> = frame
            .nearby_obstacles
            .iter()
            .map(|&obstacle| {
                let label = inspector.inspect(algorithm, obstacle);
                let scored = match &label {
                    Some(label) => stats.record_detection(algorithm, label),
                    None => {
                        warn!("nothing to show for obstacle at {}", obstacle);
                        false
                    }
                };
                Inspection {
                    obstacle,
                    label,
                    scored,
                }
            })
            .collect();

        summary.steps += 1;
        summary.inspections += inspections.len();
        summary.detections += inspections.iter().filter(|i| i.scored).count();

        on_frame(&frame, &inspections);
    }

    summary.revealed = playback.revealed_count();
    summary
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleLabel {
    pub obstacle: Point,
    pub label: String,
}

/// Labels handed out to the obstacles of a world
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelAssignment {
    entries: Vec<ObstacleLabel>,
}

impl LabelAssignment {
    /// Shuffles `labels` and deals them to the obstacles in row-major order, starting over when
    /// there are more obstacles than labels
    pub fn assign<R: Rng + ?Sized>(map: &GridMap, labels: &[String], rng: &mut R) -> Self {
        if labels.is_empty() {
            return Self::default();
        }

        let mut labels = labels.to_vec();
        labels.shuffle(rng);

        let entries = map
            .obstacles()
            .zip(labels.iter().cycle())
            .map(|(obstacle, label)| ObstacleLabel {
                obstacle,
                label: label.clone(),
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, obstacle: Point) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.obstacle == obstacle)
            .map(|entry| entry.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObstacleLabel> {
        self.entries.iter()
    }
}

impl ObstacleInspector for LabelAssignment {
    fn inspect(&mut self, _algorithm: Algorithm, obstacle: Point) -> Option<String> {
        self.get(obstacle).map(str::to_string)
    }
}
