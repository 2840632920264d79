use std::{
    path::Path,
    thread,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use gridsearch::{
    play_through,
    playback::{Inspection, PlaybackFrame},
    timed_search,
    util::parse_img,
    Algorithm, Cell, GridMap, LabelAssignment, Playback, Point, RunLedger, RunMetrics,
    SessionStats, WorldConfig,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;

use crate::cli::Command;
use crate::context::Context;

/// Everything that survives between two invocations
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Session {
    world: GridMap,
    labels: LabelAssignment,
    ledger: RunLedger,
    stats: SessionStats,
}

impl Session {
    fn create(world: GridMap, config: &WorldConfig, rng: &mut StdRng) -> Self {
        let labels = LabelAssignment::assign(&world, &config.labels, rng);
        info!(
            "new {}x{} world with {} obstacles, {} of them labelled",
            world.rows,
            world.columns,
            world.obstacle_count(),
            labels.len()
        );

        Self {
            world,
            labels,
            ledger: RunLedger::default(),
            stats: SessionStats::new(config.target_label.clone()),
        }
    }
}

pub struct App {
    context: Context,
    config: WorldConfig,
    session: Session,
}

impl App {
    pub fn new(context: Context, config: WorldConfig) -> Self {
        // if a session has been stored, continue it
        let session = if let Some(session) = context.get_storage::<Session>() {
            debug!("loaded session from storage");
            session
        } else {
            let mut rng = config.rng();
            Session::create(config.create_world(&mut rng), &config, &mut rng)
        };

        Self {
            context,
            config,
            session,
        }
    }

    pub fn handle_command(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::New {
                seed,
                size,
                obstacles,
                map,
            } => self.new_world(seed, size, obstacles, map.as_deref())?,
            Command::Run {
                algorithm,
                start,
                goal,
                no_playback,
            } => self.run(algorithm, start, goal, !no_playback)?,
            Command::Compare => self.compare(),
            Command::Show => self.show(),
        }

        self.context.set_storage(&self.session)
    }

    fn new_world(
        &mut self,
        seed: Option<u64>,
        size: Option<usize>,
        obstacles: Option<usize>,
        image: Option<&Path>,
    ) -> anyhow::Result<()> {
        if seed.is_some() {
            self.config.seed = seed;
        }
        if let Some(size) = size {
            self.config.size = size;
        }
        if let Some(obstacles) = obstacles {
            self.config.obstacles = obstacles;
        }

        let mut rng = self.config.rng();
        let world = match image {
            Some(path) => {
                let img = image::open(path)
                    .with_context(|| format!("could not load map {}", path.display()))?;
                parse_img(&img)?
            }
            None => self.config.create_world(&mut rng),
        };

        // a new world means a new session: runs and scores start over
        self.session = Session::create(world, &self.config, &mut rng);

        self.context
            .set_output(&render_world(&self.session.world, None, None, None));
        Ok(())
    }

    fn run(
        &mut self,
        algorithm: Algorithm,
        start: Point,
        goal: Point,
        playback: bool,
    ) -> anyhow::Result<()> {
        // every run gets its own copy of the world with its endpoints marked
        let world = self
            .session
            .world
            .with_endpoints(start, goal)
            .with_context(|| format!("cannot run {} from {} to {}", algorithm, start, goal))?;

        let metrics = timed_search(&world, algorithm, start, goal);

        match &metrics.path {
            Some(path) => {
                self.context.set_output(&format!(
                    "Path found with {}: {}",
                    algorithm,
                    path.iter()
                        .map(Point::to_string)
                        .collect::<Vec<_>>()
                        .join(" ")
                ));
                if playback {
                    self.play(&world, &metrics);
                }
            }
            None => {
                self.context.set_output(&format!(
                    "No path found\nObstacles encountered: {}\nTime: {:.2}s",
                    metrics.obstacles_encountered,
                    metrics.elapsed_seconds()
                ));
            }
        }

        if let Some(previous) = self.session.ledger.record(metrics) {
            debug!(
                "replaced previous {} run from {} to {}",
                algorithm, previous.start, previous.goal
            );
        }

        self.report();
        Ok(())
    }

    fn play(&mut self, world: &GridMap, metrics: &RunMetrics) {
        let Some(playback) = Playback::from_metrics(world, metrics) else {
            return;
        };

        let algorithm = metrics.algorithm;
        let delay = Duration::from_millis(self.config.playback_delay_ms);
        let started = Instant::now();
        let context = &self.context;
        let mut score = self.session.stats.detections(algorithm);

        if self.session.labels.is_empty() {
            warn!("no obstacle labels in this session, nothing will be inspected");
        }

        let summary = play_through(
            playback,
            &mut self.session.labels,
            &mut self.session.stats,
            |frame, inspections| {
                score += inspections.iter().filter(|i| i.scored).count();
                context.set_output(&render_frame(
                    world,
                    algorithm,
                    frame,
                    inspections,
                    score,
                    started.elapsed(),
                ));
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            },
        );

        context.set_output(&format!(
            "Goal reached!\nAlgorithm: {}\nObstacles: {}\nScore: {}\nTime: {:.2}s\nSteps: {}",
            algorithm,
            summary.revealed,
            score,
            started.elapsed().as_secs_f64(),
            summary.steps
        ));
    }

    fn report(&self) {
        let mut lines = vec!["Current results:".to_string()];
        for algorithm in Algorithm::ALL {
            lines.push(
                self.session
                    .ledger
                    .summary_line(algorithm, &self.session.stats),
            );
        }
        self.context.set_output(&lines.join("\n"));

        if let Some(comparison) = self.session.ledger.comparison(&self.session.stats) {
            self.context
                .set_output(&format!("DFS vs BFS\n{}", comparison));
        }
    }

    fn compare(&self) {
        match self.session.ledger.comparison(&self.session.stats) {
            Some(comparison) => self
                .context
                .set_output(&format!("DFS vs BFS\n{}", comparison)),
            None => {
                let missing: Vec<String> = Algorithm::ALL
                    .into_iter()
                    .filter(|a| self.session.ledger.get(*a).is_none())
                    .map(|a| a.to_string())
                    .collect();
                self.context.set_output(&format!(
                    "Nothing to compare yet, still missing: {}",
                    missing.join(", ")
                ));
            }
        }
    }

    fn show(&self) {
        self.context
            .set_output(&render_world(&self.session.world, None, None, None));
        self.report();
    }
}

/// Draws the world as text. The walker is drawn as `@`, endpoints as `S` and `G`.
fn render_world(
    world: &GridMap,
    start: Option<Point>,
    goal: Option<Point>,
    position: Option<Point>,
) -> String {
    let mut out = String::with_capacity((world.columns + 3) * (world.rows + 2));

    let border = format!("+{}+\n", "-".repeat(world.columns));
    out.push_str(&border);
    for (row, cells) in world.cells.iter().enumerate() {
        out.push('|');
        for (col, cell) in cells.iter().enumerate() {
            let here = Point { row, col };
            let ch = if Some(here) == position {
                '@'
            } else if Some(here) == start {
                'S'
            } else if Some(here) == goal {
                'G'
            } else {
                match cell {
                    Cell::Obstacle => 'X',
                    Cell::Start => 'S',
                    Cell::Goal => 'G',
                    Cell::Free => ' ',
                }
            };
            out.push(ch);
        }
        out.push_str("|\n");
    }
    out.push_str(&border);

    out
}

fn render_frame(
    world: &GridMap,
    algorithm: Algorithm,
    frame: &PlaybackFrame,
    inspections: &[Inspection],
    score: usize,
    elapsed: Duration,
) -> String {
    let mut out = render_world(world, world.start(), world.goal(), Some(frame.position));

    out.push_str(&format!(
        "Algorithm: {}  Obstacles: {}  Score: {}  Time: {:.2}s  Progress: {}/{}\n",
        algorithm,
        frame.revealed,
        score,
        elapsed.as_secs_f64(),
        frame.step + 1,
        frame.total_steps
    ));

    for inspection in inspections {
        match &inspection.label {
            Some(label) if inspection.scored => out.push_str(&format!(
                "Obstacle detected at {}: {} (+1)\n",
                inspection.obstacle, label
            )),
            Some(label) => out.push_str(&format!(
                "Obstacle detected at {}: {}\n",
                inspection.obstacle, label
            )),
            None => out.push_str(&format!("Obstacle detected at {}\n", inspection.obstacle)),
        }
    }

    out
}
