use std::{
    collections::VecDeque,
    fmt::{Debug, Display},
    marker::PhantomData,
    ops::{Deref, DerefMut},
    str::FromStr,
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Supertrait that collects all the requirements on the NodeReference values
/// Must be copy, comparable and not references (hence 'static)
pub trait NodeReference: Copy + Eq + Debug + 'static {}

/// A candidate move out of a node, as seen by the map
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Neighbor<R> {
    Open(R),
    Blocked(R),
}

pub trait MapTrait {
    /// The type that can be used to reference nodes in the map
    type Reference: NodeReference;

    /// The type that the map uses for storage
    type Storage<T: Default + Copy + Clone + 'static>: MapStorage<T, Reference = Self::Reference>;

    /// Check if the provided node reference is valid
    fn is_valid(&self, node: Self::Reference) -> bool;

    /// Return an iterator over the neighbors of the provided node, in the order they should be
    /// expanded. Candidates outside the map are never returned.
    fn neighbors_of(&self, node: Self::Reference) -> impl Iterator<Item = Neighbor<Self::Reference>>;

    /// Create a storage for values of type T
    fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> Self::Storage<T>;
}

pub trait MapStorage<T> {
    type Reference: NodeReference;

    fn is_valid(&self, node: Self::Reference) -> bool;
    fn get(&self, node: Self::Reference) -> T;
    fn get_mut(&mut self, node: Self::Reference) -> &mut T;
}

/// The discovered-but-not-yet-expanded nodes of a search. The pop discipline is the only thing
/// separating depth-first from breadth-first.
pub trait Frontier<T> {
    fn push(&mut self, item: T);
    fn pop(&mut self) -> Option<T>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Last in, first out
impl<T> Frontier<T> for Vec<T> {
    fn push(&mut self, item: T) {
        Vec::push(self, item)
    }

    fn pop(&mut self) -> Option<T> {
        Vec::pop(self)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// First in, first out
impl<T> Frontier<T> for VecDeque<T> {
    fn push(&mut self, item: T) {
        self.push_back(item)
    }

    fn pop(&mut self) -> Option<T> {
        self.pop_front()
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Dfs,
    Bfs,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Dfs, Algorithm::Bfs];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Dfs => "DFS",
            Algorithm::Bfs => "BFS",
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Algorithm {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dfs" => Ok(Algorithm::Dfs),
            "bfs" => Ok(Algorithm::Bfs),
            _ => Err(GridError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// An entry on the frontier
#[derive(Debug)]
pub struct ToVisit<R> {
    point: R,
    from: Option<R>,
    depth: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct VisitedItem<R> {
    /// Number of moves from the start
    pub depth: usize,
    pub from: Option<R>,
}

#[derive(Clone, Copy, Debug)]
pub struct Visited<R>(Option<VisitedItem<R>>);

impl<R> Default for Visited<R> {
    fn default() -> Self {
        Visited(None)
    }
}
impl<R> Deref for Visited<R> {
    type Target = Option<VisitedItem<R>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl<R> DerefMut for Visited<R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
impl<R> Display for Visited<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(item) => write!(f, "{:03} ", item.depth),
            None => write!(f, "{:03} ", ""),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct PathResult<R> {
    pub path: Vec<R>,
    pub start: R,
    pub goal: R,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFinderState<R> {
    Computing,
    NoPathFound,
    PathFound(PathResult<R>),
}

impl<R> PathFinderState<R> {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing)
    }
}

/// Outcome of a complete search. An absent path means the goal could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalResult<R> {
    pub path: Option<Vec<R>>,
    pub obstacles_encountered: usize,
}

/// A search over a map, generic over the frontier discipline.
///
/// A node is marked visited when it is popped, not when it is discovered, so the same node can
/// sit on the frontier several times with different parents; only its first pop counts. Every
/// attempt to step into a blocked neighbor bumps the obstacle counter, even when the same
/// obstacle was already seen from another node.
pub struct PathFinder<M: MapTrait, F> {
    start: M::Reference,
    goal: M::Reference,
    visited: M::Storage<Visited<M::Reference>>,
    visit_list: F,
    obstacles_encountered: usize,
    expanded: usize,
    state: PathFinderState<M::Reference>,
    _map: PhantomData<M>,
}

pub type DepthFirst<M> = PathFinder<M, Vec<ToVisit<<M as MapTrait>::Reference>>>;
pub type BreadthFirst<M> = PathFinder<M, VecDeque<ToVisit<<M as MapTrait>::Reference>>>;

impl<M, F> PathFinder<M, F>
where
    M: MapTrait,
    F: Frontier<ToVisit<M::Reference>> + Default,
{
    pub fn new(map: &M, start: M::Reference, goal: M::Reference) -> Self {
        let mut visit_list = F::default();
        let state = if map.is_valid(start) {
            visit_list.push(ToVisit {
                point: start,
                from: None,
                depth: 0,
            });
            PathFinderState::Computing
        } else {
            warn!("start {:?} is outside the map, nothing to search", start);
            PathFinderState::NoPathFound
        };

        Self {
            start,
            goal,
            visited: map.create_storage(),
            visit_list,
            obstacles_encountered: 0,
            expanded: 0,
            state,
            _map: PhantomData,
        }
    }

    /// Runs the search to the end and returns its outcome along with the visited storage
    pub fn finish(
        mut self,
        map: &M,
    ) -> (
        TraversalResult<M::Reference>,
        M::Storage<Visited<M::Reference>>,
    ) {
        while !self.step(map).is_done() {}

        let result = TraversalResult {
            path: match &self.state {
                PathFinderState::PathFound(found) => Some(found.path.clone()),
                _ => None,
            },
            obstacles_encountered: self.obstacles_encountered,
        };

        (result, self.visited)
    }

    /// Pops one entry off the frontier and expands it
    pub fn step(&mut self, map: &M) -> &PathFinderState<M::Reference> {
        if self.state.is_done() {
            return &self.state;
        }

        let Some(visit) = self.visit_list.pop() else {
            debug!(
                "no path from {:?} to {:?}: {} nodes expanded, {} obstacle encounters",
                self.start, self.goal, self.expanded, self.obstacles_encountered
            );
            self.state = PathFinderState::NoPathFound;
            return &self.state;
        };

        if self.visited.get(visit.point).is_some() {
            return &self.state;
        }

        *self.visited.get_mut(visit.point) = Visited(Some(VisitedItem {
            depth: visit.depth,
            from: visit.from,
        }));
        self.expanded += 1;

        if visit.point == self.goal {
            let path = self.backtrack();
            debug!(
                "found path of {} cells from {:?} to {:?}: {} nodes expanded, {} obstacle encounters",
                path.len(),
                self.start,
                self.goal,
                self.expanded,
                self.obstacles_encountered
            );

            self.state = PathFinderState::PathFound(PathResult {
                path,
                start: self.start,
                goal: self.goal,
            });
            return &self.state;
        }

        for neighbor in map.neighbors_of(visit.point) {
            match neighbor {
                Neighbor::Open(point) => {
                    // already expanded nodes would be skipped on pop anyway
                    if self.visited.get(point).is_none() {
                        self.visit_list.push(ToVisit {
                            point,
                            from: Some(visit.point),
                            depth: visit.depth + 1,
                        });
                    }
                }
                Neighbor::Blocked(point) => {
                    self.obstacles_encountered += 1;
                    debug!("obstacle encountered at {:?}", point);
                }
            }
        }

        &self.state
    }

    /// Follows the parent links recorded at first pop back from the goal. This is exactly the
    /// path carried by the frontier entry that reached the goal.
    fn backtrack(&self) -> Vec<M::Reference> {
        let mut path = vec![self.goal];

        let mut previous_visit = self.visited.get(self.goal);
        while let Visited(Some(VisitedItem {
            from: Some(from), ..
        })) = previous_visit
        {
            path.push(from);
            previous_visit = self.visited.get(from);
        }

        path.reverse();
        path
    }

    pub fn state(&self) -> &PathFinderState<M::Reference> {
        &self.state
    }

    pub fn get_visited(&self) -> &M::Storage<Visited<M::Reference>> {
        &self.visited
    }

    pub fn obstacles_encountered(&self) -> usize {
        self.obstacles_encountered
    }

    /// Number of nodes expanded so far
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Number of entries waiting on the frontier, duplicates included
    pub fn frontier_len(&self) -> usize {
        self.visit_list.len()
    }

    pub fn start(&self) -> M::Reference {
        self.start
    }

    pub fn goal(&self) -> M::Reference {
        self.goal
    }
}

pub fn search_dfs<M: MapTrait>(
    map: &M,
    start: M::Reference,
    goal: M::Reference,
) -> TraversalResult<M::Reference> {
    DepthFirst::new(map, start, goal).finish(map).0
}

pub fn search_bfs<M: MapTrait>(
    map: &M,
    start: M::Reference,
    goal: M::Reference,
) -> TraversalResult<M::Reference> {
    BreadthFirst::new(map, start, goal).finish(map).0
}

pub fn search<M: MapTrait>(
    map: &M,
    algorithm: Algorithm,
    start: M::Reference,
    goal: M::Reference,
) -> TraversalResult<M::Reference> {
    match algorithm {
        Algorithm::Dfs => search_dfs(map, start, goal),
        Algorithm::Bfs => search_bfs(map, start, goal),
    }
}

#[cfg(test)]
mod test {
    use std::collections::{HashSet, VecDeque};

    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::grid::{GridMap, Point};

    fn p(row: usize, col: usize) -> Point {
        Point { row, col }
    }

    fn path(cells: &[(usize, usize)]) -> Option<Vec<Point>> {
        Some(cells.iter().map(|&(r, c)| p(r, c)).collect())
    }

    /// Straightforward search that carries the whole path on every frontier entry and never
    /// filters at insertion time
    fn reference_search(
        map: &GridMap,
        depth_first: bool,
        start: Point,
        goal: Point,
    ) -> (Option<Vec<Point>>, usize) {
        let mut frontier = VecDeque::from([(start, vec![start])]);
        let mut visited = HashSet::new();
        let mut obstacles = 0;

        loop {
            let next = if depth_first {
                frontier.pop_back()
            } else {
                frontier.pop_front()
            };
            let Some((current, so_far)) = next else {
                return (None, obstacles);
            };
            if !visited.insert(current) {
                continue;
            }
            if current == goal {
                return (Some(so_far), obstacles);
            }

            let (r, c) = (current.row as i64, current.col as i64);
            for (nr, nc) in [(r + 1, c), (r - 1, c), (r, c + 1), (r, c - 1)] {
                if nr < 0 || nc < 0 || nr >= map.rows as i64 || nc >= map.columns as i64 {
                    continue;
                }
                let next = p(nr as usize, nc as usize);
                if map.is_obstacle(next) {
                    obstacles += 1;
                } else {
                    let mut extended = so_far.clone();
                    extended.push(next);
                    frontier.push_back((next, extended));
                }
            }
        }
    }

    /// Hop distance between two cells through free cells
    fn shortest_distance(map: &GridMap, start: Point, goal: Point) -> Option<usize> {
        let mut distance = map.create_storage::<Option<usize>>();
        let mut queue = VecDeque::from([start]);
        *distance.get_mut(start) = Some(0);

        while let Some(current) = queue.pop_front() {
            let d = distance.get(current)?;
            if current == goal {
                return Some(d);
            }
            for neighbor in map.neighbors_of(current) {
                if let Neighbor::Open(next) = neighbor {
                    if distance.get(next).is_none() {
                        *distance.get_mut(next) = Some(d + 1);
                        queue.push_back(next);
                    }
                }
            }
        }
        None
    }

    fn assert_valid_path(map: &GridMap, path: &[Point], start: Point, goal: Point) {
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]), "{:?}", pair);
        }
        for cell in &path[1..] {
            assert!(!map.is_obstacle(*cell));
        }
    }

    #[test]
    fn test_open_grid_bfs() {
        let map = GridMap::new(3, 3);

        let result = search_bfs(&map, p(0, 0), p(2, 2));
        assert_eq!(result.path, path(&[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]));
        assert_eq!(result.obstacles_encountered, 0);
    }

    #[test]
    fn test_open_grid_dfs() {
        let map = GridMap::new(3, 3);

        let result = search_dfs(&map, p(0, 0), p(2, 2));
        assert_eq!(
            result.path,
            path(&[
                (0, 0),
                (0, 1),
                (0, 2),
                (1, 2),
                (1, 1),
                (1, 0),
                (2, 0),
                (2, 1),
                (2, 2)
            ])
        );
        assert_eq!(result.obstacles_encountered, 0);
    }

    #[test]
    fn test_start_is_goal() {
        let map: GridMap = "...\n.X.\n...".parse().unwrap();

        for algorithm in Algorithm::ALL {
            let result = search(&map, algorithm, p(1, 0), p(1, 0));
            assert_eq!(result.path, path(&[(1, 0)]));
            assert_eq!(result.obstacles_encountered, 0);
        }
    }

    #[test]
    fn test_boxed_in_start() {
        // both ways out of the corner are blocked
        let map: GridMap = ".X.\nX..\n...".parse().unwrap();

        for algorithm in Algorithm::ALL {
            let result = search(&map, algorithm, p(0, 0), p(2, 2));
            assert_eq!(result.path, None);
            assert_eq!(result.obstacles_encountered, 2);
        }
    }

    #[test]
    fn test_obstacle_counted_once_per_encounter() {
        let map: GridMap = "...\n.X.\n...".parse().unwrap();

        let bfs = search_bfs(&map, p(0, 0), p(2, 2));
        assert_eq!(bfs.path, path(&[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]));
        // a single obstacle, bumped into from all four sides
        assert_eq!(bfs.obstacles_encountered, 4);

        let dfs = search_dfs(&map, p(0, 0), p(2, 2));
        assert_eq!(dfs.path, path(&[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)]));
        assert_eq!(dfs.obstacles_encountered, 2);
    }

    #[test]
    fn test_unreachable_goal() {
        let map: GridMap = "..X..\n..X..\nXXX..\n.....".parse().unwrap();

        for algorithm in Algorithm::ALL {
            let result = search(&map, algorithm, p(0, 0), p(3, 4));
            assert_eq!(result.path, None);
            // (0,1) and (1,1) each hit the wall once, (1,0) and (1,1) hit the bottom wall
            assert_eq!(result.obstacles_encountered, 4);
        }
    }

    #[test]
    fn test_blocked_start_is_still_expanded() {
        let map: GridMap = "X..\n...\n...".parse().unwrap();

        let result = search_bfs(&map, p(0, 0), p(0, 2));
        assert_eq!(result.path, path(&[(0, 0), (0, 1), (0, 2)]));
        // the start cell is bumped into from both of its neighbors
        assert_eq!(result.obstacles_encountered, 2);
    }

    #[test]
    fn test_blocked_goal_is_never_reached() {
        let map: GridMap = "...\n...\n..X".parse().unwrap();

        let result = search_dfs(&map, p(0, 0), p(2, 2));
        assert_eq!(result.path, None);
        assert_eq!(result.obstacles_encountered, 2);
    }

    #[test]
    fn test_start_outside_map() {
        let map = GridMap::new(3, 3);

        let result = search_bfs(&map, p(5, 5), p(0, 0));
        assert_eq!(result.path, None);
        assert_eq!(result.obstacles_encountered, 0);
    }

    #[test]
    fn test_stepping() {
        let map = GridMap::new(1, 3);
        let mut finder = BreadthFirst::new(&map, p(0, 0), p(0, 2));

        assert_eq!(finder.state(), &PathFinderState::Computing);
        assert_eq!(finder.step(&map), &PathFinderState::Computing);
        assert_eq!(finder.expanded(), 1);
        assert_eq!(finder.frontier_len(), 1);
        assert!(finder.get_visited().get(p(0, 0)).is_some());

        finder.step(&map);
        let state = finder.step(&map).clone();
        assert_eq!(
            state,
            PathFinderState::PathFound(PathResult {
                path: vec![p(0, 0), p(0, 1), p(0, 2)],
                start: p(0, 0),
                goal: p(0, 2),
            })
        );
        // stepping a finished search changes nothing
        assert_eq!(finder.step(&map), &state);
        assert_eq!(finder.expanded(), 3);
    }

    #[test]
    fn test_visited_depths() {
        let map = GridMap::new(2, 2);
        let (_, visited) = BreadthFirst::new(&map, p(0, 0), p(1, 1)).finish(&map);

        assert_eq!(visited.get(p(1, 1)).as_ref().map(|v| v.depth), Some(2));
        assert_eq!(
            visited.get(p(1, 1)).as_ref().and_then(|v| v.from),
            Some(p(1, 0))
        );
    }

    #[test]
    fn test_matches_reference_on_random_worlds() {
        let mut rng = StdRng::seed_from_u64(0xbee);

        for _ in 0..40 {
            let map = GridMap::random(8, 18, &mut rng);
            let free: Vec<Point> = (0..8)
                .flat_map(|row| (0..8).map(move |col| p(row, col)))
                .filter(|pt| !map.is_obstacle(*pt))
                .collect();

            for _ in 0..10 {
                let start = free[rng.gen_range(0..free.len())];
                let goal = free[rng.gen_range(0..free.len())];

                let dfs = search_dfs(&map, start, goal);
                let bfs = search_bfs(&map, start, goal);

                let (ref_path, ref_obstacles) = reference_search(&map, true, start, goal);
                assert_eq!(dfs.path, ref_path);
                assert_eq!(dfs.obstacles_encountered, ref_obstacles);

                let (ref_path, ref_obstacles) = reference_search(&map, false, start, goal);
                assert_eq!(bfs.path, ref_path);
                assert_eq!(bfs.obstacles_encountered, ref_obstacles);

                // determinism
                assert_eq!(search_dfs(&map, start, goal), dfs);
                assert_eq!(search_bfs(&map, start, goal), bfs);

                match shortest_distance(&map, start, goal) {
                    Some(distance) => {
                        let dfs_path = dfs.path.unwrap();
                        let bfs_path = bfs.path.unwrap();
                        assert_valid_path(&map, &dfs_path, start, goal);
                        assert_valid_path(&map, &bfs_path, start, goal);
                        assert_eq!(bfs_path.len(), distance + 1);
                        assert!(bfs_path.len() <= dfs_path.len());
                    }
                    None => {
                        assert_eq!(dfs.path, None);
                        assert_eq!(bfs.path, None);
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("dfs".parse::<Algorithm>(), Ok(Algorithm::Dfs));
        assert_eq!("BFS".parse::<Algorithm>(), Ok(Algorithm::Bfs));
        assert_eq!(
            "astar".parse::<Algorithm>(),
            Err(GridError::UnknownAlgorithm("astar".into()))
        );
        assert_eq!(Algorithm::Bfs.to_string(), "BFS");
    }
}
