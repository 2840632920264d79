use crate::error::{GridError, Result};
use crate::find::{MapStorage, MapTrait, Neighbor, NodeReference};
use std::{fmt::Display, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Free,
    Obstacle,
    Start,
    Goal,
}

impl Cell {
    pub fn is_obstacle(&self) -> bool {
        matches!(self, Cell::Obstacle)
    }

    fn as_char(&self) -> char {
        match self {
            Cell::Free => ' ',
            Cell::Obstacle => 'X',
            Cell::Start => 'S',
            Cell::Goal => 'G',
        }
    }
}

impl TryFrom<char> for Cell {
    type Error = char;

    fn try_from(c: char) -> std::result::Result<Self, Self::Error> {
        match c {
            ' ' | '.' => Ok(Cell::Free),
            'X' | '#' => Ok(Cell::Obstacle),
            'S' => Ok(Cell::Start),
            'G' => Ok(Cell::Goal),
            other => Err(other),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True if the two points differ by exactly one step along one axis
    pub fn is_adjacent(&self, other: &Point) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl NodeReference for Point {}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl FromStr for Point {
    type Err = GridError;

    /// Accepts "row,col", optionally wrapped in parentheses
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GridError::InvalidPoint(s.to_string());

        let inner = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let (row, col) = inner.split_once(',').ok_or_else(invalid)?;

        Ok(Point {
            row: row.trim().parse().map_err(|_| invalid())?,
            col: col.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// A MapTrait implementation that uses a rectangular grid of cells
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<Vec<Cell>>,
}

impl GridMap {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![vec![Cell::Free; columns]; rows],
        }
    }

    /// Creates an `n` x `n` world and drops `obstacle_count` obstacles on it.
    ///
    /// Every draw picks a uniformly random coordinate. Draws are not deduplicated, so two draws
    /// landing on the same cell leave fewer obstacles than requested.
    pub fn random<R: Rng + ?Sized>(n: usize, obstacle_count: usize, rng: &mut R) -> Self {
        let mut map = Self::new(n, n);

        if n == 0 {
            return map;
        }

        for _ in 0..obstacle_count {
            let row = rng.gen_range(0..n);
            let col = rng.gen_range(0..n);
            map.cells[row][col] = Cell::Obstacle;
        }

        map
    }

    pub fn contains(&self, point: Point) -> bool {
        point.row < self.rows && point.col < self.columns
    }

    pub fn get(&self, point: Point) -> Option<Cell> {
        self.cells
            .get(point.row)
            .and_then(|row| row.get(point.col))
            .copied()
    }

    pub fn is_obstacle(&self, point: Point) -> bool {
        matches!(self.get(point), Some(Cell::Obstacle))
    }

    pub fn set_obstacle(&mut self, point: Point) -> Result<()> {
        self.check_bounds(point)?;
        self.cells[point.row][point.col] = Cell::Obstacle;
        Ok(())
    }

    /// All obstacle cells in row-major order
    pub fn obstacles(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.is_obstacle())
                .map(move |(col, _)| Point { row, col })
        })
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles().count()
    }

    pub fn start(&self) -> Option<Point> {
        self.find_marker(Cell::Start)
    }

    pub fn goal(&self) -> Option<Point> {
        self.find_marker(Cell::Goal)
    }

    /// Marks `point` as the start, clearing any previous start marker
    pub fn set_start(&mut self, point: Point) -> Result<()> {
        self.place_marker(point, Cell::Start)
    }

    /// Marks `point` as the goal, clearing any previous goal marker
    pub fn set_goal(&mut self, point: Point) -> Result<()> {
        self.place_marker(point, Cell::Goal)
    }

    /// Returns a copy of this world with the given endpoints marked, for a single run
    pub fn with_endpoints(&self, start: Point, goal: Point) -> Result<GridMap> {
        let mut map = self.clone();
        map.set_start(start)?;
        map.set_goal(goal)?;
        Ok(map)
    }

    /// Scales the map by the given factor, i.e. to make it twice as large, pass 2.
    /// Obstacles are repeated over the new cells, endpoint markers are dropped.
    pub fn scale_up(&mut self, factor: usize) {
        let mut new_cells = vec![vec![Cell::Free; self.columns * factor]; self.rows * factor];

        for row in 0..self.rows {
            for col in 0..self.columns {
                if !self.cells[row][col].is_obstacle() {
                    continue;
                }
                for r in 0..factor {
                    for c in 0..factor {
                        new_cells[row * factor + r][col * factor + c] = Cell::Obstacle;
                    }
                }
            }
        }

        self.rows *= factor;
        self.columns *= factor;
        self.cells = new_cells;
    }

    fn check_bounds(&self, point: Point) -> Result<()> {
        if self.contains(point) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                point,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    fn find_marker(&self, marker: Cell) -> Option<Point> {
        for (row, cells) in self.cells.iter().enumerate() {
            if let Some(col) = cells.iter().position(|c| *c == marker) {
                return Some(Point { row, col });
            }
        }
        None
    }

    fn place_marker(&mut self, point: Point, marker: Cell) -> Result<()> {
        self.check_bounds(point)?;
        if self.cells[point.row][point.col].is_obstacle() {
            return Err(GridError::Blocked(point));
        }

        if let Some(previous) = self.find_marker(marker) {
            self.cells[previous.row][previous.col] = Cell::Free;
        }
        self.cells[point.row][point.col] = marker;

        Ok(())
    }
}

impl Display for GridMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.cells {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl FromStr for GridMap {
    type Err = GridError;

    /// Parses the same text layout that `Display` produces, one line per row
    fn from_str(s: &str) -> Result<Self> {
        let mut cells: Vec<Vec<Cell>> = Vec::new();
        let mut seen_start = false;
        let mut seen_goal = false;

        for (line_index, line) in s.lines().enumerate() {
            let mut row = Vec::with_capacity(line.len());
            for (column, ch) in line.chars().enumerate() {
                let cell = Cell::try_from(ch).map_err(|ch| GridError::InvalidCell {
                    ch,
                    line: line_index,
                    column,
                })?;

                match cell {
                    Cell::Start if seen_start => return Err(GridError::DuplicateMarker('S')),
                    Cell::Goal if seen_goal => return Err(GridError::DuplicateMarker('G')),
                    Cell::Start => seen_start = true,
                    Cell::Goal => seen_goal = true,
                    _ => {}
                }

                row.push(cell);
            }

            if let Some(first) = cells.first() {
                if first.len() != row.len() {
                    return Err(GridError::RaggedRow {
                        line: line_index,
                        expected: first.len(),
                        got: row.len(),
                    });
                }
            }
            cells.push(row);
        }

        Ok(GridMap {
            rows: cells.len(),
            columns: cells.first().map_or(0, Vec::len),
            cells,
        })
    }
}

/// A MapStorage that uses a rectangular grid of cells (a vec in a vec)
#[derive(Debug)]
pub struct CellStorage<T>(Vec<Vec<T>>);

impl<T: Copy + 'static> MapStorage<T> for CellStorage<T> {
    type Reference = Point;

    fn is_valid(&self, node: Self::Reference) -> bool {
        node.row < self.0.len() && node.col < self.0[node.row].len()
    }

    fn get(&self, node: Self::Reference) -> T {
        self.0[node.row][node.col]
    }

    fn get_mut(&mut self, node: Self::Reference) -> &mut T {
        &mut self.0[node.row][node.col]
    }
}

impl<T: Display> Display for CellStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.0 {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl MapTrait for GridMap {
    type Reference = Point;
    type Storage<T: Default + Copy + Clone + 'static> = CellStorage<T>;

    fn is_valid(&self, node: Self::Reference) -> bool {
        self.contains(node)
    }

    fn neighbors_of(&self, node: Self::Reference) -> impl Iterator<Item = Neighbor<Point>> {
        let mut points = Vec::with_capacity(4);

        // down, up, right, left; this order decides which path wins when several exist
        if node.row + 1 < self.rows {
            points.push(Point {
                row: node.row + 1,
                col: node.col,
            });
        }
        if node.row > 0 {
            points.push(Point {
                row: node.row - 1,
                col: node.col,
            });
        }
        if node.col + 1 < self.columns {
            points.push(Point {
                row: node.row,
                col: node.col + 1,
            });
        }
        if node.col > 0 {
            points.push(Point {
                row: node.row,
                col: node.col - 1,
            });
        }

        let neighbors: Vec<_> = points
            .into_iter()
            .map(|p| {
                if self.cells[p.row][p.col].is_obstacle() {
                    Neighbor::Blocked(p)
                } else {
                    Neighbor::Open(p)
                }
            })
            .collect();

        neighbors.into_iter()
    }

    fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> Self::Storage<T> {
        CellStorage(vec![vec![Default::default(); self.columns]; self.rows])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn p(row: usize, col: usize) -> Point {
        Point { row, col }
    }

    #[test]
    fn test_random_is_reproducible() {
        let a = GridMap::random(10, 20, &mut StdRng::seed_from_u64(7));
        let b = GridMap::random(10, 20, &mut StdRng::seed_from_u64(7));

        assert_eq!(a, b);
        assert_eq!(a.rows, 10);
        assert_eq!(a.columns, 10);
        // duplicate draws are allowed to collapse
        assert!(a.obstacle_count() <= 20);
        assert!(a.obstacle_count() > 0);
    }

    #[test]
    fn test_random_without_obstacles_or_cells() {
        let mut rng = StdRng::seed_from_u64(1);

        let empty = GridMap::random(0, 20, &mut rng);
        assert_eq!(empty.rows, 0);
        assert_eq!(empty.obstacle_count(), 0);

        let clear = GridMap::random(4, 0, &mut rng);
        assert_eq!(clear.obstacle_count(), 0);
        assert!(clear.cells.iter().flatten().all(|c| *c == Cell::Free));
    }

    #[test]
    fn test_parse_and_display() {
        let text = "S.X\n.#.\n..G\n";
        let map: GridMap = text.parse().unwrap();

        assert_eq!(map.rows, 3);
        assert_eq!(map.columns, 3);
        assert_eq!(map.start(), Some(p(0, 0)));
        assert_eq!(map.goal(), Some(p(2, 2)));
        assert_eq!(map.obstacles().collect::<Vec<_>>(), vec![p(0, 2), p(1, 1)]);
        assert_eq!(map.to_string(), "S X\n X \n  G\n");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "...\n..".parse::<GridMap>(),
            Err(GridError::RaggedRow {
                line: 1,
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            "S.S".parse::<GridMap>(),
            Err(GridError::DuplicateMarker('S'))
        );
        assert!(matches!(
            "..?".parse::<GridMap>(),
            Err(GridError::InvalidCell { ch: '?', .. })
        ));
    }

    #[test]
    fn test_neighbor_order() {
        let map: GridMap = "...\n.X.\n...".parse().unwrap();

        let neighbors: Vec<_> = map.neighbors_of(p(1, 0)).collect();
        assert_eq!(
            neighbors,
            vec![
                Neighbor::Open(p(2, 0)),
                Neighbor::Open(p(0, 0)),
                Neighbor::Blocked(p(1, 1)),
            ]
        );

        let corner: Vec<_> = map.neighbors_of(p(0, 0)).collect();
        assert_eq!(corner, vec![Neighbor::Open(p(1, 0)), Neighbor::Open(p(0, 1))]);
    }

    #[test]
    fn test_endpoint_selection() {
        let mut map: GridMap = "...\n.X.\n...".parse().unwrap();

        assert_eq!(map.set_start(p(1, 1)), Err(GridError::Blocked(p(1, 1))));
        assert!(matches!(
            map.set_goal(p(3, 0)),
            Err(GridError::OutOfBounds { .. })
        ));

        map.set_start(p(0, 0)).unwrap();
        map.set_start(p(2, 0)).unwrap();
        assert_eq!(map.get(p(0, 0)), Some(Cell::Free));
        assert_eq!(map.start(), Some(p(2, 0)));

        let run = map.with_endpoints(p(0, 2), p(2, 2)).unwrap();
        assert_eq!(run.start(), Some(p(0, 2)));
        assert_eq!(run.goal(), Some(p(2, 2)));
        // the source world keeps its own markers
        assert_eq!(map.start(), Some(p(2, 0)));
        assert_eq!(map.goal(), None);
    }

    #[test]
    fn test_parse_point() {
        assert_eq!("3,4".parse::<Point>(), Ok(p(3, 4)));
        assert_eq!(" (0, 9) ".parse::<Point>(), Ok(p(0, 9)));
        assert!("3;4".parse::<Point>().is_err());
        assert!("-1,2".parse::<Point>().is_err());
    }

    #[test]
    fn test_scale_up() {
        let mut map: GridMap = "X.\nSG".parse().unwrap();
        map.scale_up(2);

        assert_eq!(map.to_string(), "XX  \nXX  \n    \n    \n");
    }
}
