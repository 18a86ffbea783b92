use ratmaze_common::{CellCoord, Side};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, check_dimensions};
use crate::rng::SeededRandom;

/// One grid unit with up to four walls.
///
/// `visited` is only meaningful while the maze is being carved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub has_wall_left: bool,
    pub has_wall_bottom: bool,
    pub has_wall_right: bool,
    pub has_wall_top: bool,
    #[serde(skip)]
    pub visited: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            has_wall_left: true,
            has_wall_bottom: true,
            has_wall_right: true,
            has_wall_top: true,
            visited: false,
        }
    }
}

impl Cell {
    pub fn has_wall(&self, side: Side) -> bool {
        match side {
            Side::Left => self.has_wall_left,
            Side::Bottom => self.has_wall_bottom,
            Side::Right => self.has_wall_right,
            Side::Top => self.has_wall_top,
        }
    }

    fn clear_wall(&mut self, side: Side) {
        match side {
            Side::Left => self.has_wall_left = false,
            Side::Bottom => self.has_wall_bottom = false,
            Side::Right => self.has_wall_right = false,
            Side::Top => self.has_wall_top = false,
        }
    }

    pub fn wall_count(&self) -> usize {
        Side::ALL.iter().filter(|s| self.has_wall(**s)).count()
    }
}

/// Rectangular grid of cells carved into a perfect maze.
///
/// Cells are mutated only by [`MazeGrid::generate`]; afterwards the wall
/// topology is read-only. Row `y = 0` is the bottom row and `Top` faces +Y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeGrid {
    width: usize,
    height: usize,
    /// Row-major: index = y * width + x.
    cells: Vec<Cell>,
    collectibles: Vec<CellCoord>,
    exit: CellCoord,
}

impl MazeGrid {
    /// Build a fully walled grid without carving it.
    pub fn walled(width: i64, height: i64) -> Result<Self, ConfigError> {
        check_dimensions(width, height)?;
        let (w, h) = (width as usize, height as usize);
        Ok(Self {
            width: w,
            height: h,
            cells: vec![Cell::default(); w * h],
            collectibles: Vec::new(),
            exit: CellCoord::new(width as i32 - 1, height as i32 - 1),
        })
    }

    /// Carve a perfect maze by randomized depth-first backtracking from (0,0).
    ///
    /// Uses an explicit stack; the RNG draw order is identical to the
    /// recursive formulation, so a given stream always yields the same maze.
    pub fn generate(width: i64, height: i64, rng: &mut SeededRandom) -> Result<Self, ConfigError> {
        let _span = tracing::info_span!("maze_generate", width, height).entered();
        let mut maze = Self::walled(width, height)?;

        let start = CellCoord::new(0, 0);
        maze.cell_mut(start).visited = true;
        // Each frame re-scans its unvisited neighbours when it is back on top,
        // exactly as the recursive walk does after a child call returns.
        let mut stack = vec![start];

        while let Some(&current) = stack.last() {
            let options = maze.unvisited_neighbors(current);
            if options.is_empty() {
                stack.pop();
                continue;
            }
            let side = options[rng.index(options.len())];
            let next = current.step(side);
            maze.cell_mut(current).clear_wall(side);
            let neighbor = maze.cell_mut(next);
            neighbor.clear_wall(side.opposite());
            neighbor.visited = true;
            stack.push(next);
        }

        tracing::info!(
            cells = maze.cells.len(),
            removed = maze.removed_wall_pairs(),
            "maze generated"
        );
        Ok(maze)
    }

    /// Rejection-sample up to `max` distinct collectible cells, skipping the
    /// start and exit cells. Gives up after `10 × count` attempts and keeps
    /// whatever was placed by then.
    pub fn place_collectibles(&mut self, max: usize, rng: &mut SeededRandom) {
        let count = max.min(self.width * self.height / 4);
        let max_attempts = count * 10;
        let start = CellCoord::new(0, 0);
        let mut placed: Vec<CellCoord> = Vec::with_capacity(count);
        let mut attempts = 0;

        while placed.len() < count && attempts < max_attempts {
            attempts += 1;
            let x = rng.int_exclusive(0, self.width as i64) as i32;
            let y = rng.int_exclusive(0, self.height as i64) as i32;
            let c = CellCoord::new(x, y);
            if c == start || c == self.exit || placed.contains(&c) {
                continue;
            }
            placed.push(c);
        }

        if placed.len() < count {
            tracing::debug!(
                requested = count,
                placed = placed.len(),
                "collectible placement ran out of attempts"
            );
        }
        self.collectibles = placed;
    }

    /// Replace the collectible set with explicit cells. Out-of-bounds,
    /// duplicate, start and exit cells are dropped.
    pub fn with_collectibles(mut self, cells: impl IntoIterator<Item = CellCoord>) -> Self {
        let start = CellCoord::new(0, 0);
        let mut placed = Vec::new();
        for c in cells {
            if self.in_bounds(c) && c != start && c != self.exit && !placed.contains(&c) {
                placed.push(c);
            }
        }
        self.collectibles = placed;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn collectibles(&self) -> &[CellCoord] {
        &self.collectibles
    }

    pub fn exit(&self) -> CellCoord {
        self.exit
    }

    pub fn in_bounds(&self, c: CellCoord) -> bool {
        c.x >= 0 && c.y >= 0 && (c.x as usize) < self.width && (c.y as usize) < self.height
    }

    pub fn cell(&self, c: CellCoord) -> Option<&Cell> {
        if self.in_bounds(c) {
            Some(&self.cells[c.y as usize * self.width + c.x as usize])
        } else {
            None
        }
    }

    fn cell_mut(&mut self, c: CellCoord) -> &mut Cell {
        let idx = c.y as usize * self.width + c.x as usize;
        &mut self.cells[idx]
    }

    /// Wall flag on `side` of `c`. Out-of-bounds cells are solid.
    pub fn has_wall(&self, c: CellCoord, side: Side) -> bool {
        self.cell(c).is_none_or(|cell| cell.has_wall(side))
    }

    /// Iterate `(coord, cell)` in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let coord = CellCoord::new((i % self.width) as i32, (i / self.width) as i32);
            (coord, cell)
        })
    }

    /// Neighbours reachable from `c` through an open wall.
    pub fn open_neighbors(&self, c: CellCoord) -> Vec<CellCoord> {
        let Some(cell) = self.cell(c) else {
            return Vec::new();
        };
        Side::ALL
            .iter()
            .filter(|side| !cell.has_wall(**side))
            .map(|side| c.step(*side))
            .filter(|n| self.in_bounds(*n))
            .collect()
    }

    /// Number of interior walls removed, counting each shared wall once.
    pub fn removed_wall_pairs(&self) -> usize {
        self.iter_cells()
            .map(|(c, cell)| {
                let right = !cell.has_wall_right && self.in_bounds(c.step(Side::Right));
                let top = !cell.has_wall_top && self.in_bounds(c.step(Side::Top));
                right as usize + top as usize
            })
            .sum()
    }

    // Scan order (right, left, top, bottom) is part of the deterministic
    // draw sequence and must not change.
    fn unvisited_neighbors(&self, c: CellCoord) -> Vec<Side> {
        [Side::Right, Side::Left, Side::Top, Side::Bottom]
            .into_iter()
            .filter(|side| {
                self.cell(c.step(*side))
                    .is_some_and(|neighbor| !neighbor.visited)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn connected_count(maze: &MazeGrid) -> usize {
        let mut seen = vec![false; maze.cell_count()];
        let mut queue = VecDeque::from([CellCoord::new(0, 0)]);
        seen[0] = true;
        let mut count = 1;
        while let Some(c) = queue.pop_front() {
            for n in maze.open_neighbors(c) {
                let idx = n.y as usize * maze.width() + n.x as usize;
                if !seen[idx] {
                    seen[idx] = true;
                    count += 1;
                    queue.push_back(n);
                }
            }
        }
        count
    }

    fn assert_mirrored(maze: &MazeGrid) {
        for (c, cell) in maze.iter_cells() {
            for side in Side::ALL {
                let n = c.step(side);
                match maze.cell(n) {
                    Some(other) => assert_eq!(
                        cell.has_wall(side),
                        other.has_wall(side.opposite()),
                        "wall mismatch between {c:?} and {n:?}"
                    ),
                    None => assert!(cell.has_wall(side), "boundary wall missing at {c:?}"),
                }
            }
        }
    }

    #[test]
    fn ten_by_eight_is_a_spanning_tree() {
        let mut rng = SeededRandom::new(5);
        let maze = MazeGrid::generate(10, 8, &mut rng).unwrap();
        assert_eq!(maze.removed_wall_pairs(), 79);
        assert_eq!(connected_count(&maze), 80);
        assert_mirrored(&maze);
    }

    #[test]
    fn many_sizes_and_seeds_are_perfect() {
        for seed in 0..20u32 {
            for (w, h) in [(1, 1), (1, 7), (6, 1), (2, 2), (5, 9), (13, 4)] {
                let mut rng = SeededRandom::new(seed);
                let maze = MazeGrid::generate(w, h, &mut rng).unwrap();
                let n = (w * h) as usize;
                assert_eq!(maze.removed_wall_pairs(), n - 1, "seed {seed} {w}x{h}");
                assert_eq!(connected_count(&maze), n, "seed {seed} {w}x{h}");
                assert_mirrored(&maze);
            }
        }
    }

    #[test]
    fn large_maze_does_not_overflow_the_stack() {
        let mut rng = SeededRandom::new(77);
        let maze = MazeGrid::generate(300, 300, &mut rng).unwrap();
        assert_eq!(maze.removed_wall_pairs(), 300 * 300 - 1);
    }

    #[test]
    fn same_seed_same_maze() {
        let a = MazeGrid::generate(12, 9, &mut SeededRandom::new(31)).unwrap();
        let b = MazeGrid::generate(12, 9, &mut SeededRandom::new(31)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let a = MazeGrid::generate(12, 9, &mut SeededRandom::new(1)).unwrap();
        let b = MazeGrid::generate(12, 9, &mut SeededRandom::new(2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn visited_flags_are_all_set_after_generation() {
        let maze = MazeGrid::generate(7, 7, &mut SeededRandom::new(3)).unwrap();
        assert!(maze.iter_cells().all(|(_, c)| c.visited));
    }

    #[test]
    fn invalid_dimensions_fail_fast() {
        let mut rng = SeededRandom::new(1);
        assert_eq!(
            MazeGrid::generate(0, 5, &mut rng),
            Err(ConfigError::InvalidDimensions { width: 0, height: 5 })
        );
        assert!(MazeGrid::generate(5, -2, &mut rng).is_err());
    }

    #[test]
    fn dimensions_wider_than_a_cell_coordinate_fail_before_allocating() {
        let wide = i32::MAX as i64 + 1;
        assert_eq!(
            MazeGrid::walled(wide, 1).map(|_| ()),
            Err(ConfigError::InvalidDimensions { width: wide, height: 1 })
        );
        let mut rng = SeededRandom::new(4);
        assert!(MazeGrid::generate(1, wide, &mut rng).is_err());
    }

    #[test]
    fn exit_is_far_corner() {
        let maze = MazeGrid::generate(10, 8, &mut SeededRandom::new(5)).unwrap();
        assert_eq!(maze.exit(), CellCoord::new(9, 7));
    }

    #[test]
    fn collectibles_are_distinct_and_avoid_start_and_exit() {
        for seed in 0..50 {
            let mut rng = SeededRandom::new(seed);
            let mut maze = MazeGrid::generate(10, 8, &mut rng).unwrap();
            maze.place_collectibles(5, &mut rng);
            let items = maze.collectibles();
            assert!(items.len() <= 5);
            for (i, c) in items.iter().enumerate() {
                assert!(maze.in_bounds(*c));
                assert_ne!(*c, CellCoord::new(0, 0));
                assert_ne!(*c, maze.exit());
                assert!(!items[i + 1..].contains(c));
            }
        }
    }

    #[test]
    fn collectible_count_is_capped_by_area() {
        let mut rng = SeededRandom::new(8);
        let mut maze = MazeGrid::generate(2, 4, &mut rng).unwrap();
        maze.place_collectibles(5, &mut rng);
        assert!(maze.collectibles().len() <= 2);

        let mut tiny = MazeGrid::generate(1, 3, &mut rng).unwrap();
        tiny.place_collectibles(5, &mut rng);
        assert!(tiny.collectibles().is_empty());
    }

    #[test]
    fn explicit_collectibles_are_filtered() {
        let maze = MazeGrid::generate(4, 4, &mut SeededRandom::new(2))
            .unwrap()
            .with_collectibles([
                CellCoord::new(0, 0),
                CellCoord::new(1, 2),
                CellCoord::new(1, 2),
                CellCoord::new(3, 3),
                CellCoord::new(7, 0),
                CellCoord::new(2, 0),
            ]);
        assert_eq!(maze.collectibles(), &[CellCoord::new(1, 2), CellCoord::new(2, 0)]);
    }

    #[test]
    fn out_of_bounds_is_solid() {
        let maze = MazeGrid::generate(3, 3, &mut SeededRandom::new(1)).unwrap();
        assert!(maze.has_wall(CellCoord::new(-1, 0), Side::Right));
        assert!(maze.has_wall(CellCoord::new(0, 3), Side::Bottom));
        assert!(maze.cell(CellCoord::new(3, 0)).is_none());
    }
}
