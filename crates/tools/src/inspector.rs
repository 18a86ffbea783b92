use std::collections::VecDeque;

use ratmaze_common::{CellCoord, Side};
use ratmaze_kernel::{GameSession, MazeGrid};

/// A structural defect found by [`MazeInspector::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("wall {side:?} of {cell} is not mirrored by its neighbour")]
    UnmirroredWall { cell: CellCoord, side: Side },
    #[error("boundary wall {side:?} of {cell} is open")]
    OpenBoundary { cell: CellCoord, side: Side },
    #[error("{unreachable} of {total} cells are unreachable from the start")]
    Disconnected { unreachable: usize, total: usize },
    #[error("expected {expected} open passages for a perfect maze, found {found}")]
    PassageCount { expected: usize, found: usize },
}

/// Read-only structural queries against a maze or running session.
pub struct MazeInspector;

impl MazeInspector {
    /// Produce a summary of the session state.
    pub fn summary(session: &GameSession) -> SessionSummary {
        let status = session.status();
        SessionSummary {
            tick: status.tick,
            seed: session.seed(),
            width: session.maze().width(),
            height: session.maze().height(),
            collected: status.collected,
            total: status.total,
            portal_active: status.portal_active,
            complete: status.complete,
            pending_events: session.events().len(),
        }
    }

    /// Gather topology statistics without judging them.
    pub fn report(maze: &MazeGrid) -> MazeReport {
        let distances = Self::distances_from(maze, CellCoord::new(0, 0));
        let reachable = distances.iter().filter(|d| d.is_some()).count();
        let farthest = distances.iter().flatten().copied().max().unwrap_or(0);
        MazeReport {
            width: maze.width(),
            height: maze.height(),
            removed_walls: maze.removed_wall_pairs(),
            reachable,
            dead_ends: Self::dead_ends(maze).len(),
            farthest,
            exit_distance: Self::shortest_path(maze, CellCoord::new(0, 0), maze.exit())
                .map(|p| p.len() - 1),
        }
    }

    /// Check that `maze` is a perfect maze: mirrored walls, closed boundary,
    /// every cell reachable and exactly `w*h - 1` passages.
    pub fn validate(maze: &MazeGrid) -> Result<MazeReport, TopologyError> {
        for (c, cell) in maze.iter_cells() {
            for side in Side::ALL {
                let n = c.step(side);
                if !maze.in_bounds(n) {
                    if !cell.has_wall(side) {
                        return Err(TopologyError::OpenBoundary { cell: c, side });
                    }
                } else if cell.has_wall(side) != maze.has_wall(n, side.opposite()) {
                    return Err(TopologyError::UnmirroredWall { cell: c, side });
                }
            }
        }

        let report = Self::report(maze);
        let total = maze.cell_count();
        if report.reachable != total {
            return Err(TopologyError::Disconnected {
                unreachable: total - report.reachable,
                total,
            });
        }
        if report.removed_walls != total - 1 {
            return Err(TopologyError::PassageCount {
                expected: total - 1,
                found: report.removed_walls,
            });
        }
        tracing::debug!(cells = total, "maze topology valid");
        Ok(report)
    }

    /// Breadth-first step counts from `from`, indexed row-major.
    pub fn distances_from(maze: &MazeGrid, from: CellCoord) -> Vec<Option<usize>> {
        let index = |c: CellCoord| c.y as usize * maze.width() + c.x as usize;
        let mut dist = vec![None; maze.cell_count()];
        if !maze.in_bounds(from) {
            return dist;
        }
        dist[index(from)] = Some(0);
        let mut queue = VecDeque::from([from]);
        while let Some(c) = queue.pop_front() {
            let d = dist[index(c)].unwrap_or(0);
            for n in maze.open_neighbors(c) {
                if dist[index(n)].is_none() {
                    dist[index(n)] = Some(d + 1);
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    /// Cells along the shortest passage route, both ends included.
    pub fn shortest_path(maze: &MazeGrid, from: CellCoord, to: CellCoord) -> Option<Vec<CellCoord>> {
        if !maze.in_bounds(from) || !maze.in_bounds(to) {
            return None;
        }
        let index = |c: CellCoord| c.y as usize * maze.width() + c.x as usize;
        let mut came_from: Vec<Option<CellCoord>> = vec![None; maze.cell_count()];
        let mut seen = vec![false; maze.cell_count()];
        seen[index(from)] = true;
        let mut queue = VecDeque::from([from]);

        while let Some(c) = queue.pop_front() {
            if c == to {
                let mut path = vec![to];
                let mut cur = to;
                while let Some(prev) = came_from[index(cur)] {
                    path.push(prev);
                    cur = prev;
                }
                path.reverse();
                return Some(path);
            }
            for n in maze.open_neighbors(c) {
                if !seen[index(n)] {
                    seen[index(n)] = true;
                    came_from[index(n)] = Some(c);
                    queue.push_back(n);
                }
            }
        }
        None
    }

    /// Cells with exactly one open passage.
    pub fn dead_ends(maze: &MazeGrid) -> Vec<CellCoord> {
        maze.iter_cells()
            .map(|(c, _)| c)
            .filter(|c| maze.open_neighbors(*c).len() == 1)
            .collect()
    }
}

/// Summary of session state for the inspector.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub tick: u64,
    pub seed: u32,
    pub width: usize,
    pub height: usize,
    pub collected: usize,
    pub total: usize,
    pub portal_active: bool,
    pub complete: bool,
    pub pending_events: usize,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session: tick={} seed={} maze={}x{} cheese={}/{} portal={} complete={} pending_events={}",
            self.tick,
            self.seed,
            self.width,
            self.height,
            self.collected,
            self.total,
            if self.portal_active { "open" } else { "closed" },
            self.complete,
            self.pending_events
        )
    }
}

/// Topology statistics for one maze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeReport {
    pub width: usize,
    pub height: usize,
    pub removed_walls: usize,
    pub reachable: usize,
    pub dead_ends: usize,
    /// Longest BFS distance from the start cell.
    pub farthest: usize,
    /// Steps from start to exit, if reachable.
    pub exit_distance: Option<usize>,
}

impl std::fmt::Display for MazeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Maze {}x{}: passages={} reachable={} dead_ends={} farthest={} exit_distance={}",
            self.width,
            self.height,
            self.removed_walls,
            self.reachable,
            self.dead_ends,
            self.farthest,
            self.exit_distance
                .map_or_else(|| "unreachable".to_string(), |d| d.to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratmaze_kernel::{GameConfig, SeededRandom};

    fn maze(w: i64, h: i64, seed: u32) -> MazeGrid {
        MazeGrid::generate(w, h, &mut SeededRandom::new(seed)).unwrap()
    }

    #[test]
    fn generated_mazes_validate() {
        for seed in 0..40 {
            let m = maze(7, 5, seed);
            let report = MazeInspector::validate(&m).unwrap();
            assert_eq!(report.removed_walls, 34);
            assert_eq!(report.reachable, 35);
        }
    }

    #[test]
    fn walled_grid_is_disconnected() {
        let m = MazeGrid::walled(3, 2).unwrap();
        assert_eq!(
            MazeInspector::validate(&m),
            Err(TopologyError::Disconnected {
                unreachable: 5,
                total: 6
            })
        );
        // A single walled cell is trivially perfect.
        assert!(MazeInspector::validate(&MazeGrid::walled(1, 1).unwrap()).is_ok());
    }

    #[test]
    fn path_follows_open_passages() {
        let m = maze(10, 8, 5);
        let path = MazeInspector::shortest_path(&m, CellCoord::new(0, 0), m.exit()).unwrap();
        assert_eq!(path.first(), Some(&CellCoord::new(0, 0)));
        assert_eq!(path.last(), Some(&m.exit()));
        for pair in path.windows(2) {
            assert!(m.open_neighbors(pair[0]).contains(&pair[1]));
        }
        let dist = MazeInspector::distances_from(&m, CellCoord::new(0, 0));
        let exit_index = m.exit().y as usize * 10 + m.exit().x as usize;
        assert_eq!(dist[exit_index], Some(path.len() - 1));
    }

    #[test]
    fn path_edge_cases() {
        let m = maze(4, 4, 1);
        let c = CellCoord::new(2, 2);
        assert_eq!(MazeInspector::shortest_path(&m, c, c), Some(vec![c]));
        assert_eq!(MazeInspector::shortest_path(&m, c, CellCoord::new(9, 9)), None);
        let walled = MazeGrid::walled(2, 1).unwrap();
        assert_eq!(
            MazeInspector::shortest_path(&walled, CellCoord::new(0, 0), CellCoord::new(1, 0)),
            None
        );
    }

    #[test]
    fn corridor_has_two_dead_ends() {
        let m = maze(1, 6, 3);
        assert_eq!(
            MazeInspector::dead_ends(&m),
            vec![CellCoord::new(0, 0), CellCoord::new(0, 5)]
        );
        assert_eq!(MazeInspector::report(&m).farthest, 5);
    }

    #[test]
    fn summary_display() {
        let session = GameSession::new(GameConfig::default()).unwrap();
        let summary = MazeInspector::summary(&session);
        assert_eq!(summary.tick, 0);
        let s = format!("{summary}");
        assert!(s.contains("tick=0"));
        assert!(s.contains("maze=10x8"));
        assert!(s.contains("portal=closed"));
    }

    #[test]
    fn report_display_names_exit_distance() {
        let report = MazeInspector::report(&maze(3, 3, 9));
        assert!(format!("{report}").contains("exit_distance="));
        assert!(report.exit_distance.is_some());
    }
}
