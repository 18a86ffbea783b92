use glam::{Mat4, Quat, Vec3};
use ratmaze_common::{CellCoord, Side};
use ratmaze_kernel::{GameSession, MazeGrid};

use crate::camera::ViewMode;

/// Cells drawn around the rat with culling on and performance mode.
pub const PERFORMANCE_RENDER_DISTANCE: i32 = 2;
/// Cells drawn around the rat with culling on and quality mode.
pub const QUALITY_RENDER_DISTANCE: i32 = 4;

pub const WALL_HEIGHT: f32 = 1.0;

pub type Color = [f32; 4];

pub const WALL_LINE_COLOR: Color = [0.0, 0.0, 1.0, 1.0];
pub const RAT_LINE_COLOR: Color = [0.8, 0.2, 0.2, 1.0];

/// Surface a quad is shaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    /// Left and right walls.
    WallSide,
    /// Top and bottom walls.
    WallFront,
    Floor,
}

/// A planar quad with corners in counter-clockwise order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [Vec3; 4],
    pub normal: Vec3,
    pub material: Material,
}

/// Props placed with a model transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    Rat,
    Cheese,
    Portal { active: bool },
}

/// Backend that receives primitives. Implementations never see game state.
pub trait DrawSink {
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Color);
    fn draw_quad(&mut self, quad: &Quad);
    fn draw_prop(&mut self, prop: Prop, transform: Mat4);
}

/// Primitive counts for one built frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub cells: usize,
    pub lines: usize,
    pub quads: usize,
    pub props: usize,
}

/// Walks the maze and game objects and emits primitives for one view.
#[derive(Debug, Clone, Copy)]
pub struct SceneBuilder {
    pub view: ViewMode,
    /// Draw only cells within this many cells of the rat. `None` draws all.
    pub render_distance: Option<i32>,
}

impl SceneBuilder {
    pub fn new(view: ViewMode) -> Self {
        Self {
            view,
            render_distance: None,
        }
    }

    /// Cull to the performance (2 cells) or quality (4 cells) distance.
    pub fn with_performance_mode(mut self, high_performance: bool) -> Self {
        self.render_distance = Some(if high_performance {
            PERFORMANCE_RENDER_DISTANCE
        } else {
            QUALITY_RENDER_DISTANCE
        });
        self
    }

    /// Inclusive cell ranges to draw around `around`.
    pub fn visible_range(&self, maze: &MazeGrid, around: CellCoord) -> (CellCoord, CellCoord) {
        let max = CellCoord::new(maze.width() as i32 - 1, maze.height() as i32 - 1);
        match self.render_distance {
            Some(d) => (
                CellCoord::new((around.x - d).max(0), (around.y - d).max(0)),
                CellCoord::new((around.x + d).min(max.x), (around.y + d).min(max.y)),
            ),
            None => (CellCoord::new(0, 0), max),
        }
    }

    pub fn build(&self, session: &GameSession, sink: &mut impl DrawSink) -> SceneStats {
        let mut stats = SceneStats::default();
        let maze = session.maze();
        let (lo, hi) = self.visible_range(maze, session.rat().pose().cell());

        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                let c = CellCoord::new(x, y);
                stats.cells += 1;
                if self.view == ViewMode::Top {
                    self.cell_lines(maze, c, sink, &mut stats);
                } else {
                    self.cell_quads(maze, c, sink, &mut stats);
                }
            }
        }

        let rat = session.rat();
        let rat_pos = rat.position().as_vec2().extend(0.0);
        match self.view {
            ViewMode::Top => {
                let outline = rat_outline(rat_pos, rat.heading() as f32);
                for i in 0..outline.len() {
                    sink.draw_line(outline[i], outline[(i + 1) % outline.len()], RAT_LINE_COLOR);
                    stats.lines += 1;
                }
            }
            ViewMode::Observation => {
                sink.draw_prop(Prop::Rat, prop_transform(rat_pos, rat.heading() as f32));
                stats.props += 1;
            }
            // The camera sits inside the rat.
            ViewMode::Rat => {}
        }

        let portal = session.portal();
        sink.draw_prop(
            Prop::Portal {
                active: portal.is_active(),
            },
            prop_transform(portal.position().as_vec2().extend(0.0), 0.0),
        );
        stats.props += 1;

        for item in session.remaining_collectibles() {
            sink.draw_prop(Prop::Cheese, prop_transform(item.as_vec2().extend(0.0), 0.0));
            stats.props += 1;
        }

        tracing::trace!(?stats, view = ?self.view, "scene built");
        stats
    }

    fn cell_lines(&self, maze: &MazeGrid, c: CellCoord, sink: &mut impl DrawSink, stats: &mut SceneStats) {
        for side in Side::ALL {
            if maze.has_wall(c, side) {
                let [a, b] = wall_segment(c, side);
                sink.draw_line(a, b, WALL_LINE_COLOR);
                stats.lines += 1;
            }
        }
    }

    fn cell_quads(&self, maze: &MazeGrid, c: CellCoord, sink: &mut impl DrawSink, stats: &mut SceneStats) {
        for side in Side::ALL {
            if maze.has_wall(c, side) {
                let [a, b] = wall_segment(c, side);
                let up = Vec3::Z * WALL_HEIGHT;
                let (dx, dy) = side.delta();
                sink.draw_quad(&Quad {
                    corners: [a, b, b + up, a + up],
                    normal: Vec3::new(dx as f32, dy as f32, 0.0),
                    material: match side {
                        Side::Left | Side::Right => Material::WallSide,
                        Side::Bottom | Side::Top => Material::WallFront,
                    },
                });
                stats.quads += 1;
            }
        }
        let (x, y) = (c.x as f32, c.y as f32);
        sink.draw_quad(&Quad {
            corners: [
                Vec3::new(x, y, 0.0),
                Vec3::new(x + 1.0, y, 0.0),
                Vec3::new(x + 1.0, y + 1.0, 0.0),
                Vec3::new(x, y + 1.0, 0.0),
            ],
            normal: Vec3::Z,
            material: Material::Floor,
        });
        stats.quads += 1;
    }
}

/// Ground-level endpoints of the wall on `side` of `c`.
pub fn wall_segment(c: CellCoord, side: Side) -> [Vec3; 2] {
    let (x, y) = (c.x as f32, c.y as f32);
    match side {
        Side::Left => [Vec3::new(x, y, 0.0), Vec3::new(x, y + 1.0, 0.0)],
        Side::Bottom => [Vec3::new(x, y, 0.0), Vec3::new(x + 1.0, y, 0.0)],
        Side::Right => [Vec3::new(x + 1.0, y, 0.0), Vec3::new(x + 1.0, y + 1.0, 0.0)],
        Side::Top => [Vec3::new(x, y + 1.0, 0.0), Vec3::new(x + 1.0, y + 1.0, 0.0)],
    }
}

fn prop_transform(at: Vec3, heading: f32) -> Mat4 {
    Mat4::from_rotation_translation(Quat::from_rotation_z(heading.to_radians()), at)
}

/// Triangle pointing along the heading, for the overhead view.
fn rat_outline(at: Vec3, heading: f32) -> [Vec3; 3] {
    let m = prop_transform(at, heading);
    [
        m.transform_point3(Vec3::new(0.3, 0.0, 0.0)),
        m.transform_point3(Vec3::new(-0.2, 0.15, 0.0)),
        m.transform_point3(Vec3::new(-0.2, -0.15, 0.0)),
    ]
}

/// Sink that stores everything it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub lines: Vec<(Vec3, Vec3, Color)>,
    pub quads: Vec<Quad>,
    pub props: Vec<(Prop, Mat4)>,
}

impl DrawSink for RecordingSink {
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Color) {
        self.lines.push((from, to, color));
    }

    fn draw_quad(&mut self, quad: &Quad) {
        self.quads.push(*quad);
    }

    fn draw_prop(&mut self, prop: Prop, transform: Mat4) {
        self.props.push((prop, transform));
    }
}
