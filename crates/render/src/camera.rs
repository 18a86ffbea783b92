use glam::{Mat4, Vec3};
use ratmaze_kernel::{GameSession, MazeGrid};

/// Margin around the maze in the overhead view, in cells.
pub const TOP_VIEW_MARGIN: f32 = 0.5;

/// Which camera the scene is seen through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Orthographic, straight down, whole maze in frame.
    Top,
    /// Third person, behind and above the rat.
    #[default]
    Observation,
    /// First person, from the rat's snout.
    Rat,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Top => "Top View",
            ViewMode::Observation => "Third-Person View",
            ViewMode::Rat => "First-Person View",
        }
    }
}

/// Projection parameters for one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
    },
    Perspective {
        fov_degrees: f32,
        near: f32,
        far: f32,
    },
}

/// Camera placement for one frame. World is Z-up, the maze lies in the XY
/// plane at z = 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub mode: ViewMode,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Camera {
    /// World-to-view transform. The overhead view maps maze XY directly.
    pub fn view_matrix(&self) -> Mat4 {
        match self.mode {
            ViewMode::Top => Mat4::IDENTITY,
            _ => Mat4::look_at_rh(self.eye, self.target, self.up),
        }
    }

    /// View-to-clip transform for a viewport of the given aspect ratio.
    /// The overhead view widens its bounds so the maze keeps its shape.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
            } => {
                let (l, r, b, t) = fit_aspect(left, right, bottom, top, aspect);
                Mat4::orthographic_rh_gl(l, r, b, t, -10.0, 10.0)
            }
            Projection::Perspective {
                fov_degrees,
                near,
                far,
            } => Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect, near, far),
        }
    }
}

fn fit_aspect(left: f32, right: f32, bottom: f32, top: f32, aspect: f32) -> (f32, f32, f32, f32) {
    let width = right - left;
    let height = top - bottom;
    if aspect >= width / height {
        let half = aspect * height / 2.0;
        let mid = (left + right) / 2.0;
        (mid - half, mid + half, bottom, top)
    } else {
        let half = width / aspect / 2.0;
        let mid = (bottom + top) / 2.0;
        (left, right, mid - half, mid + half)
    }
}

/// Computes a [`Camera`] for the current mode from the rat pose.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraRig {
    pub mode: ViewMode,
    /// Follow the rat's smoothed position instead of the raw one.
    pub smoothing: bool,
}

impl CameraRig {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            smoothing: false,
        }
    }

    pub fn camera(&self, session: &GameSession) -> Camera {
        let rat = session.rat();
        let pos = if self.smoothing {
            rat.smoothed_position()
        } else {
            rat.position()
        };
        self.camera_at(session.maze(), pos.as_vec2().extend(0.0), rat.heading() as f32)
    }

    /// Camera for a rat at `rat` (z ignored) facing `heading` degrees.
    pub fn camera_at(&self, maze: &MazeGrid, rat: Vec3, heading: f32) -> Camera {
        let far = (maze.width() + maze.height()) as f32 * 2.0;
        let (sin, cos) = heading.to_radians().sin_cos();
        let dir = Vec3::new(cos, sin, 0.0);
        let ground = Vec3::new(rat.x, rat.y, 0.0);
        match self.mode {
            ViewMode::Top => {
                let w = maze.width() as f32;
                let h = maze.height() as f32;
                Camera {
                    mode: ViewMode::Top,
                    eye: Vec3::new(w / 2.0, h / 2.0, 10.0),
                    target: Vec3::new(w / 2.0, h / 2.0, 0.0),
                    up: Vec3::Y,
                    projection: Projection::Orthographic {
                        left: -TOP_VIEW_MARGIN,
                        right: w + TOP_VIEW_MARGIN,
                        bottom: -TOP_VIEW_MARGIN,
                        top: h + TOP_VIEW_MARGIN,
                    },
                }
            }
            ViewMode::Observation => Camera {
                mode: ViewMode::Observation,
                eye: ground - dir * 2.0 + Vec3::Z * 3.0,
                target: ground + dir * 0.5 + Vec3::Z * 0.3,
                up: Vec3::Z,
                projection: Projection::Perspective {
                    fov_degrees: 75.0,
                    near: 0.1,
                    far,
                },
            },
            ViewMode::Rat => Camera {
                mode: ViewMode::Rat,
                eye: ground + dir * 0.5 + Vec3::Z * 0.25,
                target: ground + dir * 3.0 + Vec3::Z * 0.25,
                up: Vec3::Z,
                projection: Projection::Perspective {
                    fov_degrees: 90.0,
                    near: 0.01,
                    far,
                },
            },
        }
    }
}
