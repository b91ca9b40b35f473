use crate::components::Sides;

/// Maximum downward velocity to prevent tunneling through 42-unit platforms.
pub const MAX_FALL_SPEED: f32 = 1000.0;

/// Probe distance used to detect a body resting on top of a solid.
const REST_PROBE: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn from_center(x: f32, y: f32, width: f32, height: f32) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self {
            min_x: x - hw,
            min_y: y - hh,
            max_x: x + hw,
            max_y: y + hh,
        }
    }

    pub fn from_top_left(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Strict intersection: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max_x > other.min_x
            && self.min_x < other.max_x
            && self.max_y > other.min_y
            && self.min_y < other.max_y
    }

    fn shifted(&self, dx: f32, dy: f32) -> Self {
        Self {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy)]
pub struct MotionParams {
    pub dt: f32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    pub collide_world_bounds: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct MotionResult {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub touching: Sides,
    pub blocked: Sides,
}

pub fn apply_gravity(vy: &mut f32, gravity: f32, dt: f32) {
    *vy += gravity * dt;
    *vy = vy.min(MAX_FALL_SPEED);
}

/// Integrates one step and separates the body from `solids`, resolving the
/// x axis first and then y. Solids are immovable; the moving body absorbs
/// the full separation and loses its velocity on the blocked axis.
pub fn resolve_motion(
    solids: &[Aabb],
    bounds: WorldBounds,
    params: MotionParams,
) -> MotionResult {
    let MotionParams {
        dt,
        x,
        y,
        vx,
        vy,
        width,
        height,
        collide_world_bounds,
    } = params;
    let mut touching = Sides::default();
    let mut blocked = Sides::default();
    let mut out_x = x + vx * dt;
    let mut out_y = y;
    let mut out_vx = vx;
    let mut out_vy = vy;
    let dx = vx * dt;
    let dy = vy * dt;

    let x_aabb = Aabb::from_center(out_x, out_y, width, height);
    let hits = overlapping(solids, &x_aabb);
    if dx > 0.0 {
        if let Some(wall) = hits.iter().map(|s| s.min_x).reduce(f32::min) {
            out_x = wall - width / 2.0;
            out_vx = 0.0;
            touching.right = true;
        }
    } else if dx < 0.0 {
        if let Some(wall) = hits.iter().map(|s| s.max_x).reduce(f32::max) {
            out_x = wall + width / 2.0;
            out_vx = 0.0;
            touching.left = true;
        }
    }

    if collide_world_bounds {
        if out_x - width / 2.0 < 0.0 {
            out_x = width / 2.0;
            out_vx = 0.0;
            blocked.left = true;
        } else if out_x + width / 2.0 > bounds.width {
            out_x = bounds.width - width / 2.0;
            out_vx = 0.0;
            blocked.right = true;
        }
    }

    out_y += dy;
    let y_aabb = Aabb::from_center(out_x, out_y, width, height);
    let hits = overlapping(solids, &y_aabb);
    if dy > 0.0 {
        if let Some(floor) = hits.iter().map(|s| s.min_y).reduce(f32::min) {
            out_y = floor - height / 2.0;
            out_vy = 0.0;
            touching.down = true;
        }
    } else if dy < 0.0 {
        if let Some(ceiling) = hits.iter().map(|s| s.max_y).reduce(f32::max) {
            out_y = ceiling + height / 2.0;
            out_vy = 0.0;
            touching.up = true;
        }
    }

    if collide_world_bounds {
        if out_y - height / 2.0 < 0.0 {
            out_y = height / 2.0;
            out_vy = 0.0;
            blocked.up = true;
        } else if out_y + height / 2.0 > bounds.height {
            out_y = bounds.height - height / 2.0;
            out_vy = 0.0;
            blocked.down = true;
        }
    }

    if !touching.down && out_vy >= 0.0 {
        touching.down = resting_on_solid(solids, out_x, out_y, width, height);
    }

    MotionResult {
        x: out_x,
        y: out_y,
        vx: out_vx,
        vy: out_vy,
        touching,
        blocked,
    }
}

/// True when a solid lies directly beneath the body's feet.
pub fn resting_on_solid(
    solids: &[Aabb],
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> bool {
    let probe = Aabb::from_center(x, y, width, height).shifted(0.0, REST_PROBE);
    !overlapping(solids, &probe).is_empty()
}

fn overlapping(solids: &[Aabb], aabb: &Aabb) -> Vec<Aabb> {
    solids.iter().copied().filter(|s| s.overlaps(aabb)).collect()
}
