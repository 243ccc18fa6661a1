//! Presentation-side world state: the following camera, sliced-off pieces in free fall, drifting clouds.

use crate::game::Block;

/// Camera sits this far above the top of the tower.
pub const CAMERA_LEAD: f32 = 100.0;
/// Seconds the camera takes to reach a new target.
const CAMERA_MOVE_SECS: f32 = 0.3;
/// Downward acceleration for falling pieces (units/s²).
pub const GRAVITY: f32 = 1500.0;
/// Cloud sway amplitude (units) and half-period (seconds).
const CLOUD_SWAY: f32 = 30.0;
const CLOUD_SWAY_SECS: f32 = 5.0;

/// Vertical camera that eases linearly towards its target.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World y shown at the middle of the playfield.
    pub center_y: f32,
    from_y: f32,
    target_y: f32,
    elapsed: f32,
}

impl Camera {
    pub fn new(center_y: f32) -> Self {
        Self {
            center_y,
            from_y: center_y,
            target_y: center_y,
            elapsed: CAMERA_MOVE_SECS,
        }
    }

    /// Start moving so that `top_y` sits [`CAMERA_LEAD`] below the centre.
    pub fn follow(&mut self, top_y: f32) {
        self.from_y = self.center_y;
        self.target_y = top_y + CAMERA_LEAD;
        self.elapsed = 0.0;
    }

    /// Jump straight to the current target.
    pub fn settle(&mut self) {
        self.center_y = self.target_y;
        self.elapsed = CAMERA_MOVE_SECS;
    }

    pub fn update(&mut self, dt: f32) {
        if self.elapsed >= CAMERA_MOVE_SECS {
            return;
        }
        self.elapsed = (self.elapsed + dt).min(CAMERA_MOVE_SECS);
        let t = self.elapsed / CAMERA_MOVE_SECS;
        self.center_y = self.from_y + (self.target_y - self.from_y) * t;
    }
}

#[derive(Debug, Clone)]
pub struct FallingPiece {
    pub block: Block,
    pub velocity_y: f32,
}

impl FallingPiece {
    pub fn new(block: Block) -> Self {
        Self {
            block,
            velocity_y: 0.0,
        }
    }

    fn step(&mut self, dt: f32) {
        self.velocity_y -= GRAVITY * dt;
        self.block.position.y += self.velocity_y * dt;
    }
}

/// Everything drawn around the tower itself.
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub falling: Vec<FallingPiece>,
    /// Seconds since the scene was created; drives the clouds.
    pub clock: f32,
}

impl Scene {
    pub fn new(base_y: f32) -> Self {
        Self {
            camera: Camera::new(base_y + CAMERA_LEAD),
            falling: Vec::new(),
            clock: 0.0,
        }
    }

    /// Advance animations. Pieces whose top has dropped below `floor_y` are discarded.
    pub fn tick(&mut self, dt: f32, floor_y: f32) {
        self.clock += dt;
        self.camera.update(dt);
        self.falling.retain_mut(|p| {
            p.step(dt);
            p.block.max_y() >= floor_y
        });
    }

    pub fn cloud_offset(&self) -> f32 {
        cloud_offset(self.clock)
    }
}

/// Horizontal cloud drift at `t` seconds: out by [`CLOUD_SWAY`] and back, forever.
pub fn cloud_offset(t: f32) -> f32 {
    let phase = t.rem_euclid(2.0 * CLOUD_SWAY_SECS);
    if phase <= CLOUD_SWAY_SECS {
        CLOUD_SWAY * phase / CLOUD_SWAY_SECS
    } else {
        CLOUD_SWAY * (2.0 * CLOUD_SWAY_SECS - phase) / CLOUD_SWAY_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Point, Size};

    #[test]
    fn test_camera_eases_to_target() {
        let mut cam = Camera::new(200.0);
        cam.follow(160.0);
        cam.update(0.15);
        assert!((cam.center_y - 230.0).abs() < 1e-3);
        cam.update(1.0);
        assert_eq!(cam.center_y, 260.0);
        cam.update(1.0);
        assert_eq!(cam.center_y, 260.0);
    }

    #[test]
    fn test_camera_settle() {
        let mut cam = Camera::new(0.0);
        cam.follow(400.0);
        cam.settle();
        assert_eq!(cam.center_y, 500.0);
    }

    #[test]
    fn test_falling_piece_accelerates_and_is_culled() {
        let block = Block::new(Size::new(50.0, 40.0), Point::new(10.0, 100.0));
        let mut scene = Scene::new(100.0);
        scene.falling.push(FallingPiece::new(block));
        scene.tick(0.1, -1000.0);
        let first = scene.falling[0].block.position.y;
        assert!(first < 100.0);
        scene.tick(0.1, -1000.0);
        let second = scene.falling[0].block.position.y;
        assert!(100.0 - first < first - second);
        scene.tick(0.1, 1000.0);
        assert!(scene.falling.is_empty());
    }

    #[test]
    fn test_cloud_offset_sways() {
        assert_eq!(cloud_offset(0.0), 0.0);
        assert_eq!(cloud_offset(2.5), 15.0);
        assert_eq!(cloud_offset(5.0), 30.0);
        assert_eq!(cloud_offset(7.5), 15.0);
        assert_eq!(cloud_offset(10.0), 0.0);
    }
}
