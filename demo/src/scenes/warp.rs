//! Warp: streaks rushing past a fixed camera

use afterglow_core::scene::{CameraPose, DemoScene, UniformProvider, UniformSet, UniformValue};
use afterglow_core::{SyncSystem, TrackHandle};
use glam::Vec3;

use crate::renderer::DrawTarget;

const STREAK_LAYERS: usize = 3;

pub struct WarpScene {
    camera: CameraPose,
    speed_track: TrackHandle,
    speed: f32,
    progress: f32,
}

impl WarpScene {
    pub fn new() -> Self {
        Self {
            camera: CameraPose {
                position: Vec3::ZERO,
                direction: Vec3::NEG_Z,
                fov: 90.0,
                ..Default::default()
            },
            speed_track: TrackHandle::DUMMY,
            speed: 0.0,
            progress: 0.0,
        }
    }
}

impl Default for WarpScene {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformProvider for WarpScene {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        match name {
            "warp_speed" => Some(UniformValue::Float(self.speed)),
            "scene_progress" => Some(UniformValue::Float(self.progress)),
            _ => None,
        }
    }
}

impl DemoScene<DrawTarget> for WarpScene {
    fn name(&self) -> &str {
        "warp"
    }

    fn load(&mut self, sync: &mut SyncSystem) {
        self.speed_track = sync.track("warp:speed");
    }

    fn sync(&mut self, sync: &SyncSystem) {
        self.speed = sync.value(self.speed_track).max(0.0);
        self.progress = sync.scene_progress();
    }

    fn draw(&self, target: &mut DrawTarget) {
        let uniforms = UniformSet::new().with(self).with(&self.camera);
        for _ in 0..STREAK_LAYERS {
            target.draw_mesh("streaks", &uniforms);
        }
    }
}
