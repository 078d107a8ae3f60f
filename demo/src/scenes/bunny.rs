//! Bunny: a turning, rising model under an orbiting camera

use afterglow_core::scene::{
    CameraFrame, CameraRig, DemoScene, UniformProvider, UniformSet, UniformValue,
};
use afterglow_core::{SyncSystem, TrackHandle};
use glam::{Mat4, Vec3};

use crate::renderer::DrawTarget;

const FRAMES: [CameraFrame; 3] = [
    CameraFrame::new(Vec3::new(0.0, 1.0, 6.0), Vec3::new(0.0, 0.0, -1.0)),
    CameraFrame::new(Vec3::new(5.0, 2.0, 3.0), Vec3::new(-1.0, -0.2, -0.6)),
    CameraFrame::new(Vec3::new(0.0, 6.0, 2.0), Vec3::new(0.0, -1.0, -0.3)),
];

pub struct BunnyScene {
    rig: CameraRig,
    rotation_track: TrackHandle,
    elevation_track: TrackHandle,
    model: Mat4,
    rotation: f32,
}

impl BunnyScene {
    pub fn new() -> Self {
        Self {
            rig: CameraRig::new(FRAMES.to_vec()),
            rotation_track: TrackHandle::DUMMY,
            elevation_track: TrackHandle::DUMMY,
            model: Mat4::IDENTITY,
            rotation: 0.0,
        }
    }

    /// Model transform for a rotation in turns and an elevation in units
    fn model_matrix(rotation: f32, elevation: f32) -> Mat4 {
        Mat4::from_translation(Vec3::Y * elevation)
            * Mat4::from_rotation_y(rotation * std::f32::consts::TAU)
    }
}

impl Default for BunnyScene {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformProvider for BunnyScene {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        match name {
            "model" => Some(UniformValue::Mat4(self.model)),
            "rotation" => Some(UniformValue::Float(self.rotation)),
            _ => None,
        }
    }
}

impl DemoScene<DrawTarget> for BunnyScene {
    fn name(&self) -> &str {
        "bunny"
    }

    fn load(&mut self, sync: &mut SyncSystem) {
        self.rotation_track = sync.track("bunny:rotation");
        self.elevation_track = sync.track("bunny:elevation");
    }

    fn sync(&mut self, sync: &SyncSystem) {
        self.rig.follow(sync);
        self.rotation = sync.value(self.rotation_track);
        self.model = Self::model_matrix(self.rotation, sync.value(self.elevation_track));
    }

    fn draw(&self, target: &mut DrawTarget) {
        let uniforms = UniformSet::new().with(self).with(self.rig.pose());
        target.draw_mesh("bunny", &uniforms);
        target.draw_mesh("floor", &UniformSet::new().with(self.rig.pose()));
    }
}
