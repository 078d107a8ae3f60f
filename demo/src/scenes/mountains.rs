//! Mountains: camera flight over terrain

use afterglow_core::scene::{
    CameraFrame, CameraRig, DemoScene, UniformProvider, UniformSet, UniformValue,
};
use afterglow_core::{SyncSystem, TrackHandle};
use glam::Vec3;

use crate::renderer::DrawTarget;

const FRAMES: [CameraFrame; 4] = [
    CameraFrame::new(Vec3::new(0.0, 40.0, 120.0), Vec3::new(0.0, -0.2, -1.0)),
    CameraFrame::new(Vec3::new(60.0, 30.0, 40.0), Vec3::new(-0.6, -0.3, -1.0)),
    CameraFrame::new(Vec3::new(20.0, 18.0, -60.0), Vec3::new(-0.2, -0.1, -1.0)),
    CameraFrame::new(Vec3::new(-40.0, 55.0, -140.0), Vec3::new(0.3, -0.5, -1.0)),
];

pub struct MountainsScene {
    rig: CameraRig,
    rotation_track: TrackHandle,
    rotation: f32,
    progress: f32,
}

impl MountainsScene {
    pub fn new() -> Self {
        Self {
            rig: CameraRig::new(FRAMES.to_vec()),
            rotation_track: TrackHandle::DUMMY,
            rotation: 0.0,
            progress: 0.0,
        }
    }
}

impl Default for MountainsScene {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformProvider for MountainsScene {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        match name {
            "rotation" => Some(UniformValue::Float(self.rotation)),
            "scene_progress" => Some(UniformValue::Float(self.progress)),
            _ => None,
        }
    }
}

impl DemoScene<DrawTarget> for MountainsScene {
    fn name(&self) -> &str {
        "mountains"
    }

    fn load(&mut self, sync: &mut SyncSystem) {
        self.rotation_track = sync.track("mountains:rotation");
    }

    fn sync(&mut self, sync: &SyncSystem) {
        self.rig.follow(sync);
        self.rotation = sync.value(self.rotation_track);
        self.progress = sync.scene_progress();
    }

    fn draw(&self, target: &mut DrawTarget) {
        let uniforms = UniformSet::new().with(self).with(self.rig.pose());
        target.draw_mesh("sky", &uniforms);
        target.draw_mesh("terrain", &uniforms);
    }
}
