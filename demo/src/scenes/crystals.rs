//! Crystals: light meshes mirrored to the stage lights

use std::sync::{Arc, Mutex};

use afterglow_core::scene::{
    CameraFrame, CameraRig, DemoScene, LightColorBuffer, LightGroup, LightMesh, UniformSet,
};
use afterglow_core::{SyncSystem, TrackHandle};
use glam::Vec3;

use crate::renderer::DrawTarget;

/// Effect id the stage rig uses for crystal lights
const CRYSTAL_EFFECT: u8 = 1;
const LIGHTS_PER_PAGE: u8 = 4;

const PALETTE: [Vec3; 3] = [
    Vec3::new(0.3, 0.8, 1.0),
    Vec3::new(1.0, 0.35, 0.8),
    Vec3::new(1.0, 0.9, 0.4),
];

const FRAMES: [CameraFrame; 2] = [
    CameraFrame::new(Vec3::new(-8.0, 2.0, 8.0), Vec3::new(1.0, -0.1, -1.0)),
    CameraFrame::new(Vec3::new(8.0, 3.0, 8.0), Vec3::new(-1.0, -0.2, -1.0)),
];

pub struct CrystalsScene {
    rig: CameraRig,
    lights_track: TrackHandle,
    group: LightGroup,
    output: Arc<Mutex<LightColorBuffer>>,
}

impl CrystalsScene {
    pub fn new(output: Arc<Mutex<LightColorBuffer>>) -> Self {
        let pages = PALETTE
            .iter()
            .enumerate()
            .map(|(page, &color)| {
                (0..LIGHTS_PER_PAGE)
                    .map(|i| {
                        LightMesh::new(CRYSTAL_EFFECT, page as u8 * LIGHTS_PER_PAGE + i, color)
                    })
                    .collect()
            })
            .collect();
        Self {
            rig: CameraRig::new(FRAMES.to_vec()),
            lights_track: TrackHandle::DUMMY,
            group: LightGroup::new(pages),
            output,
        }
    }
}

impl DemoScene<DrawTarget> for CrystalsScene {
    fn name(&self) -> &str {
        "crystals"
    }

    fn load(&mut self, sync: &mut SyncSystem) {
        self.lights_track = sync.track("crystals:lights");
    }

    fn sync(&mut self, sync: &SyncSystem) {
        self.rig.follow(sync);
        self.group.reveal(sync.value(self.lights_track));

        match self.output.lock() {
            Ok(mut buffer) => self.group.publish(&mut buffer),
            Err(poisoned) => self.group.publish(&mut poisoned.into_inner()),
        }
    }

    fn draw(&self, target: &mut DrawTarget) {
        let base = UniformSet::new().with(&self.group).with(self.rig.pose());
        for light in self.group.lights() {
            let uniforms = UniformSet::new().with(light).with(&base);
            target.draw_mesh("crystal", &uniforms);
        }
    }
}
