//! Sea: greetings revealed page by page over the water

use afterglow_core::scene::{
    CameraFrame, CameraRig, DemoScene, UniformProvider, UniformSet, UniformValue, cascade,
};
use afterglow_core::{SyncSystem, TrackHandle};
use glam::Vec3;

use crate::renderer::DrawTarget;

const GREETINGS: [[&str; 3]; 4] = [
    ["Brainstorm", "Conspiracy", "Fairlight"],
    ["Farbrausch", "Logicoma", "Mercury"],
    ["Ninjadev", "Rebels", "Still"],
    ["Titan", "Loonies", "Adapt"],
];

const FRAMES: [CameraFrame; 2] = [
    CameraFrame::new(Vec3::new(0.0, 3.0, 20.0), Vec3::new(0.0, -0.1, -1.0)),
    CameraFrame::new(Vec3::new(0.0, 1.5, 5.0), Vec3::new(0.0, 0.05, -1.0)),
];

/// One name on a greetings page.
#[derive(Debug, Clone, PartialEq)]
pub struct Greeting {
    pub text: String,
    pub alpha: f32,
}

impl UniformProvider for Greeting {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        (name == "text_alpha").then_some(UniformValue::Float(self.alpha))
    }
}

pub struct SeaScene {
    rig: CameraRig,
    greetings_track: TrackHandle,
    pages: Vec<Vec<Greeting>>,
}

impl SeaScene {
    pub fn new() -> Self {
        let pages = GREETINGS
            .iter()
            .map(|page| {
                page.iter()
                    .map(|text| Greeting {
                        text: text.to_string(),
                        alpha: 0.0,
                    })
                    .collect()
            })
            .collect();
        Self {
            rig: CameraRig::new(FRAMES.to_vec()),
            greetings_track: TrackHandle::DUMMY,
            pages,
        }
    }

    /// Apply the page/item cascade for `value`.
    fn reveal(&mut self, value: f32) {
        let item_count = self.pages.first().map_or(0, Vec::len);
        let alphas = cascade(self.pages.len(), item_count, value);
        for (page, page_alphas) in self.pages.iter_mut().zip(alphas) {
            for (greeting, alpha) in page.iter_mut().zip(page_alphas) {
                greeting.alpha = alpha;
            }
        }
    }
}

impl Default for SeaScene {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoScene<DrawTarget> for SeaScene {
    fn name(&self) -> &str {
        "sea"
    }

    fn load(&mut self, sync: &mut SyncSystem) {
        self.greetings_track = sync.track("sea:greetings");
    }

    fn sync(&mut self, sync: &SyncSystem) {
        self.rig.follow(sync);
        self.reveal(sync.value(self.greetings_track));
    }

    fn draw(&self, target: &mut DrawTarget) {
        let camera = UniformSet::new().with(self.rig.pose());
        target.draw_mesh("water", &camera);

        for greeting in self.pages.iter().flatten().filter(|g| g.alpha > 0.0) {
            let uniforms = UniformSet::new().with(greeting).with(&camera);
            target.draw_text(&greeting.text, &uniforms);
        }
    }
}
