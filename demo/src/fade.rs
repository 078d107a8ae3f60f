//! Full-screen fade overlay, independent of the active scene

use afterglow_core::SyncSystem;
use afterglow_core::TrackHandle;
use afterglow_core::scene::{UniformProvider, UniformSet, UniformValue};

use crate::renderer::Renderer;

pub const FADE_TRACK: &str = "fade";

#[derive(Debug)]
pub struct FadeOverlay {
    track: TrackHandle,
    alpha: f32,
}

impl FadeOverlay {
    pub fn new(sync: &mut SyncSystem) -> Self {
        Self {
            track: sync.track(FADE_TRACK),
            alpha: 0.0,
        }
    }

    pub fn sync(&mut self, sync: &SyncSystem) {
        self.alpha = sync.value(self.track).clamp(0.0, 1.0);
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        if self.alpha > 0.0 {
            renderer.draw_mesh("fade_quad", &UniformSet::new().with(self));
        }
    }
}

impl UniformProvider for FadeOverlay {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        (name == "fade").then_some(UniformValue::Float(self.alpha))
    }
}
