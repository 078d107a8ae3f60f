//! Draw call sink
//!
//! Scenes describe what to draw through [`Renderer`]; the GPU backend lives
//! outside this crate. [`TraceRenderer`] resolves each call's uniforms and
//! logs it, which is enough to run the whole frame loop headless.

use afterglow_core::scene::{UniformSet, UniformValue};

/// Uniform names every draw call asks for
pub const UNIFORM_NAMES: &[&str] = &[
    "view",
    "view_projection",
    "model",
    "camera_position",
    "camera_direction",
    "scene_progress",
    "rotation",
    "warp_speed",
    "light_color",
    "light_alpha",
    "light_intensity",
    "text_alpha",
    "fade",
];

pub trait Renderer {
    fn begin_frame(&mut self, row: f64);
    fn draw_mesh(&mut self, mesh: &str, uniforms: &UniformSet<'_>);
    fn draw_text(&mut self, text: &str, uniforms: &UniformSet<'_>);
    fn end_frame(&mut self);
}

/// Draw target handed to scenes
pub type DrawTarget = dyn Renderer;

/// Per-frame draw statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub meshes: u32,
    pub texts: u32,
}

/// Renderer that only logs draw calls at trace level.
#[derive(Debug, Default)]
pub struct TraceRenderer {
    frames: u64,
    current: FrameStats,
    last: FrameStats,
}

impl TraceRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Counts for the last completed frame
    pub fn last_frame(&self) -> FrameStats {
        self.last
    }

    fn log_uniforms(kind: &str, what: &str, uniforms: &UniformSet<'_>) {
        let resolved: Vec<(&str, UniformValue)> = uniforms.resolve_all(UNIFORM_NAMES);
        tracing::trace!(kind, what, uniforms = ?resolved, "draw");
    }
}

impl Renderer for TraceRenderer {
    fn begin_frame(&mut self, row: f64) {
        self.current = FrameStats::default();
        tracing::trace!(frame = self.frames, row, "begin frame");
    }

    fn draw_mesh(&mut self, mesh: &str, uniforms: &UniformSet<'_>) {
        self.current.meshes += 1;
        Self::log_uniforms("mesh", mesh, uniforms);
    }

    fn draw_text(&mut self, text: &str, uniforms: &UniformSet<'_>) {
        self.current.texts += 1;
        Self::log_uniforms("text", text, uniforms);
    }

    fn end_frame(&mut self) {
        self.last = self.current;
        self.frames += 1;
    }
}
