//! Camera frames and the interpolating camera rig
//!
//! A scene owns an ordered list of [`CameraFrame`]s. Each tick the frame
//! cursor from the sync system picks a pair of neighbouring frames and the
//! progress blends between them.

use glam::{Mat4, Vec3};

use super::uniforms::{UniformProvider, UniformValue};
use crate::error::Severity;
use crate::sync::SyncSystem;

/// Default camera field of view in degrees
pub const DEFAULT_CAMERA_FOV: f32 = 60.0;
pub const DEFAULT_ASPECT_RATIO: f32 = 16.0 / 9.0;

/// One authored camera key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub position: Vec3,
    pub direction: Vec3,
}

impl CameraFrame {
    pub const fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction,
        }
    }
}

/// Camera state for 3D rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Camera position in world space
    pub position: Vec3,
    /// Viewing direction (not necessarily normalized)
    pub direction: Vec3,
    /// Field of view in degrees
    pub fov: f32,
    /// Viewport width over height
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::NEG_Z,
            fov: DEFAULT_CAMERA_FOV,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraPose {
    /// Compute the view matrix (world-to-camera transform)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.direction, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect_ratio, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl UniformProvider for CameraPose {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        match name {
            "camera_position" => Some(UniformValue::Vec3(self.position)),
            "camera_direction" => Some(UniformValue::Vec3(self.direction)),
            "view" => Some(UniformValue::Mat4(self.view_matrix())),
            "view_projection" => Some(UniformValue::Mat4(self.view_projection_matrix())),
            _ => None,
        }
    }
}

/// Immutable frame list plus the pose derived from it.
#[derive(Debug, Clone)]
pub struct CameraRig {
    frames: Vec<CameraFrame>,
    pose: CameraPose,
    /// Last out-of-range frame reported, so a stuck cursor logs once
    reported_invalid: Option<i32>,
}

impl CameraRig {
    pub fn new(frames: Vec<CameraFrame>) -> Self {
        let mut pose = CameraPose::default();
        if let Some(first) = frames.first() {
            pose.position = first.position;
            pose.direction = first.direction;
        }
        Self {
            frames,
            pose,
            reported_invalid: None,
        }
    }

    pub fn frames(&self) -> &[CameraFrame] {
        &self.frames
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    fn frame_at(&self, index: i32) -> Option<&CameraFrame> {
        usize::try_from(index).ok().and_then(|i| self.frames.get(i))
    }

    /// Move the camera to `frame` blended towards `frame + 1` by `progress`.
    ///
    /// The last frame is held regardless of progress. An index outside the
    /// list leaves the pose untouched and returns `false`.
    pub fn set_frame(&mut self, frame: i32, progress: f32) -> bool {
        let Some(&from) = self.frame_at(frame) else {
            return false;
        };

        match frame.checked_add(1).and_then(|next| self.frame_at(next)) {
            Some(&to) => {
                let t = progress.clamp(0.0, 1.0);
                self.pose.position = from.position.lerp(to.position, t);
                self.pose.direction = from.direction.lerp(to.direction, t);
            }
            None => {
                self.pose.position = from.position;
                self.pose.direction = from.direction;
            }
        }
        true
    }

    /// Follow the frame cursor of `sync`.
    ///
    /// An out-of-range frame is a limited data error, reported once for as
    /// long as the cursor stays on it.
    pub fn follow(&mut self, sync: &SyncSystem) -> bool {
        let frame = sync.frame_index();
        if self.set_frame(frame, sync.frame_progress()) {
            self.reported_invalid = None;
            return true;
        }
        if self.reported_invalid != Some(frame) {
            sync.status().report(
                Severity::Limited,
                format!(
                    "Camera frame {} out of range ({} frames), keeping previous pose",
                    frame,
                    self.frames.len()
                ),
            );
            self.reported_invalid = Some(frame);
        }
        false
    }
}
