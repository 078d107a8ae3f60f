//! Per-frame consumers of the sync cursors
//!
//! - [`dispatch`] - picks the one scene that runs this tick
//! - [`reveal`] - page/item reveal windows from a driving value
//! - [`camera`] - camera frame interpolation
//! - [`lights`] - light reveal groups and the broadcast color buffer
//! - [`uniforms`] - shader uniform providers

pub mod camera;
pub mod dispatch;
pub mod lights;
pub mod reveal;
pub mod uniforms;

pub use camera::{CameraFrame, CameraPose, CameraRig};
pub use dispatch::{DemoScene, DispatchError, SceneDispatcher};
pub use lights::{LightColorBuffer, LightGroup, LightMesh};
pub use reveal::{cascade, divide_to_items, divide_to_pages};
pub use uniforms::{UniformProvider, UniformSet, UniformValue};
