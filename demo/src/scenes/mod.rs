//! The demo's scenes
//!
//! Each scene registers its tracks in `load`, reads them in `sync` and
//! describes its draw calls in `draw`. Track names use a `scene:property`
//! scheme so they group by scene in the editor.

mod bunny;
mod crystals;
mod mountains;
mod sea;
mod warp;

use std::sync::{Arc, Mutex};

use afterglow_core::scene::{DispatchError, LightColorBuffer, SceneDispatcher};

use crate::config::SceneIndices;
use crate::renderer::DrawTarget;

pub use bunny::BunnyScene;
pub use crystals::CrystalsScene;
pub use mountains::MountainsScene;
pub use sea::SeaScene;
pub use warp::WarpScene;

/// Register every scene under its configured index.
pub fn register_all(
    dispatcher: &mut SceneDispatcher<DrawTarget>,
    indices: &SceneIndices,
    lights: Arc<Mutex<LightColorBuffer>>,
) -> Result<(), DispatchError> {
    dispatcher.register(indices.mountains, Box::new(MountainsScene::new()))?;
    dispatcher.register(indices.bunny, Box::new(BunnyScene::new()))?;
    dispatcher.register(indices.warp, Box::new(WarpScene::new()))?;
    dispatcher.register(indices.sea, Box::new(SeaScene::new()))?;
    dispatcher.register(indices.crystals, Box::new(CrystalsScene::new(lights)))?;
    Ok(())
}
