//! Scene selection
//!
//! Scenes register under the integer index the scene track uses for them.
//! Each tick exactly one scene, the one matching the current scene index,
//! is synced and drawn. Indices with no scene draw nothing.

use thiserror::Error;

use crate::sync::SyncSystem;

/// One mutually exclusive part of the demo.
///
/// `R` is the draw target supplied by the host.
pub trait DemoScene<R: ?Sized> {
    fn name(&self) -> &str;

    /// Register tracks and prepare resources. Called once before playback.
    fn load(&mut self, _sync: &mut SyncSystem) {}

    /// Read this tick's sync values.
    fn sync(&mut self, sync: &SyncSystem);

    fn draw(&self, target: &mut R);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("scene index {index} is already used by '{existing}'")]
    DuplicateIndex { index: i32, existing: String },
}

struct Slot<R: ?Sized> {
    index: i32,
    scene: Box<dyn DemoScene<R>>,
}

pub struct SceneDispatcher<R: ?Sized> {
    slots: Vec<Slot<R>>,
    active: Option<usize>,
    /// Scene index seen on the previous tick
    last_index: Option<i32>,
}

impl<R: ?Sized> Default for SceneDispatcher<R> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            active: None,
            last_index: None,
        }
    }
}

impl<R: ?Sized> SceneDispatcher<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        index: i32,
        scene: Box<dyn DemoScene<R>>,
    ) -> Result<(), DispatchError> {
        if let Some(slot) = self.slots.iter().find(|s| s.index == index) {
            return Err(DispatchError::DuplicateIndex {
                index,
                existing: slot.scene.name().to_string(),
            });
        }
        tracing::debug!(index, scene = scene.name(), "Scene registered");
        self.slots.push(Slot { index, scene });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn load_all(&mut self, sync: &mut SyncSystem) {
        for slot in &mut self.slots {
            slot.scene.load(sync);
        }
    }

    /// Pick the scene for the current scene index and sync it.
    ///
    /// Returns the active scene's name.
    pub fn sync(&mut self, sync: &SyncSystem) -> Option<&str> {
        let index = sync.scene_index();
        self.active = self.slots.iter().position(|s| s.index == index);

        if self.last_index != Some(index) {
            match self.active {
                Some(i) => {
                    tracing::info!(index, scene = self.slots[i].scene.name(), "Scene change")
                }
                None => tracing::debug!(index, "No scene for index"),
            }
            self.last_index = Some(index);
        }

        let slot = &mut self.slots[self.active?];
        slot.scene.sync(sync);
        Some(slot.scene.name())
    }

    /// Draw the scene chosen by the last [`Self::sync`].
    pub fn draw(&self, target: &mut R) {
        if let Some(slot) = self.active.and_then(|i| self.slots.get(i)) {
            slot.scene.draw(target);
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active
            .and_then(|i| self.slots.get(i))
            .map(|slot| slot.scene.name())
    }
}
