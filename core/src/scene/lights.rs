//! Light meshes, reveal groups and the shared color buffer
//!
//! The main thread reveals lights from a track value and writes their colors
//! into a [`LightColorBuffer`]. The broadcaster thread drains the entries that
//! changed. Both sides hold the buffer's lock only briefly.

use afterglow_shared::LightRecord;
use glam::Vec3;
use hashbrown::HashMap;

use super::reveal;
use super::uniforms::{UniformProvider, UniformValue};

/// A light fixture drawn as a mesh and mirrored to stage hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightMesh {
    pub effect: u8,
    pub light: u8,
    pub color: Vec3,
    /// Reveal amount in `[0, 1]`
    pub alpha: f32,
}

impl LightMesh {
    pub fn new(effect: u8, light: u8, color: Vec3) -> Self {
        Self {
            effect,
            light,
            color,
            alpha: 0.0,
        }
    }

    /// Color scaled by the reveal amount
    pub fn lit_color(&self) -> Vec3 {
        self.color * self.alpha
    }
}

impl UniformProvider for LightMesh {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        match name {
            "light_color" => Some(UniformValue::Vec3(self.lit_color())),
            "light_alpha" => Some(UniformValue::Float(self.alpha)),
            _ => None,
        }
    }
}

/// Pages of lights revealed by one driving value.
#[derive(Debug, Clone, Default)]
pub struct LightGroup {
    pages: Vec<Vec<LightMesh>>,
    intensity: f32,
}

impl LightGroup {
    pub fn new(pages: Vec<Vec<LightMesh>>) -> Self {
        Self {
            pages,
            intensity: 0.0,
        }
    }

    pub fn pages(&self) -> &[Vec<LightMesh>] {
        &self.pages
    }

    pub fn lights(&self) -> impl Iterator<Item = &LightMesh> {
        self.pages.iter().flatten()
    }

    /// Set every light's alpha from `value`.
    ///
    /// Page windows split `value` evenly across pages; inside a page the
    /// items split that page's own progress.
    pub fn reveal(&mut self, value: f32) {
        let page_count = self.pages.len();
        if page_count == 0 {
            return;
        }
        let per_page = 1.0 / page_count as f32;
        let mut intensity = 0.0f32;

        for (page_index, page) in self.pages.iter_mut().enumerate() {
            let page_alpha = reveal::divide_to_pages(per_page, page_index, value);
            if page.is_empty() {
                continue;
            }
            let per_item = 1.0 / page.len() as f32;
            for (item_index, light) in page.iter_mut().enumerate() {
                light.alpha = reveal::divide_to_items(per_item, item_index, page_alpha);
                intensity = intensity.max(light.alpha);
            }
        }
        self.intensity = intensity;
    }

    /// Write every light's current color into `buffer`.
    pub fn publish(&self, buffer: &mut LightColorBuffer) {
        for light in self.lights() {
            buffer.set(light.effect, light.light, light.lit_color().to_array());
        }
    }
}

impl UniformProvider for LightGroup {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        match name {
            "light_intensity" => Some(UniformValue::Float(self.intensity)),
            "light_count" => Some(UniformValue::Int(self.lights().count() as i32)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    effect: u8,
    light: u8,
    color: [f32; 3],
    dirty: bool,
}

/// Latest color per `(effect, light)` with change tracking.
///
/// Writers mark entries dirty when the color changes; [`Self::drain_dirty`]
/// returns those entries as packet records and clears the marks.
#[derive(Debug, Default)]
pub struct LightColorBuffer {
    entries: Vec<Entry>,
    index: HashMap<(u8, u8), usize>,
}

impl LightColorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set(&mut self, effect: u8, light: u8, color: [f32; 3]) {
        match self.index.get(&(effect, light)) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                if entry.color != color {
                    entry.color = color;
                    entry.dirty = true;
                }
            }
            None => {
                self.index.insert((effect, light), self.entries.len());
                self.entries.push(Entry {
                    effect,
                    light,
                    color,
                    dirty: true,
                });
            }
        }
    }

    pub fn color(&self, effect: u8, light: u8) -> Option<[f32; 3]> {
        self.index.get(&(effect, light)).map(|&i| self.entries[i].color)
    }

    pub fn dirty_count(&self) -> usize {
        self.entries.iter().filter(|e| e.dirty).count()
    }

    /// Records for every changed light, in first-write order.
    pub fn drain_dirty(&mut self) -> Vec<LightRecord> {
        self.entries
            .iter_mut()
            .filter(|e| e.dirty)
            .map(|e| {
                e.dirty = false;
                LightRecord::from_color(e.effect, e.light, e.color)
            })
            .collect()
    }
}
