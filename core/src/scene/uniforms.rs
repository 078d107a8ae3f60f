//! Shader uniform providers
//!
//! Anything that feeds a shader implements [`UniformProvider`] and answers
//! the uniform names it knows. A [`UniformSet`] stacks providers so a draw
//! call can resolve its whole uniform list in one place.

use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

pub trait UniformProvider {
    /// Value for `name`, or `None` if this provider doesn't own it
    fn provide_uniform(&self, name: &str) -> Option<UniformValue>;
}

/// Ordered providers; earlier entries win.
#[derive(Default)]
pub struct UniformSet<'a> {
    providers: Vec<&'a dyn UniformProvider>,
}

impl<'a> UniformSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: &'a dyn UniformProvider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn push(&mut self, provider: &'a dyn UniformProvider) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Option<UniformValue> {
        self.providers.iter().find_map(|p| p.provide_uniform(name))
    }

    /// Resolve every name, logging the ones nobody provides.
    pub fn resolve_all<'n>(&self, names: &[&'n str]) -> Vec<(&'n str, UniformValue)> {
        names
            .iter()
            .filter_map(|&name| match self.resolve(name) {
                Some(value) => Some((name, value)),
                None => {
                    tracing::trace!(uniform = name, "No provider");
                    None
                }
            })
            .collect()
    }
}

impl UniformProvider for UniformSet<'_> {
    fn provide_uniform(&self, name: &str) -> Option<UniformValue> {
        self.resolve(name)
    }
}
