//! Per-frame animation callbacks
//!
//! Layers are driven from the render loop rather than a timer: each
//! `advance` hands every layer the frame delta and its own elapsed time.

use std::time::Instant;

type LayerFn = Box<dyn FnMut(f32, f32) -> bool>;

struct Layer {
    added: Instant,
    update: LayerFn,
}

/// Ordered set of `(dt, elapsed) -> keep` callbacks
pub struct AnimationLayers {
    layers: Vec<Layer>,
    last_advance: Option<Instant>,
}

impl AnimationLayers {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            last_advance: None,
        }
    }

    /// Register a layer; it stays until it returns `false`
    pub fn add<F>(&mut self, update: F)
    where
        F: FnMut(f32, f32) -> bool + 'static,
    {
        self.add_at(Instant::now(), update);
    }

    /// Register a layer whose elapsed time is measured from `added`
    pub fn add_at<F>(&mut self, added: Instant, update: F)
    where
        F: FnMut(f32, f32) -> bool + 'static,
    {
        self.layers.push(Layer {
            added,
            update: Box::new(update),
        });
    }

    /// Run every layer once. `dt` is zero on the first advance.
    pub fn advance(&mut self, now: Instant) {
        let dt = self
            .last_advance
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_advance = Some(now);

        self.layers.retain_mut(|layer| {
            let elapsed = now.saturating_duration_since(layer.added).as_secs_f32();
            (layer.update)(dt, elapsed)
        });
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }
}

impl Default for AnimationLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnimationLayers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationLayers")
            .field("layers", &self.layers.len())
            .field("last_advance", &self.last_advance)
            .finish()
    }
}
