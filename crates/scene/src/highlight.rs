use foundation::color::Rgb;

use crate::buffers::PointBuffers;

/// The highlighted point and the color it had before being highlighted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Highlight {
    pub index: usize,
    pub saved: Rgb,
}

/// At most one highlighted point, restorable in O(1).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightSlot {
    current: Option<Highlight>,
}

impl HighlightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Highlight> {
        self.current
    }

    pub fn index(&self) -> Option<usize> {
        self.current.map(|h| h.index)
    }

    /// Restores the previous highlight, then saves and overwrites `index`.
    ///
    /// Returns `false` (leaving the slot empty) when `index` is out of range.
    pub fn apply(&mut self, buffers: &mut PointBuffers, index: usize, color: Rgb) -> bool {
        self.clear(buffers);
        let Some(saved) = buffers.color(index) else {
            return false;
        };
        buffers.set_color(index, color);
        self.current = Some(Highlight { index, saved });
        true
    }

    /// Writes the saved color back and empties the slot.
    pub fn clear(&mut self, buffers: &mut PointBuffers) -> Option<Highlight> {
        let h = self.current.take()?;
        buffers.set_color(h.index, h.saved);
        Some(h)
    }

    pub fn forget(&mut self) {
        self.current = None;
    }
}
