use super::{AnimState, Palette, Quality};

/// Number of badge slots the bar has. Slots are never added or removed at run time.
pub const BADGE_CAPACITY: usize = 16;

/// Stable handle to an allocated badge: its slot index in the [`BadgePool`].
///
/// A handle is only valid between [`BadgePool::allocate`] and [`BadgePool::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("badge #{_0}")]
pub struct BadgeHandle(usize);

impl BadgeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One on-screen indicator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Badge {
    pub text: String,
    pub colors: Palette,
    pub anim: AnimState,
}

/// Fixed-capacity arena of badges. Every query is total: indices that are out of range or point
/// at a free slot answer "nothing there" instead of failing, since the renderer polls every
/// index each frame without knowing which ones are live.
#[derive(Debug, Clone)]
pub struct BadgePool {
    slots: Vec<Option<Badge>>,
}

impl Default for BadgePool {
    fn default() -> Self {
        Self::with_capacity(BADGE_CAPACITY)
    }
}

impl BadgePool {
    pub fn with_capacity(capacity: usize) -> Self {
        BadgePool { slots: vec![None; capacity] }
    }

    /// Take the first free slot. The new badge is hidden, has no text and the normal palette.
    /// Returns `None` when the pool is full; callers are expected to skip creating their badge.
    pub fn allocate(&mut self) -> Option<BadgeHandle> {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(Badge::default());
        Some(BadgeHandle(index))
    }

    /// Free the slot of a badge. Releasing an already free slot does nothing.
    pub fn release(&mut self, handle: BadgeHandle) {
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            *slot = None;
        }
    }

    /// Free every slot.
    pub fn release_all(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    #[cfg(test)]
    pub fn get(&self, handle: BadgeHandle) -> Option<&Badge> {
        self.badge_at(handle.index())
    }

    pub fn get_mut(&mut self, handle: BadgeHandle) -> Option<&mut Badge> {
        self.slots.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub fn set_text(&mut self, handle: BadgeHandle, text: &str) {
        if let Some(badge) = self.get_mut(handle) {
            if badge.text != text {
                badge.text.clear();
                badge.text.push_str(text);
            }
        }
    }

    pub fn set_quality(&mut self, handle: BadgeHandle, quality: Quality) {
        if let Some(badge) = self.get_mut(handle) {
            badge.colors = quality.palette();
        }
    }

    pub fn set_visible(&mut self, handle: BadgeHandle, visible: bool) {
        if let Some(badge) = self.get_mut(handle) {
            badge.anim.target_visible = visible;
        }
    }

    /// Advance the animation of every live badge. Returns whether any of them moved.
    pub fn advance_all(&mut self, dt: f64) -> bool {
        self.slots.iter_mut().flatten().fold(false, |changed, badge| badge.anim.advance(dt) | changed)
    }

    /// Number of slots, including free ones.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    fn badge_at(&self, index: usize) -> Option<&Badge> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn colors_at(&self, index: usize) -> Option<Palette> {
        self.badge_at(index).map(|badge| badge.colors)
    }

    pub fn text_at(&self, index: usize) -> Option<&str> {
        self.badge_at(index).map(|badge| badge.text.as_str())
    }

    /// Horizontal slide offset of the badge at `index`. Free slots report 1, i.e. "do not draw".
    pub fn x_offset_at(&self, index: usize) -> f64 {
        self.badge_at(index).map_or(1.0, |badge| badge.anim.x_offset())
    }
}
