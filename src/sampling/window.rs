use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::SamplingError;

/// Items carrying a strictly increasing per-stream sequence number.
pub trait Sequenced {
    fn sequence(&self) -> u64;
}

#[derive(Debug)]
struct Entry<T> {
    position: u64,
    item: T,
}

/// One sample holder: the exposed representative plus the pre-selected
/// replacements that take over when it leaves the window.
///
/// Chain entries are strictly increasing in position and every one of them
/// is newer than `active`.
#[derive(Debug)]
struct Slot<T> {
    active: Option<Entry<T>>,
    chain: VecDeque<Entry<T>>,
    next_candidate: Option<u64>,
    seen: u64,
}

impl<T> Slot<T> {
    const fn new() -> Self {
        Self {
            active: None,
            chain: VecDeque::new(),
            next_candidate: None,
            seen: 0,
        }
    }

    fn clear(&mut self) {
        self.active = None;
        self.chain.clear();
        self.next_candidate = None;
        self.seen = 0;
    }

    fn observe<R: Rng>(&mut self, entry: Entry<T>, geometry: Geometry, rng: &mut R) {
        self.seen = self.seen.saturating_add(1);
        let position = entry.position;
        let reach = self.seen.min(geometry.local_window);

        if rng.gen_range(0..reach) == 0 {
            self.chain.clear();
            self.active = Some(entry);
            self.next_candidate = geometry.draw_successor(position, rng);
            return;
        }

        if self.next_candidate == Some(position) {
            self.chain.push_back(entry);
            self.next_candidate = geometry.draw_successor(position, rng);
        }

        self.expire(position, geometry.window);
    }

    /// Promotes chain entries until the active one is inside the window.
    fn expire(&mut self, now: u64, window: u64) {
        loop {
            if let Some(active) = self.active.as_ref() {
                if now.saturating_sub(active.position) < window {
                    return;
                }
            }
            match self.chain.pop_front() {
                Some(next) => self.active = Some(next),
                None => {
                    self.active = None;
                    return;
                }
            }
        }
    }

    /// The entry this slot exposes at stream position `now`. Between two
    /// items of the slot's own sub-stream the active entry may age out; its
    /// chain successor has already arrived by then and takes over.
    fn exposed(&self, now: u64, window: u64) -> Option<&Entry<T>> {
        self.active
            .iter()
            .chain(self.chain.iter())
            .find(|entry| now.saturating_sub(entry.position) < window)
    }

    fn retained(&self) -> usize {
        self.chain
            .len()
            .saturating_add(usize::from(self.active.is_some()))
    }
}

/// Per-slot view of the stream: each slot owns every `stride`-th position.
/// When one of its items arrives, exactly `local_window` of the slot's items
/// lie inside the trailing `window` positions.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    stride: u64,
    local_window: u64,
    window: u64,
}

impl Geometry {
    const fn new(samples: u64, window: u64) -> Self {
        let stride = if samples == 0 { 1 } else { samples };
        let local_window = window.div_ceil(stride);
        Self {
            stride,
            local_window: if local_window == 0 { 1 } else { local_window },
            window,
        }
    }

    /// Picks the sub-stream item that replaces `position` once it expires.
    ///
    /// The replacement is uniform over the `local_window - 1` items that are
    /// still live when `position` leaves; the item arriving at that moment
    /// gets its own `1 / local_window` chance through the reservoir draw.
    fn draw_successor<R: Rng>(self, position: u64, rng: &mut R) -> Option<u64> {
        if self.local_window <= 1 {
            return None;
        }
        let steps = rng.gen_range(1..self.local_window);
        Some(position.saturating_add(steps.saturating_mul(self.stride)))
    }
}

/// Checks a `samples`/`window` pair without building a sampler.
///
/// # Errors
///
/// Returns an error when `samples` or `window` is zero, or when `samples`
/// exceeds `window`.
pub const fn validate_parameters(samples: usize, window: usize) -> Result<(), SamplingError> {
    if samples == 0 {
        return Err(SamplingError::ZeroSamples);
    }
    if window == 0 {
        return Err(SamplingError::ZeroWindow);
    }
    if samples > window {
        return Err(SamplingError::SamplesExceedWindow { samples, window });
    }
    Ok(())
}

/// Keeps up to `samples` items drawn uniformly from the most recent `window`
/// items of an unbounded stream, in memory independent of the stream length.
///
/// Position `p` (1-based) of the stream belongs to slot `(p - 1) % samples`.
/// Every slot runs a chain sampler over the items of its own sub-stream that
/// fall inside the trailing `window` positions. Each window item is exposed
/// with probability `1 / n`, where `n` is the number of its slot's items in
/// the window (`window / samples` rounded down or up), so the expected
/// sample is uniform exactly when `samples` divides `window` and close to it
/// otherwise. No item is exposed twice and nothing older than `window`
/// positions is ever exposed.
#[derive(Debug)]
pub struct WindowSampler<T> {
    window: usize,
    geometry: Geometry,
    slots: Vec<Slot<T>>,
    position: u64,
    last_sequence: Option<u64>,
    rng: SmallRng,
}

impl<T> WindowSampler<T>
where
    T: Sequenced,
{
    /// Creates a sampler seeded from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns an error when `samples` or `window` is zero, or when `samples`
    /// exceeds `window`.
    pub fn new(samples: usize, window: usize) -> Result<Self, SamplingError> {
        Self::with_rng(samples, window, SmallRng::from_entropy())
    }

    /// Creates a sampler with a deterministic random stream.
    ///
    /// # Errors
    ///
    /// Returns an error when `samples` or `window` is zero, or when `samples`
    /// exceeds `window`.
    pub fn with_seed(samples: usize, window: usize, seed: u64) -> Result<Self, SamplingError> {
        Self::with_rng(samples, window, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(samples: usize, window: usize, rng: SmallRng) -> Result<Self, SamplingError> {
        validate_parameters(samples, window)?;
        let geometry = Geometry::new(
            u64::try_from(samples).unwrap_or(u64::MAX),
            u64::try_from(window).unwrap_or(u64::MAX),
        );
        Ok(Self {
            window,
            geometry,
            slots: (0..samples).map(|_| Slot::new()).collect(),
            position: 0,
            last_sequence: None,
            rng,
        })
    }

    /// Feeds the next stream item.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::OutOfOrder`] when the item's sequence number is
    /// not strictly greater than every previously added one. The sampler is
    /// left unchanged in that case.
    pub fn add(&mut self, item: T) -> Result<(), SamplingError> {
        let sequence = item.sequence();
        if let Some(last) = self.last_sequence {
            if sequence <= last {
                return Err(SamplingError::OutOfOrder {
                    last,
                    actual: sequence,
                });
            }
        }
        self.last_sequence = Some(sequence);
        self.position = self.position.saturating_add(1);

        let position = self.position;
        let index = position
            .saturating_sub(1)
            .checked_rem(self.geometry.stride)
            .and_then(|index| usize::try_from(index).ok());
        let geometry = self.geometry;
        if let Some(slot) = index.and_then(|index| self.slots.get_mut(index)) {
            slot.observe(Entry { position, item }, geometry, &mut self.rng);
        }
        Ok(())
    }

    /// Current representatives of all non-empty slots, in slot order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.slots
            .iter()
            .filter_map(|slot| slot.exposed(self.position, self.geometry.window))
            .map(|entry| entry.item.clone())
            .collect()
    }

    /// Number of slots currently exposing an item.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.exposed(self.position, self.geometry.window).is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Items added since construction.
    #[must_use]
    pub const fn seen(&self) -> u64 {
        self.position
    }

    /// Items held in memory, active representatives and chains together.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.slots.iter().map(Slot::retained).sum()
    }

    /// Drops every sampled item. Sequence ordering is still enforced against
    /// items added before the reset.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }
}
