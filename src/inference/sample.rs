use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed-size uniform sample over a stream of unknown length (Algorithm R).
/// The same seed over the same stream always keeps the same items.
#[derive(Debug)]
pub struct Reservoir<T> {
    capacity: usize,
    seen: usize,
    items: Vec<T>,
    rng: StdRng,
}

impl<T> Reservoir<T> {
    pub fn new(capacity: usize, seed: u64) -> Self {
        Self {
            capacity,
            seen: 0,
            items: Vec::with_capacity(capacity.min(4096)),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn offer(&mut self, item: T) {
        self.seen += 1;
        if self.capacity == 0 {
            return;
        }
        if self.items.len() < self.capacity {
            self.items.push(item);
            return;
        }
        let j = self.rng.gen_range(0..self.seen);
        if j < self.capacity {
            self.items[j] = item;
        }
    }

    /// Candidates offered so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
