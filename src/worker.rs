//! Background refinement with stale-result suppression.
//!
//! Every submission gets a fresh [`Generation`]. A result is only handed
//! back when its generation is still the newest one, so a slow job for an
//! old image or old parameters can never overwrite a newer render.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::buffer::PixelBuffer;
use crate::compositor::LayerPair;
use crate::engine::refine;
use crate::error::Result;

/// Monotonic tag identifying one refinement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Raw counter value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Hands out increasing generations and remembers the newest.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    latest: AtomicU64,
}

impl GenerationCounter {
    /// Start a new generation, superseding all earlier ones.
    pub fn advance(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// The newest generation handed out (0 before the first call to `advance`).
    #[must_use]
    pub fn current(&self) -> Generation {
        Generation(self.latest.load(Ordering::Acquire))
    }

    /// True if nothing newer than `generation` has been started.
    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}

/// A value produced for a specific generation.
#[derive(Debug)]
pub struct Tagged<T> {
    /// Generation of the request that produced `value`.
    pub generation: Generation,
    /// The produced value.
    pub value: T,
}

/// Runs [`refine`] on the rayon thread pool and keeps only the newest result.
#[derive(Debug)]
pub struct RefineWorker {
    counter: Arc<GenerationCounter>,
    tx: Sender<Tagged<Result<LayerPair>>>,
    rx: Receiver<Tagged<Result<LayerPair>>>,
    /// Generation most recently handed back to the caller.
    delivered: Cell<u64>,
}

impl Default for RefineWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl RefineWorker {
    /// A worker with no jobs in flight.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            counter: Arc::new(GenerationCounter::default()),
            tx,
            rx,
            delivered: Cell::new(0),
        }
    }

    /// Queue a refinement, superseding any job submitted earlier.
    pub fn submit(
        &self,
        source: Arc<PixelBuffer>,
        edge_width: u32,
        blur_radius: f32,
    ) -> Generation {
        let generation = self.counter.advance();
        let counter = Arc::clone(&self.counter);
        let tx = self.tx.clone();

        rayon::spawn(move || {
            if !counter.is_current(generation) {
                tracing::trace!(generation = generation.get(), "superseded before start");
                return;
            }
            let value = refine(source, edge_width, blur_radius);
            // The worker may have been dropped; then nobody wants the result.
            let _ = tx.send(Tagged { generation, value });
        });

        tracing::debug!(generation = generation.get(), "refinement submitted");
        generation
    }

    /// Newest generation submitted so far.
    #[must_use]
    pub fn current(&self) -> Generation {
        self.counter.current()
    }

    /// Drain finished jobs without blocking, returning the current one if ready.
    ///
    /// Stale results are dropped unconsumed.
    pub fn latest(&self) -> Option<Tagged<Result<LayerPair>>> {
        let mut found = None;
        while let Ok(tagged) = self.rx.try_recv() {
            if self.counter.is_current(tagged.generation) {
                found = Some(tagged);
            } else {
                discard(&tagged);
            }
        }
        found.map(|tagged| self.deliver(tagged))
    }

    /// Block until the current generation finishes.
    ///
    /// Returns `None` if nothing has been submitted, or if the current
    /// generation was already handed out.
    pub fn wait_latest(&self) -> Option<Tagged<Result<LayerPair>>> {
        if self.counter.current().get() <= self.delivered.get() {
            return None;
        }
        loop {
            let tagged = self.rx.recv().ok()?;
            if self.counter.is_current(tagged.generation) {
                return Some(self.deliver(tagged));
            }
            discard(&tagged);
        }
    }

    fn deliver(&self, tagged: Tagged<Result<LayerPair>>) -> Tagged<Result<LayerPair>> {
        self.delivered.set(tagged.generation.get());
        tagged
    }
}

fn discard(tagged: &Tagged<Result<LayerPair>>) {
    tracing::trace!(generation = tagged.generation.get(), "dropping stale result");
}
