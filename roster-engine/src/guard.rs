use shared_types::RosterPage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counter of state-mutating requests, shared by a controller and its guards.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Bumps the counter and returns the new value.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Decides whether a completed page may still be rendered.
///
/// Pages carry the generation that was current when their fetch started. Anything older than
/// the controller's current generation is discarded, whatever order the responses arrive in.
#[derive(Debug, Clone)]
pub struct RenderGuard {
    generation: Generation,
    /// Highest generation handed to the rendering layer plus one, `0` before the first render.
    rendered: Arc<AtomicU64>,
}

impl RenderGuard {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            rendered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// True when `page` belongs to the current generation.
    pub fn accept(&self, page: &RosterPage) -> bool {
        self.is_current(page.generation)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation.current()
    }

    /// Like [`accept`](Self::accept), but succeeds at most once per generation and never for a
    /// generation older than one already claimed.
    pub fn claim(&self, page: &RosterPage) -> bool {
        let marker = page.generation + 1;
        let mut seen = self.rendered.load(Ordering::SeqCst);
        loop {
            if seen >= marker || !self.accept(page) {
                return false;
            }
            match self
                .rendered
                .compare_exchange(seen, marker, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => seen = actual,
            }
        }
        // A mutation may have landed between the check and the exchange.
        self.accept(page)
    }
}
