use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag
///
/// Cancelling a signal stops every attempt that checks it or any of its
/// children. A child can be cancelled on its own without touching its parent,
/// which is how a failing batch stops its siblings without stopping the run.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    flags: Vec<Arc<AtomicBool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self {
            flags: vec![Arc::new(AtomicBool::new(false))],
        }
    }

    /// A signal that fires when either it or `self` is cancelled
    pub fn child(&self) -> Self {
        let mut flags = self.flags.clone();
        flags.push(Arc::new(AtomicBool::new(false)));
        Self { flags }
    }

    pub fn cancel(&self) {
        if let Some(own) = self.flags.last() {
            own.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.iter().any(|flag| flag.load(Ordering::SeqCst))
    }
}
