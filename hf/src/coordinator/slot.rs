//! CoordinatorSlot - one coordinator per host lifetime

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::core::Coordinator;

/// Holds the host's single coordinator
///
/// The host owns the slot (often in a `static`). Installing a second
/// coordinator is reported and ignored, and the first one is returned.
#[derive(Debug, Default)]
pub struct CoordinatorSlot {
    cell: OnceLock<Coordinator>,
    duplicate_attempts: AtomicU64,
}

impl CoordinatorSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            duplicate_attempts: AtomicU64::new(0),
        }
    }

    /// Install the coordinator built by `build`, or return the existing one
    ///
    /// `build` only runs for the first install.
    pub fn install<F>(&self, build: F) -> &Coordinator
    where
        F: FnOnce() -> Coordinator,
    {
        let mut built = false;
        let coordinator = self.cell.get_or_init(|| {
            built = true;
            build()
        });

        if built {
            debug!("CoordinatorSlot::install: installed coordinator");
        } else {
            self.duplicate_attempts.fetch_add(1, Ordering::Relaxed);
            warn!("Attempted to construct a duplicate coordinator. Returning existing instance");
        }
        coordinator
    }

    pub fn get(&self) -> Option<&Coordinator> {
        self.cell.get()
    }

    /// Number of installs that found a coordinator already present
    pub fn duplicate_attempts(&self) -> u64 {
        self.duplicate_attempts.load(Ordering::Relaxed)
    }
}
