//! Analysis orchestration

pub mod analyzer;

pub use analyzer::{AnalysisError, SoilAnalyzer};

use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight guard: at most one analysis in flight
///
/// A second request while one is active is rejected, never queued. The
/// permit releases the guard on drop, so abandoned requests (client gone,
/// handler future dropped) cannot wedge the service.
#[derive(Debug, Default)]
pub struct SingleFlight {
    active: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to become the in-flight analysis; `None` when one is active
    pub fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit { guard: self })
    }

    /// Whether an analysis is currently in flight
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Held for the duration of one analysis; releases the guard on drop
#[derive(Debug)]
pub struct FlightPermit<'a> {
    guard: &'a SingleFlight,
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.guard.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_while_held() {
        let flight = SingleFlight::new();

        let permit = flight.try_acquire();
        assert!(permit.is_some());
        assert!(flight.is_active());
        assert!(flight.try_acquire().is_none());

        drop(permit);
        assert!(!flight.is_active());
        assert!(flight.try_acquire().is_some());
    }

    #[test]
    fn permit_releases_on_panic_unwind() {
        let flight = SingleFlight::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = flight.try_acquire().unwrap();
            panic!("analysis blew up");
        }));

        assert!(result.is_err());
        assert!(!flight.is_active());
    }
}
