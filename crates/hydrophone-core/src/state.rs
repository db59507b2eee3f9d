//! Service readiness gate checked at every RPC entry point.
//!
//! Reads are concurrent and never touch I/O; writes (startup, provisioning,
//! shutdown, admin toggles) exclude readers and other writers.

use std::sync::{PoisonError, RwLock};

use tracing::info;

use crate::error::{Error, Result};
use crate::models::ServiceState;

/// Process-wide readiness flag.
#[derive(Debug, Default)]
pub struct ServiceStateGate {
    state: RwLock<ServiceState>,
}

impl ServiceStateGate {
    /// A gate in the given initial state.
    pub fn new(initial: ServiceState) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    /// Current state.
    pub fn get(&self) -> ServiceState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the state, returning the previous one.
    pub fn set(&self, next: ServiceState) -> ServiceState {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        drop(guard);

        if previous != next {
            info!(
                subsystem = "api",
                component = "state_gate",
                from = %previous,
                to = %next,
                "Service state changed"
            );
        }
        previous
    }

    pub fn is_available(&self) -> bool {
        self.get() == ServiceState::Available
    }

    /// `Err(ServiceUnavailable)` unless the gate is open.
    pub fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::ServiceUnavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_gate_is_closed() {
        let gate = ServiceStateGate::default();
        assert_eq!(gate.get(), ServiceState::Unavailable);
        assert!(matches!(gate.ensure_available(), Err(Error::ServiceUnavailable)));
    }

    #[test]
    fn test_set_returns_previous() {
        let gate = ServiceStateGate::new(ServiceState::Unavailable);
        assert_eq!(gate.set(ServiceState::Available), ServiceState::Unavailable);
        assert!(gate.ensure_available().is_ok());
        assert_eq!(gate.set(ServiceState::Available), ServiceState::Available);
        assert_eq!(gate.set(ServiceState::Unavailable), ServiceState::Available);
        assert!(!gate.is_available());
    }

    #[test]
    fn test_readers_see_committed_values() {
        let gate = Arc::new(ServiceStateGate::new(ServiceState::Available));
        let writer = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || {
                for i in 0..1_000 {
                    let next = if i % 2 == 0 {
                        ServiceState::Unavailable
                    } else {
                        ServiceState::Available
                    };
                    gate.set(next);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        let s = gate.get();
                        assert!(matches!(s, ServiceState::Available | ServiceState::Unavailable));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        // Last write (i = 999) opened the gate.
        assert!(gate.is_available());
    }
}
