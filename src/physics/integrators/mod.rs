//! Time integration of the particle ensemble

pub mod step_integrator;
pub mod velocity_verlet;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

pub use step_integrator::{ActionContext, StepEvent, StepIntegrator};
pub use velocity_verlet::VelocityVerlet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Initialized = 0,
    Running = 1,
    InTermination = 2,
    Stopped = 3,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunState::Initialized,
            1 => RunState::Running,
            2 => RunState::InTermination,
            _ => RunState::Stopped,
        }
    }
}

/// Run state shared between an integrator and whoever may stop it.
///
/// Termination is cooperative: a request only flips the state, the
/// integrator notices it at the next step boundary.
#[derive(Debug)]
pub struct RunControl {
    state: AtomicU8,
}

impl Default for RunControl {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(RunState::Initialized as u8),
        }
    }
}

impl RunControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Ask a running integrator to stop after the current step.
    ///
    /// Returns false if no run is in progress, in which case nothing changes.
    pub fn request_termination(&self) -> bool {
        self.state
            .compare_exchange(
                RunState::Running as u8,
                RunState::InTermination as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn termination_requested(&self) -> bool {
        self.state() == RunState::InTermination
    }

    pub(crate) fn set(&self, state: RunState) {
        self.state.store(state as u8, Ordering::Release);
    }
}
