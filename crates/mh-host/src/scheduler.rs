//! Multi-rate scheduling of component models.
//!
//! The host calls every instance on its own step; each model runs on its
//! declared fixed step. An instance fires when host time reaches its next due
//! time, then the due time advances by exactly one model step. Between
//! firings the host output array keeps the last gathered values.

use mh_core::{ensure_finite, ensure_positive};
use mh_layout::PARAMETER_REGION_START;
use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// Timing of one instance, from the host's leading parameter slots and the
/// model's own step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Host engine step in seconds.
    pub host_step: f64,
    /// The model's declared fixed step in seconds.
    pub model_step: f64,
    /// Simulation end time in seconds.
    pub stop_time: f64,
    /// Re-initialize on every firing up to this time; `0` disables.
    pub release_time: f64,
}

impl Timing {
    /// Read `[id, host_step, stop_time, release_time, ...]`.
    ///
    /// # Arguments
    ///
    /// * `xdata` - Host parameter array; only the four leading slots are read
    /// * `model_step` - Fixed step from the model's metadata
    ///
    /// # Errors
    ///
    /// Fails if `xdata` is shorter than the leading region, if either step is
    /// not positive, or if a time is not finite.
    pub fn from_host(xdata: &[f64], model_step: f64) -> HostResult<Self> {
        let [_, host_step, stop_time, release_time, ..] = *xdata else {
            return Err(HostError::HostArray(format!(
                "parameter array needs {PARAMETER_REGION_START} leading values, got {}",
                xdata.len()
            )));
        };
        Ok(Self {
            host_step: ensure_positive(host_step, "host time step")?,
            model_step: ensure_positive(model_step, "model time step")?,
            stop_time: ensure_finite(stop_time, "stop time")?,
            release_time: ensure_finite(release_time, "release time")?,
        })
    }
}

/// What a due instance does this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// Inside the release window: initialize, then compute outputs. The
    /// host output array is not updated.
    Hold,
    /// Compute outputs and copy them back to the host.
    Step,
}

/// Firing clock of one instance.
///
/// Tracks the next due time, the last host time that fired (so repeated
/// calls at the same `t` fire once) and whether terminate already ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Timing read at init.
    pub timing: Timing,
    /// Host time at or after which the next firing happens.
    next_due: f64,
    last_fired: Option<f64>,
    terminated: bool,
}

impl Schedule {
    /// Create a new schedule.
    ///
    /// # Arguments
    ///
    /// * `timing` - Steps and stop/release times of the instance
    ///
    /// The first firing is due at `t = 0`.
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            next_due: 0.0,
            last_fired: None,
            terminated: false,
        }
    }

    /// Host time of the next firing.
    pub fn next_due(&self) -> f64 {
        self.next_due
    }

    /// Host time of the most recent firing, `None` before the first one.
    pub fn last_fired(&self) -> Option<f64> {
        self.last_fired
    }

    /// Due at `t`, and not already fired at `t` or later.
    pub fn is_due(&self, t: f64) -> bool {
        t >= self.next_due && self.last_fired.is_none_or(|last| t > last)
    }

    /// Returns `true` if `release_time > 0` and `0 <= t <= release_time`.
    pub fn in_release_window(&self, t: f64) -> bool {
        let release = self.timing.release_time;
        release > 0.0 && (0.0..=release).contains(&t)
    }

    /// Consume the firing at `t`, if any.
    ///
    /// Advances the due time by exactly one model step per firing, even when
    /// the host step is larger than the model step.
    pub fn fire(&mut self, t: f64) -> Option<Firing> {
        if !self.is_due(t) {
            return None;
        }
        self.last_fired = Some(t);
        self.next_due += self.timing.model_step;
        Some(if self.in_release_window(t) {
            Firing::Hold
        } else {
            Firing::Step
        })
    }

    /// Within half a host step of the stop time, and not yet terminated.
    pub fn should_terminate(&self, t: f64) -> bool {
        !self.terminated && t > self.timing.stop_time - self.timing.host_step * 0.5
    }

    /// Record that terminate ran; [`Schedule::should_terminate`] is false from now on.
    pub fn mark_terminated(&mut self) {
        self.terminated = true;
    }

    /// Whether terminate already ran.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}
