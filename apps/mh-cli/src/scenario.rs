//! YAML description of a standalone run.
//!
//! ```yaml
//! manifest: icdll_list.txt
//! host_step: 5.0e-5
//! stop_time: 0.2
//! record_every: 20
//! instances:
//!   - id: 0
//!     release_time: 0.0
//!     parameters: [1.0, 0.02, 5.0]
//!     inputs: [1.0, 0.0]
//!     initial_outputs: [1.0]
//!     state_slots: 5
//! ```
//!
//! Inputs are held constant for the whole run. A relative manifest path is
//! resolved against the scenario file's directory.

use std::path::{Path, PathBuf};

use mh_core::{InstanceId, Verbosity};
use mh_host::{DEFAULT_CAPACITY, DEFAULT_MANIFEST, HostConfig};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub verbosity: Verbosity,
    pub host_step: f64,
    pub stop_time: f64,
    /// Write every N-th host step.
    #[serde(default = "default_record_every")]
    pub record_every: usize,
    pub instances: Vec<InstanceSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub id: u32,
    #[serde(default)]
    pub release_time: f64,
    #[serde(default)]
    pub parameters: Vec<f64>,
    #[serde(default)]
    pub inputs: Vec<f64>,
    #[serde(default)]
    pub initial_outputs: Vec<f64>,
    /// Length of the host state array.
    #[serde(default)]
    pub state_slots: usize,
}

fn default_manifest() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST)
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_record_every() -> usize {
    1
}

impl Scenario {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ScenarioRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scenario: Scenario = serde_yaml::from_str(&text)?;
        if scenario.manifest.is_relative() {
            if let Some(dir) = path.parent() {
                scenario.manifest = dir.join(&scenario.manifest);
            }
        }
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> CliResult<()> {
        if !(self.host_step.is_finite() && self.host_step > 0.0) {
            return Err(CliError::Scenario(format!(
                "host_step must be positive, got {}",
                self.host_step
            )));
        }
        if !(self.stop_time.is_finite() && self.stop_time >= 0.0) {
            return Err(CliError::Scenario(format!(
                "stop_time must be non-negative, got {}",
                self.stop_time
            )));
        }
        if self.record_every == 0 {
            return Err(CliError::Scenario("record_every must be at least 1".into()));
        }
        if self.instances.is_empty() {
            return Err(CliError::Scenario("no instances to run".into()));
        }
        Ok(())
    }

    pub fn host_config(&self) -> HostConfig {
        HostConfig {
            manifest_path: self.manifest.clone(),
            capacity: self.capacity,
            verbosity: self.verbosity,
        }
    }

    /// Host steps after `t = 0`, up to and including the stop time.
    pub fn step_count(&self) -> usize {
        (self.stop_time / self.host_step).round() as usize
    }
}

impl InstanceSpec {
    pub fn instance_id(&self) -> CliResult<InstanceId> {
        InstanceId::from_index(self.id)
            .ok_or_else(|| CliError::Scenario(format!("instance id {} is out of range", self.id)))
    }

    /// `[id, host_step, stop_time, release_time, params...]`
    pub fn xdata(&self, scenario: &Scenario) -> Vec<f64> {
        let mut xdata = vec![
            f64::from(self.id),
            scenario.host_step,
            scenario.stop_time,
            self.release_time,
        ];
        xdata.extend_from_slice(&self.parameters);
        xdata
    }

    /// `[t, inputs...]`, followed by the initial outputs when `initial`.
    pub fn xin(&self, t: f64, initial: bool) -> Vec<f64> {
        let mut xin = Vec::with_capacity(1 + self.inputs.len() + self.initial_outputs.len());
        xin.push(t);
        xin.extend_from_slice(&self.inputs);
        if initial {
            xin.extend_from_slice(&self.initial_outputs);
        }
        xin
    }
}
