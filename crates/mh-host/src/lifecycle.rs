//! Lifecycle controller for one component-model instance.
//!
//! An instance moves through
//!
//! ```text
//! Registered -> Bound -> Checked -> Initialized -> Stepping* -> Terminated -> Cleaned
//! ```
//!
//! and every operation checks the phase it is called in. Return codes are
//! interpreted here: messages go to the host log, errors become
//! [`HostError::Model`].

use core::fmt;
use std::path::{Path, PathBuf};

use mh_abi::{ComponentModel, LifecycleCall, ModelContext, ModelLoader, ModelMetadata};
use mh_core::{InstanceId, ReturnCode, Role};
use mh_layout::{
    HostRegion, PackedBuffer, StateCounts, StateMemory, compute_layout, gather, scatter,
};
use tracing::{debug, info, warn};

use crate::bridge::HostLog;
use crate::error::{HostError, HostResult};
use crate::scheduler::{Firing, Schedule, Timing};

/// Simulation mode reported to models. The host is an EMT engine.
pub const EMT_MODE: u8 = 1;

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Declared in the manifest, library not loaded.
    Registered,
    /// Library loaded and metadata read; buffers may exist.
    Bound,
    /// `Model_CheckParameters` accepted the parameters.
    Checked,
    /// `Model_Initialize` returned; ready for the first step.
    Initialized,
    /// Fired at least once.
    Stepping,
    /// `Model_Terminate` ran (or was skipped).
    Terminated,
    /// Buffers freed and library unloaded. Final.
    Cleaned,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Registered => "registered",
            Phase::Bound => "bound",
            Phase::Checked => "checked",
            Phase::Initialized => "initialized",
            Phase::Stepping => "stepping",
            Phase::Terminated => "terminated",
            Phase::Cleaned => "cleaned",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
struct Buffers {
    parameters: PackedBuffer,
    inputs: PackedBuffer,
    outputs: PackedBuffer,
}

/// One arena slot: the manifest entry plus everything bound to it.
///
/// Owns the model (and through it the library handle) and the packed
/// buffers. Host arrays are borrowed per call and never retained.
pub struct Instance {
    id: InstanceId,
    library: PathBuf,
    phase: Phase,
    model: Option<Box<dyn ComponentModel>>,
    buffers: Option<Buffers>,
    states: StateCounts,
    schedule: Option<Schedule>,
    time: f64,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("library", &self.library)
            .field("phase", &self.phase)
            .field("model", &self.metadata().map(|m| &m.name))
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl Instance {
    /// Create a registered, unbound instance.
    ///
    /// # Arguments
    ///
    /// * `id` - Manifest id
    /// * `library` - Library path as written in the manifest
    pub fn new(id: InstanceId, library: impl Into<PathBuf>) -> Self {
        Self {
            id,
            library: library.into(),
            phase: Phase::Registered,
            model: None,
            buffers: None,
            states: StateCounts::default(),
            schedule: None,
            time: 0.0,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn library(&self) -> &Path {
        &self.library
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Holds a loaded model.
    pub fn is_bound(&self) -> bool {
        self.model.is_some()
    }

    /// Model metadata, while bound.
    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.model.as_deref().map(|m| m.metadata())
    }

    /// Firing clock, from `prepare` on.
    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Time written into the model context on the last call.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Packed buffer for `role`, between `prepare` and cleanup.
    pub fn buffer(&self, role: Role) -> Option<&PackedBuffer> {
        let buffers = self.buffers.as_ref()?;
        Some(match role {
            Role::Parameters => &buffers.parameters,
            Role::Inputs => &buffers.inputs,
            Role::Outputs => &buffers.outputs,
        })
    }

    fn expect_phase(&self, operation: &'static str, allowed: &[Phase]) -> HostResult<()> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        Err(HostError::OutOfOrder {
            id: self.id,
            operation,
            phase: self.phase,
        })
    }

    /// Load the library through `loader`. Only once per instance.
    pub fn bind(&mut self, loader: &mut dyn ModelLoader) -> HostResult<&ModelMetadata> {
        if self.phase != Phase::Registered {
            return Err(HostError::AlreadyBound { id: self.id });
        }
        let model = loader.load(&self.library)?;
        model.metadata().validate(&self.library)?;
        self.states = model.metadata().state_counts();
        self.phase = Phase::Bound;
        info!(instance = %self.id, model = %model.metadata().name, "instance bound");
        Ok(self.model.insert(model).metadata())
    }

    /// Allocate the packed buffers and fill them from the init-time arrays.
    ///
    /// `xin` carries the initial outputs after the inputs; they are copied
    /// into `xout` and the output buffer before any model call.
    pub fn prepare(
        &mut self,
        timing: Timing,
        t: f64,
        xdata: &[f64],
        xin: &[f64],
        xout: &mut [f64],
    ) -> HostResult<()> {
        self.expect_phase("prepare buffers", &[Phase::Bound])?;
        let id = self.id;
        let Some(model) = self.model.as_deref() else {
            return Err(HostError::OutOfOrder {
                id,
                operation: "prepare buffers",
                phase: self.phase,
            });
        };
        let meta = model.metadata();
        let buffer = |role: Role, fields: &[mh_core::FieldDescriptor]| {
            compute_layout(fields)
                .map(|layout| PackedBuffer::new(role, layout))
                .map_err(HostError::layout(id))
        };
        let mut parameters = buffer(Role::Parameters, &meta.parameter_fields())?;
        let mut inputs = buffer(Role::Inputs, &meta.input_fields())?;
        let mut outputs = buffer(Role::Outputs, &meta.output_fields())?;

        let param_region = HostRegion::for_role(Role::Parameters, parameters.field_count());
        param_region
            .check_exact(xdata.len())
            .map_err(HostError::layout(id))?;
        scatter(xdata, param_region.start, &mut parameters).map_err(HostError::layout(id))?;

        let input_region = HostRegion::for_role(Role::Inputs, inputs.field_count());
        let initial_outputs = input_region.followed_by(Role::Outputs, outputs.field_count());
        initial_outputs
            .check_fits(xin.len())
            .map_err(HostError::layout(id))?;
        scatter(xin, input_region.start, &mut inputs).map_err(HostError::layout(id))?;

        let output_region = HostRegion::for_role(Role::Outputs, outputs.field_count());
        output_region
            .check_fits(xout.len())
            .map_err(HostError::layout(id))?;
        let initial = initial_outputs.slice(xin).map_err(HostError::layout(id))?;
        xout[output_region.start..output_region.end()].copy_from_slice(initial);
        scatter(xout, output_region.start, &mut outputs).map_err(HostError::layout(id))?;

        debug!(
            instance = %id,
            parameters = parameters.byte_len(),
            inputs = inputs.byte_len(),
            outputs = outputs.byte_len(),
            "packed buffers allocated"
        );
        self.buffers = Some(Buffers {
            parameters,
            inputs,
            outputs,
        });
        self.schedule = Some(Schedule::new(timing));
        self.time = t;
        Ok(())
    }

    /// Run one lifecycle call and apply the return-code rules.
    fn invoke(
        &mut self,
        call: LifecycleCall,
        xvar: &mut [f64],
        log: &mut HostLog<'_>,
    ) -> HostResult<()> {
        let id = self.id;
        let (Some(model), Some(buffers)) = (self.model.as_deref_mut(), self.buffers.as_mut())
        else {
            return Err(HostError::OutOfOrder {
                id,
                operation: call.entry_point().symbol(),
                phase: self.phase,
            });
        };
        let states = StateMemory::new(self.states, xvar).map_err(HostError::layout(id))?;
        let mut ctx = ModelContext {
            time: self.time,
            emt_rms_mode: EMT_MODE,
            parameters: &mut buffers.parameters,
            inputs: &mut buffers.inputs,
            outputs: &mut buffers.outputs,
            states,
        };

        let Some(reply) = model.call(call, &mut ctx) else {
            log.line(&format!(
                "Instance {id}: Cannot locate '{call}' function in library \"{}\"",
                self.library.display()
            ));
            return Ok(());
        };
        debug!(instance = %id, %call, code = reply.code, time = self.time, "lifecycle call");

        match ReturnCode::from_raw(reply.code) {
            Ok(ReturnCode::Ok) => Ok(()),
            Ok(ReturnCode::Message) => {
                let text = reply.message.unwrap_or_default();
                warn!(instance = %id, %call, "{text}");
                log.line(&format!("Instance {id}: In call to '{call}'"));
                log.line(&text);
                Ok(())
            }
            Ok(ReturnCode::Error) => Err(HostError::Model {
                id,
                call,
                message: reply.error.unwrap_or_else(|| "no error message".into()),
            }),
            Err(unknown) => Err(HostError::Model {
                id,
                call,
                message: match reply.error {
                    Some(text) => format!("{unknown}: {text}"),
                    None => unknown.to_string(),
                },
            }),
        }
    }

    /// Optional first call, right after the buffers exist.
    pub fn first_call(&mut self, xvar: &mut [f64], log: &mut HostLog<'_>) -> HostResult<()> {
        self.expect_phase("call Model_FirstCall", &[Phase::Bound])?;
        self.invoke(LifecycleCall::FirstCall, xvar, log)
    }

    /// Required parameter check. An ERROR reply is fatal.
    pub fn check_parameters(&mut self, xvar: &mut [f64], log: &mut HostLog<'_>) -> HostResult<()> {
        self.expect_phase("call Model_CheckParameters", &[Phase::Bound])?;
        self.invoke(LifecycleCall::CheckParameters, xvar, log)?;
        self.phase = Phase::Checked;
        Ok(())
    }

    /// Required initialization; the instance is ready to step afterwards.
    pub fn initialize(&mut self, xvar: &mut [f64], log: &mut HostLog<'_>) -> HostResult<()> {
        self.expect_phase("call Model_Initialize", &[Phase::Checked])?;
        self.invoke(LifecycleCall::Initialize, xvar, log)?;
        self.phase = Phase::Initialized;
        Ok(())
    }

    /// One host step.
    ///
    /// Fires the model if it is due, then terminates and cleans up when the
    /// stop time is reached. Calls after cleanup are ignored.
    ///
    /// # Arguments
    ///
    /// * `t` - Host time, also `xin[0]`
    /// * `xin` - `[t, inputs...]`
    /// * `xout` - Host outputs; written only on a [`Firing::Step`]
    /// * `xvar` - Host-owned state memory
    /// * `log` - Host log
    ///
    /// Returns the firing that happened, if any.
    pub fn exec(
        &mut self,
        t: f64,
        xin: &[f64],
        xout: &mut [f64],
        xvar: &mut [f64],
        log: &mut HostLog<'_>,
    ) -> HostResult<Option<Firing>> {
        if self.phase == Phase::Cleaned {
            debug!(instance = %self.id, t, "exec after cleanup ignored");
            return Ok(None);
        }
        self.expect_phase("step", &[Phase::Initialized, Phase::Stepping])?;
        let firing = self.schedule.as_mut().and_then(|s| s.fire(t));

        if let Some(firing) = firing {
            self.time = t;
            self.scatter_inputs(xin)?;
            if firing == Firing::Hold {
                self.invoke(LifecycleCall::Initialize, xvar, log)?;
            }
            self.invoke(LifecycleCall::Outputs, xvar, log)?;
            // Host outputs keep their init-time values until release.
            if firing == Firing::Step {
                self.gather_outputs(xout)?;
            }
            self.phase = Phase::Stepping;
        }

        if let Some(schedule) = self.schedule.as_ref().filter(|s| s.should_terminate(t)) {
            let timing = schedule.timing;
            log.info(&format!(
                "Last timestep: {t:.6} - {:.6}",
                timing.stop_time - timing.host_step
            ));
            self.time = t;
            self.terminate(xvar, log)?;
        }
        Ok(firing)
    }

    fn scatter_inputs(&mut self, xin: &[f64]) -> HostResult<()> {
        let id = self.id;
        let Some(buffers) = self.buffers.as_mut() else {
            return Ok(());
        };
        let region = HostRegion::for_role(Role::Inputs, buffers.inputs.field_count());
        scatter(xin, region.start, &mut buffers.inputs).map_err(HostError::layout(id))
    }

    fn gather_outputs(&self, xout: &mut [f64]) -> HostResult<()> {
        let Some(buffers) = self.buffers.as_ref() else {
            return Ok(());
        };
        let region = HostRegion::for_role(Role::Outputs, buffers.outputs.field_count());
        gather(&buffers.outputs, xout, region.start).map_err(HostError::layout(self.id))
    }

    /// Optional terminate call, then cleanup.
    ///
    /// The phase advances even if the model reports an error, so the
    /// terminate call is never repeated.
    pub fn terminate(&mut self, xvar: &mut [f64], log: &mut HostLog<'_>) -> HostResult<()> {
        self.expect_phase(
            "call Model_Terminate",
            &[Phase::Initialized, Phase::Stepping],
        )?;
        if let Some(schedule) = self.schedule.as_mut() {
            schedule.mark_terminated();
        }
        let result = self.invoke(LifecycleCall::Terminate, xvar, log);
        self.phase = Phase::Terminated;
        result?;
        self.cleanup();
        Ok(())
    }

    /// Free the buffers and unload the library.
    ///
    /// Returns `false` when there was nothing to clean.
    pub fn cleanup(&mut self) -> bool {
        if matches!(self.phase, Phase::Registered | Phase::Cleaned) {
            return false;
        }
        self.buffers = None;
        self.model = None;
        self.phase = Phase::Cleaned;
        info!(instance = %self.id, library = %self.library.display(), "instance cleaned up");
        true
    }

    /// Ask the model to print its description.
    pub fn print_info(&mut self) -> HostResult<Option<i32>> {
        let id = self.id;
        let phase = self.phase;
        let model = self.model.as_deref_mut().ok_or(HostError::OutOfOrder {
            id,
            operation: "call Model_PrintInfo",
            phase,
        })?;
        Ok(model.print_info())
    }
}
