//! Host-facing entry points.
//!
//! The host engine calls [`Adapter::init`] once per instance and
//! [`Adapter::exec`] on every step, always with the same four flat arrays:
//!
//! - `xdata`: `[id, host_step, stop_time, release_time, params...]`
//! - `xin`: `[t, inputs...]`, at init followed by the initial outputs
//! - `xout`: `[outputs...]`
//! - `xvar`: state memory owned by the host
//!
//! Any error from `init` or `exec` is fatal: every bound instance is cleaned
//! up, the error is written to the host log and the host is asked to abort.
//! Later calls return [`HostError::Aborted`].

use mh_abi::{ModelLoader, NativeLoader};
use mh_core::{InstanceId, Verbosity};
use tracing::{error, info};

use crate::arena::Arena;
use crate::bridge::{HostBridge, HostLog};
use crate::config::HostConfig;
use crate::error::{HostError, HostResult};
use crate::manifest::Manifest;
use crate::scheduler::Timing;

const RULE: &str =
    "================================================================================";
const SEPARATOR: &str =
    "________________________________________________________________________________";
const ERROR_RULE: &str = "//////////////////////////////////////////";

pub struct Adapter<L, B> {
    config: HostConfig,
    loader: L,
    bridge: B,
    arena: Option<Arena>,
    verbosity: Verbosity,
    aborted: bool,
}

impl<B: HostBridge> Adapter<NativeLoader, B> {
    /// Adapter loading manifest entries as shared libraries.
    pub fn native(config: HostConfig, bridge: B) -> Self {
        Self::new(config, NativeLoader, bridge)
    }
}

impl<L: ModelLoader, B: HostBridge> Adapter<L, B> {
    pub fn new(config: HostConfig, loader: L, bridge: B) -> Self {
        let verbosity = config.verbosity;
        Self {
            config,
            loader,
            bridge,
            arena: None,
            verbosity,
            aborted: false,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// `None` until the first `init` reads the manifest.
    pub fn arena(&self) -> Option<&Arena> {
        self.arena.as_ref()
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Run `op`; on failure sweep the arena and abort the host.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> HostResult<T>) -> HostResult<T> {
        if self.aborted {
            return Err(HostError::Aborted);
        }
        op(self).inspect_err(|err| self.fail(err))
    }

    fn fail(&mut self, err: &HostError) {
        self.aborted = true;
        error!(error = %err, "fatal error, stopping simulation");
        let mut log = HostLog::new(&mut self.bridge, self.verbosity);

        log.debug("Cleanup of all bound instances");
        if let Some(arena) = self.arena.as_mut() {
            for id in arena.sweep() {
                let library = arena
                    .get(id)
                    .map(|i| i.library().display().to_string())
                    .unwrap_or_default();
                log.debug(&format!("Cleaning instance {id} - file: {library}"));
            }
        }
        log.debug("Cleanup ended OK");

        let reason = err.to_string();
        log.line(ERROR_RULE);
        log.line(&format!("ERROR:\n{reason}"));
        log.line(ERROR_RULE);
        log.abort(&reason);
    }

    /// Read the manifest on first use.
    fn ensure_arena(&mut self) -> HostResult<()> {
        if self.arena.is_some() {
            return Ok(());
        }
        let mut log = HostLog::new(&mut self.bridge, self.verbosity);
        log.line(RULE);
        log.line("            Initializing component-model host (IEEE/CIGRE DLL interface)");
        log.line(SEPARATOR);

        self.config.validate()?;
        let manifest = Manifest::read(&self.config.manifest_path, self.config.capacity)?;
        if let Some(verbosity) = manifest.verbosity {
            self.verbosity = verbosity;
        }
        let arena = Arena::from_manifest(&manifest, self.config.capacity)?;
        info!(
            manifest = %manifest.source.display(),
            instances = arena.len(),
            "manifest loaded"
        );

        let mut log = HostLog::new(&mut self.bridge, self.verbosity);
        log.info("List of component models read:");
        for instance in arena.iter() {
            log.info(&format!(
                "{} : {}",
                instance.id().index(),
                instance.library().display()
            ));
        }
        log.info(SEPARATOR);
        self.arena = Some(arena);
        Ok(())
    }

    /// Bind, prepare, check and initialize the instance named by `xdata[0]`.
    pub fn init(
        &mut self,
        xdata: &[f64],
        xin: &[f64],
        xout: &mut [f64],
        xvar: &mut [f64],
    ) -> HostResult<()> {
        self.guarded(|this| this.init_instance(xdata, xin, xout, xvar))
    }

    fn init_instance(
        &mut self,
        xdata: &[f64],
        xin: &[f64],
        xout: &mut [f64],
        xvar: &mut [f64],
    ) -> HostResult<()> {
        self.ensure_arena()?;
        let id = instance_id(xdata)?;
        let t = host_time(xin)?;
        let Some(arena) = self.arena.as_mut() else {
            return Err(HostError::Unregistered { id });
        };
        let instance = arena.get_mut(id)?;
        let mut log = HostLog::new(&mut self.bridge, self.verbosity);

        let meta = instance.bind(&mut self.loader)?;
        let timing = Timing::from_host(xdata, meta.fixed_step)?;
        log.line(&format!("Instance {id}"));
        log.line(&format!("Model Name= {}", meta.name));
        log.info(&format!("HostTimeStep= {:.6}", timing.host_step));
        log.info(&format!("ModelTimeStep= {:.6}", timing.model_step));
        log.info(&format!("ReleaseTime= {:.6}", timing.release_time));
        log.info(&format!("StopTime= {:.6}", timing.stop_time));
        log.info(&format!("N Inputs= {}", meta.inputs.len()));
        log.info(&format!("N Outputs= {}", meta.outputs.len()));
        log.info(&format!("N Parameters= {}", meta.parameters.len()));
        log.info(&format!("N IntStates= {}", meta.int_states));
        log.info(&format!("N FloatStates= {}", meta.float_states));
        log.info(&format!("N DoubleStates= {}", meta.double_states));

        instance.prepare(timing, t, xdata, xin, xout)?;
        instance.first_call(xvar, &mut log)?;
        instance.check_parameters(xvar, &mut log)?;
        instance.initialize(xvar, &mut log)?;
        log.line(SEPARATOR);
        Ok(())
    }

    /// One host step for the instance named by `xdata[0]`.
    pub fn exec(
        &mut self,
        xdata: &[f64],
        xin: &[f64],
        xout: &mut [f64],
        xvar: &mut [f64],
    ) -> HostResult<()> {
        self.guarded(|this| {
            let id = instance_id(xdata)?;
            let t = host_time(xin)?;
            let arena = this.arena.as_mut().ok_or(HostError::Unregistered { id })?;
            let instance = arena.get_mut(id)?;
            let mut log = HostLog::new(&mut this.bridge, this.verbosity);
            instance.exec(t, xin, xout, xvar, &mut log)?;
            Ok(())
        })
    }

    /// Ask instance `id` to print its own description, if it can.
    ///
    /// Diagnostic only: errors are returned to the caller without aborting
    /// the host, and an instance that is not bound is skipped (`Ok(None)`).
    pub fn print_info(&mut self, id: InstanceId) -> HostResult<Option<i32>> {
        if self.aborted {
            return Err(HostError::Aborted);
        }
        let arena = self.arena.as_mut().ok_or(HostError::Unregistered { id })?;
        let instance = arena.get_mut(id)?;
        if !instance.is_bound() {
            return Ok(None);
        }
        instance.print_info()
    }

    /// Clean up every bound instance without aborting, e.g. when the host
    /// stops before the configured stop time.
    pub fn shutdown(&mut self) -> Vec<InstanceId> {
        let cleaned = self.arena.as_mut().map(Arena::sweep).unwrap_or_default();
        let mut log = HostLog::new(&mut self.bridge, self.verbosity);
        for id in &cleaned {
            log.debug(&format!("Cleaning instance {id}"));
        }
        cleaned
    }
}

fn instance_id(xdata: &[f64]) -> HostResult<InstanceId> {
    let value = xdata
        .first()
        .copied()
        .ok_or_else(|| HostError::HostArray("parameter array is empty".into()))?;
    InstanceId::from_host_value(value)
        .ok_or_else(|| HostError::HostArray(format!("'{value}' is not a valid instance id")))
}

fn host_time(xin: &[f64]) -> HostResult<f64> {
    let t = xin
        .first()
        .copied()
        .ok_or_else(|| HostError::HostArray("input array is empty".into()))?;
    Ok(mh_core::ensure_finite(t, "host time")?)
}
