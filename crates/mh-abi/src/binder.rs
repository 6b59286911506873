//! Loading component-model libraries.
//!
//! Symbols are resolved once, right after the library is opened. Required
//! entry points fail the bind; optional ones are recorded in
//! [`Capabilities`] and their calls become no-ops.

use core::ffi::{CStr, c_char, c_void};
use core::ptr;
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, info};

use crate::entry::{Capabilities, EntryPoint, LifecycleCall};
use crate::error::{BindError, BindResult};
use crate::ffi::{GetInfoFn, LifecycleFn, PrintInfoFn, RawInstance};
use crate::metadata::ModelMetadata;
use crate::model::{CallReply, ComponentModel, ModelContext, ModelLoader};

/// Check a library's exports against the entry point table.
///
/// Fails on the first missing required entry point, in declaration order.
pub fn check_exports(
    path: &Path,
    mut exports: impl FnMut(EntryPoint) -> bool,
) -> BindResult<Capabilities> {
    for entry in EntryPoint::REQUIRED {
        if !exports(entry) {
            return Err(BindError::MissingSymbol {
                path: path.to_path_buf(),
                symbol: entry.symbol(),
            });
        }
    }
    let caps = Capabilities {
        first_call: exports(EntryPoint::FirstCall),
        terminate: exports(EntryPoint::Terminate),
        print_info: exports(EntryPoint::PrintInfo),
    };
    for entry in caps.absent() {
        debug!(library = %path.display(), %entry, "optional entry point not exported");
    }
    Ok(caps)
}

/// An opened shared library.
#[derive(Debug)]
pub struct BoundLibrary {
    path: PathBuf,
    library: Library,
}

impl BoundLibrary {
    pub fn open(path: &Path) -> BindResult<Self> {
        // SAFETY: opening a library runs its initializers. Manifest entries
        // are trusted the same way the host executable is.
        let library = unsafe { Library::new(path) }.map_err(|e| BindError::LibraryLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(library = %path.display(), "opened library");
        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exports(&self, entry: EntryPoint) -> bool {
        // SAFETY: the address is only tested for presence, never used.
        unsafe { self.function::<*const c_void>(entry) }.is_some()
    }

    /// # Safety
    ///
    /// `T` must be the entry point's real type.
    unsafe fn function<T: Copy>(&self, entry: EntryPoint) -> Option<T> {
        // SAFETY: forwarded from the caller.
        unsafe { self.library.get::<T>(entry.symbol().as_bytes()) }
            .ok()
            .map(|symbol| *symbol)
    }

    fn required<T: Copy>(&self, entry: EntryPoint, function: Option<T>) -> BindResult<T> {
        function.ok_or_else(|| BindError::MissingSymbol {
            path: self.path.clone(),
            symbol: entry.symbol(),
        })
    }

    /// Resolve every entry point into a typed table.
    pub fn entry_points(&self) -> BindResult<EntryPoints> {
        let caps = check_exports(&self.path, |entry| self.exports(entry))?;
        // SAFETY: the function types mirror the ABI header.
        unsafe {
            Ok(EntryPoints {
                get_info: self.required(
                    EntryPoint::GetInfo,
                    self.function::<GetInfoFn>(EntryPoint::GetInfo),
                )?,
                check_parameters: self.required(
                    EntryPoint::CheckParameters,
                    self.function::<LifecycleFn>(EntryPoint::CheckParameters),
                )?,
                initialize: self.required(
                    EntryPoint::Initialize,
                    self.function::<LifecycleFn>(EntryPoint::Initialize),
                )?,
                outputs: self.required(
                    EntryPoint::Outputs,
                    self.function::<LifecycleFn>(EntryPoint::Outputs),
                )?,
                first_call: caps
                    .first_call
                    .then(|| self.function::<LifecycleFn>(EntryPoint::FirstCall))
                    .flatten(),
                terminate: caps
                    .terminate
                    .then(|| self.function::<LifecycleFn>(EntryPoint::Terminate))
                    .flatten(),
                print_info: caps
                    .print_info
                    .then(|| self.function::<PrintInfoFn>(EntryPoint::PrintInfo))
                    .flatten(),
            })
        }
    }
}

/// Typed entry points of one library. Only valid while it stays loaded.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoints {
    get_info: GetInfoFn,
    check_parameters: LifecycleFn,
    initialize: LifecycleFn,
    outputs: LifecycleFn,
    first_call: Option<LifecycleFn>,
    terminate: Option<LifecycleFn>,
    print_info: Option<PrintInfoFn>,
}

impl EntryPoints {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            first_call: self.first_call.is_some(),
            terminate: self.terminate.is_some(),
            print_info: self.print_info.is_some(),
        }
    }

    fn lifecycle(&self, call: LifecycleCall) -> Option<LifecycleFn> {
        match call {
            LifecycleCall::FirstCall => self.first_call,
            LifecycleCall::CheckParameters => Some(self.check_parameters),
            LifecycleCall::Initialize => Some(self.initialize),
            LifecycleCall::Outputs => Some(self.outputs),
            LifecycleCall::Terminate => self.terminate,
        }
    }
}

/// A component model backed by a native library.
#[derive(Debug)]
pub struct NativeModel {
    entry: EntryPoints,
    metadata: ModelMetadata,
    instance: Box<RawInstance>,
    // Declared last: unloads after everything that points into it.
    library: BoundLibrary,
}

impl NativeModel {
    /// Open `path`, resolve its entry points and copy its metadata.
    pub fn load(path: &Path) -> BindResult<Self> {
        let library = BoundLibrary::open(path)?;
        let entry = library.entry_points()?;
        // SAFETY: `get_info` has the ABI signature and returns a pointer to
        // static data of the library, which is loaded for this whole scope.
        let metadata = unsafe { ModelMetadata::from_raw((entry.get_info)(), path) }?;
        info!(
            library = %path.display(),
            model = %metadata.name,
            step = metadata.fixed_step,
            inputs = metadata.inputs.len(),
            outputs = metadata.outputs.len(),
            parameters = metadata.parameters.len(),
            "bound component model"
        );
        Ok(Self {
            entry,
            metadata,
            instance: Box::default(),
            library,
        })
    }

    pub fn path(&self) -> &Path {
        self.library.path()
    }

    fn point_at(&mut self, ctx: &mut ModelContext<'_>) {
        let counts = ctx.states.counts();
        let base = ctx.states.as_mut_ptr();
        let instance = &mut *self.instance;
        instance.external_inputs = ctx.inputs.as_mut_ptr();
        instance.external_outputs = ctx.outputs.as_mut_ptr();
        instance.parameters = ctx.parameters.as_mut_ptr();
        instance.time = ctx.time;
        instance.sim_tool_emt_rms_mode = ctx.emt_rms_mode;
        instance.last_error_message = ptr::null();
        instance.last_general_message = ptr::null();
        instance.int_states = if counts.int > 0 {
            base.cast()
        } else {
            ptr::null_mut()
        };
        instance.float_states = if counts.float > 0 {
            base.cast::<u8>()
                .wrapping_add(counts.float_byte_offset())
                .cast()
        } else {
            ptr::null_mut()
        };
        instance.double_states = if counts.double > 0 {
            base.wrapping_add(counts.double_slot_offset())
        } else {
            ptr::null_mut()
        };
    }

    /// Drop every pointer into host memory once a call returns.
    fn detach(&mut self) {
        let time = self.instance.time;
        let mode = self.instance.sim_tool_emt_rms_mode;
        *self.instance = RawInstance {
            time,
            sim_tool_emt_rms_mode: mode,
            ..RawInstance::default()
        };
    }
}

/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn message(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

impl ComponentModel for NativeModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn capabilities(&self) -> Capabilities {
        self.entry.capabilities()
    }

    fn call(&mut self, call: LifecycleCall, ctx: &mut ModelContext<'_>) -> Option<CallReply> {
        let function = self.entry.lifecycle(call)?;
        self.point_at(ctx);
        // SAFETY: every pointer in the instance refers to memory borrowed by
        // `ctx`, sized from this model's own metadata, and alive until
        // `detach` below. Message pointers are read before the next call.
        let reply = unsafe {
            let code = function(&mut *self.instance);
            CallReply {
                code,
                message: message(self.instance.last_general_message),
                error: message(self.instance.last_error_message),
            }
        };
        self.detach();
        Some(reply)
    }

    fn print_info(&mut self) -> Option<i32> {
        let function = self.entry.print_info?;
        // SAFETY: takes no arguments; the library is loaded.
        Some(unsafe { function() })
    }
}

/// Loads manifest entries as native libraries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl ModelLoader for NativeLoader {
    fn load(&mut self, path: &Path) -> BindResult<Box<dyn ComponentModel>> {
        Ok(Box::new(NativeModel::load(path)?))
    }
}
