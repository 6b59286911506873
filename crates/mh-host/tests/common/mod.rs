//! In-process component models for driving the adapter without shared libraries.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mh_abi::{
    BindError, BindResult, CallReply, Capabilities, ComponentModel, LifecycleCall, ModelContext,
    ModelLoader, ModelMetadata,
};
use mh_core::DataType;
use mh_host::{Adapter, HostConfig, RecordingBridge};

/// One lifecycle call as seen by a fake model.
#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub model: String,
    pub call: LifecycleCall,
    pub time: f64,
}

pub type Journal = Rc<RefCell<Vec<Seen>>>;

/// Behavior of a fake model.
#[derive(Debug, Clone)]
pub struct Spec {
    pub metadata: ModelMetadata,
    pub capabilities: Capabilities,
    pub replies: HashMap<LifecycleCall, CallReply>,
}

impl Spec {
    pub fn new(metadata: ModelMetadata) -> Self {
        Self {
            metadata,
            capabilities: Capabilities::all(),
            replies: HashMap::new(),
        }
    }

    pub fn reply(mut self, call: LifecycleCall, reply: CallReply) -> Self {
        self.replies.insert(call, reply);
        self
    }

    pub fn without(mut self, caps: Capabilities) -> Self {
        self.capabilities = caps;
        self
    }
}

/// `modelA`: 2 inputs, 1 output, 3 parameters, 0/0/5 states, step 0.01.
pub fn model_a() -> ModelMetadata {
    ModelMetadata::new("modelA", 0.01)
        .with_input("in1", DataType::Float64)
        .with_input("in2", DataType::Float64)
        .with_output("out1", DataType::Float64)
        .with_parameter("p1", DataType::Float64)
        .with_parameter("p2", DataType::Int32)
        .with_parameter("p3", DataType::Uint8)
        .with_states(0, 0, 5)
}

/// Sums its inputs into its first output; counts firings in the first
/// double state.
struct FakeModel {
    spec: Spec,
    journal: Journal,
}

impl ComponentModel for FakeModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.spec.metadata
    }

    fn capabilities(&self) -> Capabilities {
        self.spec.capabilities
    }

    fn call(&mut self, call: LifecycleCall, ctx: &mut ModelContext<'_>) -> Option<CallReply> {
        if !self.spec.capabilities.provides(call.entry_point()) {
            return None;
        }
        self.journal.borrow_mut().push(Seen {
            model: self.spec.metadata.name.clone(),
            call,
            time: ctx.time,
        });
        if call == LifecycleCall::Outputs {
            let sum: f64 = ctx.inputs.to_host_values().ok()?.iter().sum();
            if ctx.outputs.field_count() > 0 {
                ctx.outputs.set(0, sum).ok()?;
            }
            if let Some(doubles) = ctx.states.doubles_mut() {
                doubles[0] += 1.0;
            }
        }
        Some(self.spec.replies.get(&call).cloned().unwrap_or_default())
    }

    fn print_info(&mut self) -> Option<i32> {
        self.spec.capabilities.print_info.then_some(0)
    }
}

/// Resolves manifest paths to fake models by file name.
pub struct FakeLoader {
    pub specs: HashMap<PathBuf, Spec>,
    pub journal: Journal,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self {
            specs: HashMap::new(),
            journal: Journal::default(),
        }
    }

    pub fn with(mut self, library: &str, spec: Spec) -> Self {
        self.specs.insert(PathBuf::from(library), spec);
        self
    }
}

impl ModelLoader for FakeLoader {
    fn load(&mut self, path: &Path) -> BindResult<Box<dyn ComponentModel>> {
        let spec = self
            .specs
            .get(path)
            .cloned()
            .ok_or_else(|| BindError::LibraryLoad {
                path: path.to_path_buf(),
                message: "no such fake model".into(),
            })?;
        Ok(Box::new(FakeModel {
            spec,
            journal: Rc::clone(&self.journal),
        }))
    }
}

/// A manifest file in a fresh temporary directory.
pub struct ManifestDir {
    _dir: tempfile::TempDir,
    pub path: PathBuf,
}

pub fn manifest(text: &str) -> ManifestDir {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("icdll_list.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    ManifestDir { _dir: dir, path }
}

pub type TestAdapter = Adapter<FakeLoader, RecordingBridge>;

pub fn adapter(manifest: &ManifestDir, loader: FakeLoader) -> (TestAdapter, Journal) {
    let journal = Rc::clone(&loader.journal);
    let config = HostConfig::with_manifest(&manifest.path);
    (Adapter::new(config, loader, RecordingBridge::default()), journal)
}

pub fn calls(journal: &Journal) -> Vec<LifecycleCall> {
    journal.borrow().iter().map(|seen| seen.call).collect()
}
