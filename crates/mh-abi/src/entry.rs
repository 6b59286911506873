//! Named entry points and the calls the lifecycle controller makes.

use core::fmt;

/// An exported function of a component-model library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    GetInfo,
    FirstCall,
    CheckParameters,
    Initialize,
    Outputs,
    Terminate,
    PrintInfo,
}

impl EntryPoint {
    /// Entry points whose absence makes a library unusable.
    pub const REQUIRED: [EntryPoint; 4] = [
        EntryPoint::GetInfo,
        EntryPoint::CheckParameters,
        EntryPoint::Initialize,
        EntryPoint::Outputs,
    ];

    /// Entry points that may be missing; their calls are skipped.
    pub const OPTIONAL: [EntryPoint; 3] = [
        EntryPoint::FirstCall,
        EntryPoint::Terminate,
        EntryPoint::PrintInfo,
    ];

    /// Exported symbol name.
    pub fn symbol(self) -> &'static str {
        match self {
            EntryPoint::GetInfo => "Model_GetInfo",
            EntryPoint::FirstCall => "Model_FirstCall",
            EntryPoint::CheckParameters => "Model_CheckParameters",
            EntryPoint::Initialize => "Model_Initialize",
            EntryPoint::Outputs => "Model_Outputs",
            EntryPoint::Terminate => "Model_Terminate",
            EntryPoint::PrintInfo => "Model_PrintInfo",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Lifecycle calls taking the instance context and returning a severity code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleCall {
    FirstCall,
    CheckParameters,
    Initialize,
    Outputs,
    Terminate,
}

impl LifecycleCall {
    pub fn entry_point(self) -> EntryPoint {
        match self {
            LifecycleCall::FirstCall => EntryPoint::FirstCall,
            LifecycleCall::CheckParameters => EntryPoint::CheckParameters,
            LifecycleCall::Initialize => EntryPoint::Initialize,
            LifecycleCall::Outputs => EntryPoint::Outputs,
            LifecycleCall::Terminate => EntryPoint::Terminate,
        }
    }
}

impl fmt::Display for LifecycleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entry_point().fmt(f)
    }
}

/// Presence of the optional entry points, resolved once at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub first_call: bool,
    pub terminate: bool,
    pub print_info: bool,
}

impl Capabilities {
    /// Every optional entry point present.
    pub fn all() -> Self {
        Self {
            first_call: true,
            terminate: true,
            print_info: true,
        }
    }

    pub fn provides(&self, entry: EntryPoint) -> bool {
        match entry {
            EntryPoint::FirstCall => self.first_call,
            EntryPoint::Terminate => self.terminate,
            EntryPoint::PrintInfo => self.print_info,
            required => required.is_required(),
        }
    }

    /// Optional entry points the library does not export.
    pub fn absent(&self) -> Vec<EntryPoint> {
        EntryPoint::OPTIONAL
            .into_iter()
            .filter(|e| !self.provides(*e))
            .collect()
    }
}
