use crate::params::ParamKind;

/// Failure produced while turning a variant key into a usable GPU program.
///
/// Compile errors are absorbed by the frame loop: the previous program keeps
/// rendering and the failure is handed to the [`ErrorSink`].
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to assemble shader source: {0}")]
    Assemble(String),
    #[error("shader parse error: {0}")]
    Parse(String),
    #[error("shader validation error: {0}")]
    Validate(String),
}

/// Engine-level error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The variant rebuild path failed. Non-fatal; the previous program is
    /// retained and rendering continues with stale-but-valid output.
    #[error("shader compilation failed: {0}")]
    ShaderCompile(#[from] CompileError),
    /// The GPU context became invalid. Fatal to the current session; every
    /// buffer and program must be treated as destroyed before ticks resume.
    #[error("GPU device lost")]
    DeviceLost,
    /// A parameter write carried a value of the wrong kind. Rejected at the
    /// boundary without touching the stored value.
    #[error("invalid value for parameter '{name}': expected {expected}")]
    InvalidParameter { name: String, expected: ParamKind },
    /// A parameter name the engine has never registered.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
}

/// Broad classification used when reporting absorbed failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ShaderCompile,
    DeviceLost,
    InvalidParameter,
}

/// Diagnostics sink for failures the tick loop absorbs instead of raising.
pub trait ErrorSink {
    fn report(&self, kind: ErrorKind, detail: &str);
}

/// Default sink that forwards reports to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, kind: ErrorKind, detail: &str) {
        tracing::warn!(?kind, detail, "engine error absorbed");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{ErrorKind, ErrorSink};
    use std::cell::RefCell;

    /// Records reports so tests can assert on the absorbed-error path.
    #[derive(Default)]
    pub struct RecordingSink {
        pub reports: RefCell<Vec<(ErrorKind, String)>>,
    }

    impl ErrorSink for RecordingSink {
        fn report(&self, kind: ErrorKind, detail: &str) {
            self.reports.borrow_mut().push((kind, detail.to_string()));
        }
    }
}
