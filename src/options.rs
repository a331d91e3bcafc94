//! Option structs threaded through compilation and validation.

/// How the schema compiler reacts to an `import` it cannot resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportResolution {
    /// Raise a [`crate::errors::CompileError::UnknownImport`].
    #[default]
    Strict,
    /// Fabricate a placeholder module with a synthetic namespace so
    /// compilation can proceed; used by editors that must tolerate
    /// incomplete workspaces.
    Relaxed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub import_resolution: ImportResolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    Config,
    State,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    pub mode: ValidationMode,
    /// Log any `must` evaluation slower than this threshold, per
    /// `spec.md` §4.11's debug facility. `None` disables the check.
    pub must_threshold_ms: Option<u64>,
}
