use crate::error::CompileError;

/// Snapshot of the structural parameters that select which shader source is
/// compiled. Compared by value; equal keys always reuse the cached program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub shape_type: i32,
    pub shape_mode: i32,
    pub displacement_active: bool,
    pub fog_enabled: bool,
}

/// Shader text assembler collaborator: a pure function from a variant key to
/// fragment source. The cache treats it as opaque.
pub trait ShaderAssembler {
    fn build(&self, key: &VariantKey) -> Result<String, CompileError>;
}

/// Rebuild-on-key-change cache in front of the assembler.
///
/// The dominant path is the cheap one: the key matches the last committed key
/// and `ensure` returns without touching the assembler or the GPU. A rebuild
/// only commits once `install` (the GPU-side compile/relink) has accepted the
/// new source, so any failure leaves the previous program active and the key
/// dirty for the next attempt.
pub struct VariantCache {
    assembler: Box<dyn ShaderAssembler + Send>,
    last_key: Option<VariantKey>,
    builds: u64,
}

impl VariantCache {
    pub fn new(assembler: Box<dyn ShaderAssembler + Send>) -> Self {
        Self {
            assembler,
            last_key: None,
            builds: 0,
        }
    }

    /// Ensures the installed program matches `key`. Returns `true` when a
    /// rebuild happened, `false` on the cached path.
    pub fn ensure<F>(
        &mut self,
        key: VariantKey,
        force: bool,
        install: F,
    ) -> Result<bool, CompileError>
    where
        F: FnOnce(&str) -> Result<(), CompileError>,
    {
        if !force && self.last_key == Some(key) {
            return Ok(false);
        }

        let source = self.assembler.build(&key)?;
        install(&source)?;
        self.last_key = Some(key);
        self.builds += 1;
        tracing::debug!(?key, builds = self.builds, "rebuilt shader variant");
        Ok(true)
    }

    /// Forgets the committed key so the next `ensure` rebuilds even with an
    /// unchanged key. Used after device loss, when the program is gone.
    pub fn invalidate(&mut self) {
        self.last_key = None;
    }

    /// Total successful rebuilds this session.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}
