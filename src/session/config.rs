//! Session configuration (spec §6 "Input", §10.3) and its builder.
//!
//! Grounded on `plotnik-lib/src/query/stages.rs`'s `QueryConfig`/`QueryBuilder` split: a plain
//! data struct for the knobs, assembled through a builder with one `with_*` method per field and
//! a couple of conservative defaults for the fuel limits (spec §5 "execution and recursion fuel
//! counters... bound pathological inputs").

use std::collections::HashMap;
use std::path::PathBuf;

use super::Session;
use crate::error::Result;

/// Conservative default execution-step budget, mirrored from the teacher's
/// `DEFAULT_QUERY_PARSE_FUEL`.
pub const DEFAULT_EXEC_FUEL: u32 = 1_000_000;

/// Conservative default recursion-depth budget, mirrored from the teacher's
/// `DEFAULT_QUERY_PARSE_MAX_DEPTH`.
pub const DEFAULT_RECURSION_FUEL: u32 = 4_096;

/// The external inputs a session is configured with (spec §6): source file paths, build-time
/// definitions, optional graph-dump paths, the out-of-scope VM's heap/stack sizing, and the
/// compiler executable's own path (for locating its runtime library).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Source files to compile, in order. Populated by [`SessionBuilder::source`]/
    /// [`SessionBuilder::sources`]; loaded into the session's [`crate::source::SourceSet`] by
    /// [`SessionBuilder::build_and_load`].
    pub source_paths: Vec<PathBuf>,

    /// Build-time `key=value` definitions, analogous to a C compiler's `-D` flags; consulted by
    /// `#if` directive evaluation (spec §4.6) for names not otherwise bound in the program.
    pub definitions: HashMap<String, String>,

    /// Where to write a rendered AST dump, if requested.
    pub ast_dump_path: Option<PathBuf>,

    /// Where to write a rendered element-graph ("element-DOM") dump, if requested.
    pub element_dump_path: Option<PathBuf>,

    /// Heap size in bytes for the out-of-scope VM collaborator evaluating `#run` directives.
    pub vm_heap_size: u64,

    /// Stack size in bytes for the out-of-scope VM collaborator.
    pub vm_stack_size: u64,

    /// Path to the compiler executable, used by the out-of-scope FFI collaborator to locate the
    /// runtime library relative to it.
    pub compiler_path: Option<PathBuf>,

    /// Execution-step fuel for the parser (spec §5); `None` disables the limit.
    pub exec_fuel: Option<u32>,

    /// Recursion-depth fuel for the parser (spec §5); `None` disables the limit.
    pub recursion_fuel: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source_paths: Vec::new(),
            definitions: HashMap::new(),
            ast_dump_path: None,
            element_dump_path: None,
            vm_heap_size: 16 * 1024 * 1024,
            vm_stack_size: 1024 * 1024,
            compiler_path: None,
            exec_fuel: Some(DEFAULT_EXEC_FUEL),
            recursion_fuel: Some(DEFAULT_RECURSION_FUEL),
        }
    }
}

/// Builder for [`SessionConfig`] / [`Session`]. Every setter consumes and returns `self` so
/// configuration reads as one chained expression, matching the teacher's `QueryBuilder`.
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source_paths.push(path.into());
        self
    }

    pub fn sources(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.config.source_paths.extend(paths);
        self
    }

    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.definitions.insert(key.into(), value.into());
        self
    }

    pub fn ast_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ast_dump_path = Some(path.into());
        self
    }

    pub fn element_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.element_dump_path = Some(path.into());
        self
    }

    pub fn vm_heap_size(mut self, bytes: u64) -> Self {
        self.config.vm_heap_size = bytes;
        self
    }

    pub fn vm_stack_size(mut self, bytes: u64) -> Self {
        self.config.vm_stack_size = bytes;
        self
    }

    pub fn compiler_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.compiler_path = Some(path.into());
        self
    }

    pub fn exec_fuel(mut self, limit: u32) -> Self {
        self.config.exec_fuel = Some(limit);
        self
    }

    pub fn no_exec_fuel_limit(mut self) -> Self {
        self.config.exec_fuel = None;
        self
    }

    pub fn recursion_fuel(mut self, limit: u32) -> Self {
        self.config.recursion_fuel = Some(limit);
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }

    /// Builds the config, constructs the [`Session`], and eagerly loads every configured source
    /// path from disk.
    pub fn build_and_load(self) -> Result<Session> {
        let paths = self.config.source_paths.clone();
        let mut session = Session::new(self.config);
        for path in paths {
            session.add_file(path)?;
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_set_conservative_fuel_limits() {
        let config = SessionConfig::default();
        assert_eq!(config.exec_fuel, Some(DEFAULT_EXEC_FUEL));
        assert_eq!(config.recursion_fuel, Some(DEFAULT_RECURSION_FUEL));
    }

    #[test]
    fn builder_chains_definitions() {
        let config = SessionBuilder::new().define("DEBUG", "true").define("ARCH", "x86_64").build();
        assert_eq!(config.definitions.get("DEBUG"), Some(&"true".to_string()));
        assert_eq!(config.definitions.len(), 2);
    }

    #[test]
    fn no_exec_fuel_limit_clears_the_default() {
        let config = SessionBuilder::new().no_exec_fuel_limit().build();
        assert_eq!(config.exec_fuel, None);
    }
}
