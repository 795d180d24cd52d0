//! # Unit Compilation
//!
//! Drives extraction, translation and emission for one source unit.
//!
//! Root declarations seed a worklist. Translating a declaration's body may
//! reference declarations not yet known; those are added to the discovered
//! set and queued. The loop drains the queue, so each declaration is
//! translated exactly once regardless of how many sites reference it.

use std::collections::VecDeque;

use tracing::debug;
use zodgen_core::{Declaration, QualifiedName, UnknownPolicy};
use zodgen_extract::{Extractor, SourceUnit};

use crate::discovered::DiscoveredSet;
use crate::emit::{emit, CompiledUnit};
use crate::error::CodegenError;
use crate::translate::Translator;

/// Compiles source units into schema modules with one extractor.
pub struct SchemaCompiler<'a> {
    extractor: &'a dyn Extractor,
    policy: UnknownPolicy,
}

impl<'a> SchemaCompiler<'a> {
    /// A compiler using `extractor` for both extraction and out-of-unit
    /// resolution.
    pub fn new(extractor: &'a dyn Extractor, policy: UnknownPolicy) -> Self {
        Self { extractor, policy }
    }

    /// Compile one unit. `Ok(None)` when it declares no records or enums.
    pub fn compile_unit(&self, unit: &SourceUnit) -> Result<Option<CompiledUnit>, CodegenError> {
        let roots = self.extractor.extract(unit)?;
        debug!(
            path = %unit.path.display(),
            extractor = self.extractor.name(),
            roots = roots.len(),
            "extracted unit"
        );
        if roots.is_empty() {
            return Ok(None);
        }
        self.compile(roots).map(Some)
    }

    /// Translate `roots` and everything they reference, then emit them in
    /// dependency order.
    pub fn compile(&self, roots: Vec<Declaration>) -> Result<CompiledUnit, CodegenError> {
        let translator = Translator::new(self.extractor, self.policy);
        let mut set = DiscoveredSet::new();
        let mut queue = VecDeque::new();
        let mut root_names = Vec::with_capacity(roots.len());

        for root in roots {
            let name = root.name.clone();
            if set.insert(root)? {
                queue.push_back(name.clone());
                root_names.push(name);
            }
        }

        while let Some(name) = queue.pop_front() {
            let Some(entry) = set.get(&name) else {
                continue;
            };
            let translation = translator.translate_declaration(&entry.declaration, &set)?;

            let mut dependencies: Vec<QualifiedName> =
                Vec::with_capacity(translation.dependencies.len());
            for dependency in translation.dependencies {
                dependencies.push(dependency.name.clone());
                let pending = dependency.name.clone();
                if set.insert(dependency)? {
                    debug!(declaration = %name, dependency = %pending, "discovered dependency");
                    queue.push_back(pending);
                }
            }
            set.complete(&name, translation.code, dependencies);
        }

        Ok(emit(&set, &root_names))
    }
}
