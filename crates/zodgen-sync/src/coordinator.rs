//! # Sync Coordinator
//!
//! Keeps the output tree in line with the source tree.
//!
//! ## Batches
//!
//! - **Sweep**: compile every source unit, delete outputs no unit accounts
//!   for, then write every compiled output that is missing or stale.
//! - **React**: recompile added and modified units, then delete the outputs
//!   of removed ones, then recompile every other unit whose output embeds
//!   a declaration those files made. When a batch introduces a name no unit
//!   declared before, every unit is recompiled, since references that did
//!   not resolve leave no trace in an output.
//!
//! At most one batch runs at a time; a second caller blocks on the batch
//! lock until the first finishes. The lock also guards the ledger of what
//! each unit last declared and emitted, which a sweep rebuilds. A unit that
//! fails to compile is logged, counted in [`SyncReport::failed`], and its
//! previous output is left in place.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use tracing::{debug, error, info};
use zodgen_core::{Config, OutputPathResolver, QualifiedName};
use zodgen_extract::{
    Extractor, ProjectIndex, ReflectiveExtractor, SourceUnit, StaticExtractor, TypeReflector,
};
use zodgen_schema::{CodegenError, CompiledUnit, SchemaCompiler};

use crate::error::SyncError;
use crate::output::{remove_output, write_if_changed, WriteOutcome};
use crate::walk::find_files;
use crate::watcher::ChangeBatch;

/// Which batch, if any, is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No batch in flight.
    Idle,
    /// A full sweep is running.
    Sweeping,
    /// A change batch is being applied.
    Reacting,
}

/// Declaration front end used for every unit in a batch.
#[derive(Clone)]
pub enum FrontEnd {
    /// Parse source text; resolve cross-file references through an index of
    /// every source unit, rebuilt per batch.
    Static,
    /// Read declaration names from text and shapes from a reflector.
    Reflective(Arc<dyn TypeReflector>),
}

impl FrontEnd {
    /// Extractor for a batch over `sources`.
    pub fn extractor(&self, sources: &[PathBuf]) -> Box<dyn Extractor> {
        match self {
            Self::Static => {
                let index = ProjectIndex::build(sources);
                debug!(declarations = index.len(), "indexed project declarations");
                Box::new(StaticExtractor::with_resolver(Arc::new(index)))
            }
            Self::Reflective(reflector) => {
                Box::new(ReflectiveExtractor::new(Arc::clone(reflector)))
            }
        }
    }
}

impl std::fmt::Debug for FrontEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => f.write_str("Static"),
            Self::Reflective(_) => f.write_str("Reflective"),
        }
    }
}

/// Files touched by one batch, each list in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Outputs written for the first time.
    pub generated: Vec<PathBuf>,
    /// Outputs rewritten with new contents.
    pub updated: Vec<PathBuf>,
    /// Outputs already up to date.
    pub unchanged: Vec<PathBuf>,
    /// Outputs removed.
    pub deleted: Vec<PathBuf>,
    /// Sources or outputs that could not be processed.
    pub failed: Vec<PathBuf>,
}

impl SyncReport {
    /// Whether every file was processed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record_write(&mut self, output: PathBuf, result: Result<WriteOutcome, SyncError>) {
        match result {
            Ok(WriteOutcome::Generated) => {
                info!(output = %output.display(), "generated");
                self.generated.push(output);
            }
            Ok(WriteOutcome::Updated) => {
                info!(output = %output.display(), "updated");
                self.updated.push(output);
            }
            Ok(WriteOutcome::Unchanged) => self.unchanged.push(output),
            Err(e) => {
                error!(output = %output.display(), error = %e, "failed to write output");
                self.failed.push(output);
            }
        }
    }

    fn record_removal(&mut self, output: PathBuf, result: Result<bool, SyncError>) {
        match result {
            Ok(true) => {
                info!(output = %output.display(), "deleted");
                self.deleted.push(output);
            }
            Ok(false) => {}
            Err(e) => {
                error!(output = %output.display(), error = %e, "failed to delete output");
                self.failed.push(output);
            }
        }
    }
}

/// What one unit declared and emitted when its output was last written.
#[derive(Debug, Clone)]
struct UnitRecord {
    declared: Vec<QualifiedName>,
    emitted: Vec<QualifiedName>,
}

/// Last written state of every unit, keyed by source path.
#[derive(Debug, Default)]
struct Ledger {
    units: HashMap<PathBuf, UnitRecord>,
}

impl Ledger {
    /// Record `unit` for `source`; returns the names it declared before.
    fn record(&mut self, source: &Path, unit: &CompiledUnit) -> Vec<QualifiedName> {
        let record = UnitRecord {
            declared: unit.roots.clone(),
            emitted: unit.declarations.clone(),
        };
        self.units
            .insert(source.to_path_buf(), record)
            .map(|previous| previous.declared)
            .unwrap_or_default()
    }

    /// Drop `source`; returns the names it declared.
    fn forget(&mut self, source: &Path) -> Vec<QualifiedName> {
        self.units
            .remove(source)
            .map(|previous| previous.declared)
            .unwrap_or_default()
    }

    /// Whether a unit other than `source` declares `name`.
    fn declares_elsewhere(&self, name: &QualifiedName, source: &Path) -> bool {
        self.units
            .iter()
            .any(|(path, record)| path != source && record.declared.contains(name))
    }

    /// Units outside `handled` whose output embeds one of `names`, or every
    /// unit outside `handled` when `names` is `None`. Sorted.
    fn dependents(
        &self,
        names: Option<&HashSet<QualifiedName>>,
        handled: &HashSet<PathBuf>,
    ) -> Vec<PathBuf> {
        let mut sources: Vec<PathBuf> = self
            .units
            .iter()
            .filter(|(source, _)| !handled.contains(*source))
            .filter(|(_, record)| {
                names.map_or(true, |names| record.emitted.iter().any(|n| names.contains(n)))
            })
            .map(|(source, _)| source.clone())
            .collect();
        sources.sort();
        sources
    }
}

/// Names a refresh saw a unit declare before and after it.
struct Refreshed {
    before: Vec<QualifiedName>,
    after: Vec<QualifiedName>,
}

/// Reconciles a watch root with its output root.
#[derive(Debug)]
pub struct SyncCoordinator {
    config: Config,
    paths: OutputPathResolver,
    front_end: FrontEnd,
    batch: Mutex<Ledger>,
    state: RwLock<SyncState>,
}

struct BatchGuard<'a> {
    state: &'a RwLock<SyncState>,
    ledger: MutexGuard<'a, Ledger>,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        *self.state.write() = SyncState::Idle;
    }
}

impl SyncCoordinator {
    /// A coordinator for `config` using `front_end` for every unit.
    pub fn new(config: Config, front_end: FrontEnd) -> Self {
        let paths = OutputPathResolver::new(&config);
        Self {
            config,
            paths,
            front_end,
            batch: Mutex::new(Ledger::default()),
            state: RwLock::new(SyncState::Idle),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The source-to-output mapping.
    pub fn paths(&self) -> &OutputPathResolver {
        &self.paths
    }

    /// The batch currently running.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Reconcile the whole output tree with the source tree.
    pub fn sweep(&self) -> SyncReport {
        let mut batch = self.begin(SyncState::Sweeping);
        let sources = find_files(&self.config.watch_root, &self.config.source_extension);
        info!(
            watch_root = %self.config.watch_root.display(),
            output_root = %self.config.output_root.display(),
            sources = sources.len(),
            "sweep started"
        );
        let extractor = self.front_end.extractor(&sources);
        let compiler = SchemaCompiler::new(extractor.as_ref(), self.config.unknown_policy);

        let mut report = SyncReport::default();
        let mut ledger = Ledger::default();
        let mut expected = HashSet::new();
        let mut pending = Vec::new();
        for source in &sources {
            let output = self.paths.resolve(source);
            match compile(&compiler, source) {
                Ok(Some(unit)) => {
                    expected.insert(output.clone());
                    pending.push((source, output, unit));
                }
                Ok(None) => debug!(source = %source.display(), "no declarations"),
                Err(e) => {
                    error!(source = %source.display(), error = %e, "failed to compile unit");
                    expected.insert(output);
                    report.failed.push(source.clone());
                    if let Some(previous) = batch.ledger.units.remove(source) {
                        ledger.units.insert(source.clone(), previous);
                    }
                }
            }
        }

        for existing in find_files(&self.config.output_root, &self.config.target_extension) {
            if !expected.contains(&existing) {
                let result = remove_output(&existing);
                report.record_removal(existing, result);
            }
        }

        for (source, output, unit) in pending {
            let result = write_if_changed(&output, &unit.text);
            if result.is_ok() {
                ledger.record(source, &unit);
            }
            report.record_write(output, result);
        }
        *batch.ledger = ledger;

        log_summary("sweep", &report);
        report
    }

    /// Apply one batch of source changes.
    pub fn react(&self, changes: &ChangeBatch) -> SyncReport {
        let mut batch = self.begin(SyncState::Reacting);
        let ledger = &mut *batch.ledger;
        let sources = find_files(&self.config.watch_root, &self.config.source_extension);
        let extractor = self.front_end.extractor(&sources);
        let compiler = SchemaCompiler::new(extractor.as_ref(), self.config.unknown_policy);

        let mut report = SyncReport::default();
        let mut handled = HashSet::new();
        let mut touched = HashSet::new();
        let mut introduced = false;
        for source in changes.added.iter().chain(&changes.modified) {
            if !self.paths.is_source(source) || !handled.insert(source.clone()) {
                continue;
            }
            if let Some(Refreshed { before, after }) =
                self.refresh(&compiler, ledger, source, &mut report)
            {
                introduced |= after
                    .iter()
                    .any(|n| !before.contains(n) && !ledger.declares_elsewhere(n, source));
                touched.extend(before);
                touched.extend(after);
            }
        }

        for source in changes.removed.iter().filter(|s| self.paths.is_source(s)) {
            handled.insert(source.clone());
            touched.extend(ledger.forget(source));
            let output = self.paths.resolve(source);
            let result = remove_output(&output);
            report.record_removal(output, result);
        }

        let dependents = if introduced {
            ledger.dependents(None, &handled)
        } else {
            ledger.dependents(Some(&touched), &handled)
        };
        if !dependents.is_empty() {
            debug!(dependents = dependents.len(), introduced, "recompiling dependent units");
        }
        for source in &dependents {
            self.refresh(&compiler, ledger, source, &mut report);
        }

        log_summary("react", &report);
        report
    }

    /// Recompile `source` and bring its output up to date. `None` when the
    /// unit failed to compile.
    fn refresh(
        &self,
        compiler: &SchemaCompiler<'_>,
        ledger: &mut Ledger,
        source: &Path,
        report: &mut SyncReport,
    ) -> Option<Refreshed> {
        let output = self.paths.resolve(source);
        match compile(compiler, source) {
            Ok(Some(unit)) => {
                let result = write_if_changed(&output, &unit.text);
                let before = if result.is_ok() {
                    ledger.record(source, &unit)
                } else {
                    ledger.units.get(source).map(|r| r.declared.clone()).unwrap_or_default()
                };
                report.record_write(output, result);
                Some(Refreshed {
                    before,
                    after: unit.roots,
                })
            }
            Ok(None) => {
                let result = remove_output(&output);
                report.record_removal(output, result);
                Some(Refreshed {
                    before: ledger.forget(source),
                    after: Vec::new(),
                })
            }
            Err(e) => {
                error!(source = %source.display(), error = %e, "failed to compile unit");
                report.failed.push(source.to_path_buf());
                None
            }
        }
    }

    fn begin(&self, state: SyncState) -> BatchGuard<'_> {
        let ledger = self.batch.lock();
        *self.state.write() = state;
        BatchGuard {
            state: &self.state,
            ledger,
        }
    }
}

fn compile(compiler: &SchemaCompiler<'_>, source: &Path) -> Result<Option<CompiledUnit>, SyncError> {
    SourceUnit::read(source)
        .map_err(CodegenError::from)
        .and_then(|unit| compiler.compile_unit(&unit))
        .map_err(|e| SyncError::Compile {
            path: source.to_path_buf(),
            source: e,
        })
}

fn log_summary(batch: &str, report: &SyncReport) {
    info!(
        batch,
        generated = report.generated.len(),
        updated = report.updated.len(),
        unchanged = report.unchanged.len(),
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "batch finished"
    );
}
