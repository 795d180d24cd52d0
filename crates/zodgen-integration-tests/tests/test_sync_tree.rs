//! # Sync Tree Scenarios
//!
//! Runs the coordinator over a copy of the fixture tree laid out like a
//! real project (`app/zodgen/...` mapped to
//! `app/javascript/__generated__/zodgen/...`).

use std::path::{Path, PathBuf};

use zodgen_core::Config;
use zodgen_sync::{find_files, ChangeBatch, FrontEnd, PollWatcher, SyncCoordinator};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    /// Fixtures split across two subdirectories of the watch root.
    fn with_fixtures() -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        for path in find_files(&fixtures().join("ruby"), "rb") {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let sub = if name.contains("enum") { "enums" } else { "records" };
            project.write_source(&format!("{sub}/{name}"), &std::fs::read_to_string(&path).unwrap());
        }
        project
    }

    fn config(&self) -> Config {
        Config {
            watch_root: self.dir.path().join("app/zodgen"),
            output_root: self.dir.path().join("app/javascript/__generated__/zodgen"),
            ..Config::default()
        }
    }

    fn write_source(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join("app/zodgen").join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, text).unwrap();
        path
    }

    fn output(&self, relative: &str) -> PathBuf {
        self.dir
            .path()
            .join("app/javascript/__generated__/zodgen")
            .join(relative)
    }

    fn outputs(&self) -> Vec<PathBuf> {
        find_files(&self.output(""), "ts")
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Sweep
// ---------------------------------------------------------------------------

#[test]
fn sweep_generates_every_fixture_output() {
    let project = Project::with_fixtures();
    let report = SyncCoordinator::new(project.config(), FrontEnd::Static).sweep();

    assert!(report.is_clean(), "failures: {:?}", report.failed);
    assert_eq!(report.generated.len(), 13);
    assert_eq!(
        read(&project.output("records/payload.ts")),
        read(&fixtures().join("expected/payload.ts"))
    );
    assert_eq!(
        read(&project.output("enums/multiple_enums.ts")),
        read(&fixtures().join("expected/multiple_enums.ts"))
    );
}

#[test]
fn sweep_scenario_removes_stale_outputs_only() {
    let project = Project {
        dir: tempfile::tempdir().unwrap(),
    };
    project.write_source("p.rb", "class P < T::Struct\n  const :a, String\nend\n");
    project.write_source("q.rb", "class Q < T::Enum\n  enums do\n    X = new\n  end\nend\n");
    let stale = project.output("r.ts");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "export const RSchema = z.object({});\n").unwrap();

    let report = SyncCoordinator::new(project.config(), FrontEnd::Static).sweep();

    assert_eq!(project.outputs(), vec![project.output("p.ts"), project.output("q.ts")]);
    assert_eq!(report.deleted, vec![stale]);
}

#[test]
fn repeated_sweeps_write_nothing() {
    let project = Project::with_fixtures();
    let coordinator = SyncCoordinator::new(project.config(), FrontEnd::Static);
    coordinator.sweep();

    let report = coordinator.sweep();
    assert!(report.generated.is_empty());
    assert!(report.updated.is_empty());
    assert!(report.deleted.is_empty());
    assert_eq!(report.unchanged.len(), 13);
}

// ---------------------------------------------------------------------------
// 2. Watch and react
// ---------------------------------------------------------------------------

#[test]
fn watcher_batches_drive_reactions() {
    let project = Project::with_fixtures();
    let config = project.config();
    let coordinator = SyncCoordinator::new(config.clone(), FrontEnd::Static);
    coordinator.sweep();
    let mut watcher = PollWatcher::new(&config.watch_root, &config.source_extension);

    let simple_enum = config.watch_root.join("enums/simple_enum.rb");
    std::fs::write(
        &simple_enum,
        "class SimpleEnum < T::Enum\n  enums do\n    RED = new\n    GREEN = new\n    BLUE = new\n    CYAN = new\n  end\nend\n",
    )
    .unwrap();
    std::fs::remove_file(config.watch_root.join("records/app.rb")).unwrap();
    project.write_source(
        "records/extra/widget.rb",
        "class Widget < T::Struct\n  prop :payload, Payload\nend\n",
    );

    let changes = watcher.poll();
    assert_eq!(changes.len(), 3);
    let report = coordinator.react(&changes);

    assert!(report.is_clean());
    assert_eq!(report.deleted, vec![project.output("records/app.ts")]);
    assert_eq!(report.updated, vec![project.output("enums/simple_enum.ts")]);
    assert!(read(&project.output("enums/simple_enum.ts")).contains("'BLUE', 'CYAN'"));

    let widget = read(&project.output("records/extra/widget.ts"));
    let order: Vec<usize> = [
        "export const PayloadResultResultTypeEnum",
        "export const PayloadResultSchema",
        "export const PayloadSchema",
        "export const WidgetSchema",
    ]
    .iter()
    .map(|needle| widget.find(needle).unwrap())
    .collect();
    assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn failed_edit_keeps_last_good_output() {
    let project = Project::with_fixtures();
    let coordinator = SyncCoordinator::new(project.config(), FrontEnd::Static);
    coordinator.sweep();
    let before = read(&project.output("records/union_types.ts"));

    let source = project.write_source("records/union_types.rb", "class UnionTypes < T::Struct\n");
    let report = coordinator.react(&ChangeBatch {
        modified: vec![source.clone()],
        ..ChangeBatch::default()
    });

    assert_eq!(report.failed, vec![source]);
    assert_eq!(read(&project.output("records/union_types.ts")), before);
}

#[test]
fn batches_from_several_threads_are_serialized() {
    let project = Project::with_fixtures();
    let coordinator = std::sync::Arc::new(SyncCoordinator::new(project.config(), FrontEnd::Static));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = std::sync::Arc::clone(&coordinator);
            std::thread::spawn(move || coordinator.sweep())
        })
        .collect();
    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let generated: usize = reports.iter().map(|r| r.generated.len()).sum();
    assert_eq!(generated, 13);
    assert!(reports.iter().all(|r| r.is_clean()));
    assert_eq!(project.outputs().len(), 13);
}
