use super::*;
use crate::pool::PoolSize;
use chrono::TimeZone;
use std::sync::Mutex;

/// Records every invocation; `save` writes an empty archive file.
#[derive(Default)]
struct FakeTool {
    pulls: Mutex<Vec<String>>,
    saves: Mutex<Vec<(PathBuf, Vec<String>)>>,
    fail_pull: Option<String>,
    fail_save_of: Option<PathBuf>,
}

impl FakeTool {
    fn pulls(&self) -> Vec<String> {
        let mut pulls = self.pulls.lock().unwrap().clone();
        pulls.sort();
        pulls
    }

    fn saves(&self) -> Vec<(PathBuf, Vec<String>)> {
        let mut saves = self.saves.lock().unwrap().clone();
        saves.sort();
        saves
    }
}

impl ImageTool for FakeTool {
    fn name(&self) -> &str {
        "docker"
    }

    fn pull(&self, image: &ImageReference) -> Result<()> {
        if self.fail_pull.as_deref() == Some(image.as_str()) {
            return Err(HarbexError::tool_exit(format!("docker pull {}", image), Some(1)));
        }
        self.pulls.lock().unwrap().push(image.to_string());
        Ok(())
    }

    fn save(&self, archive: &Path, images: &[ImageReference]) -> Result<()> {
        if self.fail_save_of.as_deref() == Some(archive) {
            return Err(HarbexError::tool_exit("docker save", Some(1)));
        }
        std::fs::write(archive, b"").unwrap();
        self.saves.lock().unwrap().push((
            archive.to_path_buf(),
            images.iter().map(ToString::to_string).collect(),
        ));
        Ok(())
    }
}

fn images(count: usize) -> Vec<ImageReference> {
    (0..count)
        .map(|i| ImageReference::new("harbor.local", "library", &format!("app{}", i), "1.0"))
        .collect()
}

fn pool(threads: usize) -> WorkerPool {
    WorkerPool::new(PoolSize::Fixed(threads)).unwrap()
}

#[test]
fn test_layout_paths() {
    let started = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let layout = RunLayout::new(DEFAULT_OUTPUT_ROOT, &started);

    assert_eq!(layout.dir(), Path::new("output/20240102030405"));
    assert_eq!(
        layout.archive_path(0),
        Path::new("output/20240102030405/export-0.tar")
    );
    assert_eq!(
        layout.archive_glob(),
        Path::new("output/20240102030405/export-*.tar")
    );
    assert_eq!(
        layout.script_path(),
        Path::new("output/20240102030405/import.sh")
    );
}

#[test]
fn test_run_timestamp_is_zero_padded() {
    let started = Local.with_ymd_and_hms(2023, 9, 1, 0, 0, 7).unwrap();
    assert_eq!(run_timestamp(&started), "20230901000007");
}

#[test]
fn test_ensure_dir_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let layout = RunLayout::in_dir(root.path().join("output/20240101120000"));

    layout.ensure_dir().unwrap();
    layout.ensure_dir().unwrap();

    assert!(layout.dir().is_dir());
}

#[test]
fn test_export_units_batches_in_order() {
    let list = images(32);
    let layout = RunLayout::in_dir("run");
    let units: Vec<_> = export_units(&list, 15, &layout).collect();

    assert_eq!(units.len(), 3);
    assert_eq!(units[0].range, IndexRange::new(0, 15));
    assert_eq!(units[1].range, IndexRange::new(15, 30));
    assert_eq!(units[2].range, IndexRange::new(30, 32));
    assert_eq!(units[2].images, &list[30..]);
    for (n, unit) in units.iter().enumerate() {
        assert_eq!(unit.sequence, n);
        assert_eq!(unit.archive, PathBuf::from(format!("run/export-{}.tar", n)));
    }
}

#[test]
fn test_export_units_empty_list() {
    let layout = RunLayout::in_dir("run");
    assert_eq!(export_units(&[], 15, &layout).count(), 0);
}

#[test]
fn test_pull_images_pulls_each_image_once() {
    let tool = FakeTool::default();
    let list = images(7);

    let report = pull_images(&pool(3), &tool, &list).unwrap();

    assert_eq!(report.completed, 7);
    let mut expected: Vec<_> = list.iter().map(ToString::to_string).collect();
    expected.sort();
    assert_eq!(tool.pulls(), expected);
}

#[test]
fn test_save_images_one_archive_per_batch() {
    let root = tempfile::tempdir().unwrap();
    let layout = RunLayout::in_dir(root.path().join("run"));
    let tool = FakeTool::default();
    let list = images(10);

    let report = save_images(&pool(2), &tool, &list, 4, &layout).unwrap();

    assert_eq!(report.completed, 3);
    let saves = tool.saves();
    assert_eq!(saves.len(), 3);
    assert_eq!(saves[0].0, layout.archive_path(0));
    assert_eq!(saves[0].1.len(), 4);
    assert_eq!(saves[1].1.len(), 4);
    assert_eq!(saves[2].1.len(), 2);
    assert_eq!(saves[2].1[0], list[8].to_string());
    assert!(layout.archive_path(2).is_file());
    assert!(!layout.archive_path(3).exists());
}

#[test]
fn test_exporter_run_writes_archives_and_script() {
    let root = tempfile::tempdir().unwrap();
    let layout = RunLayout::in_dir(root.path().join("run"));
    let exporter = Exporter::new(FakeTool::default(), pool(4), "harbor.local", 15, layout);
    let list = images(32);

    let summary = exporter.run(&list).unwrap();

    assert_eq!(
        summary,
        ExportSummary {
            images: 32,
            pulled: 32,
            archives: 3,
            script: exporter.layout().script_path(),
        }
    );
    let script = std::fs::read_to_string(&summary.script).unwrap();
    assert!(script.contains(
        "docker tag harbor.local/library/app0:1.0 ${target_registry}/library/app0:1.0"
    ));
    assert_eq!(script.matches("docker push ").count(), 32);
}

#[test]
fn test_exporter_run_without_images_still_writes_script() {
    let root = tempfile::tempdir().unwrap();
    let layout = RunLayout::in_dir(root.path().join("run"));
    let exporter = Exporter::new(FakeTool::default(), pool(2), "harbor.local", 15, layout);

    let summary = exporter.run(&[]).unwrap();

    assert_eq!(summary.pulled, 0);
    assert_eq!(summary.archives, 0);
    assert!(summary.script.is_file());
    assert!(exporter.tool.saves().is_empty());
}

#[test]
fn test_exporter_pull_failure_skips_save_stage() {
    let root = tempfile::tempdir().unwrap();
    let layout = RunLayout::in_dir(root.path().join("run"));
    let list = images(5);
    let tool = FakeTool {
        fail_pull: Some(list[2].to_string()),
        ..FakeTool::default()
    };
    let exporter = Exporter::new(tool, pool(1), "harbor.local", 15, layout);

    let result = exporter.run(&list);

    assert!(matches!(result, Err(HarbexError::Tool { .. })));
    assert!(exporter.tool.saves().is_empty());
    assert!(!exporter.layout().dir().exists());
}

#[test]
fn test_exporter_save_failure_skips_script() {
    let root = tempfile::tempdir().unwrap();
    let layout = RunLayout::in_dir(root.path().join("run"));
    let tool = FakeTool {
        fail_save_of: Some(layout.archive_path(1)),
        ..FakeTool::default()
    };
    let exporter = Exporter::new(tool, pool(1), "harbor.local", 2, layout);

    let result = exporter.run(&images(5));

    assert!(result.is_err());
    assert!(!exporter.layout().script_path().exists());
}

#[test]
fn test_exporter_from_config() {
    let config = Config::from_yaml_str(
        r#"
registry: https://harbor.local
projects: []
runtime:
  pool: 1
  exportFile:
    maxImageCount: 0
"#,
    )
    .unwrap();

    let exporter =
        Exporter::from_config(&config, FakeTool::default(), RunLayout::in_dir("run")).unwrap();

    assert_eq!(exporter.pool_threads(), 1);
    assert_eq!(exporter.batch_size(), 15);
    assert_eq!(exporter.registry_host, "harbor.local");
}
