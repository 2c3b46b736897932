//! End-to-end pipeline scenarios driven through stub collaborators.
//!
//! These exercise the installation and packaging pipelines against real
//! temporary filesystem trees, with the remote store and the prompt layer
//! replaced by scripted stand-ins.

use lifeforge::commands::install::{run_install, InstallContext, InstallError};
use lifeforge::commands::package::{run_package, PackageContext, PackagingError};
use lifeforge::commands::Outcome;
use lifeforge::prompt::{PromptError, Prompter};
use lifeforge::remote::{ModuleStore, RemoteError};
use lifeforge_archive::{validate_package, Archive};
use lifeforge_manifest::{RouteCategory, RouteRegistry};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

/// Scripted prompt layer: queued answers, sensible fallbacks (first item,
/// default value, confirm) when the queue runs dry.
#[derive(Default)]
struct ScriptedPrompter {
    confirms: Mutex<VecDeque<bool>>,
    selections: Mutex<VecDeque<String>>,
    inputs: Mutex<VecDeque<String>>,
}

impl ScriptedPrompter {
    fn new() -> Self {
        Self::default()
    }

    fn with_confirm(self, answer: bool) -> Self {
        self.confirms.lock().unwrap().push_back(answer);
        self
    }

    fn with_selection(self, item: &str) -> Self {
        self.selections.lock().unwrap().push_back(item.to_string());
        self
    }

    fn with_input(self, value: &str) -> Self {
        self.inputs.lock().unwrap().push_back(value.to_string());
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, _prompt: &str, _default: bool) -> Result<Option<bool>, PromptError> {
        Ok(Some(self.confirms.lock().unwrap().pop_front().unwrap_or(true)))
    }

    fn select(&self, _prompt: &str, items: &[String]) -> Result<Option<String>, PromptError> {
        match self.selections.lock().unwrap().pop_front() {
            Some(wanted) => Ok(items.iter().find(|item| **item == wanted).cloned()),
            None => Ok(items.first().cloned()),
        }
    }

    fn input(&self, _prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
        Ok(self
            .inputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| default.unwrap_or_default().to_string()))
    }
}

/// Prompt layer that cancels at every selection gate.
struct CancellingPrompter;

impl Prompter for CancellingPrompter {
    fn confirm(&self, _prompt: &str, _default: bool) -> Result<Option<bool>, PromptError> {
        Ok(None)
    }

    fn select(&self, _prompt: &str, _items: &[String]) -> Result<Option<String>, PromptError> {
        Ok(None)
    }

    fn input(&self, _prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
        Ok(default.unwrap_or_default().to_string())
    }
}

/// In-memory module store.
#[derive(Default)]
struct StubStore {
    paths: Vec<String>,
    backend_bundle: Vec<u8>,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    fail_upload: Option<String>,
}

impl ModuleStore for StubStore {
    fn list_module_paths(&self) -> Result<Vec<String>, RemoteError> {
        Ok(self.paths.clone())
    }

    fn fetch_backend_bundle(&self, _module_path: &str) -> Result<Vec<u8>, RemoteError> {
        Ok(self.backend_bundle.clone())
    }

    fn upload_backend_bundle(&self, module_name: &str, bundle: Vec<u8>) -> Result<(), RemoteError> {
        if let Some(message) = &self.fail_upload {
            return Err(RemoteError::Api(message.clone()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((module_name.to_string(), bundle));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn write_frontend_tree(root: &Path, items: Vec<String>) {
    std::fs::create_dir_all(root.join("src/apps")).unwrap();
    let registry = RouteRegistry {
        categories: vec![RouteCategory {
            title: "Utilities".into(),
            items,
        }],
    };
    registry.save_to_path(&RouteRegistry::locate(root)).unwrap();
}

fn sample_manifest_json(name: &str) -> String {
    format!(
        r#"{{"name":"{name}","icon":"mdi:tool","version":"1.0.0","description":"d","author":"a"}}"#
    )
}

fn sample_archive(name: &str) -> Archive {
    let mut archive = Archive::new();
    archive.insert_file("README.md", b"# module".to_vec());
    archive.insert_file("LICENSE", b"MIT".to_vec());
    archive.insert_file("manifest.json", sample_manifest_json(name).into_bytes());
    archive.insert_dir("frontend");
    archive.insert_file("frontend/index.tsx", b"export {}".to_vec());
    archive.insert_dir("backend");
    archive.insert_file("backend/index.ts", b"serve()".to_vec());
    archive.insert_dir("assets");
    archive
}

fn write_archive_file(dir: &Path, archive: &Archive) -> PathBuf {
    let path = dir.join("module.tar.gz");
    std::fs::write(&path, archive.to_bytes().unwrap()).unwrap();
    path
}

fn install_ctx(tmp: &Path, frontend_root: &Path) -> InstallContext {
    InstallContext {
        frontend_root: frontend_root.to_path_buf(),
        staging_dir: tmp.join("staging"),
    }
}

// ---------------------------------------------------------------------------
// Installation scenarios
// ---------------------------------------------------------------------------

#[test]
fn install_completes_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec![]);

    let archive_path = write_archive_file(tmp.path(), &sample_archive("MyTool"));
    let ctx = install_ctx(tmp.path(), &frontend);
    let store = StubStore::default();
    let prompter = ScriptedPrompter::new().with_selection("Utilities");

    let outcome = run_install(&archive_path, &ctx, &store, &prompter).unwrap();
    assert_eq!(outcome, Outcome::Completed);

    // Frontend moved into the apps directory under the manifest name.
    assert!(frontend.join("src/apps/MyTool/index.tsx").is_file());
    // The move consumed the staged frontend subtree.
    assert!(!ctx.staging_dir.join("frontend").exists());

    // Registry gained the module reference under the chosen category.
    let registry = RouteRegistry::load_from_path(&RouteRegistry::locate(&frontend)).unwrap();
    assert_eq!(registry.categories[0].items, vec!["@apps/MyTool"]);

    // Backend was re-bundled and uploaded under the manifest name.
    let uploads = store.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "MyTool");
    let uploaded = Archive::from_bytes(&uploads[0].1).unwrap();
    assert_eq!(uploaded.file("index.ts").unwrap(), b"serve()");
}

#[test]
fn install_refuses_existing_module_folder() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec![]);
    std::fs::create_dir_all(frontend.join("src/apps/MyTool")).unwrap();

    let archive_path = write_archive_file(tmp.path(), &sample_archive("MyTool"));
    let ctx = install_ctx(tmp.path(), &frontend);
    let store = StubStore::default();
    let prompter = ScriptedPrompter::new().with_selection("Utilities");

    let err = run_install(&archive_path, &ctx, &store, &prompter).unwrap_err();
    assert!(matches!(err, InstallError::ModuleFolderExists(_)));
    assert!(err.to_string().contains("MyTool"));

    // Registry unchanged and nothing uploaded.
    let registry = RouteRegistry::load_from_path(&RouteRegistry::locate(&frontend)).unwrap();
    assert!(registry.categories[0].items.is_empty());
    assert!(store.uploads.lock().unwrap().is_empty());
}

#[test]
fn install_rejects_invalid_manifest_before_extraction() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec![]);

    // Lowercase first letter: schema validation must fail.
    let archive_path = write_archive_file(tmp.path(), &sample_archive("myTool"));
    let ctx = install_ctx(tmp.path(), &frontend);
    let store = StubStore::default();
    let prompter = ScriptedPrompter::new();

    let err = run_install(&archive_path, &ctx, &store, &prompter).unwrap_err();
    assert!(err.to_string().contains("myTool"));

    // Validation failed before extraction: the staging slot was never
    // populated.
    assert!(!ctx.staging_dir.exists());
}

#[test]
fn install_decline_is_clean_cancellation() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec![]);

    let archive_path = write_archive_file(tmp.path(), &sample_archive("MyTool"));
    let ctx = install_ctx(tmp.path(), &frontend);
    let store = StubStore::default();
    let prompter = ScriptedPrompter::new().with_confirm(false);

    let outcome = run_install(&archive_path, &ctx, &store, &prompter).unwrap();
    assert_eq!(outcome, Outcome::Cancelled);

    assert!(!frontend.join("src/apps/MyTool").exists());
    assert!(store.uploads.lock().unwrap().is_empty());
}

#[test]
fn install_registration_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec!["@apps/MyTool".into()]);

    let archive_path = write_archive_file(tmp.path(), &sample_archive("MyTool"));
    let ctx = install_ctx(tmp.path(), &frontend);
    let store = StubStore::default();
    let prompter = ScriptedPrompter::new().with_selection("Utilities");

    let outcome = run_install(&archive_path, &ctx, &store, &prompter).unwrap();
    assert_eq!(outcome, Outcome::Completed);

    // Still exactly one reference: re-registration is a warning no-op.
    let registry = RouteRegistry::load_from_path(&RouteRegistry::locate(&frontend)).unwrap();
    assert_eq!(registry.categories[0].items, vec!["@apps/MyTool"]);
}

#[test]
fn install_upload_failure_keeps_frontend_committed() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec![]);

    let archive_path = write_archive_file(tmp.path(), &sample_archive("MyTool"));
    let ctx = install_ctx(tmp.path(), &frontend);
    let store = StubStore {
        fail_upload: Some("disk quota exceeded".into()),
        ..StubStore::default()
    };
    let prompter = ScriptedPrompter::new().with_selection("Utilities");

    let err = run_install(&archive_path, &ctx, &store, &prompter).unwrap_err();
    // The remote-supplied message is surfaced verbatim.
    assert_eq!(err.to_string(), "disk quota exceeded");

    // The frontend state is not rolled back.
    assert!(frontend.join("src/apps/MyTool/index.tsx").is_file());
    let registry = RouteRegistry::load_from_path(&RouteRegistry::locate(&frontend)).unwrap();
    assert_eq!(registry.categories[0].items, vec!["@apps/MyTool"]);
}

#[test]
fn install_wipes_stale_staging_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec![]);

    let ctx = install_ctx(tmp.path(), &frontend);
    std::fs::create_dir_all(&ctx.staging_dir).unwrap();
    std::fs::write(ctx.staging_dir.join("stale.txt"), b"old run").unwrap();

    let archive_path = write_archive_file(tmp.path(), &sample_archive("MyTool"));
    let store = StubStore::default();
    let prompter = ScriptedPrompter::new().with_selection("Utilities");

    run_install(&archive_path, &ctx, &store, &prompter).unwrap();
    assert!(!ctx.staging_dir.join("stale.txt").exists());
}

// ---------------------------------------------------------------------------
// Packaging scenarios
// ---------------------------------------------------------------------------

fn write_module_sources(frontend: &Path, name: &str) {
    let module_dir = frontend.join("src/apps").join(name);
    std::fs::create_dir_all(module_dir.join("components")).unwrap();
    std::fs::write(module_dir.join("index.tsx"), b"export {}").unwrap();
    std::fs::write(module_dir.join("components/App.tsx"), b"<App/>").unwrap();
}

fn backend_bundle_bytes() -> Vec<u8> {
    let mut archive = Archive::new();
    archive.insert_file("index.ts", b"serve()".to_vec());
    archive.to_bytes().unwrap()
}

#[test]
fn package_produces_installable_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec!["@apps/MyTool".into()]);
    write_module_sources(&frontend, "MyTool");

    let out_dir = tmp.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let ctx = PackageContext {
        frontend_root: frontend,
        out_dir: out_dir.clone(),
    };
    let store = StubStore {
        paths: vec!["modules/tools".into()],
        backend_bundle: backend_bundle_bytes(),
        ..StubStore::default()
    };
    let prompter = ScriptedPrompter::new()
        .with_selection("modules/tools")
        .with_input("a") // author
        .with_input("d") // description
        .with_input("1.2.3") // version
        .with_input("mdi:tool"); // icon

    let outcome = run_package(Some("MyTool".into()), &ctx, &store, &prompter).unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let target = out_dir.join("[Lifeforge Module] MyTool.tar.gz");
    let archive = Archive::from_path(&target).unwrap();

    // The produced archive passes the installer's own validator.
    let manifest = validate_package(&archive).unwrap();
    assert_eq!(manifest.name, "MyTool");
    assert_eq!(manifest.version, "1.2.3");

    // Frontend, backend and assets all landed where the format wants them.
    assert_eq!(archive.file("frontend/index.tsx").unwrap(), b"export {}");
    assert!(archive.entry_names().any(|n| n == "frontend/components/"));
    assert_eq!(archive.file("backend/index.ts").unwrap(), b"serve()");
    assert!(archive.entry_names().any(|n| n == "assets/"));
}

#[test]
fn package_includes_assets_when_present() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec!["@apps/MyTool".into()]);
    write_module_sources(&frontend, "MyTool");

    let assets_dir = frontend.join("public/assets/apps/MyTool");
    std::fs::create_dir_all(&assets_dir).unwrap();
    std::fs::write(assets_dir.join("logo.svg"), b"<svg/>").unwrap();

    let out_dir = tmp.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let ctx = PackageContext {
        frontend_root: frontend,
        out_dir: out_dir.clone(),
    };
    let store = StubStore {
        paths: vec!["modules/tools".into()],
        backend_bundle: backend_bundle_bytes(),
        ..StubStore::default()
    };
    let prompter = ScriptedPrompter::new()
        .with_selection("modules/tools")
        .with_input("a")
        .with_input("d")
        .with_input("1.0.0")
        .with_input("mdi:tool");

    run_package(Some("MyTool".into()), &ctx, &store, &prompter).unwrap();

    let archive = Archive::from_path(&out_dir.join("[Lifeforge Module] MyTool.tar.gz")).unwrap();
    assert_eq!(archive.file("assets/logo.svg").unwrap(), b"<svg/>");
}

#[test]
fn package_selects_module_from_registry_when_omitted() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec!["@apps/MyTool".into()]);
    write_module_sources(&frontend, "MyTool");

    let out_dir = tmp.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let ctx = PackageContext {
        frontend_root: frontend,
        out_dir: out_dir.clone(),
    };
    let store = StubStore {
        paths: vec!["modules/tools".into()],
        backend_bundle: backend_bundle_bytes(),
        ..StubStore::default()
    };
    let prompter = ScriptedPrompter::new()
        .with_selection("MyTool")
        .with_selection("modules/tools")
        .with_input("a")
        .with_input("d")
        .with_input("1.0.0")
        .with_input("mdi:tool");

    let outcome = run_package(None, &ctx, &store, &prompter).unwrap();
    assert_eq!(outcome, Outcome::Completed);
    assert!(out_dir.join("[Lifeforge Module] MyTool.tar.gz").is_file());
}

#[test]
fn package_unknown_module_reports_resolved_path() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec![]);

    let ctx = PackageContext {
        frontend_root: frontend,
        out_dir: tmp.path().to_path_buf(),
    };
    let store = StubStore::default();
    let prompter = ScriptedPrompter::new();

    let err = run_package(Some("Ghost".into()), &ctx, &store, &prompter).unwrap_err();
    assert!(matches!(err, PackagingError::ModuleNotFound(_)));
    assert!(err.to_string().contains("Ghost"));
}

#[test]
fn package_cancel_leaves_no_output() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec!["@apps/MyTool".into()]);
    write_module_sources(&frontend, "MyTool");

    let out_dir = tmp.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let ctx = PackageContext {
        frontend_root: frontend,
        out_dir: out_dir.clone(),
    };
    let store = StubStore {
        paths: vec!["modules/tools".into()],
        backend_bundle: backend_bundle_bytes(),
        ..StubStore::default()
    };

    let outcome = run_package(
        Some("MyTool".into()),
        &ctx,
        &store,
        &CancellingPrompter,
    )
    .unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
    assert!(std::fs::read_dir(&out_dir).unwrap().next().is_none());
}

#[test]
fn package_empty_backend_listing_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let frontend = tmp.path().join("frontend");
    write_frontend_tree(&frontend, vec!["@apps/MyTool".into()]);
    write_module_sources(&frontend, "MyTool");

    let ctx = PackageContext {
        frontend_root: frontend,
        out_dir: tmp.path().to_path_buf(),
    };
    let store = StubStore::default();
    let prompter = ScriptedPrompter::new();

    let err = run_package(Some("MyTool".into()), &ctx, &store, &prompter).unwrap_err();
    assert!(matches!(err, PackagingError::NoBackendPaths));
}
