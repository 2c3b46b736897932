//! `lifeforge install` - the module installation pipeline.
//!
//! A sequential state machine: load archive, validate, extract to staging,
//! confirm, install frontend, install backend. Failure at any state aborts
//! the remaining states; committed states are not rolled back, so a backend
//! failure after the frontend landed leaves a partially-installed module
//! the operator completes by re-running install with the same archive.

use crate::commands::{display_manifest, Outcome};
use crate::config_manager::{Config, ConfigError};
use crate::prompt::{PromptError, Prompter, TerminalPrompter};
use crate::remote::{HttpModuleStore, ModuleStore, RemoteError};
use crate::staging;
use lifeforge_archive::{validate_package, Archive, ArchiveError, PackageError};
use lifeforge_logger as logger;
use lifeforge_manifest::{Manifest, ManifestError, Registered, RouteRegistry, RoutesError};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Routes(#[from] RoutesError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Apps folder not found at {}. Please ensure the frontend path is correct.", .0.display())]
    AppsFolderNotFound(PathBuf),

    #[error("Module folder already exists at {}. Please remove it or choose a different name.", .0.display())]
    ModuleFolderExists(PathBuf),

    #[error("Module frontend not found at {}. Please ensure the module was extracted correctly.", .0.display())]
    StagedFrontendMissing(PathBuf),
}

/// Filesystem roots one installation run works against.
pub struct InstallContext {
    /// Checkout of the host frontend (holds `src/apps` and the registry).
    pub frontend_root: PathBuf,
    /// The staging slot this run extracts into.
    pub staging_dir: PathBuf,
}

/// Entry point for the `install` subcommand: wires the real collaborators
/// from config and runs the pipeline.
pub fn handle_install(archive_path: &Path) -> Result<(), InstallError> {
    let config = Config::load()?;
    let frontend_root = config.require_frontend_path()?;
    let store = HttpModuleStore::new(
        config.require_api_host()?.to_string(),
        config.require_session_token()?,
    );
    let ctx = InstallContext {
        frontend_root,
        staging_dir: staging::staging_dir(),
    };

    match run_install(archive_path, &ctx, &store, &TerminalPrompter)? {
        Outcome::Completed => {
            logger::success("Module installation complete");
        }
        Outcome::Cancelled => {}
    }
    Ok(())
}

/// Run the installation pipeline against explicit collaborators.
pub fn run_install(
    archive_path: &Path,
    ctx: &InstallContext,
    store: &dyn ModuleStore,
    prompter: &dyn Prompter,
) -> Result<Outcome, InstallError> {
    // Selected: load the archive into memory.
    let archive = Archive::from_path(archive_path)?;

    // Validated: nothing is extracted unless the whole contract holds.
    logger::spinner_start("Validating module archive");
    let manifest = match validate_package(&archive) {
        Ok(manifest) => {
            logger::spinner_success("Archive validated");
            manifest
        }
        Err(err) => {
            logger::spinner_error(&err.to_string());
            return Err(err.into());
        }
    };
    logger::debug(&format!("Archive contains module '{}'", manifest.name));

    // Extracted: the staging slot is wiped first, so a failed run never
    // leaves a usable half-state behind.
    logger::spinner_start("Extracting archive");
    let extracted = (|| -> Result<(), InstallError> {
        staging::reset_dir(&ctx.staging_dir)?;
        archive.extract_to(&ctx.staging_dir)?;
        Ok(())
    })();
    match extracted {
        Ok(()) => logger::spinner_success("Archive extracted"),
        Err(err) => {
            logger::spinner_error("Failed to extract archive");
            return Err(err);
        }
    }

    // Confirmed: re-read the manifest from staging and gate on the
    // operator. Declining is a clean cancellation, not an error.
    let manifest = Manifest::load_from_path(&ctx.staging_dir.join("manifest.json"))?;
    display_manifest(&manifest);
    match prompter.confirm("Install this module?", true)? {
        Some(true) => {}
        _ => {
            logger::warn("Operation cancelled");
            return Ok(Outcome::Cancelled);
        }
    }

    // Frontend-installed.
    if install_frontend(ctx, &manifest, prompter)? == Outcome::Cancelled {
        return Ok(Outcome::Cancelled);
    }

    // Backend-installed. The frontend state is already committed; a
    // failure here is terminal for this state only.
    install_backend(ctx, &manifest, store)?;

    Ok(Outcome::Completed)
}

/// Register the module in the route registry and move the staged frontend
/// into the host's apps directory.
///
/// The conflict check runs before the registry mutation so a refused
/// install leaves the registry untouched.
fn install_frontend(
    ctx: &InstallContext,
    manifest: &Manifest,
    prompter: &dyn Prompter,
) -> Result<Outcome, InstallError> {
    let apps_folder = ctx.frontend_root.join("src").join("apps");
    if !apps_folder.is_dir() {
        return Err(InstallError::AppsFolderNotFound(apps_folder));
    }

    let module_folder = apps_folder.join(&manifest.name);
    if module_folder.exists() {
        return Err(InstallError::ModuleFolderExists(module_folder));
    }

    let staged_frontend = ctx.staging_dir.join("frontend");
    if !staged_frontend.is_dir() {
        return Err(InstallError::StagedFrontendMissing(staged_frontend));
    }

    let routes_path = RouteRegistry::locate(&ctx.frontend_root);
    let mut registry = RouteRegistry::load_from_path(&routes_path)?;

    let titles = registry.titles();
    let Some(category) = prompter.select("Select a category for the module", &titles)? else {
        logger::warn("Operation cancelled");
        return Ok(Outcome::Cancelled);
    };

    match registry.register_module(&category, &manifest.name)? {
        Registered::Added => {
            // Persist immediately so memory and disk never diverge for
            // longer than this call.
            registry.save_to_path(&routes_path)?;
            logger::success(&format!("Registered {} under '{}'", manifest.name, category));
        }
        Registered::Already => {
            logger::warn(&format!(
                "Module '{}' is already registered under '{}'",
                manifest.name, category
            ));
        }
    }

    move_dir(&staged_frontend, &module_folder)?;
    logger::success(&format!("Frontend installation complete for {}", manifest.name));
    Ok(Outcome::Completed)
}

/// Re-bundle the staged backend subtree and upload it to the module store.
fn install_backend(
    ctx: &InstallContext,
    manifest: &Manifest,
    store: &dyn ModuleStore,
) -> Result<(), InstallError> {
    let staged_backend = ctx.staging_dir.join("backend");

    logger::spinner_start("Bundling backend files");
    let bundle = match Archive::bundle_dir(&staged_backend).and_then(|a| a.to_bytes()) {
        Ok(bytes) => {
            logger::spinner_success("Backend files bundled");
            bytes
        }
        Err(err) => {
            logger::spinner_error("Failed to bundle backend files");
            return Err(err.into());
        }
    };

    logger::spinner_start("Uploading backend bundle");
    match store.upload_backend_bundle(&manifest.name, bundle) {
        Ok(()) => logger::spinner_success("Backend bundle uploaded"),
        Err(err) => {
            logger::spinner_error("Failed to upload backend bundle");
            return Err(err.into());
        }
    }

    logger::success(&format!("Backend installation complete for {}", manifest.name));
    Ok(())
}

/// Move a directory, consuming the source. Falls back to copy-then-delete
/// when the staging slot and the apps folder sit on different filesystems.
fn move_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_tree(src, dst)?;
            std::fs::remove_dir_all(src)
        }
    }
}

fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
