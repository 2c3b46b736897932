//! `lifeforge package` - the module packaging pipeline.
//!
//! Reads the local frontend module (plus optional assets), fetches the
//! chosen backend bundle from the remote store, and produces one archive
//! that satisfies the installer's own format contract. Everything up to
//! the final write is confirmation-gated and side-effect free.

use crate::commands::{display_manifest, display_row, Outcome};
use crate::config_manager::{Config, ConfigError};
use crate::prompt::{choose_icon, PromptError, Prompter, TerminalPrompter};
use crate::remote::{HttpModuleStore, ModuleStore, RemoteError};
use lifeforge_archive::{Archive, ArchiveError};
use lifeforge_logger as logger;
use lifeforge_manifest::{Manifest, ManifestError, RouteRegistry, RoutesError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackagingError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

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

    #[error("Module folder not found at {}. Please ensure the module exists in the apps directory.", .0.display())]
    ModuleNotFound(PathBuf),

    #[error("The remote store returned no installable backend module paths")]
    NoBackendPaths,
}

/// Filesystem roots one packaging run works against.
pub struct PackageContext {
    /// Checkout of the host frontend.
    pub frontend_root: PathBuf,
    /// Directory the finished archive is written into.
    pub out_dir: PathBuf,
}

/// Entry point for the `package` subcommand.
pub fn handle_package(module: Option<String>, out: Option<PathBuf>) -> Result<(), PackagingError> {
    let config = Config::load()?;
    let frontend_root = config.require_frontend_path()?;
    let store = HttpModuleStore::new(
        config.require_api_host()?.to_string(),
        config.require_session_token()?,
    );
    let out_dir = match out {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let ctx = PackageContext {
        frontend_root,
        out_dir,
    };

    match run_package(module, &ctx, &store, &TerminalPrompter)? {
        Outcome::Completed => {
            logger::success("Module packaging complete");
        }
        Outcome::Cancelled => {}
    }
    Ok(())
}

/// Run the packaging pipeline against explicit collaborators.
pub fn run_package(
    module: Option<String>,
    ctx: &PackageContext,
    store: &dyn ModuleStore,
    prompter: &dyn Prompter,
) -> Result<Outcome, PackagingError> {
    // Resolve the frontend module folder, by name or by selection from
    // the registry's own module references.
    let registry = RouteRegistry::load_from_path(&RouteRegistry::locate(&ctx.frontend_root))?;
    let module_name = match module {
        Some(name) => name,
        None => {
            let names = registry.module_names();
            let Some(name) = prompter.select("Select the module to package", &names)? else {
                logger::warn("Operation cancelled");
                return Ok(Outcome::Cancelled);
            };
            name
        }
    };

    let module_path = ctx
        .frontend_root
        .join("src")
        .join("apps")
        .join(&module_name);
    if !module_path.is_dir() {
        return Err(PackagingError::ModuleNotFound(module_path));
    }

    let assets_path = ctx
        .frontend_root
        .join("public")
        .join("assets")
        .join("apps")
        .join(&module_name);
    let assets_path = assets_path.is_dir().then_some(assets_path);
    if let Some(path) = &assets_path {
        logger::info(&format!("Assets folder found: {}", path.display()));
    }

    // Resolve the backend module identifier from the remote store.
    logger::spinner_start("Fetching backend module paths");
    let backend_paths = match store.list_module_paths() {
        Ok(paths) => {
            logger::spinner_success("Backend module paths fetched");
            paths
        }
        Err(err) => {
            logger::spinner_error(&err.to_string());
            return Err(err.into());
        }
    };
    if backend_paths.is_empty() {
        return Err(PackagingError::NoBackendPaths);
    }
    let Some(backend_path) = prompter.select("Select the backend module path", &backend_paths)?
    else {
        logger::warn("Operation cancelled");
        return Ok(Outcome::Cancelled);
    };

    // Confirm every resolved path before anything irreversible happens.
    eprintln!();
    display_row("Frontend module path", &module_path.display().to_string());
    display_row(
        "Frontend assets path",
        &assets_path
            .as_ref()
            .map_or_else(|| "None".to_string(), |p| p.display().to_string()),
    );
    display_row("Backend module path", &backend_path);
    display_row("Target save path", &ctx.out_dir.display().to_string());
    eprintln!();
    match prompter.confirm("Package the module with these paths?", true)? {
        Some(true) => {}
        _ => {
            logger::warn("Operation cancelled");
            return Ok(Outcome::Cancelled);
        }
    }

    // Build and confirm the manifest.
    let manifest = build_manifest(&module_name, prompter)?;
    display_manifest(&manifest);
    match prompter.confirm("Proceed with this manifest?", true)? {
        Some(true) => {}
        _ => {
            logger::warn("Operation cancelled");
            return Ok(Outcome::Cancelled);
        }
    }

    // Bundle frontend, assets and manifest, then graft the remote backend
    // bundle under backend/.
    let mut archive = Archive::new();

    let frontend = Archive::bundle_dir(&module_path)?;
    archive.merge_under("frontend/", &frontend);
    logger::success("Frontend files packaged");

    archive.insert_dir("assets");
    if let Some(path) = &assets_path {
        let assets = Archive::bundle_dir(path)?;
        archive.merge_under("assets/", &assets);
        logger::success("Frontend assets packaged");
    }

    logger::spinner_start("Fetching backend files");
    let backend = match store
        .fetch_backend_bundle(&backend_path)
        .map_err(PackagingError::from)
        .and_then(|bytes| Ok(Archive::from_bytes(&bytes)?))
    {
        Ok(backend) => {
            logger::spinner_success("Backend files fetched");
            backend
        }
        Err(err) => {
            logger::spinner_error(&err.to_string());
            return Err(err);
        }
    };
    archive.merge_under("backend/", &backend);
    logger::success("Backend files packaged");

    archive.insert_file("manifest.json", manifest.to_json_pretty().into_bytes());
    archive.insert_file("README.md", readme_stub(&manifest).into_bytes());
    archive.insert_file("LICENSE", license_stub(&manifest).into_bytes());
    logger::success("Manifest packaged");

    // Compress first, write only the finished buffer: nothing lands in
    // the destination on a compression failure.
    logger::spinner_start("Compressing archive");
    let bytes = match archive.to_bytes() {
        Ok(bytes) => {
            logger::spinner_success("Archive compressed");
            bytes
        }
        Err(err) => {
            logger::spinner_error("Failed to compress archive");
            return Err(err.into());
        }
    };

    let target = ctx
        .out_dir
        .join(format!("[Lifeforge Module] {}.tar.gz", manifest.name));
    std::fs::write(&target, bytes)?;
    logger::success(&format!("Archive saved to: {}", target.display()));

    Ok(Outcome::Completed)
}

/// Assemble the manifest from the resolved module name and operator input,
/// then validate it against the same schema the installer enforces so a
/// package we produce is always one we can install.
fn build_manifest(module_name: &str, prompter: &dyn Prompter) -> Result<Manifest, PackagingError> {
    let author_default = std::env::var("USER").unwrap_or_else(|_| "anonymous".to_string());
    let author = prompter.input("Module author", Some(&author_default))?;

    let description_default = format!("Module created by {}", author);
    let description = prompter.input("Module description", Some(&description_default))?;

    let version = prompter.input("Module version", Some("1.0.0"))?;
    let icon = choose_icon(prompter)?;

    let manifest = Manifest {
        name: module_name.to_string(),
        icon,
        version,
        description,
        author,
    };

    let raw = serde_json::to_value(&manifest).map_err(|_| ManifestError::Invalid)?;
    Ok(Manifest::validate(&raw)?)
}

fn readme_stub(manifest: &Manifest) -> String {
    format!(
        "# {}\n\n{}\n\nPackaged with the Lifeforge CLI.\n",
        manifest.name, manifest.description
    )
}

fn license_stub(manifest: &Manifest) -> String {
    format!(
        "Copyright (c) {}\n\nAll rights reserved. Replace this file with the license your module ships under.\n",
        manifest.author
    )
}
