//! Folder listing and first-run folder setup.

use tracing::{info, warn};

use gardener_core::{DocumentStore, Result, Settings};

/// Sorted list of vault folders, excluding configuration and trash folders.
pub async fn list_folders(store: &dyn DocumentStore) -> Result<Vec<String>> {
    let mut folders = store.list_folders().await?;
    folders.sort();
    folders.dedup();
    Ok(folders)
}

/// Make sure the root folder and its notes folder exist.
///
/// Failures are logged and otherwise ignored; commands that need the folder
/// will report their own error when they try to write into it.
pub async fn ensure_root_folders(store: &dyn DocumentStore, settings: &Settings) {
    let mut targets = Vec::new();
    if !settings.root_folder().is_empty() {
        targets.push(settings.root_folder().to_string());
    }
    targets.push(settings.notes_folder());

    for folder in targets {
        match store.exists(&folder).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                warn!(folder = %folder, error = %e, "Could not check folder");
                continue;
            }
        }
        match store.create_folder(&folder).await {
            Ok(()) => info!(folder = %folder, "Created folder"),
            Err(e) => warn!(folder = %folder, error = %e, "Could not create folder"),
        }
    }
}
