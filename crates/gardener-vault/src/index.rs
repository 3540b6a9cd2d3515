//! Vault metadata reader.
//!
//! Builds a fresh [`VaultFileIndex`] from a [`DocumentStore`]. Never fails: a
//! vault that cannot be listed yields an empty index, and a document that
//! cannot be read is skipped.

use std::time::Instant;
use tracing::{debug, trace, warn};

use gardener_core::{DocumentStore, VaultFileIndex};

/// Scan every markdown document for file names, tags and frontmatter keys.
pub async fn read_vault_index(store: &dyn DocumentStore) -> VaultFileIndex {
    let start = Instant::now();
    let mut index = VaultFileIndex::default();

    let documents = match store.list_documents().await {
        Ok(docs) => docs,
        Err(e) => {
            warn!(
                subsystem = "vault",
                component = "index",
                error = %e,
                "Could not list vault documents, using an empty index"
            );
            return index;
        }
    };

    for doc in &documents {
        index.files.insert(doc.path.clone(), doc.name().to_string());

        match store.metadata(&doc.path).await {
            Ok(meta) => {
                trace!(path = %doc.path, tags = meta.tags.len(), "Indexed document");
                index.tags.extend(meta.tags);
                index.frontmatter_keys.extend(meta.frontmatter.keys().cloned());
            }
            Err(e) => {
                warn!(path = %doc.path, error = %e, "Skipping unreadable document");
            }
        }
    }

    debug!(
        subsystem = "vault",
        component = "index",
        document_count = index.files.len(),
        tag_count = index.tags.len(),
        frontmatter_key_count = index.frontmatter_keys.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Vault index built"
    );
    index
}
