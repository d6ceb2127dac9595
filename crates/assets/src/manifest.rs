//! The final path→fingerprint manifest.

use std::collections::BTreeMap;

use crate::indexer::DeploymentIndex;

/// Mapping from absolute-style logical path to content fingerprint.
///
/// Covers every indexed file, whether or not it was uploaded this run —
/// skipped files already existed remotely. A `BTreeMap` keeps iteration
/// order deterministic regardless of upload ordering.
pub type Manifest = BTreeMap<String, String>;

/// Builds the manifest from a deployment index.
pub fn build_manifest(index: &DeploymentIndex) -> Manifest {
    index
        .iter()
        .map(|(path, record)| (format!("/{path}"), record.fingerprint.clone()))
        .collect()
}
