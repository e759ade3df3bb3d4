//! Startup seeding of the in-memory repositories from a JSON file.
//!
//! The file is an object keyed by collection name, each holding an array of
//! documents:
//!
//! ```json
//! { "projects": [{ "id": "p1", "name": "shop", "gitRepository": "..." }] }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use super::Repositories;

/// Load documents from `path` into `repos`. Returns the number of documents inserted.
pub fn seed_from_file(repos: &Repositories, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Seed file {} is not valid JSON", path.display()))?;

    let count = seed_from_value(repos, parsed)?;
    info!("Seeded {} documents from {}", count, path.display());
    Ok(count)
}

pub fn seed_from_value(repos: &Repositories, seed: Value) -> Result<usize> {
    let Value::Object(collections) = seed else {
        bail!("Seed data must be an object keyed by collection name");
    };

    let mut count = 0;
    for (name, documents) in collections {
        let repo = repos
            .by_name(&name)
            .with_context(|| format!("Unknown collection in seed data: {}", name))?;
        let Value::Array(documents) = documents else {
            bail!("Seed collection {} must be an array", name);
        };
        for document in documents {
            repo.insert(document)
                .with_context(|| format!("Invalid seed document in {}", name))?;
            count += 1;
        }
        debug!(collection = %name, total = repo.len(), "Seeded collection");
    }
    Ok(count)
}
