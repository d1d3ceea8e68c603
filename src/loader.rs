//! JSON file loading for the `carematch` binary
//!
//! A collection file is either a bare array of entity records or an object
//! with an optional `config` and an `entities` array. Update logs are JSON
//! lines, one [`UpdateEvent`] per line.

use carematch_core::{Collection, CollectionConfig, EntityRecord, Error, Result, UpdateEvent};
use carematch_ranking::{EmbeddingQuality, ProfileEmbedder, ProfileEncoder, Query};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Deserialize)]
#[serde(untagged)]
enum CollectionFile {
    Records(Vec<EntityRecord>),
    Full {
        #[serde(default)]
        config: CollectionConfig,
        entities: Vec<EntityRecord>,
    },
}

fn read_collection_file(path: &Path, name: Option<&str>) -> Result<(CollectionConfig, Vec<EntityRecord>)> {
    let raw = std::fs::read_to_string(path)?;
    let (mut config, records) = match serde_json::from_str(&raw)? {
        CollectionFile::Records(records) => (CollectionConfig::default(), records),
        CollectionFile::Full { config, entities } => (config, entities),
    };

    if let Some(name) = name {
        config.name = name.to_string();
    }
    if config.name.is_empty() {
        config.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("default")
            .to_string();
    }
    Ok((config, records))
}

/// Load a collection file. `name` overrides the configured name, and
/// `encoder` fills in base vectors for records without one.
pub fn load_collection(path: impl AsRef<Path>, name: Option<&str>, encoder: Option<&ProfileEncoder>) -> Result<Collection> {
    let (config, records) = read_collection_file(path.as_ref(), name)?;

    let records = match encoder {
        Some(encoder) => records
            .into_iter()
            .map(|mut record| -> Result<EntityRecord> {
                if record.embedding.is_none() {
                    debug!(entity = %record.entity.id, "encoding profile");
                    record.embedding = Some(encoder.encode(&record.entity)?.into_inner());
                }
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?,
        None => records,
    };

    Collection::from_records(config, records)
}

/// Load a collection file, embedding the profile text of every record that
/// has no embedding.
///
/// The target dimension is the configured `vector_dim`, else the length of
/// the first supplied embedding, else whatever the first generated vector
/// has. Records that cannot be embedded get the local text fallback.
pub async fn load_collection_embedded(
    path: impl AsRef<Path>,
    name: Option<&str>,
    embedder: &ProfileEmbedder,
) -> Result<Collection> {
    let (config, mut records) = read_collection_file(path.as_ref(), name)?;

    let mut dim = config
        .vector_dim
        .or_else(|| records.iter().find_map(|r| r.embedding.as_ref().map(Vec::len)));
    let mut fallbacks = 0usize;
    for record in records.iter_mut().filter(|r| r.embedding.is_none()) {
        let (vector, quality) = embedder.embed(&record.entity, dim).await;
        if quality == EmbeddingQuality::Fallback {
            fallbacks += 1;
        }
        dim.get_or_insert(vector.dim());
        record.embedding = Some(vector.into_inner());
    }
    if fallbacks > 0 {
        info!(fallbacks, "profiles embedded with the local fallback");
    }

    Collection::from_records(config, records)
}

/// Read a JSON-lines update log. Blank lines are skipped; a malformed line
/// fails the whole read with its line number.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<UpdateEvent>> {
    let raw = std::fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (n, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line).map_err(|e| Error::Serialization(format!("line {}: {}", n + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

pub fn load_query(path: impl AsRef<Path>) -> Result<Query> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

