//! On-disk bundle holding a fitted engine.
//!
//! A bundle is a tar archive with one entry per part of the fitted state:
//!
//! | entry            | contents                         | encoding      |
//! |------------------|----------------------------------|---------------|
//! | `manifest`       | [`BundleManifest`]               | JSON          |
//! | `catalog`        | catalog names, in order          | bincode+zstd  |
//! | `analyzer`       | text pipeline operators          | JSON+zstd     |
//! | `vectorizer`     | vocabulary and IDF table         | bincode+zstd  |
//! | `corpus_vectors` | one sparse vector per name       | bincode+zstd  |
//! | `neighbor_index` | the neighbor index               | bincode+zstd  |
//!
//! Entry order inside the archive is irrelevant. The manifest carries the
//! engine config and a SHA-256 digest per entry; restore rejects the bundle
//! if any entry is missing, fails its digest, or disagrees with the others.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::time::Instant;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use zstd::{decode_all, encode_all};

use crate::catalog::Catalog;
use crate::config::MatcherConfig;
use crate::engine::MatchEngine;
use crate::types::MatchError;

/// Bump this value whenever an entry layout changes.
pub const BUNDLE_SCHEMA_VERSION: u16 = 1;

pub const MANIFEST_ENTRY: &str = "manifest";
pub const CATALOG_ENTRY: &str = "catalog";
pub const ANALYZER_ENTRY: &str = "analyzer";
pub const VECTORIZER_ENTRY: &str = "vectorizer";
pub const CORPUS_VECTORS_ENTRY: &str = "corpus_vectors";
pub const NEIGHBOR_INDEX_ENTRY: &str = "neighbor_index";

const ZSTD_LEVEL: i32 = 3;

/// How an entry body is encoded.
///
/// The analyzer is stored as JSON because its operators use a tagged
/// representation that bincode cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryEncoding {
    BincodeZstd,
    JsonZstd,
}

impl EntryEncoding {
    fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>, MatchError> {
        let raw = match self {
            EntryEncoding::BincodeZstd => {
                encode_to_vec(value, standard()).map_err(|e| MatchError::Encode(e.to_string()))?
            }
            EntryEncoding::JsonZstd => {
                serde_json::to_vec(value).map_err(|e| MatchError::Encode(e.to_string()))?
            }
        };
        encode_all(raw.as_slice(), ZSTD_LEVEL).map_err(|e| MatchError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T, String> {
        let raw = decode_all(body).map_err(|e| format!("zstd: {e}"))?;
        match self {
            EntryEncoding::BincodeZstd => {
                let (value, read) =
                    decode_from_slice(&raw, standard()).map_err(|e| e.to_string())?;
                if read != raw.len() {
                    return Err(format!("{} trailing bytes", raw.len() - read));
                }
                Ok(value)
            }
            EntryEncoding::JsonZstd => serde_json::from_slice(&raw).map_err(|e| e.to_string()),
        }
    }
}

/// Header record of one stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub name: String,
    pub encoding: EntryEncoding,
    /// Stored body size in bytes.
    pub size: u64,
    /// Hex SHA-256 of the stored body.
    pub sha256: String,
}

/// Table of contents of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub schema_version: u16,
    pub config: MatcherConfig,
    pub catalog_len: usize,
    pub vocabulary_len: usize,
    /// Hex SHA-256 of the catalog source file, when fitted from one.
    #[serde(default)]
    pub source_sha256: Option<String>,
    pub entries: Vec<EntryInfo>,
}

impl BundleManifest {
    pub fn entry(&self, name: &str) -> Option<&EntryInfo> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Write `engine` as a bundle at `path`.
///
/// The archive is assembled in a temporary file next to `path` and renamed
/// over it, so readers never observe a half-written bundle.
pub fn write_bundle(engine: &MatchEngine, path: &Path) -> Result<(), MatchError> {
    let start = Instant::now();

    let entries = [
        (
            CATALOG_ENTRY,
            EntryEncoding::BincodeZstd,
            EntryEncoding::BincodeZstd.encode(engine.catalog())?,
        ),
        (
            ANALYZER_ENTRY,
            EntryEncoding::JsonZstd,
            EntryEncoding::JsonZstd.encode(engine.analyzer())?,
        ),
        (
            VECTORIZER_ENTRY,
            EntryEncoding::BincodeZstd,
            EntryEncoding::BincodeZstd.encode(engine.model())?,
        ),
        (
            CORPUS_VECTORS_ENTRY,
            EntryEncoding::BincodeZstd,
            EntryEncoding::BincodeZstd.encode(engine.corpus_vectors())?,
        ),
        (
            NEIGHBOR_INDEX_ENTRY,
            EntryEncoding::BincodeZstd,
            EntryEncoding::BincodeZstd.encode(engine.index())?,
        ),
    ];

    let manifest = BundleManifest {
        schema_version: BUNDLE_SCHEMA_VERSION,
        config: engine.config().clone(),
        catalog_len: engine.catalog().len(),
        vocabulary_len: engine.vocabulary_len(),
        source_sha256: engine.source_digest().map(str::to_string),
        entries: entries
            .iter()
            .map(|(name, encoding, body)| EntryInfo {
                name: (*name).to_string(),
                encoding: *encoding,
                size: body.len() as u64,
                sha256: sha256_hex(body),
            })
            .collect(),
    };
    let manifest_body =
        serde_json::to_vec_pretty(&manifest).map_err(|e| MatchError::Encode(e.to_string()))?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| MatchError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| MatchError::io(parent, e))?;
    {
        let mut builder = tar::Builder::new(temp.as_file_mut());
        let mut write_all = || -> io::Result<()> {
            append_entry(&mut builder, MANIFEST_ENTRY, &manifest_body)?;
            for (name, _, body) in &entries {
                append_entry(&mut builder, name, body)?;
            }
            builder.finish()
        };
        write_all().map_err(|e| MatchError::io(path, e))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| MatchError::io(path, e))?;
    temp.persist(path)
        .map_err(|e| MatchError::io(path, e.error))?;

    let bytes: usize = manifest_body.len() + entries.iter().map(|(_, _, b)| b.len()).sum::<usize>();
    info!(
        path = %path.display(),
        catalog_len = manifest.catalog_len,
        vocabulary_len = manifest.vocabulary_len,
        bytes,
        elapsed_micros = start.elapsed().as_micros() as u64,
        "bundle_persisted"
    );
    Ok(())
}

/// Rebuild an engine from the bundle at `path`.
pub fn read_bundle(path: &Path) -> Result<MatchEngine, MatchError> {
    let start = Instant::now();
    let (file, limit) = open_bundle(path)?;

    let engine = read_entries(BufReader::new(file), limit)
        .and_then(assemble)
        .map_err(|reason| {
            warn!(path = %path.display(), %reason, "bundle_rejected");
            MatchError::corrupt(path, reason)
        })?;

    info!(
        path = %path.display(),
        catalog_len = engine.catalog().len(),
        vocabulary_len = engine.vocabulary_len(),
        elapsed_micros = start.elapsed().as_micros() as u64,
        "bundle_restored"
    );
    Ok(engine)
}

/// Read only the manifest of the bundle at `path`.
pub fn read_manifest(path: &Path) -> Result<BundleManifest, MatchError> {
    let (file, limit) = open_bundle(path)?;
    read_entries(BufReader::new(file), limit)
        .and_then(|mut blobs| parse_manifest(&mut blobs))
        .map_err(|reason| MatchError::corrupt(path, reason))
}

/// Open a bundle along with its length, which bounds every entry body.
fn open_bundle(path: &Path) -> Result<(File, u64), MatchError> {
    let file = File::open(path).map_err(|e| MatchError::io(path, e))?;
    let len = file
        .metadata()
        .map_err(|e| MatchError::io(path, e))?
        .len();
    Ok((file, len))
}

fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    body: &[u8],
) -> io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, body)
}

/// Read every entry body into memory. Headers come from an untrusted file,
/// so no body may claim or yield more than `limit` bytes.
fn read_entries<R: Read>(reader: R, limit: u64) -> Result<HashMap<String, Vec<u8>>, String> {
    let mut archive = tar::Archive::new(reader);
    let mut blobs = HashMap::new();

    let entries = archive
        .entries()
        .map_err(|e| format!("unreadable archive: {e}"))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| format!("unreadable archive entry: {e}"))?;
        let name = entry
            .path()
            .map_err(|e| format!("unreadable entry name: {e}"))?
            .to_string_lossy()
            .into_owned();
        if entry.size() > limit {
            return Err(format!(
                "entry {name} claims {} bytes but the bundle is {limit} bytes",
                entry.size()
            ));
        }
        let mut body = Vec::new();
        entry
            .by_ref()
            .take(limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| format!("entry {name}: {e}"))?;
        if body.len() as u64 > limit {
            return Err(format!("entry {name} is larger than the bundle"));
        }
        if blobs.insert(name.clone(), body).is_some() {
            return Err(format!("duplicate entry {name}"));
        }
    }
    Ok(blobs)
}

fn parse_manifest(blobs: &mut HashMap<String, Vec<u8>>) -> Result<BundleManifest, String> {
    let body = blobs
        .remove(MANIFEST_ENTRY)
        .ok_or_else(|| format!("missing entry {MANIFEST_ENTRY}"))?;
    let manifest: BundleManifest =
        serde_json::from_slice(&body).map_err(|e| format!("unreadable manifest: {e}"))?;
    if manifest.schema_version != BUNDLE_SCHEMA_VERSION {
        return Err(format!(
            "unsupported schema version {} (expected {BUNDLE_SCHEMA_VERSION})",
            manifest.schema_version
        ));
    }
    Ok(manifest)
}

fn assemble(mut blobs: HashMap<String, Vec<u8>>) -> Result<MatchEngine, String> {
    let manifest = parse_manifest(&mut blobs)?;

    let catalog: Catalog = take_entry(&blobs, &manifest, CATALOG_ENTRY)?;
    let analyzer = take_entry(&blobs, &manifest, ANALYZER_ENTRY)?;
    let model: tfidf::VectorSpaceModel = take_entry(&blobs, &manifest, VECTORIZER_ENTRY)?;
    let corpus_vectors = take_entry(&blobs, &manifest, CORPUS_VECTORS_ENTRY)?;
    let index = take_entry(&blobs, &manifest, NEIGHBOR_INDEX_ENTRY)?;

    if catalog.len() != manifest.catalog_len {
        return Err(format!(
            "manifest records {} catalog names but the catalog entry holds {}",
            manifest.catalog_len,
            catalog.len()
        ));
    }
    if model.dimension() != manifest.vocabulary_len {
        return Err(format!(
            "manifest records {} vocabulary terms but the vectorizer holds {}",
            manifest.vocabulary_len,
            model.dimension()
        ));
    }
    manifest
        .config
        .validate()
        .map_err(|e| format!("manifest config: {e}"))?;

    MatchEngine::from_parts(
        manifest.config,
        catalog,
        analyzer,
        model,
        corpus_vectors,
        index,
        manifest.source_sha256,
    )
}

fn take_entry<T: DeserializeOwned>(
    blobs: &HashMap<String, Vec<u8>>,
    manifest: &BundleManifest,
    name: &str,
) -> Result<T, String> {
    let body = blobs
        .get(name)
        .ok_or_else(|| format!("missing entry {name}"))?;
    let info = manifest
        .entry(name)
        .ok_or_else(|| format!("manifest has no record of entry {name}"))?;
    if info.size != body.len() as u64 {
        return Err(format!(
            "entry {name} is {} bytes, manifest records {}",
            body.len(),
            info.size
        ));
    }
    if sha256_hex(body) != info.sha256 {
        return Err(format!("entry {name} fails its sha256 check"));
    }
    info.encoding
        .decode(body)
        .map_err(|e| format!("entry {name}: {e}"))
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MatchEngine {
        let catalog: Catalog = ["Jon Smith", "John Smythe", "Jane Doe"].into_iter().collect();
        MatchEngine::from_catalog(catalog, MatcherConfig::default()).unwrap()
    }

    /// Rewrite the archive at `path` with `edit` applied to its entries.
    fn rewrite(path: &Path, edit: impl FnOnce(&mut Vec<(String, Vec<u8>)>)) {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(file);
        let mut entries: Vec<(String, Vec<u8>)> = archive
            .entries()
            .unwrap()
            .map(|e| {
                let mut e = e.unwrap();
                let name = e.path().unwrap().to_string_lossy().into_owned();
                let mut body = Vec::new();
                e.read_to_end(&mut body).unwrap();
                (name, body)
            })
            .collect();
        edit(&mut entries);

        let out = File::create(path).unwrap();
        let mut builder = tar::Builder::new(out);
        for (name, body) in &entries {
            append_entry(&mut builder, name, body).unwrap();
        }
        builder.finish().unwrap();
    }

    #[test]
    fn manifest_lists_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcher.mdl");
        engine().persist_to(&path).unwrap();

        let manifest = read_manifest(&path).unwrap();
        assert_eq!(manifest.schema_version, BUNDLE_SCHEMA_VERSION);
        assert_eq!(manifest.catalog_len, 3);
        let names: Vec<&str> = manifest.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                CATALOG_ENTRY,
                ANALYZER_ENTRY,
                VECTORIZER_ENTRY,
                CORPUS_VECTORS_ENTRY,
                NEIGHBOR_INDEX_ENTRY
            ]
        );
        assert_eq!(
            manifest.entry(ANALYZER_ENTRY).unwrap().encoding,
            EntryEncoding::JsonZstd
        );
    }

    #[test]
    fn persist_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ai-models").join("nested").join("matcher.mdl");
        engine().persist_to(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn entry_order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcher.mdl");
        let original = engine();
        original.persist_to(&path).unwrap();

        rewrite(&path, |entries| entries.reverse());
        let restored = MatchEngine::restore(&path).unwrap();
        assert_eq!(
            restored.match_query("Jon Smyth").unwrap(),
            original.match_query("Jon Smyth").unwrap()
        );
    }

    #[test]
    fn missing_entry_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcher.mdl");
        engine().persist_to(&path).unwrap();

        rewrite(&path, |entries| entries.retain(|(n, _)| n != CORPUS_VECTORS_ENTRY));
        match MatchEngine::restore(&path) {
            Err(MatchError::CorruptBundle { reason, .. }) => {
                assert!(reason.contains(CORPUS_VECTORS_ENTRY), "{reason}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn tampered_entry_fails_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcher.mdl");
        engine().persist_to(&path).unwrap();

        rewrite(&path, |entries| {
            let (_, body) = entries
                .iter_mut()
                .find(|(n, _)| n == CATALOG_ENTRY)
                .unwrap();
            let last = body.len() - 1;
            body[last] ^= 0xff;
        });
        match MatchEngine::restore(&path) {
            Err(MatchError::CorruptBundle { reason, .. }) => assert!(reason.contains("sha256")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn mismatched_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcher.mdl");
        let other = dir.path().join("other.mdl");
        engine().persist_to(&path).unwrap();

        let catalog: Catalog = ["Jon Smith", "John Smythe", "Ann Lee"].into_iter().collect();
        MatchEngine::from_catalog(catalog, MatcherConfig::default())
            .unwrap()
            .persist_to(&other)
            .unwrap();

        // Graft the neighbor index of a different fit into the bundle,
        // keeping the manifest digest in step so only the cross-entry
        // check can catch it.
        let foreign_index = {
            let file = File::open(&other).unwrap();
            let len = file.metadata().unwrap().len();
            let mut blobs = read_entries(file, len).unwrap();
            blobs.remove(NEIGHBOR_INDEX_ENTRY).unwrap()
        };
        rewrite(&path, |entries| {
            for (name, body) in entries.iter_mut() {
                if name == NEIGHBOR_INDEX_ENTRY {
                    *body = foreign_index.clone();
                }
            }
            let (_, manifest_body) = entries
                .iter_mut()
                .find(|(n, _)| n == MANIFEST_ENTRY)
                .unwrap();
            let mut manifest: BundleManifest = serde_json::from_slice(manifest_body).unwrap();
            for info in &mut manifest.entries {
                if info.name == NEIGHBOR_INDEX_ENTRY {
                    info.size = foreign_index.len() as u64;
                    info.sha256 = sha256_hex(&foreign_index);
                }
            }
            *manifest_body = serde_json::to_vec(&manifest).unwrap();
        });

        assert!(matches!(
            MatchEngine::restore(&path),
            Err(MatchError::CorruptBundle { .. })
        ));
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcher.mdl");
        fs::write(&path, b"not a tar archive at all").unwrap();
        assert!(matches!(
            MatchEngine::restore(&path),
            Err(MatchError::CorruptBundle { .. })
        ));
    }

    #[test]
    fn oversized_entry_header_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcher.mdl");

        // A lone header announcing an exabyte-scale manifest body.
        let mut header = tar::Header::new_gnu();
        header.set_path(MANIFEST_ENTRY).unwrap();
        header.set_size(1 << 62);
        header.set_mode(0o644);
        header.set_cksum();
        let mut raw = header.as_bytes().to_vec();
        raw.extend_from_slice(&[0u8; 1024]);
        fs::write(&path, raw).unwrap();

        match MatchEngine::restore(&path) {
            Err(MatchError::CorruptBundle { reason, .. }) => {
                assert!(reason.contains(MANIFEST_ENTRY), "{reason}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            read_manifest(&path),
            Err(MatchError::CorruptBundle { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            MatchEngine::restore(dir.path().join("absent.mdl")),
            Err(MatchError::Io { .. })
        ));
    }
}
