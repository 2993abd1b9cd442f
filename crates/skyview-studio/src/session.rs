//! Session snapshots: node transforms plus interaction state, stored as a
//! single JSON record under a fixed key.
//!
//! Records carry no schema version. Every field is optional on load and a
//! missing field keeps the current in-memory value.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use skyview_base::{Axis, NodeId};
use skyview_scene::Transform;
use tracing::{info, warn};

use crate::annotation::Annotation;
use crate::cut::CutRanges;
use crate::error::{Result, StudioError};
use crate::store::{InteractionStore, StoreEvent, TransformMode};

pub trait SessionStorage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per record inside `dir`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StudioError::Io {
                operation: "read",
                path,
                source,
            }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|source| StudioError::Io {
            operation: "create directory",
            path: self.dir.clone(),
            source,
        })?;
        write_atomic(&path, value.as_bytes())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(io_error("create", &temp_path))?;
    file.write_all(bytes).map_err(io_error("write", &temp_path))?;
    file.sync_all().map_err(io_error("sync", &temp_path))?;
    fs::rename(&temp_path, path).map_err(io_error("rename", path))?;
    Ok(())
}

fn io_error(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> StudioError {
    let path = path.to_path_buf();
    move |source| StudioError::Io {
        operation,
        path,
        source,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutSnapshot {
    pub axis: Option<Axis>,
    pub offset: Option<f64>,
    pub ranges: Option<CutRanges>,
    pub visible: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub saved_at_ms: Option<u64>,
    pub transforms: Option<BTreeMap<NodeId, Transform>>,
    pub annotations: Option<Vec<Annotation>>,
    pub transform_mode: Option<TransformMode>,
    pub cut: Option<CutSnapshot>,
}

impl SessionSnapshot {
    pub fn capture(store: &InteractionStore) -> Self {
        let scene = store.scene();
        let transforms = scene
            .mesh_ids()
            .into_iter()
            .filter_map(|id| scene.node(id).map(|node| (id, node.transform)))
            .collect();
        let cut = store.cut();
        Self {
            saved_at_ms: Some(now_ms()),
            transforms: Some(transforms),
            annotations: Some(store.annotations().to_vec()),
            transform_mode: Some(store.transform_mode()),
            cut: Some(CutSnapshot {
                axis: Some(cut.axis()),
                offset: Some(cut.offset()),
                ranges: Some(*cut.ranges()),
                visible: Some(cut.visible),
            }),
        }
    }

    /// Applies the snapshot; returns how many node transforms matched.
    pub fn apply(&self, store: &mut InteractionStore) -> usize {
        let mut applied = 0;
        if let Some(transforms) = &self.transforms {
            for (id, transform) in transforms {
                let is_mesh = store.scene().node(*id).is_some_and(|node| node.is_mesh());
                if is_mesh && store.set_node_transform(*id, *transform) {
                    applied += 1;
                }
            }
        }
        if let Some(annotations) = &self.annotations {
            store.replace_annotations(annotations.clone());
        }
        if let Some(mode) = self.transform_mode {
            store.set_transform_mode(mode);
        }
        if let Some(cut) = &self.cut {
            let current = *store.cut();
            store.restore_cut(
                cut.axis.unwrap_or(current.axis()),
                cut.ranges.unwrap_or(*current.ranges()),
                cut.offset.unwrap_or(current.offset()),
                cut.visible.unwrap_or(current.visible),
            );
        }
        store.forget_original_positions();
        store.select_by_id(None);
        applied
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, saturating_millis)
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Overwrites the stored record with a fresh snapshot of `store`.
pub fn save_session(
    store: &InteractionStore,
    storage: &mut dyn SessionStorage,
) -> Result<SessionSnapshot> {
    let snapshot = SessionSnapshot::capture(store);
    let text = serde_json::to_string_pretty(&snapshot)?;
    storage.write(&store.config().session_key, &text)?;
    info!(
        nodes = snapshot.transforms.as_ref().map_or(0, BTreeMap::len),
        annotations = store.annotations().len(),
        "session saved"
    );
    Ok(snapshot)
}

/// Reads and applies the stored record. Nothing is mutated unless the record
/// exists and parses.
pub fn try_load_session(
    store: &mut InteractionStore,
    storage: &dyn SessionStorage,
) -> Result<SessionSnapshot> {
    let text = storage
        .read(&store.config().session_key)?
        .ok_or(StudioError::SessionMissing)?;
    let snapshot: SessionSnapshot =
        serde_json::from_str(&text).map_err(StudioError::SessionMalformed)?;
    let applied = snapshot.apply(store);
    info!(applied, "session restored");
    store.emit(StoreEvent::SessionRestored);
    Ok(snapshot)
}

pub fn load_session(store: &mut InteractionStore, storage: &dyn SessionStorage) -> bool {
    match try_load_session(store, storage) {
        Ok(_) => true,
        Err(err) => {
            warn!(error = %err, "session not restored");
            false
        }
    }
}
