//! Persistence of story sessions.
//!
//! The whole collection lives in one blob (key [`STORE_KEY`]) as a JSON map from record id
//! to [`SavedStoryContext`]. Every operation reads the map, changes it and writes it back
//! in full, so the last writer wins and a record is never half-written.
//!
//! Record ids are typed through [`SaveId`]. Public write paths only ever produce
//! [`SaveId::Primary`] and [`SaveId::Snapshot`] ids; the legacy variants exist so
//! [`ContextStore::cleanup_duplicates`] can migrate collections written by older builds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use taleweaver_core::{ConversationMessage, Genre, ModelConfig, StoryState};
use taleweaver_error::{StorageError, StorageErrorKind, TaleweaverResult};
use taleweaver_interface::BlobStore;

/// Blob key holding the saved-story collection.
pub const STORE_KEY: &str = "story_contexts";

/// Schema version written by this build. Records carrying another version are rejected on load.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

const IMPORT_PREFIX: &str = "[imported] ";
const THUMBNAIL_CHARS: usize = 140;

const PRIMARY_PREFIX: &str = "story_";
const SNAPSHOT_PREFIX: &str = "snapshot_";
const LEGACY_AUTO_PREFIX: &str = "auto_";

/// Identifier of a saved record.
///
/// # Examples
///
/// ```
/// use taleweaver_narrative::SaveId;
///
/// let id = SaveId::parse("story_abc");
/// assert_eq!(id, SaveId::Primary("abc".to_string()));
/// assert_eq!(id.to_string(), "story_abc");
/// assert!(matches!(SaveId::parse("auto_abc"), SaveId::LegacyAuto(_)));
/// assert!(matches!(SaveId::parse("my-save"), SaveId::Legacy(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SaveId {
    /// The one canonical record of a story, keyed by story id
    Primary(String),
    /// An explicitly created, immutable copy
    Snapshot(String),
    /// Autosave id written by older builds, read only by the migration pass
    LegacyAuto(String),
    /// Any other id written by older builds
    Legacy(String),
}

impl SaveId {
    /// The primary id of a story.
    pub fn primary(story_id: impl Into<String>) -> Self {
        Self::Primary(story_id.into())
    }

    /// A fresh snapshot id.
    pub fn new_snapshot() -> Self {
        Self::Snapshot(uuid::Uuid::new_v4().to_string())
    }

    /// Classify a stored key. Never fails: unknown shapes are [`SaveId::Legacy`].
    pub fn parse(key: &str) -> Self {
        let key = key.trim();
        if let Some(rest) = key.strip_prefix(PRIMARY_PREFIX).filter(|r| !r.is_empty()) {
            Self::Primary(rest.to_string())
        } else if let Some(rest) = key.strip_prefix(SNAPSHOT_PREFIX).filter(|r| !r.is_empty()) {
            Self::Snapshot(rest.to_string())
        } else if let Some(rest) = key.strip_prefix(LEGACY_AUTO_PREFIX).filter(|r| !r.is_empty()) {
            Self::LegacyAuto(rest.to_string())
        } else {
            Self::Legacy(key.to_string())
        }
    }

    /// Whether this is a primary id.
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary(_))
    }

    /// Whether this is a snapshot id.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::Snapshot(_))
    }

    /// Whether this id belongs to a legacy id space.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::LegacyAuto(_) | Self::Legacy(_))
    }
}

impl fmt::Display for SaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary(id) => write!(f, "{PRIMARY_PREFIX}{id}"),
            Self::Snapshot(id) => write!(f, "{SNAPSHOT_PREFIX}{id}"),
            Self::LegacyAuto(id) => write!(f, "{LEGACY_AUTO_PREFIX}{id}"),
            Self::Legacy(raw) => f.write_str(raw),
        }
    }
}

impl From<&str> for SaveId {
    fn from(key: &str) -> Self {
        Self::parse(key)
    }
}

/// A persisted story session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStoryContext {
    /// Record id, equal to the key it is stored under
    pub id: String,
    /// Display label
    pub title: String,
    /// Narrative state at save time
    pub story_state: StoryState,
    /// Conversation the model has seen
    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,
    /// Model settings, without credentials
    #[serde(default)]
    pub model_config: ModelConfig,
    /// When the record was last explicitly saved
    pub save_time: DateTime<Utc>,
    /// When the story was last played
    pub last_play_time: DateTime<Utc>,
    /// Schema version the record was written with
    pub version: u32,
    /// Whether the record came from an autosave
    #[serde(default)]
    pub is_auto_save: bool,
    /// Accumulated play time in seconds
    #[serde(default)]
    pub play_time: u64,
    /// Short excerpt of the current scene
    #[serde(default)]
    pub thumbnail: String,
    /// Genre of the story
    #[serde(default)]
    pub genre: Genre,
}

impl SavedStoryContext {
    /// Typed id of this record.
    pub fn save_id(&self) -> SaveId {
        SaveId::parse(&self.id)
    }
}

/// Options for [`ContextStore::save`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOptions {
    /// Display label; defaults to the existing manual title or a generated one
    pub title: Option<String>,
    /// Whether this save was triggered automatically
    pub is_auto_save: bool,
    /// Target id; defaults to the story's primary id
    pub custom_id: Option<SaveId>,
    /// Total play time in seconds; defaults to the stored value
    pub play_time: Option<u64>,
}

impl SaveOptions {
    /// A manual save with a title.
    pub fn manual(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// An automatic save.
    pub fn auto() -> Self {
        Self {
            is_auto_save: true,
            ..Self::default()
        }
    }
}

/// Options for [`ContextStore::save_progress`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveProgressOptions {
    /// Write an immutable snapshot instead of updating the primary record
    pub create_snapshot: bool,
    /// Label for the snapshot
    pub title: Option<String>,
}

/// One line of [`ContextStore::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSummary {
    /// Record id
    #[serde(serialize_with = "serialize_display")]
    pub id: SaveId,
    /// Display label
    pub title: String,
    /// Story the record belongs to
    pub story_id: String,
    /// Story genre
    pub genre: Genre,
    /// Chapter at save time
    pub chapter: u32,
    /// Whether the story has ended
    pub is_completed: bool,
    /// Whether the record came from an autosave
    pub is_auto_save: bool,
    /// Schema version of the record
    pub version: u32,
    /// When the record was last explicitly saved
    pub save_time: DateTime<Utc>,
    /// When the story was last played
    pub last_play_time: DateTime<Utc>,
    /// Short excerpt of the current scene
    pub thumbnail: String,
}

fn serialize_display<S: serde::Serializer>(id: &SaveId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(id)
}

impl From<&SavedStoryContext> for SaveSummary {
    fn from(record: &SavedStoryContext) -> Self {
        Self {
            id: record.save_id(),
            title: record.title.clone(),
            story_id: record.story_state.story_id.clone(),
            genre: record.genre,
            chapter: record.story_state.chapter,
            is_completed: record.story_state.is_completed,
            is_auto_save: record.is_auto_save,
            version: record.version,
            save_time: record.save_time,
            last_play_time: record.last_play_time,
            thumbnail: record.thumbnail.clone(),
        }
    }
}

/// What a [`ContextStore::cleanup_duplicates`] run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Records moved to their story's primary id, as `(from, to)`
    pub promoted: Vec<(SaveId, SaveId)>,
    /// Records removed as duplicates
    pub discarded: Vec<SaveId>,
    /// Records stamped with the current schema version
    pub upgraded: Vec<SaveId>,
}

impl CleanupReport {
    /// Whether the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.promoted.is_empty() && self.discarded.is_empty() && self.upgraded.is_empty()
    }
}

/// Just enough of a record to reason about duplicates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordHeader {
    story_state: StoryRef,
    #[serde(default)]
    is_auto_save: bool,
    save_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryRef {
    story_id: String,
}

type Collection = Map<String, Value>;

fn storage_error(kind: StorageErrorKind) -> StorageError {
    StorageError::new(kind)
}

fn default_title(state: &StoryState) -> String {
    let mut genre = state.genre.to_string();
    if let Some(first) = genre.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    format!("{} tale, chapter {}", genre, state.chapter)
}

fn thumbnail(scene: &str) -> String {
    let scene = scene.split_whitespace().collect::<Vec<_>>().join(" ");
    if scene.chars().count() <= THUMBNAIL_CHARS {
        return scene;
    }
    let cut: String = scene.chars().take(THUMBNAIL_CHARS).collect();
    let cut = match cut.rfind(' ') {
        Some(space) if space > THUMBNAIL_CHARS / 2 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}...", cut.trim_end_matches([',', '.', ';', ':']))
}

/// CRUD and reconciliation over the saved-story collection.
#[derive(Clone)]
pub struct ContextStore {
    blob: Arc<dyn BlobStore>,
}

impl fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStore")
            .field("key", &STORE_KEY)
            .finish_non_exhaustive()
    }
}

impl ContextStore {
    /// Create a store over a durable blob backend.
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }

    async fn read_collection(&self) -> TaleweaverResult<Collection> {
        let Some(raw) = self.blob.read(STORE_KEY).await? else {
            return Ok(Collection::new());
        };
        if raw.trim().is_empty() {
            return Ok(Collection::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(storage_error(StorageErrorKind::Serialization(
                "saved-story collection is not a JSON object".to_string(),
            ))
            .into()),
            Err(e) => Err(storage_error(StorageErrorKind::Serialization(e.to_string())).into()),
        }
    }

    async fn write_collection(&self, collection: &Collection) -> TaleweaverResult<()> {
        let raw = serde_json::to_string(collection)
            .map_err(|e| storage_error(StorageErrorKind::Serialization(e.to_string())))?;
        self.blob.write(STORE_KEY, &raw).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to write saved-story collection");
        })
    }

    fn decode(key: &str, value: &Value) -> Result<SavedStoryContext, StorageError> {
        serde_json::from_value(value.clone()).map_err(|e| {
            storage_error(StorageErrorKind::InvalidRecord {
                id: key.to_string(),
                reason: e.to_string(),
            })
        })
    }

    fn encode(record: &SavedStoryContext) -> Result<Value, StorageError> {
        serde_json::to_value(record)
            .map_err(|e| storage_error(StorageErrorKind::Serialization(e.to_string())))
    }

    /// Write a record, by default to the story's primary id.
    ///
    /// An autosave over a manual record keeps the manual title and status.
    ///
    /// # Errors
    ///
    /// `ImmutableSnapshot` when the target is an existing snapshot, `InvalidKey` when the
    /// target is a legacy id or the state has a blank story id, and any backend failure.
    #[tracing::instrument(skip_all, fields(story_id = %state.story_id, auto = options.is_auto_save))]
    pub async fn save(
        &self,
        state: &StoryState,
        history: &[ConversationMessage],
        config: &ModelConfig,
        options: SaveOptions,
    ) -> TaleweaverResult<SaveId> {
        if state.story_id.trim().is_empty() {
            let key = PRIMARY_PREFIX.to_string();
            return Err(storage_error(StorageErrorKind::InvalidKey(key)).into());
        }
        let id = options
            .custom_id
            .clone()
            .unwrap_or_else(|| SaveId::primary(&state.story_id));
        if id.is_legacy() {
            return Err(storage_error(StorageErrorKind::InvalidKey(id.to_string())).into());
        }

        let key = id.to_string();
        let mut collection = self.read_collection().await?;

        let existing = match collection.get(&key) {
            Some(_) if id.is_snapshot() => {
                return Err(storage_error(StorageErrorKind::ImmutableSnapshot(key)).into());
            }
            Some(value) => match Self::decode(&key, value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Overwriting undecodable record");
                    None
                }
            },
            None => None,
        };

        let now = Utc::now();
        let sticky_manual = options.is_auto_save && existing.as_ref().is_some_and(|e| !e.is_auto_save);
        let (title, is_auto_save, save_time) = match &existing {
            Some(prev) if sticky_manual => (prev.title.clone(), false, prev.save_time),
            _ => (
                options
                    .title
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .or_else(|| {
                        existing
                            .as_ref()
                            .filter(|prev| !prev.is_auto_save)
                            .map(|prev| prev.title.clone())
                    })
                    .unwrap_or_else(|| default_title(state)),
                options.is_auto_save,
                now,
            ),
        };

        let record = SavedStoryContext {
            id: key.clone(),
            title,
            story_state: state.clone(),
            conversation_history: history.to_vec(),
            model_config: config.clone(),
            save_time,
            last_play_time: now,
            version: CURRENT_SCHEMA_VERSION,
            is_auto_save,
            play_time: options
                .play_time
                .or_else(|| existing.as_ref().map(|prev| prev.play_time))
                .unwrap_or(0),
            thumbnail: thumbnail(&state.current_scene),
            genre: state.genre,
        };

        collection.insert(key, Self::encode(&record)?);
        self.write_collection(&collection).await?;

        tracing::info!(id = %id, sticky_manual, "Saved story");
        Ok(id)
    }

    /// Save to the story's primary id as an autosave.
    pub async fn auto_save(
        &self,
        state: &StoryState,
        history: &[ConversationMessage],
        config: &ModelConfig,
    ) -> TaleweaverResult<SaveId> {
        self.save(state, history, config, SaveOptions::auto()).await
    }

    /// Autosave, or write a fresh snapshot when asked to.
    pub async fn save_progress(
        &self,
        state: &StoryState,
        history: &[ConversationMessage],
        config: &ModelConfig,
        options: SaveProgressOptions,
    ) -> TaleweaverResult<SaveId> {
        if !options.create_snapshot {
            return self.auto_save(state, history, config).await;
        }

        let title = options
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("{} (snapshot)", default_title(state)));
        let save_options = SaveOptions {
            title: Some(title),
            is_auto_save: false,
            custom_id: Some(SaveId::new_snapshot()),
            play_time: None,
        };
        self.save(state, history, config, save_options).await
    }

    /// Load one record.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent, `VersionMismatch` when the record was written with another
    /// schema version, `InvalidRecord` when it cannot be decoded.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn load(&self, id: &SaveId) -> TaleweaverResult<SavedStoryContext> {
        let key = id.to_string();
        let collection = self.read_collection().await?;
        let value = collection
            .get(&key)
            .ok_or_else(|| storage_error(StorageErrorKind::NotFound(key.clone())))?;
        Ok(Self::decode_current(&key, value)?)
    }

    fn decode_current(key: &str, value: &Value) -> Result<SavedStoryContext, StorageError> {
        let stored = value.get("version").and_then(Value::as_u64).unwrap_or(0);
        if stored != u64::from(CURRENT_SCHEMA_VERSION) {
            let found = u32::try_from(stored).unwrap_or(u32::MAX);
            return Err(storage_error(StorageErrorKind::VersionMismatch {
                found,
                expected: CURRENT_SCHEMA_VERSION,
            }));
        }
        Self::decode(key, value)
    }

    /// Delete a record. Returns whether anything was removed.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &SaveId) -> TaleweaverResult<bool> {
        let mut collection = self.read_collection().await?;
        if collection.remove(&id.to_string()).is_none() {
            tracing::debug!("Nothing to delete");
            return Ok(false);
        }
        self.write_collection(&collection).await?;
        tracing::info!("Deleted saved story");
        Ok(true)
    }

    /// Change a record's title. Snapshots may be renamed; their content stays as written.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent, `InvalidRecord` for a blank title or a non-object record.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn rename(&self, id: &SaveId, title: &str) -> TaleweaverResult<()> {
        let key = id.to_string();
        let title = title.trim();
        if title.is_empty() {
            return Err(storage_error(StorageErrorKind::InvalidRecord {
                id: key,
                reason: "title must not be empty".to_string(),
            })
            .into());
        }

        let mut collection = self.read_collection().await?;
        let record = collection
            .get_mut(&key)
            .ok_or_else(|| storage_error(StorageErrorKind::NotFound(key.clone())))?
            .as_object_mut()
            .ok_or_else(|| {
                storage_error(StorageErrorKind::InvalidRecord {
                    id: key.clone(),
                    reason: "record is not a JSON object".to_string(),
                })
            })?;
        record.insert("title".to_string(), Value::String(title.to_string()));

        self.write_collection(&collection).await
    }

    /// Summaries of every decodable record, most recently played first.
    pub async fn list(&self) -> TaleweaverResult<Vec<SaveSummary>> {
        let collection = self.read_collection().await?;
        let mut summaries: Vec<SaveSummary> = collection
            .iter()
            .filter_map(|(key, value)| match Self::decode(key, value) {
                Ok(record) => Some(SaveSummary::from(&record)),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable record");
                    None
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.last_play_time.cmp(&a.last_play_time));
        Ok(summaries)
    }

    /// The primary record of a story, if any.
    pub async fn find_primary(&self, story_id: &str) -> TaleweaverResult<Option<SavedStoryContext>> {
        match self.load(&SaveId::primary(story_id)).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if matches!(e.storage_kind(), Some(StorageErrorKind::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reconcile duplicates so that each story has at most one primary record.
    ///
    /// Per story: a legacy autosave is promoted to the primary id when none exists and
    /// discarded when one does, as are other stray autosaves; with no primary and no
    /// autosave, the most recently saved legacy manual record is promoted. Snapshots keep
    /// their ids and content. Older records that still decode are stamped with the current
    /// schema version. Running it again changes nothing.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_duplicates(&self) -> TaleweaverResult<CleanupReport> {
        let mut collection = self.read_collection().await?;
        let mut report = CleanupReport::default();

        let mut groups: BTreeMap<String, Vec<(SaveId, RecordHeader)>> = BTreeMap::new();
        for (key, value) in &collection {
            let id = SaveId::parse(key);
            if id.is_snapshot() {
                continue;
            }
            match serde_json::from_value::<RecordHeader>(value.clone()) {
                Ok(header) => groups
                    .entry(header.story_state.story_id.clone())
                    .or_default()
                    .push((id, header)),
                Err(e) => tracing::warn!(id = %key, error = %e, "Skipping undecodable record"),
            }
        }

        for (story_id, records) in groups {
            if story_id.trim().is_empty() {
                tracing::warn!(records = records.len(), "Skipping records without a story id");
                continue;
            }
            let primary = SaveId::primary(&story_id);
            let mut has_primary = records.iter().any(|(id, _)| *id == primary);

            let mut others: Vec<(SaveId, RecordHeader)> =
                records.into_iter().filter(|(id, _)| *id != primary).collect();
            // legacy autosave ids first, then newest first
            others.sort_by(|(a_id, a), (b_id, b)| {
                let a_auto = matches!(a_id, SaveId::LegacyAuto(_));
                let b_auto = matches!(b_id, SaveId::LegacyAuto(_));
                b_auto.cmp(&a_auto).then(b.save_time.cmp(&a.save_time))
            });

            let (autos, manuals): (Vec<_>, Vec<_>) = others
                .into_iter()
                .partition(|(id, header)| header.is_auto_save || matches!(id, SaveId::LegacyAuto(_)));

            for (id, _) in autos {
                if has_primary {
                    collection.remove(&id.to_string());
                    tracing::debug!(%id, %story_id, "Discarded duplicate autosave");
                    report.discarded.push(id);
                } else {
                    Self::move_record(&mut collection, &id, &primary);
                    report.promoted.push((id, primary.clone()));
                    has_primary = true;
                }
            }

            if has_primary {
                continue;
            }
            if let Some((id, _)) = manuals.into_iter().next() {
                Self::move_record(&mut collection, &id, &primary);
                report.promoted.push((id, primary.clone()));
            }
        }

        for (key, value) in collection.iter_mut() {
            let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
            if version >= u64::from(CURRENT_SCHEMA_VERSION) {
                continue;
            }
            let mut stamped = value.clone();
            if let Some(object) = stamped.as_object_mut() {
                object.insert("version".to_string(), Value::from(CURRENT_SCHEMA_VERSION));
            }
            if Self::decode(key, &stamped).is_ok() {
                *value = stamped;
                report.upgraded.push(SaveId::parse(key));
            }
        }

        if report.is_noop() {
            tracing::debug!("Collection already clean");
            return Ok(report);
        }

        self.write_collection(&collection).await?;
        tracing::info!(
            promoted = report.promoted.len(),
            discarded = report.discarded.len(),
            upgraded = report.upgraded.len(),
            "Cleaned up saved stories"
        );
        Ok(report)
    }

    fn move_record(collection: &mut Collection, from: &SaveId, to: &SaveId) {
        let Some(mut value) = collection.remove(&from.to_string()) else {
            return;
        };
        if let Some(object) = value.as_object_mut() {
            object.insert("id".to_string(), Value::String(to.to_string()));
        }
        tracing::debug!(from = %from, to = %to, "Promoted record to primary id");
        collection.insert(to.to_string(), value);
    }

    /// One record as pretty-printed JSON.
    pub async fn export(&self, id: &SaveId) -> TaleweaverResult<String> {
        let record = self.load(id).await?;
        Ok(serde_json::to_string_pretty(&record)
            .map_err(|e| storage_error(StorageErrorKind::Serialization(e.to_string())))?)
    }

    /// Store an exported record under a fresh snapshot id with an `[imported]` title.
    ///
    /// # Errors
    ///
    /// `Serialization` for text that is not JSON, `VersionMismatch` for another schema
    /// version and `InvalidRecord` for JSON that is not a saved story.
    #[tracing::instrument(skip_all)]
    pub async fn import(&self, blob: &str) -> TaleweaverResult<SaveId> {
        let value: Value = serde_json::from_str(blob.trim())
            .map_err(|e| storage_error(StorageErrorKind::Serialization(e.to_string())))?;
        let mut record = Self::decode_current("import", &value)?;

        let id = SaveId::new_snapshot();
        record.id = id.to_string();
        if !record.title.starts_with(IMPORT_PREFIX) {
            record.title = format!("{IMPORT_PREFIX}{}", record.title);
        }

        let mut collection = self.read_collection().await?;
        collection.insert(record.id.clone(), Self::encode(&record)?);
        self.write_collection(&collection).await?;

        tracing::info!(id = %id, story_id = %record.story_state.story_id, "Imported saved story");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_id_round_trip_through_keys() {
        for key in ["story_a1", "snapshot_f00", "auto_a1", "manual-save-3"] {
            assert_eq!(SaveId::parse(key).to_string(), key);
        }
        assert_eq!(SaveId::parse("story_"), SaveId::Legacy("story_".to_string()));
        assert!(SaveId::new_snapshot().is_snapshot());
    }

    #[test]
    fn test_default_title_and_thumbnail() {
        let mut state = StoryState::new("s", Genre::Mystery);
        state.chapter = 4;
        assert_eq!(default_title(&state), "Mystery tale, chapter 4");

        assert_eq!(thumbnail("  short\n scene "), "short scene");
        let long = "word ".repeat(60);
        let thumb = thumbnail(&long);
        assert!(thumb.ends_with("..."));
        assert!(thumb.chars().count() <= THUMBNAIL_CHARS + 3);
    }

    #[test]
    fn test_cleanup_report_noop() {
        assert!(CleanupReport::default().is_noop());
        let report = CleanupReport {
            discarded: vec![SaveId::parse("auto_x")],
            ..CleanupReport::default()
        };
        assert!(!report.is_noop());
    }
}
