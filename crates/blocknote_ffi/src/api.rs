//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose content, editor and note-store use-cases to Dart via FRB.
//! - Keep error semantics simple: envelopes with `ok` and `message`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Editor calls are pure; Dart replaces its held state with the result.
//! - Note ids cross the boundary as UUID strings.

use blocknote_core::db::open_db;
use blocknote_core::{
    core_version as core_version_inner, delete_checklist_on_backspace, enter_in_checklist,
    init_logging as init_logging_inner, insert_checklist_at_cursor, normalize, parse,
    ping as ping_inner, serialize, set_block_text, toggle_checklist, AutosaveScheduler, Block,
    CoreConfig, EditableValue, EditorState, NoteId, NoteRecord, NoteService, NoteServiceError,
    SqliteNoteRepository,
};
use log::warn;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::Instant;
use uuid::Uuid;

static CORE_CONFIG: OnceLock<CoreConfig> = OnceLock::new();
static AUTOSAVE: Lazy<Mutex<AutosaveScheduler>> =
    Lazy::new(|| Mutex::new(AutosaveScheduler::new(core_config().autosave_delay)));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Dart-facing mirror of a content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FfiBlock {
    Text {
        content: String,
    },
    Checklist {
        content: String,
        checked: bool,
    },
    Image {
        uri: String,
    },
    File {
        uri: String,
        filename: String,
        size_bytes: u64,
    },
}

impl From<Block> for FfiBlock {
    fn from(value: Block) -> Self {
        match value {
            Block::Text { content } => Self::Text { content },
            Block::Checklist { content, checked } => Self::Checklist { content, checked },
            Block::Image { uri } => Self::Image { uri },
            Block::File {
                uri,
                filename,
                size_bytes,
            } => Self::File {
                uri,
                filename,
                size_bytes,
            },
        }
    }
}

impl From<FfiBlock> for Block {
    fn from(value: FfiBlock) -> Self {
        match value {
            FfiBlock::Text { content } => Block::Text { content },
            FfiBlock::Checklist { content, checked } => Block::Checklist { content, checked },
            FfiBlock::Image { uri } => Block::Image { uri },
            FfiBlock::File {
                uri,
                filename,
                size_bytes,
            } => Block::File {
                uri,
                filename,
                size_bytes,
            },
        }
    }
}

/// Editable text field value for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiEditableValue {
    pub text: String,
    /// Collapsed cursor position in chars; `None` leaves the field as is.
    pub selection_base: Option<u32>,
    pub selection_extent: Option<u32>,
}

impl From<EditableValue> for FfiEditableValue {
    fn from(value: EditableValue) -> Self {
        Self {
            text: value.text,
            selection_base: value.selection.map(|sel| to_u32(sel.base)),
            selection_extent: value.selection.map(|sel| to_u32(sel.extent)),
        }
    }
}

/// Editor session state exchanged with Dart on every editor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiEditorState {
    pub blocks: Vec<FfiBlock>,
    /// Derived values; ignored on input and regenerated whenever an edit
    /// changes the state. No-op edits return the input untouched.
    pub values: Vec<FfiEditableValue>,
    pub focused_index: u32,
    pub cursor_offset: u32,
}

impl From<EditorState> for FfiEditorState {
    fn from(value: EditorState) -> Self {
        Self {
            blocks: value.blocks.into_iter().map(FfiBlock::from).collect(),
            values: value
                .projection
                .into_iter()
                .map(FfiEditableValue::from)
                .collect(),
            focused_index: to_u32(value.focused_index),
            cursor_offset: to_u32(value.cursor_offset),
        }
    }
}

impl From<FfiEditorState> for EditorState {
    fn from(value: FfiEditorState) -> Self {
        EditorState::from_blocks(
            to_blocks(value.blocks),
            value.focused_index as usize,
            value.cursor_offset as usize,
        )
    }
}

/// Note-store response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    pub note_id: Option<String>,
    /// Parsed blocks of the note (empty on failure and delete).
    pub blocks: Vec<FfiBlock>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl NoteResponse {
    fn success(message: impl Into<String>, note_id: NoteId, blocks: Vec<Block>) -> Self {
        Self {
            ok: true,
            note_id: Some(note_id.to_string()),
            blocks: blocks.into_iter().map(FfiBlock::from).collect(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            blocks: Vec::new(),
            message: message.into(),
        }
    }
}

/// One row of the note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub note_id: String,
    pub content: String,
    pub checklist_total: u32,
    pub checklist_done: u32,
    pub updated_at: i64,
}

/// Note list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListResponse {
    pub items: Vec<NoteListItem>,
    pub message: String,
    /// Effective applied list limit.
    pub applied_limit: u32,
}

/// Result of one autosave commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveCommitItem {
    pub note_id: String,
    pub ok: bool,
    /// Failed on store contention and will be retried by a later flush.
    pub requeued: bool,
    pub message: String,
}

/// Parses stored content into blocks.
#[flutter_rust_bridge::frb(sync)]
pub fn content_parse(stored: String) -> Vec<FfiBlock> {
    parse(&stored).into_iter().map(FfiBlock::from).collect()
}

/// Flattens blocks into stored content without normalizing them.
#[flutter_rust_bridge::frb(sync)]
pub fn content_serialize(blocks: Vec<FfiBlock>) -> String {
    serialize(&to_blocks(blocks))
}

/// Normalizes blocks the way the save pipeline does.
#[flutter_rust_bridge::frb(sync)]
pub fn content_normalize(blocks: Vec<FfiBlock>) -> Vec<FfiBlock> {
    normalize(&to_blocks(blocks))
        .into_iter()
        .map(FfiBlock::from)
        .collect()
}

/// Starts an editor session from stored content.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_load(stored: String) -> FfiEditorState {
    EditorState::load(&stored).into()
}

/// Checklist toolbar button; returns the input unchanged when `locked`.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_insert_checklist(state: FfiEditorState, locked: bool) -> FfiEditorState {
    if locked {
        return state;
    }
    apply_edit(state, |current| insert_checklist_at_cursor(current, false))
}

/// Backspace at the start of a checklist line.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_backspace_checklist(state: FfiEditorState, checklist_index: u32) -> FfiEditorState {
    apply_edit(state, |current| {
        delete_checklist_on_backspace(current, checklist_index as usize)
    })
}

/// Enter inside a checklist line.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_enter_checklist(state: FfiEditorState, checklist_index: u32) -> FfiEditorState {
    apply_edit(state, |current| {
        enter_in_checklist(current, checklist_index as usize)
    })
}

/// Text field change for one block.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_block_text(
    state: FfiEditorState,
    index: u32,
    text: String,
    cursor_offset: u32,
) -> FfiEditorState {
    apply_edit(state, |current| {
        set_block_text(current, index as usize, &text, cursor_offset as usize)
    })
}

/// Checkbox tap on a checklist line.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_toggle_checklist(state: FfiEditorState, index: u32) -> FfiEditorState {
    apply_edit(state, |current| toggle_checklist(current, index as usize))
}

/// Creates a note from blocks.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn note_create(blocks: Vec<FfiBlock>) -> NoteResponse {
    let blocks = to_blocks(blocks);
    match with_note_service(|service| service.create_note(&blocks)) {
        Ok(record) => record_response("Note created.", &record),
        Err(err) => NoteResponse::failure(format!("note_create failed: {err}")),
    }
}

/// Saves blocks of an existing note immediately and cancels its pending
/// autosave.
#[flutter_rust_bridge::frb(sync)]
pub fn note_save(note_id: String, blocks: Vec<FfiBlock>) -> NoteResponse {
    let note_id = match parse_note_id(&note_id) {
        Ok(note_id) => note_id,
        Err(message) => return NoteResponse::failure(format!("note_save failed: {message}")),
    };
    lock_autosave().cancel(note_id);

    let blocks = to_blocks(blocks);
    match with_note_service(|service| service.save_blocks(note_id, &blocks)) {
        Ok(record) => record_response("Note saved.", &record),
        Err(err) => NoteResponse::failure(format!("note_save failed: {err}")),
    }
}

/// Loads one note and returns its parsed blocks.
#[flutter_rust_bridge::frb(sync)]
pub fn note_load(note_id: String) -> NoteResponse {
    let note_id = match parse_note_id(&note_id) {
        Ok(note_id) => note_id,
        Err(message) => return NoteResponse::failure(format!("note_load failed: {message}")),
    };
    match with_note_service(|service| service.load_blocks(note_id)) {
        Ok(blocks) => NoteResponse::success("Note loaded.", note_id, blocks),
        Err(err) => NoteResponse::failure(format!("note_load failed: {err}")),
    }
}

/// Soft-deletes one note and drops its pending autosave.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String) -> NoteResponse {
    let note_id = match parse_note_id(&note_id) {
        Ok(note_id) => note_id,
        Err(message) => return NoteResponse::failure(format!("note_delete failed: {message}")),
    };
    lock_autosave().cancel(note_id);
    match with_note_service(|service| service.delete_note(note_id)) {
        Ok(()) => NoteResponse::success("Note deleted.", note_id, Vec::new()),
        Err(err) => NoteResponse::failure(format!("note_delete failed: {err}")),
    }
}

/// Lists notes, most recently updated first.
#[flutter_rust_bridge::frb(sync)]
pub fn note_list(limit: Option<u32>, offset: u32) -> NoteListResponse {
    match with_note_service(|service| service.list_notes(limit, offset)) {
        Ok(result) => {
            let items = result
                .items
                .iter()
                .map(to_note_list_item)
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No notes.".to_string()
            } else {
                format!("Found {} note(s).", items.len())
            };
            NoteListResponse {
                items,
                message,
                applied_limit: result.applied_limit,
            }
        }
        Err(err) => NoteListResponse {
            items: Vec::new(),
            message: format!("note_list failed: {err}"),
            applied_limit: 0,
        },
    }
}

/// Schedules a debounced save of `blocks`, replacing any pending one.
///
/// Returns an error message for invalid ids, empty string otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn autosave_schedule(note_id: String, blocks: Vec<FfiBlock>) -> String {
    match parse_note_id(&note_id) {
        Ok(note_id) => {
            lock_autosave().schedule(note_id, to_blocks(blocks), Instant::now());
            String::new()
        }
        Err(message) => format!("autosave_schedule failed: {message}"),
    }
}

/// Cancels the pending autosave of one note; `true` if one was pending.
#[flutter_rust_bridge::frb(sync)]
pub fn autosave_cancel(note_id: String) -> bool {
    parse_note_id(&note_id)
        .map(|note_id| lock_autosave().cancel(note_id))
        .unwrap_or(false)
}

/// Commits every autosave whose quiescence window elapsed.
///
/// Dart polls this from a periodic timer. Commits that hit store contention,
/// including a busy store on open, stay queued for the next poll.
#[flutter_rust_bridge::frb(sync)]
pub fn autosave_flush_due() -> Vec<AutosaveCommitItem> {
    let now = Instant::now();
    if !lock_autosave().has_due(now) {
        return Vec::new();
    }

    let conn = match open_db(resolve_db_path()) {
        Ok(conn) => conn,
        Err(err) if err.is_busy() => {
            warn!("event=autosave_flush module=ffi status=deferred error={err}");
            return Vec::new();
        }
        Err(err) => return fail_due_commits(now, format!("note store open failed: {err}")),
    };
    let repo = match SqliteNoteRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) if err.is_busy() => {
            warn!("event=autosave_flush module=ffi status=deferred error={err}");
            return Vec::new();
        }
        Err(err) => return fail_due_commits(now, format!("note repo init failed: {err}")),
    };
    let service = NoteService::new(repo);

    lock_autosave()
        .flush_due(now, &service)
        .into_iter()
        .map(|outcome| {
            let note_id = outcome.note_id.to_string();
            match outcome.result {
                Ok(_) => AutosaveCommitItem {
                    note_id,
                    ok: true,
                    requeued: false,
                    message: "Autosaved.".to_string(),
                },
                Err(err) if outcome.requeued => AutosaveCommitItem {
                    note_id,
                    ok: false,
                    requeued: true,
                    message: format!("autosave deferred: {err}"),
                },
                Err(err) => AutosaveCommitItem {
                    note_id,
                    ok: false,
                    requeued: false,
                    message: format!("autosave failed: {err}"),
                },
            }
        })
        .collect()
}

fn core_config() -> &'static CoreConfig {
    CORE_CONFIG.get_or_init(|| {
        CoreConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=ffi status=error error={err}");
            CoreConfig::default()
        })
    })
}

/// Runs one edit; a no-op hands back Dart's state exactly as received.
fn apply_edit(
    state: FfiEditorState,
    edit: impl FnOnce(&EditorState) -> EditorState,
) -> FfiEditorState {
    let current = EditorState::from(state.clone());
    let next = edit(&current);
    if next == current {
        state
    } else {
        next.into()
    }
}

/// Drops every due commit, reporting `reason` for each.
fn fail_due_commits(now: Instant, reason: String) -> Vec<AutosaveCommitItem> {
    warn!("event=autosave_flush module=ffi status=error error={reason}");
    lock_autosave()
        .take_due(now)
        .into_iter()
        .map(|commit| AutosaveCommitItem {
            note_id: commit.note_id.to_string(),
            ok: false,
            requeued: false,
            message: format!("autosave failed: {reason}"),
        })
        .collect()
}

fn resolve_db_path() -> PathBuf {
    core_config().db_path.clone()
}

fn lock_autosave() -> MutexGuard<'static, AutosaveScheduler> {
    AUTOSAVE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_note_service<T>(
    f: impl FnOnce(&NoteService<SqliteNoteRepository<'_>>) -> Result<T, NoteServiceError>,
) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("note store open failed: {err}"))?;
    let repo = SqliteNoteRepository::try_new(&conn)
        .map_err(|err| format!("note repo init failed: {err}"))?;
    let service = NoteService::new(repo);
    f(&service).map_err(|err| err.to_string())
}

fn record_response(message: &str, record: &NoteRecord) -> NoteResponse {
    NoteResponse::success(message, record.note_id, parse(&record.content))
}

fn to_note_list_item(record: &NoteRecord) -> NoteListItem {
    NoteListItem {
        note_id: record.note_id.to_string(),
        content: record.content.clone(),
        checklist_total: to_u32(record.checklist.len()),
        checklist_done: to_u32(record.checklist.iter().filter(|item| item.checked).count()),
        updated_at: record.updated_at,
    }
}

fn parse_note_id(raw: &str) -> Result<NoteId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid note id `{}`", raw.trim()))
}

fn to_blocks(blocks: Vec<FfiBlock>) -> Vec<Block> {
    blocks.into_iter().map(Block::from).collect()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
