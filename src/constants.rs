/// Default bearer token lifetime in hours
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Default maximum upload size in bytes (25MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 26_214_400;

/// Random bytes behind a share token (base64url encoded on the wire)
pub const SHARE_TOKEN_BYTES: usize = 32;

/// Random bytes behind a block identifier (hex encoded)
pub const BLOCK_ID_BYTES: usize = 16;

/// Random bytes appended to stored upload and backup file names (hex encoded)
pub const BLOB_SUFFIX_BYTES: usize = 8;

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_NOTE_COLOR: &str = "#00ffff";
pub const DEFAULT_CATEGORY_COLOR: &str = "#00ffff";
pub const DEFAULT_TAG_COLOR: &str = "#ff0080";
pub const DEFAULT_THEME: &str = "dark";
pub const DEFAULT_TEMPLATE_CATEGORY: &str = "general";
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

// =============================================================================
// Graph
// =============================================================================

/// Upper bound for a note node's size
pub const GRAPH_NOTE_MAX_SIZE: i64 = 50;

/// Base size added to content_length / 10 for a note node
pub const GRAPH_NOTE_BASE_SIZE: i64 = 10;

pub const GRAPH_CATEGORY_SIZE: i64 = 20;
pub const GRAPH_TAG_SIZE: i64 = 15;

// =============================================================================
// Accepted enumerations
// =============================================================================

pub const LINK_TYPES: &[&str] = &["reference", "embed", "mention"];
pub const SHARE_PERMISSIONS: &[&str] = &["read", "write"];
pub const CANVAS_NODE_TYPES: &[&str] = &["note", "text", "image", "file", "group"];
pub const BLOCK_TYPES: &[&str] = &["paragraph", "heading", "list", "code", "quote"];
pub const GRAPH_LAYOUTS: &[&str] = &["force", "circular", "tree"];
pub const REPEAT_TYPES: &[&str] = &["daily", "weekly", "monthly"];

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_NOTE_NOT_FOUND: &str = "Note not found";
pub const ERR_CATEGORY_NOT_FOUND: &str = "Category not found";
pub const ERR_TAG_NOT_FOUND: &str = "Tag not found";
pub const ERR_TEMPLATE_NOT_FOUND: &str = "Template not found";
pub const ERR_REMINDER_NOT_FOUND: &str = "Reminder not found";
pub const ERR_FILE_NOT_FOUND: &str = "File not found";
pub const ERR_SHARE_NOT_FOUND: &str = "Share not found";
pub const ERR_BACKUP_NOT_FOUND: &str = "Backup not found";
pub const ERR_LINK_NOT_FOUND: &str = "Link not found";
pub const ERR_GRAPH_STATE_NOT_FOUND: &str = "Graph state not found";
pub const ERR_CANVAS_NOT_FOUND: &str = "Canvas not found";
pub const ERR_CANVAS_NODE_NOT_FOUND: &str = "Canvas node not found";
pub const ERR_WORKSPACE_NOT_FOUND: &str = "Workspace not found";
pub const ERR_PLUGIN_NOT_FOUND: &str = "Plugin not found";
pub const ERR_USER_NOT_FOUND: &str = "User not found";

pub const ERR_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const ERR_INVALID_DATE: &str = "Dates must use the YYYY-MM-DD format";
pub const ERR_UNKNOWN_CATEGORY: &str = "category_id does not name one of your categories";
