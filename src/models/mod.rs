pub mod backup;
pub mod canvas;
pub mod file;
pub mod graph;
pub mod note;
pub mod plugin;
pub mod reminder;
pub mod share;
pub mod taxonomy;
pub mod template;
pub mod user;
pub mod workspace;

pub use backup::Backup;
pub use canvas::{Canvas, CanvasConnection, CanvasNode};
pub use file::FileRecord;
pub use graph::{GraphData, GraphEdge, GraphNode, GraphState, Link};
pub use note::{Block, Note, NoteHistory};
pub use plugin::{Hotkey, Plugin};
pub use reminder::Reminder;
pub use share::Share;
pub use taxonomy::{Category, Tag};
pub use template::Template;
pub use user::User;
pub use workspace::{DailyNote, Workspace};

use serde::{de, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Deserialize a field that distinguishes "absent" from "explicitly null"
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent -> `None`, `null` -> `Some(None)`, value -> `Some(Some(v))`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserialize an optional query parameter, treating `?key=` as absent
///
/// Use with `#[serde(default, deserialize_with = "empty_as_none")]`.
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}
