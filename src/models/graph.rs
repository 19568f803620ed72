use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::empty_as_none;

/// Directed edge between two notes
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub from_note_id: i64,
    pub to_note_id: i64,
    pub link_text: String,
    pub link_type: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A link pointing at a note, with the source note's title for display
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Backlink {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub link: Link,
    pub from_note_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLink {
    pub from_note_id: i64,
    pub to_note_id: i64,
    #[serde(default)]
    pub link_text: String,
    pub link_type: Option<String>,
}

/// Node kinds in the assembled graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphNodeKind {
    Note,
    Category,
    Tag,
}

impl GraphNodeKind {
    /// Prefix that keeps the three id spaces disjoint in one node set
    pub fn prefix(self) -> &'static str {
        match self {
            GraphNodeKind::Note => "note",
            GraphNodeKind::Category => "cat",
            GraphNodeKind::Tag => "tag",
        }
    }

    pub fn node_id(self, id: i64) -> String {
        format!("{}_{}", self.prefix(), id)
    }
}

impl FromStr for GraphNodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(GraphNodeKind::Note),
            "category" => Ok(GraphNodeKind::Category),
            "tag" => Ok(GraphNodeKind::Tag),
            other => Err(format!(
                "unknown node type '{}', expected note, category or tag",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: GraphNodeKind,
    pub color: String,
    pub size: i64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub weight: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// `GET /api/graph` filters
#[derive(Debug, Default, Deserialize)]
pub struct GraphQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tag: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "empty_as_none")]
    pub kind: Option<GraphNodeKind>,
}

/// A named, saved viewport/filter configuration for the graph view
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GraphState {
    pub id: i64,
    pub name: String,
    pub data: String,
    pub layout: String,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub filter: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphStateInput {
    pub name: String,
    #[serde(default)]
    pub data: String,
    pub layout: Option<String>,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub pan_x: f64,
    #[serde(default)]
    pub pan_y: f64,
    #[serde(default)]
    pub filter: String,
}

fn default_zoom() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_disjoint() {
        assert_eq!(GraphNodeKind::Note.node_id(1), "note_1");
        assert_eq!(GraphNodeKind::Category.node_id(1), "cat_1");
        assert_eq!(GraphNodeKind::Tag.node_id(1), "tag_1");
    }

    #[test]
    fn test_graph_query_type_filter() {
        let q: GraphQuery = serde_json::from_str(r#"{"type":"category"}"#).unwrap();
        assert_eq!(q.kind, Some(GraphNodeKind::Category));

        assert!(serde_json::from_str::<GraphQuery>(r#"{"type":"planet"}"#).is_err());

        let q: GraphQuery = serde_json::from_str(r#"{"type":"","category":"","tag":""}"#).unwrap();
        assert!(q.kind.is_none());
        assert!(q.category.is_none());
        assert!(q.tag.is_none());
    }
}
