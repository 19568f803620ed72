//! Node/edge projection of a user's notes, categories, tags and links.
//!
//! Recomputed on every request; sized for personal-scale data only.

use crate::constants::{
    GRAPH_CATEGORY_SIZE, GRAPH_NOTE_BASE_SIZE, GRAPH_NOTE_MAX_SIZE, GRAPH_TAG_SIZE,
};
use crate::models::graph::{GraphData, GraphEdge, GraphNode, GraphNodeKind, GraphQuery};
use crate::models::{Category, Link, Note, Tag};

/// Everything the assembler reads, already scoped to one user
///
/// `notes` must carry their tags; when a category filter is in effect the
/// caller passes only the notes in that category.
pub struct GraphSource<'a> {
    pub notes: &'a [Note],
    pub categories: &'a [Category],
    pub tags: &'a [Tag],
    pub links: &'a [Link],
}

/// Display size of a note node, growing with content length
pub fn note_size(content: &str) -> i64 {
    let size = content.len() as i64 / 10 + GRAPH_NOTE_BASE_SIZE;
    size.min(GRAPH_NOTE_MAX_SIZE)
}

fn includes(filter: Option<GraphNodeKind>, kind: GraphNodeKind) -> bool {
    filter.map_or(true, |f| f == kind)
}

fn edge(source: String, target: String, edge_type: &str) -> GraphEdge {
    GraphEdge {
        source,
        target,
        edge_type: edge_type.to_string(),
        weight: 1,
    }
}

pub fn assemble(source: &GraphSource<'_>, query: &GraphQuery) -> GraphData {
    let tag_filter = query.tag.as_deref();
    let tag_matches = |tag: &Tag| tag_filter.map_or(true, |name| tag.name == name);
    let mut graph = GraphData::default();

    if includes(query.kind, GraphNodeKind::Note) {
        graph.nodes.extend(source.notes.iter().map(|note| GraphNode {
            id: GraphNodeKind::Note.node_id(note.id),
            label: note.title.clone(),
            kind: GraphNodeKind::Note,
            color: note.color.clone(),
            size: note_size(&note.content),
            x: 0.0,
            y: 0.0,
        }));
    }

    if includes(query.kind, GraphNodeKind::Category) {
        graph.nodes.extend(source.categories.iter().map(|cat| GraphNode {
            id: GraphNodeKind::Category.node_id(cat.id),
            label: cat.name.clone(),
            kind: GraphNodeKind::Category,
            color: cat.color.clone(),
            size: GRAPH_CATEGORY_SIZE,
            x: 0.0,
            y: 0.0,
        }));
    }

    if includes(query.kind, GraphNodeKind::Tag) {
        graph
            .nodes
            .extend(source.tags.iter().filter(|t| tag_matches(t)).map(|tag| GraphNode {
                id: GraphNodeKind::Tag.node_id(tag.id),
                label: tag.name.clone(),
                kind: GraphNodeKind::Tag,
                color: tag.color.clone(),
                size: GRAPH_TAG_SIZE,
                x: 0.0,
                y: 0.0,
            }));
    }

    for link in source.links {
        graph.edges.push(edge(
            GraphNodeKind::Note.node_id(link.from_note_id),
            GraphNodeKind::Note.node_id(link.to_note_id),
            &link.link_type,
        ));
    }

    for note in source.notes {
        if let Some(category_id) = note.category_id {
            graph.edges.push(edge(
                GraphNodeKind::Note.node_id(note.id),
                GraphNodeKind::Category.node_id(category_id),
                "category",
            ));
        }
    }

    for note in source.notes {
        for tag in note.tags.iter().filter(|t| tag_matches(t)) {
            graph.edges.push(edge(
                GraphNodeKind::Note.node_id(note.id),
                GraphNodeKind::Tag.node_id(tag.id),
                "tag",
            ));
        }
    }

    graph
}
