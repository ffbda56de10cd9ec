use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::util::strip_quotes;

use super::model::{DebateEdge, DebateGraph, DebateNode, NodeKind, RelationKind};
use super::timeline::resolve_timestamps;

#[derive(Clone, Debug, Deserialize)]
struct RawNodeRecord {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default, rename = "detail__title")]
    detail_title: String,
    #[serde(default, rename = "detail__text")]
    detail_text: String,
    #[serde(default, rename = "detail__value")]
    detail_value: String,
    #[serde(default, rename = "detail__tagline")]
    detail_tagline: String,
    #[serde(default, rename = "detail__summary")]
    detail_summary: String,
    #[serde(default, rename = "detail__author_id")]
    detail_author_id: String,
}

#[derive(Clone, Debug, Deserialize)]
struct RawEdgeRecord {
    source: String,
    target: String,
    #[serde(default, rename = "mainStat")]
    main_stat: String,
}

#[derive(Clone, Debug, Deserialize)]
struct RawAuthorRecord {
    id: serde_json::Value,
    #[serde(default)]
    pseudo: Option<String>,
    #[serde(default)]
    creation_timestamp: Option<i64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TutorialStep {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "focusType")]
    pub focus_type: String,
}

/// Author id -> display name and contribution timestamp.
#[derive(Clone, Debug, Default)]
pub struct AuthorDirectory {
    pub names: HashMap<String, String>,
    pub timestamps: HashMap<String, i64>,
}

impl AuthorDirectory {
    pub fn display_name(&self, author_id: &str) -> &str {
        self.names
            .get(strip_quotes(author_id))
            .map(String::as_str)
            .unwrap_or("Anonymous")
    }
}

pub struct DebateData {
    pub graph: DebateGraph,
    pub authors: AuthorDirectory,
    pub tutorial: Vec<TutorialStep>,
}

pub fn load_debate(data_dir: &str) -> Result<DebateData> {
    let dir = Path::new(data_dir);

    let node_records: Vec<RawNodeRecord> = read_json(&dir.join("nodes.json"))
        .context("failed to load debate node records")?;
    let edge_records: Vec<RawEdgeRecord> = read_json(&dir.join("edges.json"))
        .context("failed to load debate edge records")?;

    // Authors and the tutorial script are optional; the graph renders
    // without either.
    let author_records: Vec<RawAuthorRecord> =
        read_json(&dir.join("authors.json")).unwrap_or_default();
    let tutorial: Vec<TutorialStep> =
        read_json(&dir.join("tutorial.json")).unwrap_or_default();

    let authors = build_author_directory(&author_records);
    let mut graph = build_graph(node_records, edge_records)?;
    resolve_timestamps(&mut graph, &authors.timestamps);

    Ok(DebateData {
        graph,
        authors,
        tutorial,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn build_author_directory(records: &[RawAuthorRecord]) -> AuthorDirectory {
    let mut directory = AuthorDirectory::default();
    for record in records {
        let id = match &record.id {
            serde_json::Value::String(value) => strip_quotes(value).to_string(),
            serde_json::Value::Number(value) => value.to_string(),
            _ => continue,
        };
        if id.is_empty() {
            continue;
        }

        if let Some(name) = &record.pseudo {
            directory.names.insert(id.clone(), name.clone());
        }
        if let Some(timestamp) = record.creation_timestamp {
            directory.timestamps.insert(id.clone(), timestamp);
        }
    }
    directory
}

fn build_graph(
    node_records: Vec<RawNodeRecord>,
    edge_records: Vec<RawEdgeRecord>,
) -> Result<DebateGraph> {
    let mut nodes = Vec::with_capacity(node_records.len());
    let mut seen_ids = HashSet::new();

    for record in node_records {
        if record.id.is_empty() || !seen_ids.insert(record.id.clone()) {
            continue;
        }

        // The `title` column discriminates the node kind; records with an
        // unknown kind are skipped rather than failing the load.
        let Some(kind) = NodeKind::parse(&record.title) else {
            continue;
        };

        let author_id = {
            let cleaned = strip_quotes(&record.detail_author_id);
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned.to_string())
            }
        };

        nodes.push(DebateNode {
            id: record.id,
            kind,
            title: record.detail_title,
            text: record.detail_text,
            value: strip_quotes(&record.detail_value).to_string(),
            tagline: record.detail_tagline,
            summary: record.detail_summary,
            author_id,
            degree: 0,
            timestamp: None,
        });
    }

    if nodes.is_empty() {
        return Err(anyhow!("no usable debate nodes in input records"));
    }

    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), index))
        .collect::<HashMap<_, _>>();

    // De-duplicate on (source, target, relation); dangling endpoints are
    // dropped silently.
    let mut seen_edges = HashSet::new();
    let mut edges = Vec::new();
    for record in edge_records {
        let relation = RelationKind::parse(&record.main_stat);
        let (Some(&source), Some(&target)) = (
            index_by_id.get(record.source.as_str()),
            index_by_id.get(record.target.as_str()),
        ) else {
            continue;
        };
        if source == target {
            continue;
        }
        if seen_edges.insert((source, target, relation)) {
            edges.push(DebateEdge {
                source,
                target,
                relation,
            });
        }
    }

    Ok(DebateGraph::new(nodes, edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_json(id: &str, kind: &str) -> String {
        format!(r#"{{"id":"{id}","title":"{kind}","detail__title":"{id} title"}}"#)
    }

    fn parse_records(nodes: &[String], edges: &[String]) -> DebateGraph {
        let node_records: Vec<RawNodeRecord> =
            serde_json::from_str(&format!("[{}]", nodes.join(","))).unwrap();
        let edge_records: Vec<RawEdgeRecord> =
            serde_json::from_str(&format!("[{}]", edges.join(","))).unwrap();
        build_graph(node_records, edge_records).unwrap()
    }

    #[test]
    fn duplicate_edges_collapse() {
        let graph = parse_records(
            &[node_json("s", "SUBJECT"), node_json("p", "POSITION")],
            &[
                r#"{"source":"s","target":"p","mainStat":"HAS_POSITION"}"#.to_string(),
                r#"{"source":"s","target":"p","mainStat":"HAS_POSITION"}"#.to_string(),
                r#"{"source":"s","target":"p","mainStat":"MENTION"}"#.to_string(),
            ],
        );
        // The duplicate triple collapses; the differing relation survives.
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn dedup_is_idempotent() {
        let edges = [
            r#"{"source":"s","target":"p","mainStat":"HAS_POSITION"}"#.to_string(),
            r#"{"source":"s","target":"p","mainStat":"HAS_POSITION"}"#.to_string(),
        ];
        let nodes = [node_json("s", "SUBJECT"), node_json("p", "POSITION")];
        let once = parse_records(&nodes, &edges);
        let twice = parse_records(&nodes, &edges[..1]);
        assert_eq!(once.edges.len(), twice.edges.len());
    }

    #[test]
    fn dangling_edges_dropped() {
        let graph = parse_records(
            &[node_json("s", "SUBJECT")],
            &[r#"{"source":"s","target":"ghost"}"#.to_string()],
        );
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn unknown_node_kinds_skipped() {
        let graph = parse_records(
            &[node_json("s", "SUBJECT"), node_json("x", "WIDGET")],
            &[],
        );
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn author_directory_strips_quotes_and_maps_timestamps() {
        let records: Vec<RawAuthorRecord> = serde_json::from_str(
            r#"[{"id":"\"u1\"","pseudo":"Ada","creation_timestamp":42},{"id":7}]"#,
        )
        .unwrap();
        let directory = build_author_directory(&records);
        assert_eq!(directory.display_name("u1"), "Ada");
        assert_eq!(directory.timestamps.get("u1"), Some(&42));
        assert_eq!(directory.display_name("7"), "Anonymous");
    }
}
