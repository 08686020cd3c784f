//! Loading the DOID release in obograph JSON format
//!
//! Only nodes with DOID identifiers are kept. Identifiers are normalized
//! from `http://purl.obolibrary.org/obo/DOID_1324` (or `DOID:1324`) to
//! `1324`. Edges with predicate `is_a` form the hierarchy; all other edges
//! between DOID nodes are kept as auxiliary relations.

use crate::config::DoidManualConfig;
use crate::error::DoidError;
use crate::model::{DoidModel, DoidModelBuilder, DoidNode, DoidRelation};
use log::{debug, warn};
use serde::Deserialize;
use std::path::Path;

const DOID_URL_PREFIX: &str = "http://purl.obolibrary.org/obo/DOID_";
const DOID_CURIE_PREFIX: &str = "DOID:";
const IS_A: &str = "is_a";

#[derive(Debug, Deserialize)]
struct ObographDocument {
    #[serde(default)]
    graphs: Vec<ObographGraph>,
}

#[derive(Debug, Deserialize)]
struct ObographGraph {
    #[serde(default)]
    nodes: Vec<ObographNode>,
    #[serde(default)]
    edges: Vec<ObographEdge>,
}

#[derive(Debug, Deserialize)]
struct ObographNode {
    id: String,
    lbl: Option<String>,
    meta: Option<ObographMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct ObographMeta {
    #[serde(default)]
    synonyms: Vec<ObographValue>,
    #[serde(default)]
    xrefs: Vec<ObographValue>,
    #[serde(default)]
    deprecated: bool,
}

#[derive(Debug, Deserialize)]
struct ObographValue {
    val: String,
}

#[derive(Debug, Deserialize)]
struct ObographEdge {
    sub: String,
    pred: String,
    obj: String,
}

/// Bare DOID number of an obograph identifier, if it is a DOID
pub fn normalize_doid(id: &str) -> Option<&str> {
    id.strip_prefix(DOID_URL_PREFIX)
        .or_else(|| id.strip_prefix(DOID_CURIE_PREFIX))
}

/// Parse an obograph document into a builder
pub fn parse_obograph(json: &str) -> Result<DoidModelBuilder, DoidError> {
    let document: ObographDocument = serde_json::from_str(json)?;
    if document.graphs.is_empty() {
        return Err(DoidError::EmptyGraph("obograph document".to_string()));
    }

    let mut builder = DoidModelBuilder::new();
    let mut skipped_nodes = 0usize;
    let mut deprecated = 0usize;

    for graph in document.graphs {
        for node in graph.nodes {
            let Some(id) = normalize_doid(&node.id) else {
                skipped_nodes += 1;
                continue;
            };
            let meta = node.meta.unwrap_or_default();
            if meta.deprecated {
                deprecated += 1;
                continue;
            }
            let Some(label) = node.lbl else {
                skipped_nodes += 1;
                continue;
            };
            builder = builder.node(DoidNode {
                id: id.to_string(),
                term: label,
                synonyms: meta.synonyms.into_iter().map(|s| s.val).collect(),
                xrefs: meta.xrefs.into_iter().map(|x| x.val).collect(),
            });
        }

        for edge in graph.edges {
            let (Some(sub), Some(obj)) = (normalize_doid(&edge.sub), normalize_doid(&edge.obj)) else {
                continue;
            };
            builder = if edge.pred == IS_A {
                builder.is_a(sub, obj)
            } else {
                builder.relation(DoidRelation {
                    subject: sub.to_string(),
                    predicate: edge.pred,
                    object: obj.to_string(),
                })
            };
        }
    }

    if deprecated > 0 || skipped_nodes > 0 {
        debug!(
            "Skipped {} deprecated and {} non-DOID or unlabelled nodes",
            deprecated, skipped_nodes
        );
    }
    Ok(builder)
}

/// Load and build a model from an obograph file plus an optional manual config
pub fn load_obograph(
    path: impl AsRef<Path>,
    config: Option<DoidManualConfig>,
) -> Result<DoidModel, DoidError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| DoidError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut builder = parse_obograph(&json)?;
    match config {
        Some(config) => builder = builder.manual_config(config),
        None => warn!("No manual DOID config given; main cancer types and adeno-squamous mappings are empty"),
    }

    let model = builder.build()?;
    debug!("Loaded {} DOID terms from {}", model.node_count(), path.display());
    Ok(model)
}
