//! The DOID graph and its queries

use crate::config::{AdenoSquamousMapping, DoidManualConfig};
use crate::error::DoidError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use trialmatch_types::EvaluationResult;

/// A disease term of the ontology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoidNode {
    /// Bare DOID number, e.g. `"162"`
    pub id: String,
    pub term: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub xrefs: Vec<String>,
}

impl DoidNode {
    pub fn new(id: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            synonyms: Vec::new(),
            xrefs: Vec::new(),
        }
    }

    pub fn with_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.synonyms.push(synonym.into());
        self
    }
}

/// Non-hierarchical relation between two terms (kept, never traversed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoidRelation {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Collects nodes and edges, then validates and indexes them
#[derive(Debug, Default)]
pub struct DoidModelBuilder {
    nodes: HashMap<String, DoidNode>,
    parents: HashMap<String, Vec<String>>,
    relations: Vec<DoidRelation>,
    config: DoidManualConfig,
}

impl DoidModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: DoidNode) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    /// Add an is-a edge from `child` to `parent`
    pub fn is_a(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        let parents = self.parents.entry(child.into()).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
        self
    }

    pub fn relation(mut self, relation: DoidRelation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn manual_config(mut self, config: DoidManualConfig) -> Self {
        self.config = config;
        self
    }

    /// Compute ancestor closures and indexes.
    ///
    /// Fails with [`DoidError::Cycle`] when the is-a edges are not acyclic.
    pub fn build(self) -> Result<DoidModel, DoidError> {
        let Self {
            nodes,
            parents,
            relations,
            config,
        } = self;

        let mut ids: BTreeSet<&str> = nodes.keys().map(String::as_str).collect();
        for (child, ps) in &parents {
            ids.insert(child);
            ids.extend(ps.iter().map(String::as_str));
        }
        ids.extend(config.additional_doids.keys().map(String::as_str));

        let mut is_a_closures: HashMap<String, HashSet<String>> = HashMap::new();
        let mut stack = Vec::new();
        for id in &ids {
            close_over_parents(id, &parents, &mut is_a_closures, &mut stack)?;
        }

        let closures = merge_additional_doids(&is_a_closures, &config.additional_doids);

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for (child, ps) in &parents {
            for parent in ps {
                children.entry(parent.clone()).or_default().push(child.clone());
            }
        }
        for list in children.values_mut() {
            list.sort();
        }

        // Lowest id wins when labels collide
        let mut sorted: Vec<&DoidNode> = nodes.values().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        let mut term_index: HashMap<String, String> = HashMap::new();
        let mut synonym_index = HashMap::new();
        for node in sorted {
            let kept = term_index
                .entry(node.term.to_lowercase())
                .or_insert_with(|| node.id.clone());
            if *kept != node.id {
                warn!(
                    "DOID {} shares term '{}' with DOID {}, which keeps it",
                    node.id, node.term, kept
                );
            }
            for synonym in &node.synonyms {
                synonym_index
                    .entry(synonym.to_lowercase())
                    .or_insert_with(|| node.id.clone());
            }
        }

        debug!(
            "Built DOID model: {} nodes, {} is-a edges, {} relations, {} main cancer types",
            nodes.len(),
            parents.values().map(Vec::len).sum::<usize>(),
            relations.len(),
            config.main_cancer_doids.len()
        );

        Ok(DoidModel {
            nodes,
            parents,
            children,
            relations,
            closures,
            term_index,
            synonym_index,
            config,
        })
    }
}

fn close_over_parents(
    id: &str,
    parents: &HashMap<String, Vec<String>>,
    closures: &mut HashMap<String, HashSet<String>>,
    stack: &mut Vec<String>,
) -> Result<(), DoidError> {
    if closures.contains_key(id) {
        return Ok(());
    }
    if let Some(start) = stack.iter().position(|s| s == id) {
        let mut path = stack[start..].to_vec();
        path.push(id.to_string());
        return Err(DoidError::Cycle { path });
    }

    stack.push(id.to_string());
    let mut closure = HashSet::from([id.to_string()]);
    for parent in parents.get(id).into_iter().flatten() {
        close_over_parents(parent, parents, closures, stack)?;
        if let Some(ancestors) = closures.get(parent.as_str()) {
            closure.extend(ancestors.iter().cloned());
        }
    }
    stack.pop();

    closures.insert(id.to_string(), closure);
    Ok(())
}

/// Extend each closure with the additional doids of its members and their ancestors
fn merge_additional_doids(
    is_a_closures: &HashMap<String, HashSet<String>>,
    additional: &HashMap<String, HashSet<String>>,
) -> HashMap<String, HashSet<String>> {
    is_a_closures
        .iter()
        .map(|(id, closure)| {
            let mut merged = closure.clone();
            for member in closure {
                for extra in additional.get(member).into_iter().flatten() {
                    match is_a_closures.get(extra) {
                        Some(extra_closure) => merged.extend(extra_closure.iter().cloned()),
                        None => {
                            merged.insert(extra.clone());
                        }
                    }
                }
            }
            (id.clone(), merged)
        })
        .collect()
}

/// Read-only disease ontology with precomputed ancestor closures
#[derive(Debug)]
pub struct DoidModel {
    nodes: HashMap<String, DoidNode>,
    parents: HashMap<String, Vec<String>>,
    children: HashMap<String, Vec<String>>,
    relations: Vec<DoidRelation>,
    closures: HashMap<String, HashSet<String>>,
    term_index: HashMap<String, String>,
    synonym_index: HashMap<String, String>,
    config: DoidManualConfig,
}

impl DoidModel {
    pub fn builder() -> DoidModelBuilder {
        DoidModelBuilder::new()
    }

    /// Model without any terms; every id is its own closure
    pub fn empty() -> Self {
        Self {
            nodes: HashMap::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            relations: Vec::new(),
            closures: HashMap::new(),
            term_index: HashMap::new(),
            synonym_index: HashMap::new(),
            config: DoidManualConfig::default(),
        }
    }

    fn closure_contains(&self, id: &str, target: &str) -> bool {
        match self.closures.get(id) {
            Some(closure) => closure.contains(target),
            None => id == target,
        }
    }

    fn closure_hits(&self, id: &str, targets: &[&str]) -> bool {
        targets.iter().any(|target| self.closure_contains(id, target))
    }

    /// The id together with all its ancestors; `{id}` for unknown ids
    pub fn doid_with_parents(&self, id: &str) -> HashSet<String> {
        self.closures
            .get(id)
            .cloned()
            .unwrap_or_else(|| HashSet::from([id.to_string()]))
    }

    /// True if any of `ids` is `target` or a descendant of it
    pub fn is_of_type<I, S>(&self, ids: I, target: &str) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter().any(|id| self.closure_contains(id.as_ref(), target))
    }

    /// Whether all of `ids` are of type `target` and none of type `exclude`.
    ///
    /// | ids                                        | result |
    /// |--------------------------------------------|--------|
    /// | empty                                      | FAIL   |
    /// | some id not under `target`                 | FAIL   |
    /// | some id under any of `exclude`             | FAIL   |
    /// | otherwise, some id under any of `warn`     | WARN   |
    /// | otherwise                                  | PASS   |
    pub fn is_exclusively_of_type<I, S>(
        &self,
        ids: I,
        target: &str,
        exclude: &[&str],
        warn: &[&str],
    ) -> EvaluationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen_any = false;
        let mut warns = false;
        for id in ids {
            let id = id.as_ref();
            seen_any = true;
            if !self.closure_contains(id, target) || self.closure_hits(id, exclude) {
                return EvaluationResult::Fail;
            }
            warns |= self.closure_hits(id, warn);
        }

        match (seen_any, warns) {
            (false, _) => EvaluationResult::Fail,
            (true, true) => EvaluationResult::Warn,
            (true, false) => EvaluationResult::Pass,
        }
    }

    /// Main cancer types the id belongs to, sorted
    pub fn main_cancer_doids(&self, id: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .doid_with_parents(id)
            .into_iter()
            .filter(|doid| self.config.main_cancer_doids.contains(doid))
            .collect();
        found.sort();
        found
    }

    /// Mappings in which the id is the squamous or the adeno part
    pub fn adeno_squamous_mappings_for_doid(&self, id: &str) -> Vec<&AdenoSquamousMapping> {
        self.config
            .adeno_squamous_mappings
            .iter()
            .filter(|m| m.squamous_doid == id || m.adeno_doid == id)
            .collect()
    }

    /// Case-insensitive lookup by label, then by synonym
    pub fn resolve_doid_for_term(&self, term: &str) -> Option<&str> {
        let key = term.trim().to_lowercase();
        self.term_index
            .get(&key)
            .or_else(|| self.synonym_index.get(&key))
            .map(String::as_str)
    }

    pub fn resolve_term_for_doid(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).map(|node| node.term.as_str())
    }

    pub fn has_doid(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&DoidNode> {
        self.nodes.get(id)
    }

    /// Direct is-a parents
    pub fn parents_of(&self, id: &str) -> &[String] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct is-a children, sorted
    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn relations(&self) -> &[DoidRelation] {
        &self.relations
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn manual_config(&self) -> &DoidManualConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stage_model() -> DoidModel {
        DoidModel::builder()
            .node(DoidNode::new("CANCER", "cancer"))
            .node(DoidNode::new("II", "stage two"))
            .node(DoidNode::new("IIB", "stage two b"))
            .is_a("IIB", "II")
            .is_a("II", "CANCER")
            .build()
            .unwrap()
    }

    #[test]
    fn test_shared_term_resolves_to_lowest_id() {
        for _ in 0..8 {
            let model = DoidModel::builder()
                .node(DoidNode::new("9351", "Diabetes"))
                .node(DoidNode::new("1612", "breast cancer"))
                .node(DoidNode::new("0070000", "diabetes"))
                .node(DoidNode::new("50000", "diabetes"))
                .build()
                .unwrap();
            assert_eq!(model.resolve_doid_for_term("diabetes"), Some("0070000"));
        }
    }

    #[test]
    fn test_closure_of_sub_stage() {
        let model = stage_model();
        let expected: HashSet<String> = ["IIB", "II", "CANCER"].iter().map(|s| s.to_string()).collect();
        assert_eq!(model.doid_with_parents("IIB"), expected);
        assert!(model.is_of_type(["IIB"], "CANCER"));
        assert!(!model.is_of_type(["CANCER"], "IIB"));
    }

    #[test]
    fn test_unknown_id_is_its_own_closure() {
        let model = stage_model();
        assert_eq!(model.doid_with_parents("999"), HashSet::from(["999".to_string()]));
        assert!(model.is_of_type(["999"], "999"));
        assert!(!model.has_doid("999"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let result = DoidModel::builder().is_a("a", "b").is_a("b", "c").is_a("c", "a").build();
        match result {
            Err(DoidError::Cycle { path }) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
            }
            other => panic!("expected cycle, got {:?}", other.map(|m| m.node_count())),
        }
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let model = DoidModel::builder()
            .is_a("d", "b")
            .is_a("d", "c")
            .is_a("b", "a")
            .is_a("c", "a")
            .build()
            .unwrap();
        assert_eq!(model.doid_with_parents("d").len(), 4);
    }

    #[test]
    fn test_exclusively_of_type() {
        let model = DoidModel::builder()
            .is_a("lung adeno", "lung")
            .is_a("lung squamous", "lung")
            .is_a("lung", "cancer")
            .is_a("colon", "cancer")
            .build()
            .unwrap();

        let check = |ids: &[&str]| {
            model.is_exclusively_of_type(ids.iter().copied(), "lung", &["lung squamous"], &["lung adeno"])
        };
        assert_eq!(check(&[]), EvaluationResult::Fail);
        assert_eq!(check(&["lung"]), EvaluationResult::Pass);
        assert_eq!(check(&["lung adeno"]), EvaluationResult::Warn);
        assert_eq!(check(&["lung", "colon"]), EvaluationResult::Fail);
        assert_eq!(check(&["lung adeno", "lung squamous"]), EvaluationResult::Fail);
    }

    #[test]
    fn test_additional_doids_are_merged() {
        let mut config = DoidManualConfig::default();
        config
            .additional_doids
            .insert("melanoma of eye".into(), HashSet::from(["eye cancer".to_string()]));
        let model = DoidModel::builder()
            .is_a("melanoma of eye", "melanoma")
            .is_a("eye cancer", "cancer")
            .manual_config(config)
            .build()
            .unwrap();
        let closure = model.doid_with_parents("melanoma of eye");
        assert!(closure.contains("melanoma"));
        assert!(closure.contains("eye cancer"));
        assert!(closure.contains("cancer"));
    }

    #[test]
    fn test_term_resolution_is_case_insensitive() {
        let model = DoidModel::builder()
            .node(DoidNode::new("1324", "lung cancer").with_synonym("lung neoplasm"))
            .build()
            .unwrap();
        assert_eq!(model.resolve_doid_for_term("Lung Cancer"), Some("1324"));
        assert_eq!(model.resolve_doid_for_term("LUNG NEOPLASM"), Some("1324"));
        assert_eq!(model.resolve_doid_for_term("lung"), None);
        assert_eq!(model.resolve_term_for_doid("1324"), Some("lung cancer"));
    }

    #[test]
    fn test_main_cancer_and_adeno_squamous() {
        let config = DoidManualConfig {
            main_cancer_doids: HashSet::from(["lung".to_string()]),
            adeno_squamous_mappings: vec![AdenoSquamousMapping {
                squamous_doid: "lung squamous".into(),
                adeno_doid: "lung adeno".into(),
                adeno_squamous_doid: "lung adenosquamous".into(),
            }],
            additional_doids: HashMap::new(),
        };
        let model = DoidModel::builder()
            .is_a("lung adeno", "lung")
            .manual_config(config)
            .build()
            .unwrap();

        assert_eq!(model.main_cancer_doids("lung adeno"), vec!["lung".to_string()]);
        assert!(model.main_cancer_doids("colon").is_empty());
        assert_eq!(model.adeno_squamous_mappings_for_doid("lung adeno").len(), 1);
        assert_eq!(model.adeno_squamous_mappings_for_doid("lung squamous").len(), 1);
        assert!(model.adeno_squamous_mappings_for_doid("lung adenosquamous").is_empty());
    }
}
