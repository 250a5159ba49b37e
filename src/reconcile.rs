//! The reconciliation engine.
//!
//! One call reconciles one remote entity into the local graph: fetch the
//! entity's current state, snapshot both sides, then apply the minimal set of
//! insertions, updates and deletions that makes the local projection match
//! the remote truth for that subject, leaving all unrelated local content
//! untouched.
//!
//! The twelve steps run in a fixed sequence with no branching back:
//! validate, resolve identity, snapshot local, partition, snapshot remote,
//! create-only shortcut, labels, descriptions, relation set, relation
//! values, blank structures, done. There is no transaction log and no
//! rollback: a failure mid-way leaves the graph partially updated, and only
//! the id validation of step 1 is guaranteed to fail before any mutation.

use std::collections::BTreeSet;

use oxigraph::model::{Graph, Literal, NamedNode, Term, Triple};

use crate::blank::{self, BlankResolver};
use crate::error::{GraphError, SyncResult};
use crate::ids::EntityId;
use crate::literal;
use crate::rdf::{RDFS_COMMENT, RDFS_LABEL, remove_with_predicate};
use crate::remote::WikibaseClient;
use crate::snapshot::{LocalSnapshot, RemoteSnapshot};
use crate::uri;

/// Reconciles remote entities into a local graph, one subject per call.
///
/// Fully synchronous; assumes exclusive access to the graph for the duration
/// of a call. Remote reads are attempted exactly once — no retries, no
/// timeouts, no caching across calls.
pub struct Reconciler {
    client: WikibaseClient,
}

impl Reconciler {
    pub fn new(client: WikibaseClient) -> Self {
        Self { client }
    }

    /// The remote reader this engine pulls entity state from.
    pub fn client(&self) -> &WikibaseClient {
        &self.client
    }

    /// Reconcile one entity, mutating the graph in place.
    ///
    /// A malformed id fails before any mutation or network call. An entity
    /// without a related link is logged and skipped — the call completes
    /// without touching the graph. Every other failure propagates as-is,
    /// possibly leaving the graph partially updated.
    pub fn execute(&self, graph: &mut Graph, raw_id: &str) -> SyncResult<()> {
        let id = EntityId::parse(raw_id)?;
        tracing::info!(endpoint = %self.client.endpoint(), %id, "starting sync");

        let related_link = self.client.related_link_of(&id.to_string())?;
        if related_link.is_empty() {
            tracing::warn!(
                %id,
                "no related link set on the entity; set one to enable the sync"
            );
            return Ok(());
        }
        let subject_name: String = uri::local_name(&related_link)?
            .split_whitespace()
            .collect();
        let subject = NamedNode::new(&related_link).map_err(|_| GraphError::InvalidIri {
            value: related_link.clone(),
        })?;
        tracing::info!(subject = %subject_name, "sync of the subject");

        let local = LocalSnapshot::collect(graph, &subject);
        let remote = RemoteSnapshot::fetch(&self.client, &id)?;

        if !local.exists {
            tracing::warn!(%id, subject = %subject_name, "subject missing locally; creating it");
            self.create_subject(graph, &subject, &remote)?;
            return Ok(());
        }

        reconcile_labels(graph, &subject, &subject_name, &local, &remote)?;
        reconcile_descriptions(graph, &subject, &subject_name, &local, &remote)?;
        reconcile_relation_set(graph, &subject, &subject_name, &local, &remote)?;
        reconcile_relation_values(graph, &subject, &subject_name, &local, &remote)?;

        blank::purge(graph, &local);
        self.rebuild_blank_structures(graph, &subject, &remote)?;
        Ok(())
    }

    /// Create-only path: the subject is absent locally, so the entire remote
    /// snapshot becomes new triples. None of the diff steps run.
    fn create_subject(
        &self,
        graph: &mut Graph,
        subject: &NamedNode,
        remote: &RemoteSnapshot,
    ) -> SyncResult<()> {
        for (lang, text) in &remote.labels {
            graph.insert(&Triple::new(
                subject.clone(),
                RDFS_LABEL.into_owned(),
                Term::Literal(tagged_literal(text, lang)?),
            ));
        }
        for (lang, text) in &remote.descriptions {
            graph.insert(&Triple::new(
                subject.clone(),
                RDFS_COMMENT.into_owned(),
                Term::Literal(tagged_literal(text, lang)?),
            ));
        }
        for (claim_link, values) in &remote.direct {
            let predicate = parse_predicate(claim_link)?;
            for value in values {
                let (term, _) = literal::infer(value);
                graph.insert(&Triple::new(subject.clone(), predicate.clone(), term));
            }
        }
        self.rebuild_blank_structures(graph, subject, remote)
    }

    fn rebuild_blank_structures(
        &self,
        graph: &mut Graph,
        subject: &NamedNode,
        remote: &RemoteSnapshot,
    ) -> SyncResult<()> {
        let resolver = BlankResolver::new(&self.client);
        for (claim_link, values) in &remote.blank {
            for value in values {
                resolver.resolve_and_emit(graph, subject, claim_link, value)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("client", &self.client)
            .finish()
    }
}

fn tagged_literal(text: &str, lang: &str) -> Result<Literal, GraphError> {
    Literal::new_language_tagged_literal(text, lang).map_err(|_| GraphError::InvalidLanguageTag {
        tag: lang.to_string(),
    })
}

fn parse_predicate(value: &str) -> Result<NamedNode, GraphError> {
    NamedNode::new(value).map_err(|_| GraphError::InvalidIri {
        value: value.to_string(),
    })
}

/// Step 7: per-language label diff. Same language with different text is
/// replaced, remote-only languages are added, local-only languages are
/// removed. Each change is a separate graph mutation.
pub(crate) fn reconcile_labels(
    graph: &mut Graph,
    subject: &NamedNode,
    subject_name: &str,
    local: &LocalSnapshot,
    remote: &RemoteSnapshot,
) -> SyncResult<()> {
    for (lang, remote_text) in &remote.labels {
        match local.labels.get(lang) {
            Some(local_text) if local_text != remote_text => {
                tracing::warn!(
                    subject = %subject_name,
                    %lang,
                    "same language of label but with different values"
                );
                graph.remove(&Triple::new(
                    subject.clone(),
                    RDFS_LABEL.into_owned(),
                    Term::Literal(tagged_literal(local_text, lang)?),
                ));
                graph.insert(&Triple::new(
                    subject.clone(),
                    RDFS_LABEL.into_owned(),
                    Term::Literal(tagged_literal(remote_text, lang)?),
                ));
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    subject = %subject_name,
                    %lang,
                    "new language of label not in the local graph"
                );
                graph.insert(&Triple::new(
                    subject.clone(),
                    RDFS_LABEL.into_owned(),
                    Term::Literal(tagged_literal(remote_text, lang)?),
                ));
            }
        }
    }
    for (lang, local_text) in &local.labels {
        if !remote.labels.contains_key(lang) {
            tracing::warn!(
                subject = %subject_name,
                %lang,
                "deleting label of a language that no longer exists remotely"
            );
            graph.remove(&Triple::new(
                subject.clone(),
                RDFS_LABEL.into_owned(),
                Term::Literal(tagged_literal(local_text, lang)?),
            ));
        }
    }
    Ok(())
}

/// Step 8: description diff. An entity with no remote descriptions at all
/// loses the local description relation entirely (coarse removal, not
/// per-language); otherwise the per-language rule of the labels applies.
pub(crate) fn reconcile_descriptions(
    graph: &mut Graph,
    subject: &NamedNode,
    subject_name: &str,
    local: &LocalSnapshot,
    remote: &RemoteSnapshot,
) -> SyncResult<()> {
    if remote.descriptions.is_empty() {
        tracing::info!(subject = %subject_name, "no remote descriptions; removing local ones");
        remove_with_predicate(graph, subject.as_ref(), RDFS_COMMENT);
        return Ok(());
    }
    for (lang, remote_text) in &remote.descriptions {
        match local.descriptions.get(lang) {
            Some(local_text) if local_text != remote_text => {
                tracing::warn!(
                    subject = %subject_name,
                    %lang,
                    "same language of description but with different values"
                );
                graph.remove(&Triple::new(
                    subject.clone(),
                    RDFS_COMMENT.into_owned(),
                    Term::Literal(tagged_literal(local_text, lang)?),
                ));
                graph.insert(&Triple::new(
                    subject.clone(),
                    RDFS_COMMENT.into_owned(),
                    Term::Literal(tagged_literal(remote_text, lang)?),
                ));
            }
            Some(_) => {}
            None => {
                tracing::info!(
                    subject = %subject_name,
                    %lang,
                    "new language of description not in the local graph"
                );
                graph.insert(&Triple::new(
                    subject.clone(),
                    RDFS_COMMENT.into_owned(),
                    Term::Literal(tagged_literal(remote_text, lang)?),
                ));
            }
        }
    }
    for (lang, local_text) in &local.descriptions {
        if !remote.descriptions.contains_key(lang) {
            tracing::info!(
                subject = %subject_name,
                %lang,
                "deleting description of a language that no longer exists remotely"
            );
            graph.remove(&Triple::new(
                subject.clone(),
                RDFS_COMMENT.into_owned(),
                Term::Literal(tagged_literal(local_text, lang)?),
            ));
        }
    }
    Ok(())
}

/// Step 9: relation-set diff between the remote relation set and the local
/// non-blank relation predicates. Local-only predicates are fully removed;
/// remote-only predicates are fully added through the type inferencer.
pub(crate) fn reconcile_relation_set(
    graph: &mut Graph,
    subject: &NamedNode,
    subject_name: &str,
    local: &LocalSnapshot,
    remote: &RemoteSnapshot,
) -> SyncResult<()> {
    let local_set: BTreeSet<&String> = local.direct.keys().collect();
    let remote_set: BTreeSet<&String> = remote.relation_set.iter().collect();
    if local_set == remote_set {
        tracing::info!(subject = %subject_name, "same relations on both sides");
        return Ok(());
    }

    for predicate in local_set.difference(&remote_set) {
        tracing::warn!(
            subject = %subject_name,
            predicate = %predicate,
            "deleting relation that no longer exists remotely"
        );
        let predicate = parse_predicate(predicate)?;
        remove_with_predicate(graph, subject.as_ref(), predicate.as_ref());
    }

    for claim_link in remote_set.difference(&local_set) {
        // A relation whose values are all anonymous references has nothing
        // to add here; the blank rebuild owns it.
        let Some(values) = remote.direct.get(*claim_link) else {
            continue;
        };
        tracing::warn!(
            subject = %subject_name,
            predicate = %claim_link,
            "adding relation that only exists remotely"
        );
        let predicate = parse_predicate(claim_link)?;
        for value in values {
            let (term, _) = literal::infer(value);
            graph.insert(&Triple::new(subject.clone(), predicate.clone(), term));
        }
    }
    Ok(())
}

/// Step 10: value diff for predicates present on both sides. The lists are
/// compared as a whole; any difference replaces every local value with the
/// full remote list — a predicate-level rewrite, not a per-value diff.
pub(crate) fn reconcile_relation_values(
    graph: &mut Graph,
    subject: &NamedNode,
    subject_name: &str,
    local: &LocalSnapshot,
    remote: &RemoteSnapshot,
) -> SyncResult<()> {
    for (claim_link, remote_values) in &remote.direct {
        let Some(local_values) = local.direct.get(claim_link) else {
            continue;
        };
        if value_lists_match(local_values, remote_values) {
            continue;
        }
        tracing::warn!(
            subject = %subject_name,
            predicate = %claim_link,
            "updating the objects of a relation with different remote values"
        );
        let predicate = parse_predicate(claim_link)?;
        remove_with_predicate(graph, subject.as_ref(), predicate.as_ref());
        for value in remote_values {
            let (term, _) = literal::infer(value);
            graph.insert(&Triple::new(subject.clone(), predicate.clone(), term));
        }
    }
    Ok(())
}

/// Whether a local value list and a remote one carry the same values in the
/// same order, comparing local terms by lexical form (URI text or literal
/// value).
pub(crate) fn value_lists_match(local: &[Term], remote: &[String]) -> bool {
    local.len() == remote.len()
        && local
            .iter()
            .zip(remote)
            .all(|(term, raw)| lexical_form(term) == *raw)
}

fn lexical_form(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::Literal(lit) => lit.value().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::partition_claim_values;
    use oxigraph::model::TermRef;
    use std::collections::BTreeMap;

    const SUBJECT: &str = "http://example.org/onto#Thing";

    fn subject() -> NamedNode {
        NamedNode::new(SUBJECT).unwrap()
    }

    fn tagged(text: &str, lang: &str) -> Term {
        Term::Literal(Literal::new_language_tagged_literal(text, lang).unwrap())
    }

    fn graph_with_labels(pairs: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (lang, text) in pairs {
            graph.insert(&Triple::new(
                subject(),
                RDFS_LABEL.into_owned(),
                tagged(text, lang),
            ));
        }
        graph
    }

    fn labels_of(graph: &Graph) -> BTreeMap<String, String> {
        LocalSnapshot::collect(graph, &subject()).labels
    }

    #[test]
    fn labels_replace_add_and_keep() {
        let mut graph = graph_with_labels(&[("en", "A")]);
        let local = LocalSnapshot::collect(&graph, &subject());
        let remote = RemoteSnapshot {
            labels: BTreeMap::from([
                ("en".to_string(), "B".to_string()),
                ("fr".to_string(), "C".to_string()),
            ]),
            ..Default::default()
        };

        reconcile_labels(&mut graph, &subject(), "Thing", &local, &remote).unwrap();

        let labels = labels_of(&graph);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["en"], "B");
        assert_eq!(labels["fr"], "C");
    }

    #[test]
    fn labels_absent_remotely_are_removed() {
        let mut graph = graph_with_labels(&[("en", "A"), ("de", "D")]);
        let local = LocalSnapshot::collect(&graph, &subject());
        let remote = RemoteSnapshot {
            labels: BTreeMap::from([("en".to_string(), "A".to_string())]),
            ..Default::default()
        };

        reconcile_labels(&mut graph, &subject(), "Thing", &local, &remote).unwrap();

        let labels = labels_of(&graph);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels["en"], "A");
    }

    #[test]
    fn empty_remote_descriptions_remove_the_relation_entirely() {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            subject(),
            RDFS_COMMENT.into_owned(),
            tagged("a thing", "en"),
        ));
        graph.insert(&Triple::new(
            subject(),
            RDFS_COMMENT.into_owned(),
            tagged("una cosa", "es"),
        ));
        let local = LocalSnapshot::collect(&graph, &subject());
        let remote = RemoteSnapshot::default();

        reconcile_descriptions(&mut graph, &subject(), "Thing", &local, &remote).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn descriptions_follow_the_per_language_rule() {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            subject(),
            RDFS_COMMENT.into_owned(),
            tagged("old", "en"),
        ));
        let local = LocalSnapshot::collect(&graph, &subject());
        let remote = RemoteSnapshot {
            descriptions: BTreeMap::from([("en".to_string(), "new".to_string())]),
            ..Default::default()
        };

        reconcile_descriptions(&mut graph, &subject(), "Thing", &local, &remote).unwrap();

        let snapshot = LocalSnapshot::collect(&graph, &subject());
        assert_eq!(snapshot.descriptions["en"], "new");
        assert_eq!(snapshot.descriptions.len(), 1);
    }

    #[test]
    fn relation_set_removes_local_only_and_adds_remote_only() {
        let gone = "http://example.org/onto#gone";
        let incoming = "http://example.org/onto#incoming";
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            subject(),
            NamedNode::new(gone).unwrap(),
            Term::NamedNode(NamedNode::new("http://example.org/Old").unwrap()),
        ));
        let local = LocalSnapshot::collect(&graph, &subject());
        let remote = RemoteSnapshot {
            relation_set: BTreeSet::from([incoming.to_string()]),
            direct: BTreeMap::from([(
                incoming.to_string(),
                vec!["1".to_string(), "http://example.org/New".to_string()],
            )]),
            ..Default::default()
        };

        reconcile_relation_set(&mut graph, &subject(), "Thing", &local, &remote).unwrap();

        let snapshot = LocalSnapshot::collect(&graph, &subject());
        assert!(!snapshot.direct.contains_key(gone));
        let added = &snapshot.direct[incoming];
        assert_eq!(added.len(), 2);
        assert!(added.iter().any(|t| matches!(t, Term::NamedNode(_))));
        assert!(added.iter().any(|t| matches!(t, Term::Literal(_))));
    }

    #[test]
    fn blank_only_remote_relation_adds_nothing_directly() {
        let rel = "http://example.org/onto#hasPart";
        let mut graph = Graph::new();
        let local = LocalSnapshot::collect(&graph, &subject());
        let (direct, blank) = partition_claim_values(BTreeMap::from([(
            rel.to_string(),
            vec!["http://wb.example/genid/abc".to_string()],
        )]));
        let remote = RemoteSnapshot {
            relation_set: BTreeSet::from([rel.to_string()]),
            direct,
            blank,
            ..Default::default()
        };

        reconcile_relation_set(&mut graph, &subject(), "Thing", &local, &remote).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn differing_value_lists_are_rewritten_wholesale() {
        let rel = "http://example.org/onto#width";
        let mut graph = Graph::new();
        let predicate = NamedNode::new(rel).unwrap();
        graph.insert(&Triple::new(subject(), predicate.clone(), literal::infer("3").0));
        let local = LocalSnapshot::collect(&graph, &subject());
        let remote = RemoteSnapshot {
            relation_set: BTreeSet::from([rel.to_string()]),
            direct: BTreeMap::from([(rel.to_string(), vec!["4".to_string()])]),
            ..Default::default()
        };

        reconcile_relation_values(&mut graph, &subject(), "Thing", &local, &remote).unwrap();

        let values: Vec<_> = graph.triples_for_subject(subject().as_ref()).collect();
        assert_eq!(values.len(), 1);
        let TermRef::Literal(lit) = values[0].object else {
            panic!("expected literal")
        };
        assert_eq!(lit.value(), "4");
    }

    #[test]
    fn matching_value_lists_leave_the_graph_untouched() {
        let rel = "http://example.org/onto#width";
        let mut graph = Graph::new();
        let predicate = NamedNode::new(rel).unwrap();
        graph.insert(&Triple::new(subject(), predicate.clone(), literal::infer("3").0));
        let before = graph.clone();
        let local = LocalSnapshot::collect(&graph, &subject());
        let remote = RemoteSnapshot {
            relation_set: BTreeSet::from([rel.to_string()]),
            direct: BTreeMap::from([(rel.to_string(), vec!["3".to_string()])]),
            ..Default::default()
        };

        reconcile_relation_values(&mut graph, &subject(), "Thing", &local, &remote).unwrap();
        assert_eq!(graph, before);
    }

    #[test]
    fn value_comparison_uses_lexical_forms() {
        let local = vec![
            literal::infer("2.0").0,
            literal::infer("http://example.org/X").0,
        ];
        let remote = vec!["2.0".to_string(), "http://example.org/X".to_string()];
        assert!(value_lists_match(&local, &remote));

        let differing = vec!["2.5".to_string(), "http://example.org/X".to_string()];
        assert!(!value_lists_match(&local, &differing));
    }
}
