//! Anonymous (blank-node) structures.
//!
//! A remote claim value carrying the reserved `/genid/` path marker stands
//! for an anonymous sub-entity with no URI of its own. Blank structures have
//! no stable identity across reconciliation calls: the engine always deletes
//! every anonymous node previously attached to a subject and recreates the
//! structures from the current remote state. No blank node identifier
//! survives two calls.

use std::collections::BTreeMap;

use oxigraph::model::{BlankNode, Graph, NamedNode, Term, Triple};

use crate::error::{GraphError, SyncResult};
use crate::literal;
use crate::rdf::remove_blank_island;
use crate::remote::{GENID_MARKER, WikibaseClient};
use crate::snapshot::LocalSnapshot;
use crate::uri;

/// Remove every anonymous node attached to the snapshot's subject, with all
/// triples hanging off it.
pub fn purge(graph: &mut Graph, local: &LocalSnapshot) {
    for node in local.blank_nodes() {
        remove_blank_island(graph, node.as_ref());
    }
}

/// Insert one fresh anonymous structure: a new blank node linked from the
/// subject, carrying one triple per relation/value pair.
///
/// Values go through the literal type inferencer, so resource references and
/// typed literals come out the same way they do for direct relations.
pub(crate) fn emit_structure(
    graph: &mut Graph,
    subject: &NamedNode,
    predicate: &str,
    pairs: &BTreeMap<String, Vec<String>>,
) -> SyncResult<BlankNode> {
    let predicate = parse_iri(predicate)?;
    let node = BlankNode::default();
    graph.insert(&Triple::new(
        subject.clone(),
        predicate,
        Term::BlankNode(node.clone()),
    ));
    for (claim_link, values) in pairs {
        let claim_predicate = parse_iri(claim_link)?;
        for value in values {
            let (term, _) = literal::infer(value);
            graph.insert(&Triple::new(node.clone(), claim_predicate.clone(), term));
        }
    }
    Ok(node)
}

fn parse_iri(value: &str) -> Result<NamedNode, GraphError> {
    NamedNode::new(value).map_err(|_| GraphError::InvalidIri {
        value: value.to_string(),
    })
}

/// Resolves remote blank values to their backing entities and rebuilds the
/// corresponding anonymous structures in the local graph.
pub struct BlankResolver<'a> {
    client: &'a WikibaseClient,
}

impl<'a> BlankResolver<'a> {
    pub fn new(client: &'a WikibaseClient) -> Self {
        Self { client }
    }

    /// Resolve one blank value and emit its structure under `subject`.
    ///
    /// The backing entity is found by a label search for the `/genid/`
    /// marker joined with the local name of the blank reference; the first
    /// hit wins. Exactly one fresh blank node is created per call.
    pub fn resolve_and_emit(
        &self,
        graph: &mut Graph,
        subject: &NamedNode,
        predicate: &str,
        blank_ref: &str,
    ) -> SyncResult<()> {
        let label = format!("{GENID_MARKER}{}", uri::local_name(blank_ref)?);
        let backing = self.client.search_entity_id(&label)?;
        let pairs = self.client.claim_values(&backing)?;
        let node = emit_structure(graph, subject, predicate, &pairs)?;
        tracing::warn!(
            subject = %subject,
            node = %node,
            backing = %backing,
            "recreated anonymous structure"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::TermRef;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    #[test]
    fn purge_removes_every_attached_anonymous_node() {
        let subject = node("http://example.org/Thing");
        let pred = node("http://example.org/hasPart");
        let inner = node("http://example.org/size");
        let b1 = BlankNode::default();
        let b2 = BlankNode::default();

        let mut graph = Graph::new();
        for b in [&b1, &b2] {
            graph.insert(&Triple::new(
                subject.clone(),
                pred.clone(),
                Term::BlankNode(b.clone()),
            ));
            let (term, _) = literal::infer("42");
            graph.insert(&Triple::new(b.clone(), inner.clone(), term));
        }

        let local = LocalSnapshot::collect(&graph, &subject);
        purge(&mut graph, &local);
        assert!(graph.is_empty());
    }

    #[test]
    fn emit_structure_mints_one_fresh_node() {
        let subject = node("http://example.org/Thing");
        let mut pairs = BTreeMap::new();
        pairs.insert(
            "http://example.org/width".to_string(),
            vec!["3".to_string()],
        );
        pairs.insert(
            "http://example.org/seeAlso".to_string(),
            vec!["http://example.org/Other".to_string()],
        );

        let mut graph = Graph::new();
        let minted = emit_structure(
            &mut graph,
            &subject,
            "http://example.org/hasPart",
            &pairs,
        )
        .unwrap();

        // Link from the subject plus one triple per pair.
        assert_eq!(graph.len(), 3);
        let inner: Vec<_> = graph.triples_for_subject(minted.as_ref()).collect();
        assert_eq!(inner.len(), 2);
        assert!(inner.iter().any(|t| matches!(t.object, TermRef::NamedNode(_))));
    }

    #[test]
    fn emit_structure_rejects_non_iri_predicates() {
        let subject = node("http://example.org/Thing");
        let mut graph = Graph::new();
        let err = emit_structure(&mut graph, &subject, "", &BTreeMap::new()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SyncError::Graph(GraphError::InvalidIri { .. })
        ));
    }
}
