//! Per-call snapshots of one subject, on both sides of the synchronization.
//!
//! A [`LocalSnapshot`] is built in one pass over the local graph triples of
//! the related-link subject; a [`RemoteSnapshot`] is assembled from the
//! Wikibase reads of the same entity. Both are rebuilt from scratch on every
//! reconciliation call and never outlive it. Value lists keep the order the
//! values were encountered in, and every value lands in exactly one of the
//! direct/blank partitions.

use std::collections::{BTreeMap, BTreeSet};

use oxigraph::model::{BlankNode, Graph, NamedNode, Term, TermRef};

use crate::error::RemoteError;
use crate::ids::EntityId;
use crate::rdf::{RDFS_COMMENT, RDFS_LABEL};
use crate::remote::{GENID_MARKER, LanguageField, WikibaseClient};

/// What the local graph currently says about one subject.
#[derive(Debug, Clone, Default)]
pub struct LocalSnapshot {
    /// Whether any triple with the subject was seen at all.
    pub exists: bool,
    /// Language → label text (language-tagged `rdfs:label` literals).
    pub labels: BTreeMap<String, String>,
    /// Language → description text (language-tagged `rdfs:comment` literals).
    pub descriptions: BTreeMap<String, String>,
    /// Predicate IRI → ordered non-blank objects.
    pub direct: BTreeMap<String, Vec<Term>>,
    /// Predicate IRI → ordered blank-node objects.
    pub blank: BTreeMap<String, Vec<BlankNode>>,
}

impl LocalSnapshot {
    /// Scan the graph for everything attached to `subject`.
    pub fn collect(graph: &Graph, subject: &NamedNode) -> Self {
        let mut snapshot = Self::default();
        for triple in graph.triples_for_subject(subject.as_ref()) {
            snapshot.exists = true;
            if triple.predicate == RDFS_LABEL || triple.predicate == RDFS_COMMENT {
                let target = if triple.predicate == RDFS_LABEL {
                    &mut snapshot.labels
                } else {
                    &mut snapshot.descriptions
                };
                match triple.object {
                    TermRef::Literal(lit) => match lit.language() {
                        Some(lang) => {
                            target.insert(lang.to_string(), lit.value().to_string());
                        }
                        None => {
                            tracing::debug!(
                                predicate = %triple.predicate,
                                "ignoring label/description literal without a language tag"
                            );
                        }
                    },
                    other => {
                        tracing::debug!(
                            predicate = %triple.predicate,
                            object = %other,
                            "ignoring non-literal label/description object"
                        );
                    }
                }
                continue;
            }

            let predicate = triple.predicate.as_str().to_string();
            match triple.object {
                TermRef::BlankNode(node) => {
                    snapshot
                        .blank
                        .entry(predicate)
                        .or_default()
                        .push(node.into_owned());
                }
                object => {
                    snapshot
                        .direct
                        .entry(predicate)
                        .or_default()
                        .push(object.into_owned());
                }
            }
        }
        snapshot
    }

    /// Every blank node attached to the subject, across all predicates.
    pub fn blank_nodes(&self) -> impl Iterator<Item = &BlankNode> {
        self.blank.values().flatten()
    }
}

/// What the wikibase currently says about one entity.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    /// Language → label text, language codes folded.
    pub labels: BTreeMap<String, String>,
    /// Language → description text, language codes folded.
    pub descriptions: BTreeMap<String, String>,
    /// Related links of every non-meta claim property.
    pub relation_set: BTreeSet<String>,
    /// Claim related-link → ordered resolved values without the blank marker.
    pub direct: BTreeMap<String, Vec<String>>,
    /// Claim related-link → ordered resolved values carrying the blank marker.
    pub blank: BTreeMap<String, Vec<String>>,
}

impl RemoteSnapshot {
    /// Read the entity's current remote state. Several blocking reads; any
    /// failure propagates.
    pub fn fetch(client: &WikibaseClient, id: &EntityId) -> Result<Self, RemoteError> {
        let id_str = id.to_string();

        let mut relation_set = BTreeSet::new();
        for property in client.content_claims(id)? {
            relation_set.insert(client.related_link_of(&property)?);
        }

        let (direct, blank) = partition_claim_values(client.claim_values(&id_str)?);

        Ok(Self {
            labels: client.entity_languages(&id_str, LanguageField::Labels)?,
            descriptions: client.entity_languages(&id_str, LanguageField::Descriptions)?,
            relation_set,
            direct,
            blank,
        })
    }
}

/// Split resolved claim values into direct values and anonymous sub-entity
/// references, detected by the reserved path marker.
pub(crate) fn partition_claim_values(
    values: BTreeMap<String, Vec<String>>,
) -> (BTreeMap<String, Vec<String>>, BTreeMap<String, Vec<String>>) {
    let mut direct: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut blank: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (claim_link, list) in values {
        for value in list {
            if value.contains(GENID_MARKER) {
                blank.entry(claim_link.clone()).or_default().push(value);
            } else {
                direct.entry(claim_link.clone()).or_default().push(value);
            }
        }
    }
    (direct, blank)
}
