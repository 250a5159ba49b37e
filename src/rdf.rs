//! Local graph plumbing: vocabulary constants, textual RDF parse/serialize,
//! and the pattern-removal helpers the reconciliation engine mutates with.
//!
//! The local projection is a plain in-memory [`Graph`]; all file I/O stays at
//! the edges (the CLI reads and writes the bytes, this module turns them into
//! a graph and back).

use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::{
    BlankNodeRef, Graph, GraphNameRef, NamedNodeRef, TermRef, Triple,
};

use crate::error::GraphError;

/// `rdfs:label` — carries the multilingual labels of a subject.
pub const RDFS_LABEL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#label");

/// `rdfs:comment` — carries the multilingual descriptions of a subject.
pub const RDFS_COMMENT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#comment");

/// Prefixes bound on serialization. The in-memory graph carries no prefix
/// state, so well-known namespaces are re-bound when writing the file out.
const PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// A supported textual RDF syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfSyntax {
    Turtle,
    NTriples,
    RdfXml,
    TriG,
    NQuads,
    N3,
}

impl RdfSyntax {
    /// Resolve a user-facing syntax name. Unknown names are rejected up
    /// front, before any file or network work happens.
    pub fn from_name(name: &str) -> Result<Self, GraphError> {
        match name {
            "ttl" | "turtle" => Ok(RdfSyntax::Turtle),
            "nt" | "ntriples" => Ok(RdfSyntax::NTriples),
            "xml" | "rdf-xml" | "rdfxml" => Ok(RdfSyntax::RdfXml),
            "trig" => Ok(RdfSyntax::TriG),
            "nquads" | "nq" => Ok(RdfSyntax::NQuads),
            "n3" => Ok(RdfSyntax::N3),
            _ => Err(GraphError::UnsupportedSyntax {
                name: name.to_string(),
            }),
        }
    }

    fn format(self) -> RdfFormat {
        match self {
            RdfSyntax::Turtle => RdfFormat::Turtle,
            RdfSyntax::NTriples => RdfFormat::NTriples,
            RdfSyntax::RdfXml => RdfFormat::RdfXml,
            RdfSyntax::TriG => RdfFormat::TriG,
            RdfSyntax::NQuads => RdfFormat::NQuads,
            RdfSyntax::N3 => RdfFormat::N3,
        }
    }
}

impl std::fmt::Display for RdfSyntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RdfSyntax::Turtle => "turtle",
            RdfSyntax::NTriples => "ntriples",
            RdfSyntax::RdfXml => "rdf-xml",
            RdfSyntax::TriG => "trig",
            RdfSyntax::NQuads => "nquads",
            RdfSyntax::N3 => "n3",
        };
        write!(f, "{name}")
    }
}

/// Parse a textual RDF document into an in-memory graph.
///
/// Named graphs (trig/nquads) are flattened into the single local graph.
pub fn parse_graph(data: &str, syntax: RdfSyntax) -> Result<Graph, GraphError> {
    let mut graph = Graph::new();
    for quad in RdfParser::from_format(syntax.format()).for_reader(data.as_bytes()) {
        let quad = quad.map_err(|e| GraphError::Parse {
            message: e.to_string(),
        })?;
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(graph)
}

/// Serialize the graph in the given syntax, binding well-known prefixes.
pub fn serialize_graph(graph: &Graph, syntax: RdfSyntax) -> Result<String, GraphError> {
    let mut serializer = RdfSerializer::from_format(syntax.format());
    for (prefix, iri) in PREFIXES {
        serializer = serializer
            .with_prefix(*prefix, *iri)
            .map_err(|e| GraphError::Serialize {
                message: format!("invalid prefix {prefix}: {e}"),
            })?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    for triple in graph.iter() {
        writer
            .serialize_quad(triple.in_graph(GraphNameRef::DefaultGraph))
            .map_err(|e| GraphError::Serialize {
                message: e.to_string(),
            })?;
    }
    let bytes = writer.finish().map_err(|e| GraphError::Serialize {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| GraphError::Serialize {
        message: e.to_string(),
    })
}

/// Remove every `(subject, predicate, _)` triple. Returns how many went.
pub fn remove_with_predicate(
    graph: &mut Graph,
    subject: NamedNodeRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> usize {
    let doomed: Vec<Triple> = graph
        .triples_for_subject(subject)
        .filter(|t| t.predicate == predicate)
        .map(|t| t.into_owned())
        .collect();
    for triple in &doomed {
        graph.remove(triple);
    }
    doomed.len()
}

/// Remove every triple that has the blank node as subject or as object.
///
/// This severs the node from its anchor subject and drops the whole
/// anonymous structure hanging off it.
pub fn remove_blank_island(graph: &mut Graph, node: BlankNodeRef<'_>) {
    let mut doomed: Vec<Triple> = graph
        .triples_for_subject(node)
        .map(|t| t.into_owned())
        .collect();
    doomed.extend(
        graph
            .iter()
            .filter(|t| t.object == TermRef::BlankNode(node))
            .map(|t| t.into_owned()),
    );
    for triple in &doomed {
        graph.remove(triple);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{BlankNode, Literal, NamedNode, Term};

    fn node(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    #[test]
    fn syntax_names_resolve() {
        assert_eq!(RdfSyntax::from_name("ttl").unwrap(), RdfSyntax::Turtle);
        assert_eq!(RdfSyntax::from_name("turtle").unwrap(), RdfSyntax::Turtle);
        assert_eq!(RdfSyntax::from_name("nt").unwrap(), RdfSyntax::NTriples);
        assert!(RdfSyntax::from_name("non_existent").is_err());
    }

    #[test]
    fn parse_and_serialize_roundtrip() {
        let ttl = r#"@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
<http://example.org/Thing> rdfs:label "thing"@en .
"#;
        let graph = parse_graph(ttl, RdfSyntax::Turtle).unwrap();
        assert_eq!(graph.len(), 1);

        let out = serialize_graph(&graph, RdfSyntax::Turtle).unwrap();
        let reparsed = parse_graph(&out, RdfSyntax::Turtle).unwrap();
        assert_eq!(reparsed, graph);
    }

    #[test]
    fn parse_error_reports_message() {
        let err = parse_graph("this is not turtle", RdfSyntax::Turtle).unwrap_err();
        assert!(matches!(err, GraphError::Parse { .. }));
    }

    #[test]
    fn remove_with_predicate_is_exhaustive() {
        let s = node("http://example.org/s");
        let p = node("http://example.org/p");
        let other = node("http://example.org/other");
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            s.clone(),
            p.clone(),
            Term::Literal(Literal::new_simple_literal("a")),
        ));
        graph.insert(&Triple::new(
            s.clone(),
            p.clone(),
            Term::Literal(Literal::new_simple_literal("b")),
        ));
        graph.insert(&Triple::new(
            s.clone(),
            other.clone(),
            Term::Literal(Literal::new_simple_literal("keep")),
        ));

        let removed = remove_with_predicate(&mut graph, s.as_ref(), p.as_ref());
        assert_eq!(removed, 2);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn remove_blank_island_severs_both_sides() {
        let s = node("http://example.org/s");
        let p = node("http://example.org/p");
        let q = node("http://example.org/q");
        let b = BlankNode::default();
        let mut graph = Graph::new();
        graph.insert(&Triple::new(s.clone(), p.clone(), Term::BlankNode(b.clone())));
        graph.insert(&Triple::new(
            b.clone(),
            q.clone(),
            Term::Literal(Literal::new_simple_literal("inner")),
        ));
        graph.insert(&Triple::new(
            s.clone(),
            q.clone(),
            Term::Literal(Literal::new_simple_literal("outer")),
        ));

        remove_blank_island(&mut graph, b.as_ref());
        assert_eq!(graph.len(), 1);
    }
}
