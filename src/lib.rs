//! # sesh-sync
//!
//! Keeps a locally held RDF ontology graph synchronized with a remote
//! Wikibase instance. The remote side is authoritative for content; the
//! local graph is a cached, versioned projection of it, mutated in place.
//!
//! ## Architecture
//!
//! - **Reconciliation engine** (`reconcile`): per-entity diff-and-apply over
//!   the local graph
//! - **Remote reader** (`remote`): blocking Wikibase action-API queries,
//!   plus the recent-changes feed
//! - **Snapshots** (`snapshot`): typed per-call views of one subject on both
//!   sides
//! - **Literal typing** (`literal`): fixed-order type inference for claim
//!   values
//! - **Blank structures** (`blank`): delete-then-recreate anonymous nodes
//! - **Hosting** (`hosting`): publish the result as a GitHub pull request
//!
//! ## Library usage
//!
//! ```no_run
//! use oxigraph::model::Graph;
//! use sesh_sync::reconcile::Reconciler;
//! use sesh_sync::remote::WikibaseClient;
//!
//! let mut graph = Graph::new();
//! let engine = Reconciler::new(WikibaseClient::new("http://localhost/w/api.php"));
//! engine.execute(&mut graph, "Q5").unwrap();
//! ```

pub mod blank;
pub mod config;
pub mod error;
pub mod hosting;
pub mod ids;
pub mod literal;
pub mod rdf;
pub mod reconcile;
pub mod remote;
pub mod snapshot;
pub mod uri;
