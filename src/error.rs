//! Diagnostic error types for sesh-sync.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text, so a failed synchronization says exactly
//! which side (local graph, Wikibase, GitHub) went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for sesh-sync.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum SyncError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Id(#[from] IdError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Uri(#[from] UriError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Hosting(#[from] HostingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Entity id errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IdError {
    #[error("wrong id of wikibase item or property: {id}")]
    #[diagnostic(
        code(sesh::id::malformed),
        help(
            "A Wikibase entity id is a kind letter followed by digits: \
             `Q` for items (e.g. Q42) or `P` for properties (e.g. P31)."
        )
    )]
    Malformed { id: String },
}

// ---------------------------------------------------------------------------
// URI errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum UriError {
    #[error("not a well-formed URL: {value}")]
    #[diagnostic(
        code(sesh::uri::not_a_url),
        help(
            "The value must be an absolute http/https/ftp URL with a resolvable \
             host part. Check the related link set on the Wikibase entity."
        )
    )]
    NotAUrl { value: String },
}

// ---------------------------------------------------------------------------
// Remote (Wikibase API) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RemoteError {
    #[error("wikibase request failed: {message}")]
    #[diagnostic(
        code(sesh::remote::transport),
        help("Is the API endpoint reachable? Check the endpoint URL in your config.")
    )]
    Transport { message: String },

    #[error("unexpected wikibase response: {context}")]
    #[diagnostic(
        code(sesh::remote::response),
        help(
            "The API answered with a document that does not have the expected \
             shape. Verify the endpoint points at a Wikibase action API \
             (`.../api.php`) and that the entity exists."
        )
    )]
    MalformedResponse { context: String },

    #[error("no search match for label {label:?}")]
    #[diagnostic(
        code(sesh::remote::empty_search),
        help(
            "Resolving an anonymous structure searches entities by label. \
             The backing entity for this label no longer exists in the wikibase."
        )
    )]
    EmptySearch { label: String },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("failed to parse RDF: {message}")]
    #[diagnostic(
        code(sesh::graph::parse),
        help("Check that the file is valid RDF in the syntax you selected.")
    )]
    Parse { message: String },

    #[error("failed to serialize RDF: {message}")]
    #[diagnostic(code(sesh::graph::serialize))]
    Serialize { message: String },

    #[error("wrong input format: {name}")]
    #[diagnostic(
        code(sesh::graph::syntax),
        help("Supported syntaxes: ttl, turtle, nt, ntriples, xml, rdf-xml, trig, nquads, n3.")
    )]
    UnsupportedSyntax { name: String },

    #[error("invalid IRI: {value}")]
    #[diagnostic(
        code(sesh::graph::iri),
        help("The related link of the entity must be a valid IRI to become a subject.")
    )]
    InvalidIri { value: String },

    #[error("invalid language tag: {tag}")]
    #[diagnostic(
        code(sesh::graph::language),
        help("Wikibase language codes must be usable as RDF language tags (BCP47).")
    )]
    InvalidLanguageTag { tag: String },
}

// ---------------------------------------------------------------------------
// Recent-changes feed errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum FeedError {
    #[error("malformed recent-changes feed: {message}")]
    #[diagnostic(
        code(sesh::feed::xml),
        help("The feedrecentchanges response was not parseable XML.")
    )]
    Xml { message: String },
}

// ---------------------------------------------------------------------------
// Code-hosting (GitHub) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum HostingError {
    #[error("github request failed: {message}")]
    #[diagnostic(
        code(sesh::hosting::request),
        help("Check the repository name, the branch names and your access token.")
    )]
    Request { message: String },

    #[error("unexpected github response: {message}")]
    #[diagnostic(code(sesh::hosting::response))]
    Response { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("number of days must be 1 or higher, got {days}")]
    #[diagnostic(
        code(sesh::config::day_window),
        help("The recent-changes window selects entities changed in the last N days; N must be at least 1.")
    )]
    InvalidDayWindow { days: i64 },

    #[error("failed to read config file: {source}")]
    #[diagnostic(
        code(sesh::config::io),
        help("Check that the config file exists and is readable.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {message}")]
    #[diagnostic(
        code(sesh::config::parse),
        help("The config file must be valid TOML; see the README for the expected keys.")
    )]
    Parse { message: String },

    #[error("missing access token: set the {var} environment variable")]
    #[diagnostic(
        code(sesh::config::token),
        help("The push flow authenticates against GitHub with a personal access token.")
    )]
    MissingToken { var: String },
}

/// Convenience alias for functions returning sesh-sync results.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
