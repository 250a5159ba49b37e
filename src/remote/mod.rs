//! Remote entity reader for the Wikibase action API.
//!
//! [`WikibaseClient`] issues blocking read queries (`wbgetentities`,
//! `wbgetclaims`, `wbsearchentities`, `feedrecentchanges`) and normalizes the
//! JSON responses into plain typed mappings. Stateless per call: nothing is
//! cached between reads, every claim lookup fans out into one entity request
//! per claim property, and every error propagates to the caller untouched.

pub mod feed;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::RemoteError;
use crate::ids::EntityId;

/// Reserved English label of the claim property anchoring an entity to its
/// local-graph subject URI.
pub const RELATED_LINK_LABEL: &str = "related link";

/// Reserved English label of the cross-reference claim property.
pub const SAME_AS_LABEL: &str = "same as";

/// The two meta-relations, never treated as ontology content.
pub const META_LABELS: [&str; 2] = [RELATED_LINK_LABEL, SAME_AS_LABEL];

/// Path marker flagging a resolved value as an anonymous sub-entity
/// reference rather than a regular resource.
pub const GENID_MARKER: &str = "/genid/";

/// Remote language codes folded into another code when building snapshots.
/// Formal-register variants collapse into their base language.
const LANG_FOLDS: &[(&str, &str)] = &[("es-formal", "es")];

/// Which language-keyed section of an entity document to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageField {
    Labels,
    Descriptions,
}

impl LanguageField {
    fn key(self) -> &'static str {
        match self {
            LanguageField::Labels => "labels",
            LanguageField::Descriptions => "descriptions",
        }
    }
}

/// Fold a remote language code per [`LANG_FOLDS`].
pub(crate) fn fold_language(lang: &str) -> &str {
    for (from, to) in LANG_FOLDS {
        if lang == *from {
            return to;
        }
    }
    lang
}

fn field<'a>(value: &'a Value, key: &str, context: &str) -> Result<&'a Value, RemoteError> {
    value.get(key).ok_or_else(|| RemoteError::MalformedResponse {
        context: format!("missing `{key}` in {context}"),
    })
}

/// Read `labels`/`descriptions` out of a `wbgetentities` document, folding
/// language codes.
pub(crate) fn languages_of(
    document: &Value,
    id: &str,
    section: LanguageField,
) -> Result<BTreeMap<String, String>, RemoteError> {
    let entity = field(field(document, "entities", "entity document")?, id, "entities")?;
    let map = field(entity, section.key(), id)?
        .as_object()
        .ok_or_else(|| RemoteError::MalformedResponse {
            context: format!("`{}` of {id} is not an object", section.key()),
        })?;
    let mut out = BTreeMap::new();
    for (lang, entry) in map {
        let text = field(entry, "value", &format!("{} {lang} of {id}", section.key()))?
            .as_str()
            .ok_or_else(|| RemoteError::MalformedResponse {
                context: format!("{} {lang} of {id} is not a string", section.key()),
            })?;
        out.insert(fold_language(lang).to_string(), text.to_string());
    }
    Ok(out)
}

/// The English label of an entity document, if it has one.
pub(crate) fn english_label(document: &Value, id: &str) -> Option<String> {
    document
        .get("entities")?
        .get(id)?
        .get("labels")?
        .get("en")?
        .get("value")?
        .as_str()
        .map(str::to_string)
}

/// The `mainsnak` value of one claim statement: either a reference to
/// another entity or a raw scalar. The two shapes must be branch-tested;
/// nothing about the claim itself says which one arrives.
fn statement_value(statement: &Value, context: &str) -> Result<ClaimValue, RemoteError> {
    let value = field(
        field(field(statement, "mainsnak", context)?, "datavalue", context)?,
        "value",
        context,
    )?;
    if let Some(id) = value.get("id").and_then(Value::as_str) {
        return Ok(ClaimValue::EntityRef(id.to_string()));
    }
    match value.as_str() {
        Some(s) => Ok(ClaimValue::Scalar(s.to_string())),
        None => Err(RemoteError::MalformedResponse {
            context: format!("{context}: claim value is neither an entity reference nor a string"),
        }),
    }
}

enum ClaimValue {
    EntityRef(String),
    Scalar(String),
}

/// Blocking client for one Wikibase action API endpoint.
pub struct WikibaseClient {
    endpoint: String,
    http: ureq::Agent,
}

impl WikibaseClient {
    /// Create a client for an action API endpoint (`…/api.php`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: ureq::Agent::new(),
        }
    }

    /// The endpoint this client reads from.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn api_get(&self, params: &[(&str, &str)]) -> Result<Value, RemoteError> {
        let mut request = self.http.get(&self.endpoint).query("format", "json");
        for (key, value) in params {
            request = request.query(key, value);
        }
        let response = request.call().map_err(|e| RemoteError::Transport {
            message: e.to_string(),
        })?;
        response.into_json().map_err(|e| RemoteError::MalformedResponse {
            context: format!("response is not JSON: {e}"),
        })
    }

    fn api_get_text(&self, params: &[(&str, &str)]) -> Result<String, RemoteError> {
        let mut request = self.http.get(&self.endpoint).query("format", "json");
        for (key, value) in params {
            request = request.query(key, value);
        }
        let response = request.call().map_err(|e| RemoteError::Transport {
            message: e.to_string(),
        })?;
        response.into_string().map_err(|e| RemoteError::MalformedResponse {
            context: format!("failed to read response body: {e}"),
        })
    }

    /// Raw `wbgetentities` document for one entity.
    pub fn entity_document(&self, id: &str) -> Result<Value, RemoteError> {
        self.api_get(&[("action", "wbgetentities"), ("ids", id)])
    }

    /// Labels or descriptions of an entity, keyed by folded language code.
    pub fn entity_languages(
        &self,
        id: &str,
        section: LanguageField,
    ) -> Result<BTreeMap<String, String>, RemoteError> {
        let document = self.entity_document(id)?;
        languages_of(&document, id, section)
    }

    fn entity_label_en(&self, id: &str) -> Result<Option<String>, RemoteError> {
        let document = self.entity_document(id)?;
        Ok(english_label(&document, id))
    }

    /// Raw `wbgetclaims` map: claim property id → statement list.
    fn raw_claims(&self, id: &str) -> Result<serde_json::Map<String, Value>, RemoteError> {
        let document = self.api_get(&[("action", "wbgetclaims"), ("entity", id)])?;
        Ok(field(&document, "claims", "claims document")?
            .as_object()
            .ok_or_else(|| RemoteError::MalformedResponse {
                context: format!("`claims` of {id} is not an object"),
            })?
            .clone())
    }

    /// Claim property ids attached to an entity, with the two meta-relations
    /// filtered out. One nested entity lookup per claim property — an
    /// O(claims) fan-out with no batching or caching.
    pub fn content_claims(&self, id: &EntityId) -> Result<Vec<String>, RemoteError> {
        let claims = self.raw_claims(&id.to_string())?;
        let mut out = Vec::new();
        for property in claims.keys() {
            let label = self.entity_label_en(property)?;
            if !label.as_deref().is_some_and(|l| META_LABELS.contains(&l)) {
                out.push(property.clone());
            }
        }
        Ok(out)
    }

    /// The related link of an entity: the value of its claim whose property
    /// carries the reserved `related link` label, or an empty string when no
    /// such claim exists.
    ///
    /// A value that is not an entity id is already a literal URI (or plain
    /// scalar) and comes back unchanged.
    pub fn related_link_of(&self, raw: &str) -> Result<String, RemoteError> {
        if !EntityId::is_valid(raw) {
            return Ok(raw.to_string());
        }
        let claims = self.raw_claims(raw)?;
        let mut related_link = String::new();
        for (property, statements) in &claims {
            let label = self.entity_label_en(property)?;
            if label.as_deref() == Some(RELATED_LINK_LABEL) {
                let first = statements.get(0).ok_or_else(|| {
                    RemoteError::MalformedResponse {
                        context: format!("empty statement list for {property} on {raw}"),
                    }
                })?;
                match statement_value(first, &format!("related link of {raw}"))? {
                    ClaimValue::Scalar(s) => related_link = s,
                    ClaimValue::EntityRef(id) => {
                        return Err(RemoteError::MalformedResponse {
                            context: format!("related link of {raw} is an entity reference, not a URI: {id}"),
                        });
                    }
                }
            }
        }
        Ok(related_link)
    }

    /// Resolved values of every non-meta claim of an entity, keyed by the
    /// related link of the claim property, in statement order.
    ///
    /// Entity-reference values resolve through their own related link;
    /// scalar values pass through [`Self::related_link_of`] unchanged.
    pub fn claim_values(&self, id: &str) -> Result<BTreeMap<String, Vec<String>>, RemoteError> {
        let claims = self.raw_claims(id)?;
        let mut out = BTreeMap::new();
        for (property, statements) in &claims {
            let label = self.entity_label_en(property)?;
            if label.as_deref().is_some_and(|l| META_LABELS.contains(&l)) {
                continue;
            }
            let claim_link = self.related_link_of(property)?;
            let statements = statements.as_array().ok_or_else(|| {
                RemoteError::MalformedResponse {
                    context: format!("statements of {property} on {id} are not a list"),
                }
            })?;
            let mut values = Vec::with_capacity(statements.len());
            for statement in statements {
                let resolved = match statement_value(statement, &format!("{property} on {id}"))? {
                    ClaimValue::EntityRef(target) => self.related_link_of(&target)?,
                    ClaimValue::Scalar(s) => self.related_link_of(&s)?,
                };
                values.push(resolved);
            }
            out.insert(claim_link, values);
        }
        Ok(out)
    }

    /// First entity id matching a label search (language `en`, type `item`).
    pub fn search_entity_id(&self, label: &str) -> Result<String, RemoteError> {
        let document = self.api_get(&[
            ("action", "wbsearchentities"),
            ("search", label),
            ("language", "en"),
            ("type", "item"),
        ])?;
        let hits = field(&document, "search", "search document")?
            .as_array()
            .ok_or_else(|| RemoteError::MalformedResponse {
                context: "`search` is not a list".to_string(),
            })?;
        let first = hits.first().ok_or_else(|| RemoteError::EmptySearch {
            label: label.to_string(),
        })?;
        Ok(field(first, "id", "search hit")?
            .as_str()
            .ok_or_else(|| RemoteError::MalformedResponse {
                context: "search hit id is not a string".to_string(),
            })?
            .to_string())
    }
}

impl std::fmt::Debug for WikibaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikibaseClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn language_fold_collapses_formal_spanish() {
        assert_eq!(fold_language("es-formal"), "es");
        assert_eq!(fold_language("es"), "es");
        assert_eq!(fold_language("en"), "en");
    }

    #[test]
    fn languages_of_reads_and_folds() {
        let document = json!({
            "entities": {
                "Q1": {
                    "labels": {
                        "en": {"language": "en", "value": "thing"},
                        "es-formal": {"language": "es-formal", "value": "cosa"}
                    }
                }
            }
        });
        let labels = languages_of(&document, "Q1", LanguageField::Labels).unwrap();
        assert_eq!(labels.get("en").unwrap(), "thing");
        assert_eq!(labels.get("es").unwrap(), "cosa");
        assert!(!labels.contains_key("es-formal"));
    }

    #[test]
    fn languages_of_missing_entity_is_an_error() {
        let document = json!({"entities": {}});
        let err = languages_of(&document, "Q404", LanguageField::Labels).unwrap_err();
        assert!(matches!(err, RemoteError::MalformedResponse { .. }));
    }

    #[test]
    fn english_label_is_optional() {
        let with = json!({
            "entities": {"P1": {"labels": {"en": {"value": "related link"}}}}
        });
        assert_eq!(english_label(&with, "P1").as_deref(), Some("related link"));

        let without = json!({"entities": {"P2": {"labels": {}}}});
        assert_eq!(english_label(&without, "P2"), None);
    }

    #[test]
    fn statement_values_branch_on_shape() {
        let reference = json!({"mainsnak": {"datavalue": {"value": {"id": "Q7"}}}});
        assert!(matches!(
            statement_value(&reference, "test").unwrap(),
            ClaimValue::EntityRef(id) if id == "Q7"
        ));

        let scalar = json!({"mainsnak": {"datavalue": {"value": "13:15"}}});
        assert!(matches!(
            statement_value(&scalar, "test").unwrap(),
            ClaimValue::Scalar(s) if s == "13:15"
        ));

        let odd = json!({"mainsnak": {"datavalue": {"value": 3}}});
        assert!(statement_value(&odd, "test").is_err());
    }
}
