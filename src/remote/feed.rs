//! Recent-changes feed listing.
//!
//! `feedrecentchanges` answers with an RSS document whose `<item><title>`
//! elements name the changed pages as `Namespace:Id` (e.g. `Item:Q5`,
//! `Property:P11`). The part after the first `:` is the entity id; titles
//! without a parsable id (regular wiki pages) are skipped.

use std::collections::BTreeSet;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{ConfigError, FeedError, SyncResult};
use crate::ids::EntityId;

use super::WikibaseClient;

impl WikibaseClient {
    /// Entity ids changed within the last `days` days.
    pub fn changed_entities(&self, days: u32) -> SyncResult<BTreeSet<EntityId>> {
        if days < 1 {
            return Err(ConfigError::InvalidDayWindow { days: days.into() }.into());
        }
        let xml = self.api_get_text(&[
            ("action", "feedrecentchanges"),
            ("days", &days.to_string()),
        ])?;
        let changed = parse_feed(&xml)?;
        tracing::info!(count = changed.len(), days, "entities to sync from recent changes");
        Ok(changed)
    }
}

/// Extract the changed entity ids from a recent-changes RSS document.
pub fn parse_feed(xml: &str) -> Result<BTreeSet<EntityId>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut changed = BTreeSet::new();
    let mut in_item = false;
    let mut in_title = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"item" => in_item = true,
                b"title" if in_item => in_title = true,
                _ => {}
            },
            Ok(Event::Text(text)) if in_title => {
                let title = text.unescape().map_err(|e| FeedError::Xml {
                    message: e.to_string(),
                })?;
                if let Some((_, raw_id)) = title.split_once(':') {
                    match EntityId::parse(raw_id.trim()) {
                        Ok(id) => {
                            changed.insert(id);
                        }
                        Err(_) => {
                            tracing::debug!(title = %title, "skipping non-entity feed title");
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"item" => in_item = false,
                b"title" => in_title = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(FeedError::Xml {
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(changed)
}
