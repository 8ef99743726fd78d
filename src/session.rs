use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::fetch::{Fetcher, SourceKind};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::EventDocument;
use crate::ui::HostUi;

/// In-memory event documents for the session, keyed by event name.
///
/// Entries are shared handles: a cache hit hands back the same allocation.
#[derive(Debug, Default)]
pub struct SessionStore {
    events: HashMap<String, Arc<EventDocument>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<EventDocument>> {
        self.events.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Replace wholesale.
    pub fn insert(&mut self, name: &str, doc: EventDocument) -> Arc<EventDocument> {
        let doc = Arc::new(doc);
        self.events.insert(name.to_string(), doc.clone());
        log(
            Level::Debug,
            Domain::Session,
            "store_insert",
            obj(&[("event_name", v_str(name))]),
        );
        doc
    }

    /// Cached document, or whatever the fetch chain produces (then cached).
    pub async fn load(
        &mut self,
        name: &str,
        fetcher: &Fetcher,
        ui: &mut dyn HostUi,
    ) -> (Arc<EventDocument>, Option<SourceKind>) {
        if let Some(doc) = self.get(name) {
            return (doc, None);
        }
        let loaded = fetcher.load(name, ui).await;
        (self.insert(name, loaded.document), Some(loaded.source))
    }

    /// Set `meta.aoi_geo` on `name`, creating an empty placeholder entry if needed.
    pub fn attach_aoi(&mut self, name: &str, geojson: Value) -> Arc<EventDocument> {
        let entry = self
            .events
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(EventDocument::empty(name)));
        Arc::make_mut(entry).meta.aoi_geo = Some(geojson);
        entry.clone()
    }
}
