use serde::{Deserialize, Serialize};

use crate::error::OutputError;
use crate::plan::RequestBatch;

/// One stored cookie, keyed by the URL it was set for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieEntry {
    pub url: String,
    pub name: String,
    pub value: String,
    pub path: String,
}

/// The cookies every planned request carries, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar(Vec<CookieEntry>);

impl CookieJar {
    /// Collect cookies in request order. A later cookie for the same URL and
    /// name replaces the earlier one in place.
    pub fn from_batch(batch: &RequestBatch) -> Self {
        let mut jar = Self::default();
        for request in batch {
            let url = request.url.to_string();
            for cookie in &request.cookies {
                jar.set(CookieEntry {
                    url: url.clone(),
                    name: cookie.name.clone(),
                    value: cookie.value.clone(),
                    path: cookie.path.clone(),
                });
            }
        }
        jar
    }

    pub fn set(&mut self, entry: CookieEntry) {
        match self
            .0
            .iter_mut()
            .find(|e| e.url == entry.url && e.name == entry.name)
        {
            Some(existing) => *existing = entry,
            None => self.0.push(entry),
        }
    }

    pub fn entries(&self) -> &[CookieEntry] {
        &self.0
    }

    pub fn to_json(&self) -> Result<String, OutputError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
