use std::fmt;

pub const PRESENTER_PARAM: &str = "presenter";

/// Oldest entries are dropped beyond this.
const MAX_HISTORY: usize = 64;

/// URL-like address of a view: `slidesync://deck/<name>?presenter=true`.
///
/// Only the query matters to the presenter; the path identifies the deck for
/// display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLocation {
    path: String,
    query: Vec<(String, String)>,
}

impl ViewLocation {
    pub fn for_deck(name: &str) -> Self {
        Self {
            path: format!("deck/{name}"),
            query: Vec::new(),
        }
    }

    /// Parse `slidesync://path?k=v&k2=v2`. The scheme prefix is optional.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn parse(url: &str) -> Self {
        let url = url.strip_prefix("slidesync://").unwrap_or(url);
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (k.to_string(), v.to_string())
            })
            .collect();
        Self {
            path: path.to_string(),
            query,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_param(&mut self, key: &str, value: &str) {
        match self.query.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.query.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove_param(&mut self, key: &str) {
        self.query.retain(|(k, _)| k != key);
    }

    pub fn is_presenter(&self) -> bool {
        self.param(PRESENTER_PARAM) == Some("true")
    }
}

impl fmt::Display for ViewLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slidesync://{}", self.path)?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{k}={v}")?;
        }
        Ok(())
    }
}

/// Push-only navigation history for one view, keeping the latest
/// `MAX_HISTORY` entries. Changing the location never reloads the deck.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<ViewLocation>,
}

impl History {
    pub fn new(initial: ViewLocation) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    pub fn current(&self) -> &ViewLocation {
        // Never empty: constructed with one entry and only ever pushed to
        &self.entries[self.entries.len() - 1]
    }

    pub fn push(&mut self, location: ViewLocation) {
        if self.len() >= MAX_HISTORY {
            self.entries.remove(0);
        }
        self.entries.push(location);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_presenter(&self) -> bool {
        self.current().is_presenter()
    }

    /// Flip the presenter flag in the query and push the rewritten location.
    pub fn toggle_presenter(&mut self) -> bool {
        let mut next = self.current().clone();
        if next.is_presenter() {
            next.remove_param(PRESENTER_PARAM);
        } else {
            next.set_param(PRESENTER_PARAM, "true");
        }
        let enabled = next.is_presenter();
        tracing::debug!(location = %next, "Presenter mode {}", if enabled { "on" } else { "off" });
        self.push(next);
        enabled
    }
}
