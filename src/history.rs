use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history state is not serializable: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("history state does not match the expected shape: {0}")]
    Deserialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub state: Option<Value>,
    pub title: String,
    pub url: String,
}

/// The entry a traversal landed on, as delivered to a `popstate` listener.
#[derive(Debug, Clone, PartialEq)]
pub struct PopState {
    pub state: Option<Value>,
    pub url: String,
}

/// Per-page session history: an entry list plus a cursor.
///
/// State is stored as JSON so whatever goes in comes back as an independent
/// copy, never a live reference.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl SessionHistory {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry {
                state: None,
                title: String::new(),
                url: initial_url.into(),
            }],
            index: 0,
        }
    }

    /// Add an entry after the current one, dropping any forward entries.
    pub fn push_state<T: Serialize>(
        &mut self,
        state: &T,
        title: &str,
        url: &str,
    ) -> Result<(), HistoryError> {
        let state = serde_json::to_value(state).map_err(HistoryError::Serialize)?;
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry {
            state: Some(state),
            title: title.to_string(),
            url: url.to_string(),
        });
        self.index = self.entries.len() - 1;
        Ok(())
    }

    pub fn replace_state<T: Serialize>(
        &mut self,
        state: &T,
        title: &str,
        url: &str,
    ) -> Result<(), HistoryError> {
        let state = serde_json::to_value(state).map_err(HistoryError::Serialize)?;
        self.entries[self.index] = HistoryEntry {
            state: Some(state),
            title: title.to_string(),
            url: url.to_string(),
        };
        Ok(())
    }

    pub fn back(&mut self) -> Option<PopState> {
        self.go(-1)
    }

    pub fn forward(&mut self) -> Option<PopState> {
        self.go(1)
    }

    /// Move the cursor by `delta`. Out-of-range or zero deltas do nothing.
    pub fn go(&mut self, delta: isize) -> Option<PopState> {
        if delta == 0 {
            return None;
        }
        let target = self.index.checked_add_signed(delta)?;
        let entry = self.entries.get(target)?;
        self.index = target;
        Some(PopState {
            state: entry.state.clone(),
            url: entry.url.clone(),
        })
    }

    pub fn state(&self) -> Option<&Value> {
        self.current().state.as_ref()
    }

    /// Current state decoded as `T`, or `None` for a null state.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<Option<T>, HistoryError> {
        self.state()
            .cloned()
            .map(serde_json::from_value::<T>)
            .transpose()
            .map_err(HistoryError::Deserialize)
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.index]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
