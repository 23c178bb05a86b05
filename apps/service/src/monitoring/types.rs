use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A polled endpoint together with its failure history.
///
/// A `Target` is moved, never cloned, through the polling pipeline: intake
/// queue, prober, completion queue, delay task and back. Whoever holds the
/// value is the only task able to touch `consecutive_errors`.
#[derive(Debug, PartialEq, Eq)]
pub struct Target {
    url: String,
    consecutive_errors: u32,
}

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), consecutive_errors: 0 }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Failures since the last successful probe.
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
    }
}

/// Outcome of one probe, sent from a prober to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub endpoint: String,
    pub status: String,
}

impl StatusUpdate {
    pub fn new(endpoint: impl Into<String>, status: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), status: status.into() }
    }
}

/// Latest status of every endpoint seen so far, read at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn from_table(table: &HashMap<String, String>) -> Self {
        Self { entries: table.iter().map(|(k, v)| (k.clone(), v.clone())).collect() }
    }

    /// Endpoint to status, ordered by endpoint.
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn get(&self, endpoint: &str) -> Option<&str> {
        self.entries.get(endpoint).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The textual report: a header line, then one line per endpoint.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once("Current state:".to_string()).chain(
            self.entries.iter().map(|(endpoint, status)| format!(" {endpoint} {status}")),
        )
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
