//! Event payloads handed to the worker

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

/// An opaque unit of work for the worker
///
/// The coordinator never looks inside `args`; it only preserves arrival order
/// and passes `callback_selector` through so the worker knows which entry
/// point to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identity (UUID v7)
    pub id: String,

    /// Selects the worker-side callback that handles this event
    #[serde(rename = "callback-selector")]
    pub callback_selector: i64,

    /// Positional domain arguments
    pub args: Vec<Value>,
}

impl Event {
    /// Create a new event with a fresh identity
    pub fn new(callback_selector: i64, args: Vec<Value>) -> Self {
        let id = Uuid::now_v7().to_string();
        debug!(%id, callback_selector, arg_count = args.len(), "Event::new: called");
        Self {
            id,
            callback_selector,
            args,
        }
    }

    /// Positional arguments sent over the worker channel: the selector first,
    /// then the domain arguments
    pub fn invocation_args(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.args.len() + 1);
        out.push(Value::from(self.callback_selector));
        out.extend(self.args.iter().cloned());
        out
    }
}

/// An event stamped with its arrival sequence number
#[derive(Debug, Clone)]
pub struct Envelope {
    pub seq: u64,
    pub accepted_at: Instant,
    pub event: Event,
}

impl Envelope {
    pub fn new(seq: u64, event: Event) -> Self {
        Self {
            seq,
            accepted_at: Instant::now(),
            event,
        }
    }
}

/// Kind of region boundary crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    Enter,
    Exit,
    Dwell,
}

impl TransitionKind {
    /// Integer code the worker expects
    pub fn code(self) -> i64 {
        match self {
            TransitionKind::Enter => 1,
            TransitionKind::Exit => 2,
            TransitionKind::Dwell => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(TransitionKind::Enter),
            2 => Some(TransitionKind::Exit),
            4 => Some(TransitionKind::Dwell),
            _ => None,
        }
    }
}

/// A location transition reported by a platform region monitor
///
/// One transition can trigger several regions at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTransition {
    #[serde(rename = "region-ids")]
    pub region_ids: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: TransitionKind,
}

impl RegionTransition {
    /// Convert into an event with args `[[ids...], [lat, lng], kind]`
    pub fn into_event(self, callback_selector: i64) -> Event {
        debug!(
            region_count = self.region_ids.len(),
            kind = ?self.kind,
            "RegionTransition::into_event: called"
        );
        Event::new(
            callback_selector,
            vec![
                json!(self.region_ids),
                json!([self.latitude, self.longitude]),
                json!(self.kind.code()),
            ],
        )
    }
}
