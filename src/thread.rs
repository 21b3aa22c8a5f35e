use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which side of the conversation an actor belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Customer to support.
    Incoming,
    /// Support to customer, including system notes from unknown actors.
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }

    /// Header label used when rendering the thread for the model.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Incoming => "[Customer -> Support]",
            Self::Outgoing => "[Support -> Customer]",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reconstructed conversation turn: consecutive same-direction timeline
/// entries merged together. Actor and timestamp come from the first entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub direction: Direction,
    pub timestamp: NaiveDateTime,
    pub actor: String,
    pub from: String,
    pub to: String,
    /// Newline-joined `[ACTION] content` lines, one per merged entry.
    pub body: String,
}
