use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One case record extracted from the export table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub area: String,
    pub opened: NaiveDateTime,
    pub closed: Option<NaiveDateTime>,
    pub priority: String,
    pub ticket_type: String,
    pub importance: String,
    pub linked_to: String,
    /// Detail cell markup as exported; the timeline is recovered from it.
    pub detail_markup: String,
    /// Detail cell rendered as readable text.
    pub detail_text: String,
}

impl Ticket {
    pub fn is_closed(&self) -> bool {
        self.closed.is_some()
    }
}

/// Action recorded in a timeline header (`<ts> <ACTION> by <actor>`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Opened,
    Assigned,
    Edited,
    Resolved,
    Closed,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "OPENED",
            Self::Assigned => "ASSIGNED",
            Self::Edited => "EDITED",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }

    /// RESOLVED and CLOSED both end the case.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPENED" => Ok(Self::Opened),
            "ASSIGNED" => Ok(Self::Assigned),
            "EDITED" => Ok(Self::Edited),
            "RESOLVED" => Ok(Self::Resolved),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(format!("Unknown timeline action: {}", s)),
        }
    }
}

/// One timestamped action recovered from a ticket's detail markup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEntry {
    pub timestamp: NaiveDateTime,
    pub action: ActionKind,
    /// Raw actor, possibly suffixed with a `to <party>` routing annotation.
    pub actor: String,
    pub content: String,
}

impl TimelineEntry {
    /// `[ACTION] content`, or bare `[ACTION]` when there is no content.
    pub fn tagged_line(&self) -> String {
        if self.content.is_empty() {
            format!("[{}]", self.action)
        } else {
            format!("[{}] {}", self.action, self.content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::EntryBuilder;

    #[test]
    fn test_action_roundtrip() {
        for kind in [
            ActionKind::Opened,
            ActionKind::Assigned,
            ActionKind::Edited,
            ActionKind::Resolved,
            ActionKind::Closed,
        ] {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        }
        assert!("REOPENED".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_tagged_line() {
        let bare = EntryBuilder::new("10:00", ActionKind::Opened, "Alice").build();
        assert_eq!(bare.tagged_line(), "[OPENED]");

        let with_content = EntryBuilder::new("10:05", ActionKind::Edited, "Alice")
            .content("added log")
            .build();
        assert_eq!(with_content.tagged_line(), "[EDITED] added log");
    }

    #[test]
    fn test_action_serializes_uppercase() {
        let json = serde_json::to_string(&ActionKind::Resolved).unwrap();
        assert_eq!(json, "\"RESOLVED\"");
    }
}
