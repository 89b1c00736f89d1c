//! Crawl state definitions for the ingestion orchestrator
//!
//! `Idle -> SessionStarting -> Listing -> (Enriching) -> Success`, with a
//! failed `Listing` moving to `Retrying` (back to `SessionStarting`) or, once
//! the attempt bound is reached, to `Exhausted`.

use serde::Serialize;
use std::fmt;

/// Represents where an orchestration run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    // ===== Active States =====
    /// No run has started yet
    Idle,

    /// A browsing session is being acquired for the next attempt
    SessionStarting,

    /// Listing pages are being walked under the current session
    Listing,

    /// Detail pages are being fetched for the accumulated records
    Enriching,

    /// The last attempt failed; waiting out the backoff delay
    Retrying,

    // ===== Terminal States =====
    /// The crawl produced a result (possibly empty)
    Success,

    /// Every attempt failed; the result is empty
    Exhausted,
}

impl CrawlState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Exhausted)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;

        matches!(
            (*self, next),
            (Idle, SessionStarting)
                | (SessionStarting, Listing)
                | (Listing, Enriching)
                | (Listing, Success)
                | (Listing, Retrying)
                | (Listing, Exhausted)
                | (Retrying, SessionStarting)
                | (Enriching, Success)
        )
    }

    /// Converts the state to the string stored in the run ledger
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SessionStarting => "session_starting",
            Self::Listing => "listing",
            Self::Enriching => "enriching",
            Self::Retrying => "retrying",
            Self::Success => "success",
            Self::Exhausted => "exhausted",
        }
    }

    /// Parses a state from its ledger representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "session_starting" => Some(Self::SessionStarting),
            "listing" => Some(Self::Listing),
            "enriching" => Some(Self::Enriching),
            "retrying" => Some(Self::Retrying),
            "success" => Some(Self::Success),
            "exhausted" => Some(Self::Exhausted),
            _ => None,
        }
    }

    /// Returns all possible crawl states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::SessionStarting,
            Self::Listing,
            Self::Enriching,
            Self::Retrying,
            Self::Success,
            Self::Exhausted,
        ]
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
