//! Matcher request/response wire types.

use likeness_core::{MatchEntry, RankedMatches};
use serde::{Deserialize, Serialize};

/// Body of a similarity request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    /// JPEG data URL of the stabilized frame.
    pub image: String,
    /// Total grid cell count available for placement.
    #[serde(rename = "numVids")]
    pub num_vids: u32,
}

/// Raw response body; either list may be absent on malformed replies.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub most_similar: Option<Vec<MatchEntry>>,
    pub least_similar: Option<Vec<MatchEntry>>,
}

/// Outcome of one similarity request.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// Both ranked lists, each ordered best-first.
    Matches(RankedMatches),
    /// The matcher saw no face in the uploaded frame. Not an error and
    /// not retried; the next new-face event issues a fresh request.
    NoFace,
}
