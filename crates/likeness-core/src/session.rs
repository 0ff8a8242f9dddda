//! Face-session tracking: decides when a detection is a *new* face.
//!
//! A new-face transition (unknown → known) is what triggers a similarity
//! request upstream; the session flips to known before the caller
//! dispatches, so at most one request is issued per transition.

/// Consecutive no-detection ticks before the tracked face is considered lost.
const LOST_THRESHOLD: u32 = 10;

/// Outcome of feeding one tick's detection result into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// First detection after the session was unknown; triggers a
    /// similarity request.
    NewFace,
    /// Detection of an already-known face; no request issued.
    Tracking,
    /// No detection this tick, but the face is not yet considered lost.
    Absent,
    /// The no-detection streak reached the threshold; the session reset
    /// to unknown. The next detection is a new face.
    Lost,
}

/// Per-pipeline face session state. Owned by the pipeline instance and
/// fed exactly once per tick.
#[derive(Debug, Default)]
pub struct FaceSession {
    known_face: bool,
    no_detection_streak: u32,
}

impl FaceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn known_face(&self) -> bool {
        self.known_face
    }

    /// Record this tick's detection outcome and return the transition.
    pub fn observe(&mut self, detected: bool) -> SessionEvent {
        if detected {
            self.no_detection_streak = 0;
            if self.known_face {
                SessionEvent::Tracking
            } else {
                self.known_face = true;
                SessionEvent::NewFace
            }
        } else {
            self.no_detection_streak += 1;
            if self.no_detection_streak >= LOST_THRESHOLD {
                self.known_face = false;
                self.no_detection_streak = 0;
                SessionEvent::Lost
            } else {
                SessionEvent::Absent
            }
        }
    }
}
