/// Entry state definitions for tracking one queue entry through the
/// retry controller
use std::fmt;

/// Represents where a queue entry is in its retry cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    // ===== Active States =====
    /// Entry has not been attempted yet
    Idle,

    /// A fetch/classify/persist attempt is running
    Attempting,

    /// The last attempt failed transiently; a retry may follow
    SoftFail,

    // ===== Terminal States =====
    /// Entry fully handled
    Success,

    /// Bot-defense challenge detected; domain is blocklisted
    HardBlock,

    /// Retry budget used up
    Exhausted,
}

impl EntryState {
    /// Returns true if no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::HardBlock | Self::Exhausted)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: EntryState) -> bool {
        use EntryState::*;
        matches!(
            (self, next),
            (Idle, Attempting)
                | (Attempting, Success)
                | (Attempting, HardBlock)
                | (Attempting, SoftFail)
                | (SoftFail, Attempting)
                | (SoftFail, Exhausted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Attempting => "attempting",
            Self::SoftFail => "soft_fail",
            Self::Success => "success",
            Self::HardBlock => "hard_block",
            Self::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final result of handling one queue entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Entry handled; `outlier` is set when the link set was reduced to
    /// documents only, `link_failures` counts individually logged links
    Succeeded { outlier: bool, link_failures: usize },

    /// URL was already in the processed set
    AlreadyProcessed,

    /// Label satisfied by a literal artifact, no network access
    Literal,

    /// Domain was on the blocklist before the entry started
    BlockedDomain,

    /// Challenge detected during this entry; domain newly blocklisted
    ChallengeBlocked { domain: String },

    /// Every attempt failed transiently
    Exhausted { attempts: u32 },

    /// Entry could not be started (unparsable URL, unwritable directory)
    Rejected { reason: String },
}

impl EntryOutcome {
    /// Returns true if this outcome wrote a failure ledger row for the entry
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::BlockedDomain
                | Self::ChallengeBlocked { .. }
                | Self::Exhausted { .. }
                | Self::Rejected { .. }
        )
    }

    /// Returns true if the entry ended with its URL marked processed
    pub fn marks_processed(&self) -> bool {
        !matches!(self, Self::AlreadyProcessed)
    }
}
