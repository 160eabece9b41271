//! Verdict - the classification outcome for one batch

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Intrusion,
}

impl Verdict {
    /// Wire flag: `{"intrusion": 0|1}`
    pub fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(Verdict::Clean),
            1 => Some(Verdict::Intrusion),
            _ => None,
        }
    }

    pub fn is_intrusion(&self) -> bool {
        matches!(self, Verdict::Intrusion)
    }

    /// Operator-facing headline
    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::Clean => "No Intrusion Detected",
            Verdict::Intrusion => "Intrusion Detected!",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}
