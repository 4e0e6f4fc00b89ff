/// How multiple yearly records of one initiative are reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Policy {
    /// One row per initiative: its most recent record.
    UniqueInitiatives,
    /// Every current-year row, plus the most recent older row per initiative.
    MultipleInstruments,
}

impl Policy {
    pub fn as_str(&self) -> &str {
        match self {
            Policy::UniqueInitiatives => "unique",
            Policy::MultipleInstruments => "multiple",
        }
    }

    /// Wording shown to people picking a policy.
    pub fn label(&self) -> &str {
        match self {
            Policy::UniqueInitiatives => "Gather unique policy initiatives",
            Policy::MultipleInstruments => "Gather policy initiatives with multiple instruments",
        }
    }

    /// Accepts the short names and the full labels, case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        [Policy::UniqueInitiatives, Policy::MultipleInstruments]
            .into_iter()
            .find(|p| s == p.as_str() || s == p.label().to_lowercase())
    }
}
