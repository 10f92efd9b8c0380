/// The two phases a job passes through: a `prepare` phase where the Task
/// Expander synthesizes tasks, then a `transfer` phase where the dispatch
/// loop drains `todo`. A task is only eligible once its job's `transfer`
/// phase has opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Prepare,
    Transfer,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prepare" => Ok(Self::Prepare),
            "transfer" => Ok(Self::Transfer),
            other => Err(format!("unknown job phase: {other}")),
        }
    }
}

/// A `(prepare, transfer)` epoch pair: start/finish milliseconds since the
/// Unix epoch, recorded as a phase opens and closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseTiming {
    pub start: Option<i64>,
    pub finish: Option<i64>,
}

/// A client-submitted batch of transfers. Owns its tasks, data items, and
/// attempts (deletes cascade).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: i64,
    pub client_ref: String,
    pub max_attempts: u32,
    pub prepare: PhaseTiming,
    pub transfer: PhaseTiming,
}

impl Job {
    pub fn new(id: i64, client_ref: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            id,
            client_ref: client_ref.into(),
            max_attempts: max_attempts.max(1),
            prepare: PhaseTiming::default(),
            transfer: PhaseTiming::default(),
        }
    }

    /// `true` once the `transfer` phase has opened — the first of the
    /// `todo` eligibility conditions.
    pub fn transfer_open(&self) -> bool {
        self.transfer.start.is_some()
    }
}
