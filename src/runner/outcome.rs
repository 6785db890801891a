//! Phase outcomes

use std::fmt;

/// What a task callback asks the runner to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Keep going
    Continue,
    /// Stop: skip the rest of this task (pre-execute) or halt the run
    Halt,
    /// The callback expressed no preference; treated as [`Outcome::Continue`]
    #[default]
    Unspecified,
}

impl Outcome {
    pub fn is_halt(self) -> bool {
        matches!(self, Outcome::Halt)
    }

    pub fn should_continue(self) -> bool {
        !self.is_halt()
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        if value {
            Outcome::Continue
        } else {
            Outcome::Halt
        }
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Unspecified
    }
}

impl From<Option<bool>> for Outcome {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Outcome::Unspecified, Outcome::from)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Continue => write!(f, "continue"),
            Outcome::Halt => write!(f, "halt"),
            Outcome::Unspecified => write!(f, "unspecified"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_halt_stops() {
        assert!(Outcome::Continue.should_continue());
        assert!(Outcome::Unspecified.should_continue());
        assert!(Outcome::Halt.is_halt());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Outcome::from(true), Outcome::Continue);
        assert_eq!(Outcome::from(false), Outcome::Halt);
        assert_eq!(Outcome::from(()), Outcome::Unspecified);
        assert_eq!(Outcome::from(None::<bool>), Outcome::Unspecified);
    }
}
