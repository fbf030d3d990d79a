//! Two-tier error taxonomy: recoverable user mistakes vs. fatal invariant
//! violations.

use thiserror::Error;

/// Recoverable: bad input from the caster or the surrounding interface.
/// Raising one of these must leave simulation state untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserError {
    #[error("unknown spell: {0}")]
    UnknownSpell(String),
    #[error("unknown draw mode: {0}")]
    UnknownDrawMode(String),
    #[error("location out of bounds: {0:?}")]
    OutOfBounds(crate::location::Location),
    #[error("spell {spell} already cast on this tile this turn")]
    DoubleCast { spell: String },
    #[error("not enough mana: need {need}, have {have}")]
    InsufficientMana { need: f64, have: f64 },
    #[error("spell {spell} cannot be cast here: {reason}")]
    UncastableHere { spell: String, reason: String },
    #[error("caster level too low: need {need}, have {have}")]
    LevelTooLow { need: u32, have: u32 },
    #[error("missing prerequisite spell {spell} at level {level}")]
    MissingPrereq { spell: String, level: u32 },
    #[error("talent already at max level: {0}")]
    TalentAtMax(String),
    #[error("no talent points remaining")]
    NoTalentPoints,
    #[error("malformed location string: {0}")]
    BadLocationString(String),
    #[error("no city at location {0:?}")]
    NoCityHere(crate::location::Location),
    #[error("bad command: {0}")]
    BadCommand(String),
    #[error("turn count out of range [1,100]: {0}")]
    BadTurnCount(i64),
}

/// Unrecoverable: an invariant was violated. The caller should halt rather
/// than attempt to continue the turn loop.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgramError {
    #[error("invariant violated: {0}")]
    Invariant(String),
    #[error("user error surfaced inside an atomic apply sequence: {0}")]
    ReclassifiedUserError(String),
    #[error("configuration already initialized")]
    ConfigurationAlreadyCreated,
    #[error("world config variant not yet supported: {0}")]
    UnsupportedWorldConfig(String),
}

/// Top-level sum type returned from command dispatch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BaalError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Program(#[from] ProgramError),
}

pub type UserResult<T> = Result<T, UserError>;
pub type ProgramResult<T> = Result<T, ProgramError>;
pub type BaalResult<T> = Result<T, BaalError>;

/// Runs the atomic cast sequence (mutate caster -> apply spell -> award
/// exp) and reclassifies any `UserError` that escapes it as a fatal
/// `ProgramError`.
///
/// By the time this runs, `verify_apply` has already passed, so any
/// further user error indicates a broken invariant, not a legitimate
/// mistake by the caster.
pub fn run_atomic<T>(f: impl FnOnce() -> UserResult<T>) -> Result<T, ProgramError> {
    f().map_err(|e| ProgramError::ReclassifiedUserError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_reclassifies_user_error() {
        let result: Result<(), ProgramError> =
            run_atomic(|| Err(UserError::NoTalentPoints));
        assert!(matches!(result, Err(ProgramError::ReclassifiedUserError(_))));
    }

    #[test]
    fn atomic_passes_through_success() {
        let result = run_atomic(|| Ok(42));
        assert_eq!(result, Ok(42));
    }
}
