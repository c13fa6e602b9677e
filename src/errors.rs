//! Error taxonomy shared by all Tenor blueprints.
//!
//! Pure code (accounting, state transitions) returns `Result<_, ProtocolError>`. Blueprint methods turn a
//! failed `Result` into a transaction revert with [`Revert::or_revert`], so the engine reports the error
//! message as the failure reason and no partial state is committed.

use core::fmt;
use scrypto::prelude::*;

#[derive(ScryptoSbor, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    InsufficientCollateral,
    ExcessiveDebt,
    NotAuthorized,
    SeriesNotMature,
    SeriesAlreadyMatured,
    SeriesAlreadySettled,
    SeriesNotSettled,
    MissingSettlementPrice,
    SeriesAlreadyExists,
    UnknownSeries,
    InsufficientFunds,
    ShutdownActive,
    ShutdownNotActive,
    UnknownAccount,
    UnknownCollateral,
    CollateralNotAccepted,
    CollateralNotMigratable,
    InvalidAmount,
    InvalidMaturity,
    RepaymentExceedsDebt,
    InvalidTransition,
}

impl ProtocolError {
    pub fn message(&self) -> &str {
        match self {
            ProtocolError::InsufficientCollateral => "Ledger: Insufficient collateral",
            ProtocolError::ExcessiveDebt => "Ledger: Too much debt",
            ProtocolError::NotAuthorized => "Migrator: Only owner or delegate",
            ProtocolError::SeriesNotMature => "Ledger: Series not mature",
            ProtocolError::SeriesAlreadyMatured => "Ledger: Series already matured",
            ProtocolError::SeriesAlreadySettled => "Unwinder: Series already finalized",
            ProtocolError::SeriesNotSettled => "Unwinder: Series not finalized",
            ProtocolError::MissingSettlementPrice => "Ledger: No settlement price",
            ProtocolError::SeriesAlreadyExists => "Ledger: Series already exists",
            ProtocolError::UnknownSeries => "Ledger: Unknown series",
            ProtocolError::InsufficientFunds => "Custodian: Insufficient funds",
            ProtocolError::ShutdownActive => "Shutdown active",
            ProtocolError::ShutdownNotActive => "Unwinder: Base ledger not caged",
            ProtocolError::UnknownAccount => "Ledger: Unknown account",
            ProtocolError::UnknownCollateral => "Unknown collateral",
            ProtocolError::CollateralNotAccepted => "Ledger: Collateral not accepted",
            ProtocolError::CollateralNotMigratable => "Migrator: Collateral not held in base ledger",
            ProtocolError::InvalidAmount => "Amount must be positive",
            ProtocolError::InvalidMaturity => "Ledger: Maturity must be in the future",
            ProtocolError::RepaymentExceedsDebt => "Ledger: Repayment exceeds debt",
            ProtocolError::InvalidTransition => "Invalid state transition",
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Returns `Err(error)` unless `condition` holds.
pub fn ensure(condition: bool, error: ProtocolError) -> Result<(), ProtocolError> {
    if condition {
        Ok(())
    } else {
        Err(error)
    }
}

/// Aborts the running transaction on error.
pub trait Revert<T> {
    fn or_revert(self) -> T;
}

impl<T> Revert<T> for Result<T, ProtocolError> {
    fn or_revert(self) -> T {
        match self {
            Ok(value) => value,
            Err(error) => panic!("{}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_passes_through_conditions() {
        assert_eq!(ensure(true, ProtocolError::InvalidAmount), Ok(()));
        assert_eq!(
            ensure(false, ProtocolError::ExcessiveDebt),
            Err(ProtocolError::ExcessiveDebt)
        );
    }

    #[test]
    fn display_uses_revert_message() {
        assert_eq!(ProtocolError::ExcessiveDebt.to_string(), "Ledger: Too much debt");
    }

    #[test]
    #[should_panic(expected = "Custodian: Insufficient funds")]
    fn or_revert_panics_with_message() {
        let result: Result<(), ProtocolError> = Err(ProtocolError::InsufficientFunds);
        result.or_revert();
    }
}
