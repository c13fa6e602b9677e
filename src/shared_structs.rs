//! # Shared structs
//! Data types used by more than one Tenor blueprint, plus the guarded state transitions of series and of the
//! Unwinder.

use crate::accounting::rate_growth;
use crate::errors::{ensure, ProtocolError};
use scrypto::prelude::*;

/// Data of an account badge. The badge's local id identifies the user in every Ledger operation.
#[derive(ScryptoSbor, NonFungibleData, Clone, Debug)]
pub struct LedgerAccount {
    /// Time the account was opened.
    pub opened_at: Instant,
}

/// Where the Custodian keeps a collateral type.
#[derive(ScryptoSbor, PartialEq, Eq, Clone, Copy, Debug)]
pub enum CollateralRoute {
    /// Deposited into the Custodian's own urn in the base ledger, where it backs Custodian debt.
    BaseLedger,
    /// The savings asset itself, pooled with the Custodian's savings.
    Savings,
    /// Kept in a plain Custodian vault.
    Held,
}

#[derive(ScryptoSbor, Clone, Debug)]
pub struct CollateralType {
    /// Disabled types can no longer be posted. Existing positions are unaffected.
    pub enabled: bool,
    pub route: CollateralRoute,
}

/// A user's posted collateral, debt per series and delegates.
#[derive(ScryptoSbor, Clone, Debug, Default)]
pub struct Position {
    /// Posted amount per collateral type.
    pub posted: HashMap<ResourceAddress, Decimal>,
    /// Face debt per series maturity.
    pub debts: HashMap<i64, Decimal>,
    /// Accounts allowed to act for the owner.
    pub delegates: HashSet<NonFungibleLocalId>,
}

impl Position {
    pub fn posted(&self, collateral: &ResourceAddress) -> Decimal {
        self.posted.get(collateral).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn face_debt(&self, maturity: i64) -> Decimal {
        self.debts.get(&maturity).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn add_posted(&mut self, collateral: ResourceAddress, amount: Decimal) {
        *self.posted.entry(collateral).or_insert(Decimal::ZERO) += amount;
    }

    pub fn remove_posted(
        &mut self,
        collateral: ResourceAddress,
        amount: Decimal,
    ) -> Result<(), ProtocolError> {
        let posted = self.posted(&collateral);
        ensure(amount <= posted, ProtocolError::InsufficientCollateral)?;
        self.posted.insert(collateral, posted - amount);
        Ok(())
    }

    pub fn add_debt(&mut self, maturity: i64, face: Decimal) {
        *self.debts.entry(maturity).or_insert(Decimal::ZERO) += face;
    }

    pub fn remove_debt(&mut self, maturity: i64, face: Decimal) -> Result<(), ProtocolError> {
        let debt = self.face_debt(maturity);
        ensure(face <= debt, ProtocolError::RepaymentExceedsDebt)?;
        self.debts.insert(maturity, debt - face);
        Ok(())
    }

    pub fn clear_debt(&mut self, maturity: i64) -> Decimal {
        self.debts.remove(&maturity).unwrap_or(Decimal::ZERO)
    }

    /// True if `caller` is the position's owner or one of its delegates.
    pub fn is_authorized(&self, owner: &NonFungibleLocalId, caller: &NonFungibleLocalId) -> bool {
        owner == caller || self.delegates.contains(caller)
    }
}

/// Settlement values of a series fixed during shutdown.
#[derive(ScryptoSbor, Clone, Debug, PartialEq)]
pub struct SeriesSettlement {
    /// Debt units per collateral unit, per collateral type.
    pub prices: HashMap<ResourceAddress, Decimal>,
    /// Debt units per face unit.
    pub accrual: Decimal,
}

/// A fixed-maturity debt cohort, identified by its maturity timestamp.
#[derive(ScryptoSbor, Clone, Debug)]
pub struct Series {
    pub maturity: i64,
    pub matured: bool,
    /// Base rate of the primary collateral when the series matured.
    pub rate_at_maturity: Option<Decimal>,
    /// Written once, by the Unwinder.
    pub settlement: Option<SeriesSettlement>,
}

impl Series {
    pub fn new(maturity: i64, now: i64) -> Result<Self, ProtocolError> {
        ensure(maturity > now, ProtocolError::InvalidMaturity)?;
        Ok(Self {
            maturity,
            matured: false,
            rate_at_maturity: None,
            settlement: None,
        })
    }

    pub fn is_due(&self, now: i64) -> bool {
        now >= self.maturity
    }

    /// Matures the series at `now`, snapshotting the base rate.
    pub fn mature(&mut self, now: i64, rate: Decimal) -> Result<(), ProtocolError> {
        ensure(!self.matured, ProtocolError::SeriesAlreadyMatured)?;
        ensure(self.is_due(now), ProtocolError::SeriesNotMature)?;
        self.matured = true;
        self.rate_at_maturity = Some(rate);
        Ok(())
    }

    /// Matures the series regardless of time. Used when the system is shut down.
    pub fn force_mature(&mut self, rate: Decimal) {
        if !self.matured {
            self.matured = true;
            self.rate_at_maturity = Some(rate);
        }
    }

    pub fn fix(&mut self, settlement: SeriesSettlement, rate: Decimal) -> Result<(), ProtocolError> {
        ensure(self.settlement.is_none(), ProtocolError::SeriesAlreadySettled)?;
        self.force_mature(rate);
        self.settlement = Some(settlement);
        Ok(())
    }

    /// Debt units per face unit at base rate `rate_now`.
    pub fn accrual(&self, rate_now: Decimal) -> Decimal {
        match &self.settlement {
            Some(settlement) => settlement.accrual,
            None if self.matured => rate_growth(rate_now, self.rate_at_maturity),
            None => Decimal::ONE,
        }
    }
}

/// Lifecycle of the Unwinder.
#[derive(ScryptoSbor, PartialEq, Eq, Clone, Copy, Debug)]
pub enum UnwinderState {
    Idle,
    Caged,
    SeriesSettling,
    ProfitSkimmed,
}

impl UnwinderState {
    pub fn is_caged(&self) -> bool {
        *self != UnwinderState::Idle
    }

    pub fn cage(self) -> Result<Self, ProtocolError> {
        match self {
            UnwinderState::Idle => Ok(UnwinderState::Caged),
            _ => Err(ProtocolError::InvalidTransition),
        }
    }

    /// Finalizing series is allowed at any point after caging; it only advances a freshly caged system.
    pub fn finalize_series(self) -> Result<Self, ProtocolError> {
        match self {
            UnwinderState::Idle => Err(ProtocolError::ShutdownNotActive),
            UnwinderState::Caged => Ok(UnwinderState::SeriesSettling),
            other => Ok(other),
        }
    }

    pub fn skim(self) -> Result<Self, ProtocolError> {
        match self {
            UnwinderState::Idle => Err(ProtocolError::ShutdownNotActive),
            _ => Ok(UnwinderState::ProfitSkimmed),
        }
    }
}
