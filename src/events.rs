//! Defines events emitted by the Tenor protocol components.

use scrypto::prelude::*;
use crate::accounting::SettlementPart;
use crate::shared_structs::*;

/// Emitted when collateral is posted to an account.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventPosted {
    /// Account the collateral was posted to.
    pub user: NonFungibleLocalId,
    /// Collateral type posted.
    pub collateral: ResourceAddress,
    /// Amount posted.
    pub amount: Decimal,
}

/// Emitted when posted collateral is withdrawn by its owner or a delegate.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventWithdrawn {
    pub user: NonFungibleLocalId,
    pub collateral: ResourceAddress,
    pub amount: Decimal,
}

/// Emitted when debt is drawn against a series.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventBorrowed {
    /// Maturity of the series borrowed from.
    pub maturity: i64,
    pub user: NonFungibleLocalId,
    /// Debt units paid out.
    pub amount: Decimal,
}

#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventRepaid {
    pub maturity: i64,
    pub user: NonFungibleLocalId,
    /// Debt units paid in.
    pub amount: Decimal,
    /// Face units extinguished.
    pub face: Decimal,
}

/// Emitted when collateral is seized by a liquidation authority.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventGrabbed {
    pub user: NonFungibleLocalId,
    /// Collateral units seized.
    pub tokens: Decimal,
}

/// Emitted for every collateral type touched when a series position is settled.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventSettled {
    pub maturity: i64,
    pub user: NonFungibleLocalId,
    /// Collateral units forfeited to the Custodian.
    pub tokens: Decimal,
    /// Debt units covered by the forfeited collateral.
    pub dai_debt: Decimal,
    /// Face units extinguished.
    pub ydai_debt: Decimal,
}

impl EventSettled {
    pub fn from_part(maturity: i64, user: NonFungibleLocalId, part: &SettlementPart<ResourceAddress>) -> Self {
        Self {
            maturity,
            user,
            tokens: part.tokens,
            dai_debt: part.debt,
            ydai_debt: part.face,
        }
    }
}

/// Emitted when posted collateral could not cover a settled position.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventSettlementShortfall {
    pub maturity: i64,
    pub user: NonFungibleLocalId,
    /// Debt units left uncovered.
    pub shortfall: Decimal,
}

#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventSeriesAdded {
    pub maturity: i64,
}

#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventSeriesMatured {
    pub maturity: i64,
    /// Base rate snapshot taken at maturity.
    pub rate: Decimal,
}

#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventCollateralAdded {
    pub collateral: ResourceAddress,
    pub route: CollateralRoute,
}

/// Emitted by the Migrator when collateral moves into a base ledger urn.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventCollateralMigrated {
    pub user: NonFungibleLocalId,
    pub destination: ComponentAddress,
    pub collateral: ResourceAddress,
    pub amount: Decimal,
}

/// Emitted by the Migrator when a series position moves into a base ledger urn.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventPositionMigrated {
    pub maturity: i64,
    pub user: NonFungibleLocalId,
    pub destination: ComponentAddress,
    pub collateral: ResourceAddress,
    /// Collateral units moved.
    pub tokens: Decimal,
    /// Debt units the position owed.
    pub dai_debt: Decimal,
    /// Normalized base ledger debt opened for `destination`.
    pub normalized_debt: Decimal,
}

#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventCaged {
    pub timestamp: i64,
}

#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventSeriesFinalized {
    pub maturity: i64,
    pub accrual: Decimal,
}

/// Emitted when the Custodian's surplus is swept during shutdown.
#[derive(ScryptoSbor, ScryptoEvent, Clone)]
pub struct EventProfitSkimmed {
    pub destination: ComponentAddress,
    /// Savings units transferred.
    pub amount: Decimal,
}
