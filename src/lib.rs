//! # Tenor Protocol Crate
//!
//! This crate contains the Scrypto blueprints for Tenor, a fixed-term lending layer on top of a base
//! collateral/debt ledger. Users post collateral of several types into a single account and borrow debt units
//! from fixed-maturity series. Before maturity a series owes exactly what was borrowed; after maturity the debt
//! accrues at the base ledger's stability rate until it is repaid or settled against the posted collateral.
//!
//! ## Modules
//!
//! - `ledger`: The `Ledger` component, which owns accounts, collateral balances and series debt, enforces
//!   collateralization and settles matured debt. Its `instantiate` function sets up the whole stack.
//! - `custodian`: The `Custodian` component, which holds all pooled collateral and savings, runs the
//!   protocol's urns in the base ledger and pays out or takes in debt units.
//! - `migrator`: The `Migrator` component, which moves collateral and series positions into base ledger urns.
//! - `unwinder`: The `Unwinder` component, which fixes settlement values and sweeps surplus after the base
//!   ledger shuts down.
//! - `liquidations`: The `Liquidations` component, the authority allowed to seize unneeded collateral.
//! - `accounting`: Pure fixed-point arithmetic for valuation, accrual and settlement planning.
//! - `shared_structs`: Data structures shared across components, such as `Position`, `Series` and
//!   `UnwinderState`.
//! - `events`: Events emitted by the components, allowing off-ledger services to track state changes.
//! - `errors`: The `ProtocolError` type and the helpers that turn failed checks into transaction reverts.

pub mod accounting;
pub mod custodian;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod liquidations;
pub mod migrator;
pub mod shared_structs;
pub mod unwinder;
