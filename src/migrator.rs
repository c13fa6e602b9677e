#![allow(deprecated)]

//! # The Tenor Migrator Blueprint
//!
//! Moves collateral and whole series positions out of the Ledger and into a base ledger urn owned by another
//! component, without the user having to repay first.
//!
//! Both migrations are atomic. The Ledger debits the position, then the Custodian forks the collateral (and
//! for positions the equivalent normalized debt) from its own urn into the destination urn. The Migrator calls
//! both with the controller badge it received at instantiation.

use crate::accounting::*;
use crate::custodian::custodian::Custodian;
use crate::errors::*;
use crate::events::*;
use crate::ledger::ledger::Ledger;
use crate::shared_structs::*;
use scrypto::prelude::*;

#[blueprint]
#[events(EventCollateralMigrated, EventPositionMigrated)]
mod migrator {
    enable_method_auth! {
        methods {
            migrate_collateral => PUBLIC;
            migrate_position => PUBLIC;
            get_ledger_address => PUBLIC;
        }
    }

    struct Migrator {
        badge_vault: FungibleVault,
        ledger: Global<Ledger>,
        custodian: Global<Custodian>,
        base_ledger: Global<AnyComponent>,
    }

    impl Migrator {
        pub fn instantiate(
            controller_badge: Bucket,
            owner_role: OwnerRole,
            ledger_address: ComponentAddress,
            custodian_address: ComponentAddress,
            base_ledger_address: ComponentAddress,
        ) -> Global<Migrator> {
            Self {
                badge_vault: FungibleVault::with_bucket(controller_badge.as_fungible()),
                ledger: Global::from(ledger_address),
                custodian: Global::from(custodian_address),
                base_ledger: Global::from(base_ledger_address),
            }
            .instantiate()
            .prepare_to_globalize(owner_role)
            .metadata(metadata! {
                init {
                    "name" => "Tenor Migrator".to_string(), updatable;
                    "description" => "Moves Tenor positions into base ledger urns".to_string(), updatable;
                }
            })
            .globalize()
        }

        /// Moves posted collateral into the base ledger urn of `destination`.
        ///
        /// # Arguments
        /// * `account_proof`: Proof of the owner's or a delegate's account badge.
        /// * `user`: The account to migrate from.
        /// * `destination`: Owner of the receiving urn.
        /// * `collateral`: A collateral type kept in the base ledger.
        /// * `amount`: Collateral units to move.
        ///
        /// # Panics
        /// * If the caller is neither owner nor delegate.
        /// * If the collateral is not kept in the base ledger, or the remaining collateral would not cover the
        ///   account's debt.
        pub fn migrate_collateral(
            &mut self,
            account_proof: NonFungibleProof,
            user: NonFungibleLocalId,
            destination: ComponentAddress,
            collateral: ResourceAddress,
            amount: Decimal,
        ) {
            self.check_authorized(account_proof, &user);

            self.badge_vault.authorize_with_amount(dec!("0.75"), || {
                self.ledger.extract_collateral(user.clone(), collateral, amount);
                self.custodian
                    .migrate_out(collateral, amount, destination, Decimal::ZERO);
            });

            info!("Migrated {} collateral of account {} to {:?}", amount, user, destination);

            Runtime::emit_event(EventCollateralMigrated {
                user,
                destination,
                collateral,
                amount,
            });
        }

        /// Moves a series position into the base ledger urn of `destination`.
        ///
        /// The series debt `d` becomes `d / rate` normalized debt in the destination urn, together with the
        /// primary collateral backing it.
        ///
        /// # Panics
        /// * If the caller is neither owner nor delegate.
        /// * If the system is shut down or the series has matured.
        /// * If the destination urn would be unsafe, or the rest of the position would be undercollateralized.
        pub fn migrate_position(
            &mut self,
            account_proof: NonFungibleProof,
            maturity: i64,
            user: NonFungibleLocalId,
            destination: ComponentAddress,
        ) {
            self.check_authorized(account_proof, &user);

            let (collateral, tokens, dai_debt) = self.badge_vault.authorize_with_amount(dec!("0.75"), || {
                self.ledger.extract_position(maturity, user.clone())
            });

            let rate: Decimal = self
                .base_ledger
                .call_raw("get_rate", scrypto_args!(collateral));
            let art = normalized_debt(dai_debt, rate);

            self.badge_vault.authorize_with_amount(dec!("0.75"), || {
                self.custodian.migrate_out(collateral, tokens, destination, art)
            });

            info!(
                "Migrated series {} position of account {} to {:?}: {} collateral, {} debt",
                maturity, user, destination, tokens, dai_debt
            );

            Runtime::emit_event(EventPositionMigrated {
                maturity,
                user,
                destination,
                collateral,
                tokens,
                dai_debt,
                normalized_debt: art,
            });
        }

        pub fn get_ledger_address(&self) -> ComponentAddress {
            self.ledger.address()
        }

        fn check_authorized(&self, account_proof: NonFungibleProof, user: &NonFungibleLocalId) {
            let caller = account_proof
                .check_with_message(self.ledger.get_account_address(), "Invalid account proof")
                .non_fungible::<LedgerAccount>()
                .local_id()
                .clone();

            ensure(
                self.ledger.is_authorized(user.clone(), caller),
                ProtocolError::NotAuthorized,
            )
            .or_revert();
        }
    }
}
