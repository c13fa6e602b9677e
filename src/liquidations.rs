#![allow(deprecated)]

//! # The Tenor Liquidations Blueprint
//! Liquidation authority of the Ledger. Holds a controller badge and lets the admin seize collateral that
//! does not back any debt.

use crate::ledger::ledger::Ledger;
use scrypto::prelude::*;

#[blueprint]
mod liquidations {
    enable_method_auth! {
        methods {
            seize => restrict_to: [OWNER];
            get_ledger_address => PUBLIC;
        }
    }

    struct Liquidations {
        badge_vault: FungibleVault,
        ledger: Global<Ledger>,
    }

    impl Liquidations {
        pub fn instantiate(
            controller_badge: Bucket,
            owner_role: OwnerRole,
            ledger_address: ComponentAddress,
        ) -> Global<Liquidations> {
            Self {
                badge_vault: FungibleVault::with_bucket(controller_badge.as_fungible()),
                ledger: Global::from(ledger_address),
            }
            .instantiate()
            .prepare_to_globalize(owner_role)
            .metadata(metadata! {
                init {
                    "name" => "Tenor Liquidations".to_string(), updatable;
                }
            })
            .globalize()
        }

        /// Seizes `amount` of a user's posted collateral through `Ledger::grab`.
        pub fn seize(
            &mut self,
            user: NonFungibleLocalId,
            collateral: ResourceAddress,
            amount: Decimal,
        ) -> Bucket {
            self.badge_vault.authorize_with_amount(dec!("0.75"), || {
                self.ledger.grab(user, collateral, amount)
            })
        }

        pub fn get_ledger_address(&self) -> ComponentAddress {
            self.ledger.address()
        }
    }
}
