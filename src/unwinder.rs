#![allow(deprecated)]

//! # The Tenor Unwinder Blueprint
//!
//! Winds the protocol down once the base ledger has been caged (global settlement).
//!
//! ## Lifecycle
//! `Idle -> Caged -> SeriesSettling -> ProfitSkimmed`
//! 1. **Cage:** anyone may cage the Unwinder once the base ledger reports it is no longer live. This shuts the
//!    Ledger and Custodian down: no more borrowing, migrations or debt advances.
//! 2. **Finalize:** the admin gives every series fixed settlement values, i.e. a price for every registered
//!    collateral type (from the base ledger's final tags where the collateral lives there, from the oracle
//!    otherwise) and the series accrual at shutdown.
//! 3. **Settle:** anyone may settle a position of a finalized series at the fixed values.
//! 4. **Skim:** the admin sweeps the Custodian's surplus savings to a destination account.

use crate::custodian::custodian::Custodian;
use crate::errors::*;
use crate::events::*;
use crate::ledger::ledger::Ledger;
use crate::shared_structs::*;
use scrypto::prelude::*;

#[blueprint]
#[events(EventCaged, EventSeriesFinalized, EventProfitSkimmed)]
mod unwinder {
    enable_method_auth! {
        methods {
            cage => PUBLIC;
            finalize_series => restrict_to: [OWNER];
            finalize_all_series => restrict_to: [OWNER];
            settle_position => PUBLIC;
            get_state => PUBLIC;
            get_skimmable_profit => PUBLIC;
            skim => restrict_to: [OWNER];
        }
    }

    struct Unwinder {
        state: crate::shared_structs::UnwinderState,
        badge_vault: FungibleVault,
        ledger: Global<Ledger>,
        custodian: Global<Custodian>,
        base_ledger: Global<AnyComponent>,
    }

    impl Unwinder {
        pub fn instantiate(
            controller_badge: Bucket,
            owner_role: OwnerRole,
            ledger_address: ComponentAddress,
            custodian_address: ComponentAddress,
            base_ledger_address: ComponentAddress,
        ) -> Global<Unwinder> {
            Self {
                state: crate::shared_structs::UnwinderState::Idle,
                badge_vault: FungibleVault::with_bucket(controller_badge.as_fungible()),
                ledger: Global::from(ledger_address),
                custodian: Global::from(custodian_address),
                base_ledger: Global::from(base_ledger_address),
            }
            .instantiate()
            .prepare_to_globalize(owner_role)
            .metadata(metadata! {
                init {
                    "name" => "Tenor Unwinder".to_string(), updatable;
                    "description" => "Settles Tenor after base ledger shutdown".to_string(), updatable;
                }
            })
            .globalize()
        }

        /// Shuts Tenor down after the base ledger has been caged.
        ///
        /// # Panics
        /// * If the base ledger is still live ("Unwinder: Base ledger not caged").
        /// * If the Unwinder was already caged.
        pub fn cage(&mut self) {
            let base_ledger_live: bool = self.base_ledger.call_raw("is_live", scrypto_args!());
            ensure(!base_ledger_live, ProtocolError::ShutdownNotActive).or_revert();
            self.state = self.state.cage().or_revert();

            self.badge_vault.authorize_with_amount(dec!("0.75"), || {
                self.ledger.shutdown();
                self.custodian.shutdown();
            });

            let timestamp = Clock::current_time_rounded_to_seconds().seconds_since_unix_epoch;
            info!("Tenor caged at {}", timestamp);

            Runtime::emit_event(EventCaged { timestamp });
        }

        /// Fixes the settlement values of a series.
        ///
        /// # Panics
        /// * If the Unwinder is not caged.
        /// * If the series is unknown or already finalized.
        pub fn finalize_series(&mut self, maturity: i64) {
            self.state = self.state.finalize_series().or_revert();

            let settlement = self.settlement_values(maturity);
            let accrual = settlement.accrual;

            self.badge_vault.authorize_with_amount(dec!("0.75"), || {
                self.ledger.fix_series(maturity, settlement)
            });

            Runtime::emit_event(EventSeriesFinalized { maturity, accrual });
        }

        /// Finalizes every series that has not been finalized yet.
        pub fn finalize_all_series(&mut self) {
            for maturity in self.ledger.get_series_list() {
                if self.ledger.get_series(maturity).settlement.is_none() {
                    self.finalize_series(maturity);
                }
            }
        }

        /// Settles a user's debt in a finalized series at the fixed settlement values.
        pub fn settle_position(&mut self, maturity: i64, user: NonFungibleLocalId) {
            ensure(
                self.ledger.get_series(maturity).settlement.is_some(),
                ProtocolError::SeriesNotSettled,
            )
            .or_revert();

            self.badge_vault
                .authorize_with_amount(dec!("0.75"), || self.ledger.settle(maturity, user));
        }

        /// Sweeps the Custodian's surplus savings into the `destination` account.
        ///
        /// # Returns
        /// * `Decimal`: Savings units transferred. Zero if there is no surplus.
        ///
        /// # Panics
        /// * If the Unwinder is not caged.
        pub fn skim(&mut self, destination: ComponentAddress) -> Decimal {
            self.state = self.state.skim().or_revert();

            let profit = self.custodian.get_skimmable_profit();
            if profit > Decimal::ZERO {
                let savings = self
                    .badge_vault
                    .authorize_with_amount(dec!("0.75"), || self.custodian.take_savings(profit));
                let mut account: Global<Account> = Global::from(destination);
                account.try_deposit_or_abort(savings, None);

                info!("Skimmed {} savings to {:?}", profit, destination);

                Runtime::emit_event(EventProfitSkimmed {
                    destination,
                    amount: profit,
                });
            }

            profit
        }

        pub fn get_state(&self) -> crate::shared_structs::UnwinderState {
            self.state
        }

        pub fn get_skimmable_profit(&self) -> Decimal {
            self.custodian.get_skimmable_profit()
        }

        fn settlement_values(&self, maturity: i64) -> SeriesSettlement {
            let accrual = self
                .ledger
                .get_series(maturity)
                .accrual(self.ledger.get_base_rate());

            let prices = self
                .ledger
                .get_collateral_list()
                .into_iter()
                .map(|collateral| {
                    let collateral_type = self.ledger.get_collateral(collateral);
                    let price = match collateral_type.route {
                        CollateralRoute::BaseLedger => {
                            let tag: Decimal = self
                                .base_ledger
                                .call_raw("get_final_tag", scrypto_args!(collateral));
                            Decimal::ONE / tag
                        }
                        _ => self.ledger.get_price(collateral),
                    };
                    (collateral, price)
                })
                .collect();

            SeriesSettlement { prices, accrual }
        }
    }
}
