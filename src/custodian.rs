#![allow(deprecated)]

//! # The Tenor Custodian Blueprint
//!
//! Pools every unit of collateral posted through the Ledger together with the protocol's savings, and is the
//! only Tenor component that talks to the base ledger's urns.
//!
//! ## Custody routes
//! - `BaseLedger` collateral goes straight into the Custodian's own urn, where it also backs the debt the
//!   Custodian draws to pay out borrowers.
//! - `Savings` collateral is the savings asset itself and is pooled in the savings vault.
//! - `Held` collateral sits in a plain vault per type.
//!
//! For every type the Custodian tracks the amount *reserved* for users, i.e. the sum of all posted balances.
//! Reserved funds never count as protocol funds: they can be released only on instruction of the Ledger and
//! are excluded from the skimmable profit.
//!
//! ## Debt waterfall
//! Debt units are paid out from the idle vault first, then by exiting unreserved savings, and finally by
//! drawing normalized debt from the Custodian's urns. Repayments run the other way: base ledger debt is
//! repaid first and any rest is joined into savings.
//!
//! All mutating methods are restricted to the owner role, held by the Ledger's controller badge.

use crate::accounting::*;
use crate::errors::*;
use crate::shared_structs::*;
use scrypto::prelude::*;

#[blueprint]
#[types(ResourceAddress, Vault, Decimal, CollateralRoute)]
mod custodian {
    enable_method_auth! {
        methods {
            deposit_savings => PUBLIC;
            get_reserved => PUBLIC;
            get_pooled => PUBLIC;
            get_savings_balance => PUBLIC;
            get_idle_balance => PUBLIC;
            get_base_debt => PUBLIC;
            get_skimmable_profit => PUBLIC;
            get_debt_unit_address => PUBLIC;
            get_savings_address => PUBLIC;
            is_live => PUBLIC;
            add_collateral => restrict_to: [OWNER];
            take => restrict_to: [OWNER];
            release => restrict_to: [OWNER];
            forfeit => restrict_to: [OWNER];
            advance_debt => restrict_to: [OWNER];
            receive_debt => restrict_to: [OWNER];
            push_collateral => restrict_to: [OWNER];
            pull_debt => restrict_to: [OWNER];
            migrate_out => restrict_to: [OWNER];
            take_savings => restrict_to: [OWNER];
            shutdown => restrict_to: [OWNER];
        }
    }

    struct Custodian {
        /// Own address, the owner of the Custodian's urns in the base ledger.
        component_address: ComponentAddress,
        base_ledger: Global<AnyComponent>,
        savings: Global<AnyComponent>,
        /// Idle debt units.
        debt_unit_vault: Vault,
        /// Pooled savings, reserved and unreserved.
        savings_vault: Vault,
        /// Vaults of `Held` collateral types.
        held_vaults: KeyValueStore<ResourceAddress, Vault>,
        routes: KeyValueStore<ResourceAddress, CollateralRoute>,
        /// `BaseLedger` collateral types in registration order. Debt is drawn and repaid in this order.
        base_collaterals: Vec<ResourceAddress>,
        /// Sum of all posted balances per collateral type.
        reserved: KeyValueStore<ResourceAddress, Decimal>,
        live: bool,
    }

    impl Custodian {
        /// Instantiates the Custodian. Called by the Ledger during its own instantiation.
        ///
        /// # Arguments
        /// * `owner_role`: Owner role of the component (controller badge, optionally the admin badge).
        /// * `base_ledger_address`: Address of the base ledger component.
        /// * `savings_address`: Address of the savings component.
        ///
        /// # Returns
        /// * `Global<Custodian>`: The new component.
        pub fn instantiate(
            owner_role: OwnerRole,
            base_ledger_address: ComponentAddress,
            savings_address: ComponentAddress,
        ) -> Global<Custodian> {
            let (address_reservation, component_address) =
                Runtime::allocate_component_address(Custodian::blueprint_id());

            let base_ledger: Global<AnyComponent> = Global::from(base_ledger_address);
            let savings: Global<AnyComponent> = Global::from(savings_address);
            let debt_unit_address: ResourceAddress =
                base_ledger.call_raw("get_debt_unit_address", scrypto_args!());
            let savings_resource: ResourceAddress =
                savings.call_raw("get_savings_address", scrypto_args!());

            Self {
                component_address,
                base_ledger,
                savings,
                debt_unit_vault: Vault::new(debt_unit_address),
                savings_vault: Vault::new(savings_resource),
                held_vaults: KeyValueStore::new_with_registered_type(),
                routes: KeyValueStore::new_with_registered_type(),
                base_collaterals: vec![],
                reserved: KeyValueStore::new_with_registered_type(),
                live: true,
            }
            .instantiate()
            .prepare_to_globalize(owner_role)
            .with_address(address_reservation)
            .metadata(metadata! {
                init {
                    "name" => "Tenor Custodian".to_string(), updatable;
                    "description" => "Pools collateral and savings for the Tenor Ledger".to_string(), updatable;
                }
            })
            .globalize()
        }

        //==================================================================
        //                         ADMIN METHODS
        //==================================================================

        /// Registers the custody route of a collateral type.
        ///
        /// # Panics
        /// * If the type is already registered.
        /// * If the `Savings` route is used for anything other than the savings asset.
        pub fn add_collateral(&mut self, collateral: ResourceAddress, route: CollateralRoute) {
            ensure(
                self.routes.get(&collateral).is_none(),
                ProtocolError::CollateralNotAccepted,
            )
            .or_revert();

            match route {
                CollateralRoute::BaseLedger => self.base_collaterals.push(collateral),
                CollateralRoute::Savings => ensure(
                    collateral == self.savings_vault.resource_address(),
                    ProtocolError::CollateralNotAccepted,
                )
                .or_revert(),
                CollateralRoute::Held => self.held_vaults.insert(collateral, Vault::new(collateral)),
            }

            self.routes.insert(collateral, route);
            self.reserved.insert(collateral, Decimal::ZERO);
        }

        /// Takes custody of collateral posted by a user.
        pub fn take(&mut self, collateral: Bucket) {
            let resource = collateral.resource_address();
            let amount = collateral.amount();
            self.store(collateral);
            *self.reserved.get_mut(&resource).unwrap() += amount;
        }

        /// Releases reserved collateral of a user.
        ///
        /// # Panics
        /// * If less than `amount` is reserved or pooled for this type.
        /// * If the Custodian's urn would become unsafe.
        pub fn release(&mut self, collateral: ResourceAddress, amount: Decimal) -> Bucket {
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();
            ensure(
                self.reserved_of(collateral) >= amount,
                ProtocolError::InsufficientFunds,
            )
            .or_revert();

            let bucket = self.withdraw(collateral, amount);
            *self.reserved.get_mut(&collateral).unwrap() -= amount;
            bucket
        }

        /// Un-reserves collateral forfeited at settlement. It stays in the pool as protocol funds.
        pub fn forfeit(&mut self, collateral: ResourceAddress, amount: Decimal) {
            let reserved = self.reserved_of(collateral);
            ensure(reserved >= amount, ProtocolError::InsufficientFunds).or_revert();
            self.reserved.insert(collateral, reserved - amount);
        }

        /// Pays out `amount` debt units: idle balance first, then unreserved savings, then base ledger debt.
        ///
        /// # Panics
        /// * If the Custodian is shut down.
        /// * If all sources together cannot cover `amount`.
        pub fn advance_debt(&mut self, amount: Decimal) -> Bucket {
            ensure(self.live, ProtocolError::ShutdownActive).or_revert();
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();

            let idle = self.debt_unit_vault.amount().min(amount);
            let mut payout = self.debt_unit_vault.take(idle);

            if payout.amount() < amount {
                let needed = div_up(amount - payout.amount(), self.exchange_rate())
                    .min(self.unreserved_savings());
                if needed > Decimal::ZERO {
                    let savings = self.savings_vault.take(needed);
                    let debt: Bucket = self.savings.call_raw("exit", scrypto_args!(savings));
                    payout.put(debt);
                }
            }

            if payout.amount() < amount {
                let drawn = self.draw(amount - payout.amount());
                payout.put(drawn);
            }

            if payout.amount() > amount {
                let excess = payout.amount() - amount;
                self.debt_unit_vault.put(payout.take(excess));
            }

            payout
        }

        /// Receives a debt-unit repayment: base ledger debt is repaid first, the rest joins savings.
        pub fn receive_debt(&mut self, payment: Bucket) {
            ensure(
                payment.resource_address() == self.debt_unit_vault.resource_address(),
                ProtocolError::InvalidAmount,
            )
            .or_revert();

            let mut payment = payment;
            for collateral in self.base_collaterals.clone() {
                if payment.is_empty() {
                    break;
                }
                let (_, art) = self.urn(collateral);
                if art > Decimal::ZERO {
                    payment = self.base_ledger.call_raw(
                        "decrease_debt",
                        scrypto_args!(self.component_address, collateral, payment),
                    );
                }
            }

            self.save(payment);
        }

        /// Deposits unreserved `BaseLedger` collateral into the Custodian's urn.
        pub fn push_collateral(&mut self, collateral: Bucket) {
            let route = self.route(collateral.resource_address());
            ensure(
                route == CollateralRoute::BaseLedger,
                ProtocolError::CollateralNotMigratable,
            )
            .or_revert();
            self.store(collateral);
        }

        /// Draws `amount` debt units from the base ledger against the Custodian's urns.
        pub fn pull_debt(&mut self, amount: Decimal) -> Bucket {
            ensure(self.live, ProtocolError::ShutdownActive).or_revert();
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();
            self.draw(amount)
        }

        /// Moves reserved collateral and normalized debt from the Custodian's urn into `destination`'s urn.
        /// If the Custodian owes less than `art`, the difference is drawn first and its proceeds saved.
        ///
        /// # Arguments
        /// * `collateral`: A `BaseLedger` collateral type.
        /// * `amount`: Reserved collateral units to move.
        /// * `destination`: Owner of the receiving urn.
        /// * `art`: Normalized debt to move.
        pub fn migrate_out(
            &mut self,
            collateral: ResourceAddress,
            amount: Decimal,
            destination: ComponentAddress,
            art: Decimal,
        ) {
            ensure(
                self.route(collateral) == CollateralRoute::BaseLedger,
                ProtocolError::CollateralNotMigratable,
            )
            .or_revert();
            ensure(
                self.reserved_of(collateral) >= amount,
                ProtocolError::InsufficientFunds,
            )
            .or_revert();

            let (_, own_art) = self.urn(collateral);
            if own_art < art {
                let minted: Bucket = self.base_ledger.call_raw(
                    "increase_debt",
                    scrypto_args!(self.component_address, collateral, art - own_art),
                );
                self.save(minted);
            }

            self.base_ledger.call_raw::<()>(
                "fork",
                scrypto_args!(collateral, self.component_address, destination, amount, art),
            );
            *self.reserved.get_mut(&collateral).unwrap() -= amount;
        }

        /// Withdraws unreserved savings.
        pub fn take_savings(&mut self, amount: Decimal) -> Bucket {
            ensure(
                amount <= self.unreserved_savings(),
                ProtocolError::InsufficientFunds,
            )
            .or_revert();
            self.savings_vault.take(amount)
        }

        pub fn shutdown(&mut self) {
            self.live = false;
        }

        //==================================================================
        //                         PUBLIC METHODS
        //==================================================================

        /// Adds savings to the pool as protocol funds.
        pub fn deposit_savings(&mut self, savings: Bucket) {
            self.savings_vault.put(savings);
        }

        pub fn get_reserved(&self, collateral: ResourceAddress) -> Decimal {
            self.reserved_of(collateral)
        }

        /// Collateral units of a type in custody, reserved or not.
        pub fn get_pooled(&self, collateral: ResourceAddress) -> Decimal {
            match self.route(collateral) {
                CollateralRoute::BaseLedger => self.urn(collateral).0,
                CollateralRoute::Savings => self.savings_vault.amount(),
                CollateralRoute::Held => self.held_vaults.get(&collateral).unwrap().amount(),
            }
        }

        pub fn get_savings_balance(&self) -> Decimal {
            self.savings_vault.amount()
        }

        pub fn get_idle_balance(&self) -> Decimal {
            self.debt_unit_vault.amount()
        }

        /// Debt units owed to the base ledger across all urns.
        pub fn get_base_debt(&self) -> Decimal {
            self.base_collaterals
                .iter()
                .map(|collateral| self.urn(*collateral).1 * self.rate(*collateral))
                .fold(Decimal::ZERO, |total, debt| total + debt)
        }

        /// Savings units that can be swept as profit. Zero when the Custodian is in deficit.
        pub fn get_skimmable_profit(&self) -> Decimal {
            let profit = skim_profit(
                self.savings_vault.amount(),
                self.reserved_of(self.savings_vault.resource_address()),
                self.get_base_debt(),
                self.exchange_rate(),
            );
            profit.max(Decimal::ZERO)
        }

        pub fn get_debt_unit_address(&self) -> ResourceAddress {
            self.debt_unit_vault.resource_address()
        }

        pub fn get_savings_address(&self) -> ResourceAddress {
            self.savings_vault.resource_address()
        }

        pub fn is_live(&self) -> bool {
            self.live
        }

        //==================================================================
        //                         HELPER METHODS
        //==================================================================

        fn route(&self, collateral: ResourceAddress) -> CollateralRoute {
            self.routes
                .get(&collateral)
                .map(|route| *route)
                .ok_or(ProtocolError::UnknownCollateral)
                .or_revert()
        }

        fn reserved_of(&self, collateral: ResourceAddress) -> Decimal {
            self.reserved
                .get(&collateral)
                .map(|reserved| *reserved)
                .unwrap_or(Decimal::ZERO)
        }

        fn unreserved_savings(&self) -> Decimal {
            self.savings_vault.amount() - self.reserved_of(self.savings_vault.resource_address())
        }

        fn urn(&self, collateral: ResourceAddress) -> (Decimal, Decimal) {
            self.base_ledger
                .call_raw("get_urn", scrypto_args!(collateral, self.component_address))
        }

        fn rate(&self, collateral: ResourceAddress) -> Decimal {
            self.base_ledger.call_raw("get_rate", scrypto_args!(collateral))
        }

        fn spot(&self, collateral: ResourceAddress) -> Decimal {
            self.base_ledger.call_raw("get_spot", scrypto_args!(collateral))
        }

        fn exchange_rate(&self) -> Decimal {
            self.savings.call_raw("get_exchange_rate", scrypto_args!())
        }

        /// Puts collateral where its route says, without touching reservations.
        fn store(&mut self, collateral: Bucket) {
            let resource = collateral.resource_address();
            match self.route(resource) {
                CollateralRoute::BaseLedger => self.base_ledger.call_raw::<()>(
                    "deposit_collateral",
                    scrypto_args!(self.component_address, collateral),
                ),
                CollateralRoute::Savings => self.savings_vault.put(collateral),
                CollateralRoute::Held => self.held_vaults.get_mut(&resource).unwrap().put(collateral),
            }
        }

        fn withdraw(&mut self, collateral: ResourceAddress, amount: Decimal) -> Bucket {
            match self.route(collateral) {
                CollateralRoute::BaseLedger => {
                    let (ink, art) = self.urn(collateral);
                    ensure(
                        ink >= amount
                            && urn_is_safe(ink - amount, self.spot(collateral), art, self.rate(collateral)),
                        ProtocolError::InsufficientFunds,
                    )
                    .or_revert();
                    self.base_ledger.call_raw(
                        "withdraw_collateral",
                        scrypto_args!(self.component_address, collateral, amount),
                    )
                }
                CollateralRoute::Savings => {
                    ensure(
                        self.savings_vault.amount() >= amount,
                        ProtocolError::InsufficientFunds,
                    )
                    .or_revert();
                    self.savings_vault.take(amount)
                }
                CollateralRoute::Held => {
                    let mut vault = self.held_vaults.get_mut(&collateral).unwrap();
                    ensure(vault.amount() >= amount, ProtocolError::InsufficientFunds).or_revert();
                    vault.take(amount)
                }
            }
        }

        /// Draws `amount` debt units from the Custodian's urns, in registration order. An urn drawn to its
        /// limit may mint a few attos less than asked, since rounding its normalized debt up would make it
        /// unsafe.
        fn draw(&mut self, amount: Decimal) -> Bucket {
            let mut drawn = Bucket::new(self.debt_unit_vault.resource_address());
            let mut target = amount;

            for collateral in self.base_collaterals.clone() {
                if drawn.amount() >= target {
                    break;
                }
                let (ink, art) = self.urn(collateral);
                let rate = self.rate(collateral);
                let spot = self.spot(collateral);
                let wanted = (target - drawn.amount()).min(urn_capacity(ink, spot, art, rate));
                if wanted <= Decimal::ZERO {
                    continue;
                }

                let (art_delta, minted) = draw_amounts(wanted, ink, spot, art, rate);
                if minted < wanted {
                    target -= wanted - minted;
                }
                let debt: Bucket = self.base_ledger.call_raw(
                    "increase_debt",
                    scrypto_args!(self.component_address, collateral, art_delta),
                );
                drawn.put(debt);
            }

            ensure(drawn.amount() >= target, ProtocolError::InsufficientFunds).or_revert();
            drawn
        }

        /// Joins debt units into savings; an empty bucket goes back to the idle vault.
        fn save(&mut self, debt: Bucket) {
            if debt.is_empty() {
                self.debt_unit_vault.put(debt);
            } else {
                let savings: Bucket = self.savings.call_raw("join", scrypto_args!(debt));
                self.savings_vault.put(savings);
            }
        }
    }
}
