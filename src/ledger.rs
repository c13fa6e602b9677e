#![allow(deprecated)]

//! # The Tenor Ledger Blueprint
//!
//! The central ledger of the protocol (the "Dealer"). It records, per account, the collateral posted for
//! every collateral type and the debt owed for every series, and it enforces that posted collateral,
//! valued at live oracle prices, always covers outstanding debt.
//!
//! ## Overview
//! - **Accounts:** users are identified by an account badge minted with `open_account`. Operations that take
//!   value out of a position (`withdraw`, `borrow`, migrations) require a proof of the owner's badge or of a
//!   delegate's badge.
//! - **Collateral:** `post` sends collateral to the Custodian and credits the account. `withdraw` releases it
//!   again as long as the remaining collateral covers the account's debt.
//! - **Series:** fixed-maturity debt cohorts keyed by their maturity timestamp. `borrow` pays out debt units
//!   before maturity against a face debt of the same amount; after maturity the debt accrues at the base
//!   ledger's stability rate.
//! - **Settlement:** once a series has matured, `settle` forfeits just enough posted collateral to the
//!   Custodian to cover the series debt and clears it.
//! - **Seizure:** `grab` lets the liquidation authority take collateral that is not needed to back debt.
//!
//! ## Authorization
//! The Ledger mints the controller badge at instantiation. Holding 0.75 of it (or the admin badge) satisfies
//! the owner role of the Ledger and of every component instantiated alongside it. The Custodian, Migrator,
//! Unwinder and Liquidations components act on each other through the badges they hold.

use crate::accounting::*;
use crate::custodian::custodian::Custodian;
use crate::errors::*;
use crate::events::*;
use crate::liquidations::liquidations::Liquidations;
use crate::migrator::migrator::Migrator;
use crate::shared_structs::*;
use crate::unwinder::unwinder::Unwinder;
use scrypto::prelude::*;
use scrypto_avltree::AvlTree;

#[blueprint]
#[types(NonFungibleLocalId, Position, ResourceAddress, CollateralType, LedgerAccount)]
#[events(
    EventPosted,
    EventWithdrawn,
    EventBorrowed,
    EventRepaid,
    EventGrabbed,
    EventSettled,
    EventSettlementShortfall,
    EventSeriesAdded,
    EventSeriesMatured,
    EventCollateralAdded,
)]
mod ledger {
    enable_method_auth! {
        methods {
            open_account => PUBLIC;
            add_delegate => PUBLIC;
            remove_delegate => PUBLIC;
            post => PUBLIC;
            withdraw => PUBLIC;
            borrow => PUBLIC;
            repay => PUBLIC;
            mature => PUBLIC;
            get_posted => PUBLIC;
            get_debt => PUBLIC;
            get_face_debt => PUBLIC;
            get_total_debt => PUBLIC;
            get_collateral_value => PUBLIC;
            get_position => PUBLIC;
            get_series => PUBLIC;
            get_series_list => PUBLIC;
            get_collateral => PUBLIC;
            get_collateral_list => PUBLIC;
            get_primary_collateral => PUBLIC;
            get_price => PUBLIC;
            get_base_rate => PUBLIC;
            is_authorized => PUBLIC;
            is_live => PUBLIC;
            get_account_address => PUBLIC;
            get_controller_badge_address => PUBLIC;
            get_debt_unit_address => PUBLIC;
            settle => restrict_to: [OWNER];
            grab => restrict_to: [OWNER];
            add_series => restrict_to: [OWNER];
            add_collateral => restrict_to: [OWNER];
            set_collateral_enabled => restrict_to: [OWNER];
            set_oracle => restrict_to: [OWNER];
            fix_series => restrict_to: [OWNER];
            extract_collateral => restrict_to: [OWNER];
            extract_position => restrict_to: [OWNER];
            shutdown => restrict_to: [OWNER];
            mint_controller_badge => restrict_to: [OWNER];
        }
    }

    struct Ledger {
        /// Controller badges used to call the Custodian.
        badge_vault: FungibleVault,
        controller_badge_manager: ResourceManager,
        /// Account badges.
        account_manager: ResourceManager,
        account_counter: u64,
        debt_unit_address: ResourceAddress,
        oracle: Global<AnyComponent>,
        /// Method the oracle exposes for single price lookups.
        oracle_method_name: String,
        base_ledger: Global<AnyComponent>,
        custodian: Global<Custodian>,
        collaterals: KeyValueStore<ResourceAddress, CollateralType>,
        /// Collateral types in registration order. Settlement consumes collateral in this order.
        collateral_list: Vec<ResourceAddress>,
        /// First registered `BaseLedger` collateral type. Its base rate drives matured-series accrual.
        primary_collateral: Option<ResourceAddress>,
        positions: KeyValueStore<NonFungibleLocalId, Position>,
        series: AvlTree<i64, Series>,
        live: bool,
    }

    impl Ledger {
        /// Instantiates the whole Tenor stack: Ledger, Custodian, Migrator, Unwinder and Liquidations.
        ///
        /// # Arguments
        /// * `admin_badge_address`: Badge that may act as owner of every component.
        /// * `oracle_address`: Price oracle, queried through `get_price(ResourceAddress) -> Decimal`.
        /// * `base_ledger_address`: The base collateral/debt ledger.
        /// * `savings_address`: The savings asset component.
        ///
        /// # Returns
        /// * Global references to the Ledger, Custodian, Migrator, Unwinder and Liquidations components.
        ///
        /// # Logic
        /// 1. Allocates the Ledger address and mints the controller badge, mintable only by the Ledger.
        /// 2. Creates the account badge resource.
        /// 3. Instantiates the Custodian, then hands one controller badge each to the Migrator, Unwinder and
        ///    Liquidations components.
        /// 4. Globalizes the Ledger with the remaining badges in its vault.
        pub fn instantiate(
            admin_badge_address: ResourceAddress,
            oracle_address: ComponentAddress,
            base_ledger_address: ComponentAddress,
            savings_address: ComponentAddress,
        ) -> (
            Global<Ledger>,
            Global<Custodian>,
            Global<Migrator>,
            Global<Unwinder>,
            Global<Liquidations>,
        ) {
            let (address_reservation, component_address) =
                Runtime::allocate_component_address(Ledger::blueprint_id());

            let mut controller_badge: Bucket = ResourceBuilder::new_fungible(OwnerRole::Fixed(rule!(
                require(global_caller(component_address))
            )))
            .divisibility(DIVISIBILITY_MAXIMUM)
            .metadata(metadata!(
                init {
                    "name" => "controller badge tenor", locked;
                    "symbol" => "tenorCTRL", locked;
                }
            ))
            .mint_roles(mint_roles!(
                minter => rule!(require(global_caller(component_address)));
                minter_updater => rule!(deny_all);
            ))
            .mint_initial_supply(10)
            .into();

            let controller_badge_address = controller_badge.resource_address();
            let owner_role_access_rule = rule!(
                require_amount(dec!("0.75"), admin_badge_address)
                    || require_amount(dec!("0.75"), controller_badge_address)
            );
            let owner_role = OwnerRole::Fixed(owner_role_access_rule);

            let account_manager: ResourceManager =
                ResourceBuilder::new_integer_non_fungible_with_registered_type::<LedgerAccount>(
                    OwnerRole::Fixed(rule!(require_amount(dec!("0.75"), controller_badge_address))),
                )
                .metadata(metadata!(
                    init {
                        "name" => "Tenor Account", locked;
                        "symbol" => "tenorACC", locked;
                        "description" => "An account holding collateral and fixed-term debt in Tenor.", locked;
                    }
                ))
                .mint_roles(mint_roles!(
                    minter => rule!(require(global_caller(component_address)));
                    minter_updater => rule!(deny_all);
                ))
                .create_with_no_initial_supply()
                .into();

            let base_ledger: Global<AnyComponent> = Global::from(base_ledger_address);
            let debt_unit_address: ResourceAddress =
                base_ledger.call_raw("get_debt_unit_address", scrypto_args!());

            let custodian =
                Custodian::instantiate(owner_role.clone(), base_ledger_address, savings_address);

            let migrator = Migrator::instantiate(
                controller_badge.take(1),
                owner_role.clone(),
                component_address,
                custodian.address(),
                base_ledger_address,
            );

            let unwinder = Unwinder::instantiate(
                controller_badge.take(1),
                owner_role.clone(),
                component_address,
                custodian.address(),
                base_ledger_address,
            );

            let liquidations =
                Liquidations::instantiate(controller_badge.take(1), owner_role.clone(), component_address);

            let ledger = Self {
                badge_vault: FungibleVault::with_bucket(controller_badge.as_fungible()),
                controller_badge_manager: ResourceManager::from_address(controller_badge_address),
                account_manager,
                account_counter: 0,
                debt_unit_address,
                oracle: Global::from(oracle_address),
                oracle_method_name: "get_price".to_string(),
                base_ledger,
                custodian,
                collaterals: KeyValueStore::new_with_registered_type(),
                collateral_list: vec![],
                primary_collateral: None,
                positions: KeyValueStore::new_with_registered_type(),
                series: AvlTree::new(),
                live: true,
            }
            .instantiate()
            .prepare_to_globalize(owner_role)
            .with_address(address_reservation)
            .metadata(metadata! {
                init {
                    "name" => "Tenor Ledger".to_string(), updatable;
                    "description" => "Fixed-term multi-collateral lending ledger".to_string(), updatable;
                }
            })
            .globalize();

            (ledger, custodian, migrator, unwinder, liquidations)
        }

        //==================================================================
        //                         ACCOUNT METHODS
        //==================================================================

        /// Opens a new account.
        ///
        /// # Returns
        /// * `Bucket`: The account badge. Its local id identifies the user in every other method.
        pub fn open_account(&mut self) -> Bucket {
            self.account_counter += 1;
            let id = NonFungibleLocalId::integer(self.account_counter);

            self.positions.insert(id.clone(), Position::default());

            self.account_manager.mint_non_fungible(
                &id,
                LedgerAccount {
                    opened_at: Clock::current_time_rounded_to_seconds(),
                },
            )
        }

        /// Lets `delegate` withdraw, borrow and migrate on behalf of the proven account.
        pub fn add_delegate(&mut self, account_proof: NonFungibleProof, delegate: NonFungibleLocalId) {
            let user = self.account_id(account_proof);
            let mut position = self.position(&user);
            position.delegates.insert(delegate);
            self.positions.insert(user, position);
        }

        pub fn remove_delegate(&mut self, account_proof: NonFungibleProof, delegate: NonFungibleLocalId) {
            let user = self.account_id(account_proof);
            let mut position = self.position(&user);
            position.delegates.remove(&delegate);
            self.positions.insert(user, position);
        }

        //==================================================================
        //                         POSITION METHODS
        //==================================================================

        /// Posts collateral to an account. Anyone may post to any account; posting never needs a
        /// collateralization check.
        ///
        /// # Arguments
        /// * `user`: The receiving account.
        /// * `collateral`: Collateral of an enabled type.
        ///
        /// # Panics
        /// * If the bucket is empty.
        /// * If the collateral type is unknown or disabled.
        /// * If the account does not exist.
        pub fn post(&mut self, user: NonFungibleLocalId, collateral: Bucket) {
            let resource = collateral.resource_address();
            let amount = collateral.amount();
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();

            let collateral_type = self.collateral_type(resource);
            ensure(collateral_type.enabled, ProtocolError::CollateralNotAccepted).or_revert();

            let mut position = self.position(&user);
            position.add_posted(resource, amount);
            self.positions.insert(user.clone(), position);

            self.badge_vault
                .authorize_with_amount(dec!("0.75"), || self.custodian.take(collateral));

            Runtime::emit_event(EventPosted {
                user,
                collateral: resource,
                amount,
            });
        }

        /// Withdraws posted collateral.
        ///
        /// # Arguments
        /// * `account_proof`: Proof of the owner's or a delegate's account badge.
        /// * `user`: The account to withdraw from.
        /// * `collateral`: Collateral type.
        /// * `amount`: Amount to withdraw.
        ///
        /// # Returns
        /// * `Bucket`: The withdrawn collateral.
        ///
        /// # Panics
        /// * If the caller is neither owner nor delegate.
        /// * If less than `amount` is posted, or the remaining collateral would not cover the account's debt.
        pub fn withdraw(
            &mut self,
            account_proof: NonFungibleProof,
            user: NonFungibleLocalId,
            collateral: ResourceAddress,
            amount: Decimal,
        ) -> Bucket {
            let caller = self.account_id(account_proof);
            let mut position = self.position(&user);
            ensure(position.is_authorized(&user, &caller), ProtocolError::NotAuthorized).or_revert();
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();

            position.remove_posted(collateral, amount).or_revert();
            self.ensure_covered(&position, ProtocolError::InsufficientCollateral);
            self.positions.insert(user.clone(), position);

            let bucket = self
                .badge_vault
                .authorize_with_amount(dec!("0.75"), || self.custodian.release(collateral, amount));

            Runtime::emit_event(EventWithdrawn {
                user,
                collateral,
                amount,
            });

            bucket
        }

        /// Borrows debt units from a series, owing the same amount in face units.
        ///
        /// # Arguments
        /// * `account_proof`: Proof of the owner's or a delegate's account badge.
        /// * `maturity`: The series.
        /// * `user`: The borrowing account.
        /// * `amount`: Debt units to borrow.
        ///
        /// # Returns
        /// * `Bucket`: The borrowed debt units.
        ///
        /// # Panics
        /// * If the system is shut down.
        /// * If the series is unknown or has matured.
        /// * If the account's collateral would not cover its debt including the new amount.
        pub fn borrow(
            &mut self,
            account_proof: NonFungibleProof,
            maturity: i64,
            user: NonFungibleLocalId,
            amount: Decimal,
        ) -> Bucket {
            self.ensure_live();
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();

            let caller = self.account_id(account_proof);
            let mut position = self.position(&user);
            ensure(position.is_authorized(&user, &caller), ProtocolError::NotAuthorized).or_revert();

            let series = self.series_of(maturity);
            ensure(
                !series.matured && !series.is_due(Self::now()),
                ProtocolError::SeriesAlreadyMatured,
            )
            .or_revert();

            position.add_debt(maturity, amount);
            self.ensure_covered(&position, ProtocolError::InsufficientCollateral);
            self.positions.insert(user.clone(), position);

            let debt = self
                .badge_vault
                .authorize_with_amount(dec!("0.75"), || self.custodian.advance_debt(amount));

            Runtime::emit_event(EventBorrowed {
                maturity,
                user,
                amount,
            });

            debt
        }

        /// Repays series debt with debt units. Anyone may repay for any account.
        ///
        /// # Panics
        /// * If the payment is not in debt units, is empty, or exceeds the series debt.
        pub fn repay(&mut self, maturity: i64, user: NonFungibleLocalId, payment: Bucket) {
            ensure(
                payment.resource_address() == self.debt_unit_address,
                ProtocolError::InvalidAmount,
            )
            .or_revert();
            let amount = payment.amount();
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();

            let accrual = self.series_of(maturity).accrual(self.base_rate());
            let mut position = self.position(&user);
            let face_debt = position.face_debt(maturity);
            let owed = debt_value(face_debt, accrual);
            ensure(amount <= owed, ProtocolError::RepaymentExceedsDebt).or_revert();

            let face = if amount == owed {
                face_debt
            } else {
                face_for_payment(amount, accrual).min(face_debt)
            };
            position.remove_debt(maturity, face).or_revert();
            self.positions.insert(user.clone(), position);

            self.badge_vault
                .authorize_with_amount(dec!("0.75"), || self.custodian.receive_debt(payment));

            Runtime::emit_event(EventRepaid {
                maturity,
                user,
                amount,
                face,
            });
        }

        /// Matures a series whose maturity has passed, snapshotting the base rate.
        pub fn mature(&mut self, maturity: i64) {
            let mut series = self.series_of(maturity);
            let rate = self.base_rate();
            series.mature(Self::now(), rate).or_revert();
            self.store_series(series);

            Runtime::emit_event(EventSeriesMatured { maturity, rate });
        }

        //==================================================================
        //                         PRIVILEGED METHODS
        //==================================================================

        /// Settles an account's debt in a matured series against its posted collateral.
        ///
        /// A due series is matured on the spot. Collateral is valued at the series' fixed settlement prices if
        /// the Unwinder finalized it, otherwise at live oracle prices, and consumed in registration order.
        /// Only the collateral needed is forfeited to the Custodian; any shortfall is reported, not reverted.
        /// Settling an account without debt in the series does nothing.
        ///
        /// # Panics
        /// * If the series is unknown or not yet due.
        /// * If the series is finalized but has no fixed price for a posted collateral type.
        pub fn settle(&mut self, maturity: i64, user: NonFungibleLocalId) {
            let rate = self.base_rate();
            let mut series = self.series_of(maturity);
            if !series.matured {
                series.mature(Self::now(), rate).or_revert();
                self.store_series(series.clone());
                Runtime::emit_event(EventSeriesMatured { maturity, rate });
            }

            let mut position = self.position(&user);
            let face = position.face_debt(maturity);
            if face == Decimal::ZERO {
                return;
            }

            let holdings: Vec<(ResourceAddress, Decimal, Decimal)> = self
                .collateral_list
                .iter()
                .filter(|collateral| position.posted(collateral) > Decimal::ZERO)
                .map(|collateral| {
                    let price = match series.settlement.as_ref() {
                        Some(settlement) => settlement
                            .prices
                            .get(collateral)
                            .copied()
                            .ok_or(ProtocolError::MissingSettlementPrice)
                            .or_revert(),
                        None => self.price(*collateral),
                    };
                    (*collateral, position.posted(collateral), price)
                })
                .collect();

            let plan = plan_settlement(face, series.accrual(rate), &holdings);
            position.clear_debt(maturity);

            for part in plan.parts.iter() {
                position.remove_posted(part.key, part.tokens).or_revert();
                self.badge_vault.authorize_with_amount(dec!("0.75"), || {
                    self.custodian.forfeit(part.key, part.tokens)
                });

                Runtime::emit_event(EventSettled::from_part(maturity, user.clone(), part));
            }

            if plan.shortfall > Decimal::ZERO {
                Runtime::emit_event(EventSettlementShortfall {
                    maturity,
                    user: user.clone(),
                    shortfall: plan.shortfall,
                });
            }

            self.positions.insert(user, position);
        }

        /// Seizes posted collateral that is not needed to back the account's debt.
        ///
        /// # Returns
        /// * `Bucket`: The seized collateral.
        ///
        /// # Panics
        /// * If less than `amount` is posted.
        /// * If the remaining collateral would not cover the account's debt ("Ledger: Too much debt").
        pub fn grab(
            &mut self,
            user: NonFungibleLocalId,
            collateral: ResourceAddress,
            amount: Decimal,
        ) -> Bucket {
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();

            let mut position = self.position(&user);
            position.remove_posted(collateral, amount).or_revert();
            self.ensure_covered(&position, ProtocolError::ExcessiveDebt);
            self.positions.insert(user.clone(), position);

            let seized = self
                .badge_vault
                .authorize_with_amount(dec!("0.75"), || self.custodian.release(collateral, amount));

            Runtime::emit_event(EventGrabbed {
                user,
                tokens: amount,
            });

            seized
        }

        /// Adds a series maturing at `maturity` (seconds since Unix epoch).
        pub fn add_series(&mut self, maturity: i64) {
            let series = Series::new(maturity, Self::now()).or_revert();
            ensure(
                self.series.get(&maturity).is_none(),
                ProtocolError::SeriesAlreadyExists,
            )
            .or_revert();

            self.series.insert(maturity, series);

            Runtime::emit_event(EventSeriesAdded { maturity });
        }

        /// Accepts a new collateral type. The first `BaseLedger` type becomes the primary collateral.
        ///
        /// # Arguments
        /// * `collateral`: The collateral resource. Must be priced by the oracle.
        /// * `route`: Where the Custodian keeps it.
        pub fn add_collateral(&mut self, collateral: ResourceAddress, route: CollateralRoute) {
            ensure(
                self.collaterals.get(&collateral).is_none(),
                ProtocolError::CollateralNotAccepted,
            )
            .or_revert();

            if route == CollateralRoute::BaseLedger && self.primary_collateral.is_none() {
                self.primary_collateral = Some(collateral);
            }
            self.collaterals.insert(
                collateral,
                CollateralType {
                    enabled: true,
                    route,
                },
            );
            self.collateral_list.push(collateral);

            self.badge_vault.authorize_with_amount(dec!("0.75"), || {
                self.custodian.add_collateral(collateral, route)
            });

            Runtime::emit_event(EventCollateralAdded { collateral, route });
        }

        pub fn set_collateral_enabled(&mut self, collateral: ResourceAddress, enabled: bool) {
            let mut collateral_type = self.collateral_type(collateral);
            collateral_type.enabled = enabled;
            self.collaterals.insert(collateral, collateral_type);
        }

        /// Points the Ledger at another oracle.
        pub fn set_oracle(&mut self, oracle_address: ComponentAddress, method_name: String) {
            self.oracle = Global::from(oracle_address);
            self.oracle_method_name = method_name;
        }

        /// Fixes the settlement values of a series. Used by the Unwinder during shutdown.
        pub fn fix_series(&mut self, maturity: i64, settlement: SeriesSettlement) {
            let mut series = self.series_of(maturity);
            series.fix(settlement, self.base_rate()).or_revert();
            self.store_series(series);
        }

        /// Debits posted collateral that the Migrator moves into a base ledger urn.
        ///
        /// # Panics
        /// * If the system is shut down or the collateral is not kept in the base ledger.
        /// * If the remaining collateral would not cover the account's debt.
        pub fn extract_collateral(
            &mut self,
            user: NonFungibleLocalId,
            collateral: ResourceAddress,
            amount: Decimal,
        ) {
            self.ensure_live();
            ensure(amount > Decimal::ZERO, ProtocolError::InvalidAmount).or_revert();
            ensure(
                self.collateral_type(collateral).route == CollateralRoute::BaseLedger,
                ProtocolError::CollateralNotMigratable,
            )
            .or_revert();

            let mut position = self.position(&user);
            position.remove_posted(collateral, amount).or_revert();
            self.ensure_covered(&position, ProtocolError::InsufficientCollateral);
            self.positions.insert(user, position);
        }

        /// Clears a series position that the Migrator moves into a base ledger urn.
        ///
        /// The primary collateral backing the debt moves with it: all of it if the account has no other debt,
        /// otherwise just enough to cover the series debt at the live price.
        ///
        /// # Returns
        /// * `(ResourceAddress, Decimal, Decimal)`: The collateral type, the collateral units and the debt units
        ///   leaving the Ledger.
        pub fn extract_position(
            &mut self,
            maturity: i64,
            user: NonFungibleLocalId,
        ) -> (ResourceAddress, Decimal, Decimal) {
            self.ensure_live();
            let series = self.series_of(maturity);
            ensure(
                !series.matured && !series.is_due(Self::now()),
                ProtocolError::SeriesAlreadyMatured,
            )
            .or_revert();
            let primary = self
                .primary_collateral
                .ok_or(ProtocolError::CollateralNotMigratable)
                .or_revert();

            let mut position = self.position(&user);
            let debt = position.clear_debt(maturity);
            let posted = position.posted(&primary);
            let other_debt = position.debts.values().any(|face| *face > Decimal::ZERO);
            let tokens = if other_debt {
                div_up(debt, self.price(primary)).min(posted)
            } else {
                posted
            };

            position.remove_posted(primary, tokens).or_revert();
            self.ensure_covered(&position, ProtocolError::InsufficientCollateral);
            self.positions.insert(user, position);

            (primary, tokens, debt)
        }

        /// Stops new debt and migrations. Called by the Unwinder when the base ledger is caged.
        pub fn shutdown(&mut self) {
            self.live = false;
        }

        /// Mints controller badges to grant the capability to another component.
        pub fn mint_controller_badge(&self, amount: Decimal) -> Bucket {
            self.controller_badge_manager.mint(amount)
        }

        //==================================================================
        //                         GETTERS
        //==================================================================

        pub fn get_posted(&self, user: NonFungibleLocalId, collateral: ResourceAddress) -> Decimal {
            self.position(&user).posted(&collateral)
        }

        /// Debt units owed in a series.
        pub fn get_debt(&self, maturity: i64, user: NonFungibleLocalId) -> Decimal {
            let accrual = self.series_of(maturity).accrual(self.base_rate());
            debt_value(self.position(&user).face_debt(maturity), accrual)
        }

        /// Face units owed in a series.
        pub fn get_face_debt(&self, maturity: i64, user: NonFungibleLocalId) -> Decimal {
            self.position(&user).face_debt(maturity)
        }

        /// Debt units owed across all series.
        pub fn get_total_debt(&self, user: NonFungibleLocalId) -> Decimal {
            self.debt_of(&self.position(&user))
        }

        /// Value of the posted collateral in debt units, at live prices.
        pub fn get_collateral_value(&self, user: NonFungibleLocalId) -> Decimal {
            self.collateral_value_of(&self.position(&user))
        }

        pub fn get_position(&self, user: NonFungibleLocalId) -> Position {
            self.position(&user)
        }

        pub fn get_series(&self, maturity: i64) -> Series {
            self.series_of(maturity)
        }

        /// Series maturities in ascending order.
        pub fn get_series_list(&self) -> Vec<i64> {
            self.series
                .range(i64::MIN..)
                .map(|(maturity, _, _)| maturity)
                .collect()
        }

        pub fn get_collateral(&self, collateral: ResourceAddress) -> CollateralType {
            self.collateral_type(collateral)
        }

        pub fn get_collateral_list(&self) -> Vec<ResourceAddress> {
            self.collateral_list.clone()
        }

        pub fn get_primary_collateral(&self) -> Option<ResourceAddress> {
            self.primary_collateral
        }

        /// Live oracle price in debt units per collateral unit.
        pub fn get_price(&self, collateral: ResourceAddress) -> Decimal {
            self.price(collateral)
        }

        /// Base ledger rate of the primary collateral.
        pub fn get_base_rate(&self) -> Decimal {
            self.base_rate()
        }

        pub fn is_authorized(&self, user: NonFungibleLocalId, caller: NonFungibleLocalId) -> bool {
            self.position(&user).is_authorized(&user, &caller)
        }

        pub fn is_live(&self) -> bool {
            self.live
        }

        pub fn get_account_address(&self) -> ResourceAddress {
            self.account_manager.address()
        }

        pub fn get_controller_badge_address(&self) -> ResourceAddress {
            self.controller_badge_manager.address()
        }

        pub fn get_debt_unit_address(&self) -> ResourceAddress {
            self.debt_unit_address
        }

        //==================================================================
        //                         HELPER METHODS
        //==================================================================

        fn now() -> i64 {
            Clock::current_time_rounded_to_seconds().seconds_since_unix_epoch
        }

        fn account_id(&self, account_proof: NonFungibleProof) -> NonFungibleLocalId {
            account_proof
                .check_with_message(self.account_manager.address(), "Invalid account proof")
                .non_fungible::<LedgerAccount>()
                .local_id()
                .clone()
        }

        fn position(&self, user: &NonFungibleLocalId) -> Position {
            self.positions
                .get(user)
                .map(|position| (*position).clone())
                .ok_or(ProtocolError::UnknownAccount)
                .or_revert()
        }

        fn collateral_type(&self, collateral: ResourceAddress) -> CollateralType {
            self.collaterals
                .get(&collateral)
                .map(|collateral_type| (*collateral_type).clone())
                .ok_or(ProtocolError::CollateralNotAccepted)
                .or_revert()
        }

        fn series_of(&self, maturity: i64) -> Series {
            self.series
                .get(&maturity)
                .map(|series| (*series).clone())
                .ok_or(ProtocolError::UnknownSeries)
                .or_revert()
        }

        fn store_series(&mut self, series: Series) {
            let maturity = series.maturity;
            *self.series.get_mut(&maturity).unwrap() = series;
        }

        fn price(&self, collateral: ResourceAddress) -> Decimal {
            self.oracle
                .call_raw(&self.oracle_method_name, scrypto_args!(collateral))
        }

        fn base_rate(&self) -> Decimal {
            match self.primary_collateral {
                Some(primary) => self.base_ledger.call_raw("get_rate", scrypto_args!(primary)),
                None => Decimal::ONE,
            }
        }

        fn debt_of(&self, position: &Position) -> Decimal {
            let rate = self.base_rate();
            position
                .debts
                .iter()
                .filter(|(_, face)| **face > Decimal::ZERO)
                .map(|(maturity, face)| debt_value(*face, self.series_of(*maturity).accrual(rate)))
                .fold(Decimal::ZERO, |total, debt| total + debt)
        }

        fn collateral_value_of(&self, position: &Position) -> Decimal {
            position
                .posted
                .iter()
                .filter(|(_, amount)| **amount > Decimal::ZERO)
                .map(|(collateral, amount)| collateral_value(*amount, self.price(*collateral)))
                .fold(Decimal::ZERO, |total, value| total + value)
        }

        /// Reverts once either Tenor or the base ledger has been caged.
        fn ensure_live(&self) {
            let base_ledger_live: bool = self.base_ledger.call_raw("is_live", scrypto_args!());
            ensure(self.live && base_ledger_live, ProtocolError::ShutdownActive).or_revert();
        }

        /// Reverts with `error` unless the position's collateral covers its debt.
        fn ensure_covered(&self, position: &Position, error: ProtocolError) {
            let debt = self.debt_of(position);
            if debt == Decimal::ZERO {
                return;
            }
            ensure(self.collateral_value_of(position) >= debt, error).or_revert();
        }
    }
}
