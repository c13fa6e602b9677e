//! # Dummy Base Ledger Blueprint
//! A minimal collateral/debt engine standing in for the external CDP system in tests.
//!
//! Every collateral type has a `spot` (debt units of capacity per collateral unit) and an accumulated `rate`
//! (debt units per unit of normalized debt). Urns are keyed by collateral type and owning component and hold
//! `ink` (collateral) and `art` (normalized debt). An urn is safe while `art * rate <= ink * spot`.
//! The component mints and burns the debt unit. Caging ends new debt and fixes a final tag per type.

use scrypto::prelude::*;

#[derive(ScryptoSbor, Clone, Debug)]
pub struct Ilk {
    pub spot: Decimal,
    pub rate: Decimal,
    /// Collateral units per debt unit, fixed on cage.
    pub tag: Option<Decimal>,
}

#[derive(ScryptoSbor, Clone, Debug, Default)]
pub struct Urn {
    pub ink: Decimal,
    pub art: Decimal,
}

impl Urn {
    fn is_safe(&self, ilk: &Ilk) -> bool {
        self.art * ilk.rate <= self.ink * ilk.spot
    }
}

#[blueprint]
mod base_ledger {
    enable_method_auth! {
        methods {
            deposit_collateral => PUBLIC;
            withdraw_collateral => PUBLIC;
            increase_debt => PUBLIC;
            decrease_debt => PUBLIC;
            fork => PUBLIC;
            get_rate => PUBLIC;
            get_spot => PUBLIC;
            get_urn => PUBLIC;
            get_final_tag => PUBLIC;
            is_live => PUBLIC;
            get_debt_unit_address => PUBLIC;
            add_collateral_type => restrict_to: [OWNER];
            set_rate => restrict_to: [OWNER];
            set_spot => restrict_to: [OWNER];
            cage => restrict_to: [OWNER];
            mint_debt_units => restrict_to: [OWNER];
        }
    }

    struct BaseLedger {
        ilks: HashMap<ResourceAddress, Ilk>,
        urns: KeyValueStore<(ResourceAddress, ComponentAddress), Urn>,
        vaults: KeyValueStore<ResourceAddress, Vault>,
        debt_unit_manager: ResourceManager,
        live: bool,
    }

    impl BaseLedger {
        pub fn instantiate_base_ledger() -> Global<BaseLedger> {
            let (address_reservation, component_address) =
                Runtime::allocate_component_address(BaseLedger::blueprint_id());

            let debt_unit_manager: ResourceManager = ResourceBuilder::new_fungible(OwnerRole::None)
                .divisibility(DIVISIBILITY_MAXIMUM)
                .metadata(metadata!(
                    init {
                        "name" => "Dummy Dai", locked;
                        "symbol" => "DAI", locked;
                    }
                ))
                .mint_roles(mint_roles!(
                    minter => rule!(require(global_caller(component_address)));
                    minter_updater => rule!(deny_all);
                ))
                .burn_roles(burn_roles!(
                    burner => rule!(require(global_caller(component_address)));
                    burner_updater => rule!(deny_all);
                ))
                .create_with_no_initial_supply()
                .into();

            Self {
                ilks: HashMap::new(),
                urns: KeyValueStore::new(),
                vaults: KeyValueStore::new(),
                debt_unit_manager,
                live: true,
            }
            .instantiate()
            .prepare_to_globalize(OwnerRole::None)
            .with_address(address_reservation)
            .metadata(metadata! {
                init {
                    "name" => "Tenor Dummy Base Ledger".to_string(), updatable;
                    "description" => "A dummy collateral/debt engine used for testing Tenor".to_string(), updatable;
                }
            })
            .globalize()
        }

        pub fn add_collateral_type(&mut self, collateral: ResourceAddress, spot: Decimal, rate: Decimal) {
            assert!(!self.ilks.contains_key(&collateral), "Collateral type already exists");
            assert!(rate >= Decimal::ONE, "Rate must be at least one");
            self.ilks.insert(collateral, Ilk { spot, rate, tag: None });
            self.vaults.insert(collateral, Vault::new(collateral));
        }

        pub fn set_rate(&mut self, collateral: ResourceAddress, rate: Decimal) {
            assert!(self.live, "BaseLedger: Not live");
            self.ilk_mut(collateral).rate = rate;
        }

        pub fn set_spot(&mut self, collateral: ResourceAddress, spot: Decimal) {
            assert!(self.live, "BaseLedger: Not live");
            self.ilk_mut(collateral).spot = spot;
        }

        /// Starts global settlement: no new debt, and every type gets a final tag of `1 / spot`.
        pub fn cage(&mut self) {
            assert!(self.live, "BaseLedger: Already caged");
            self.live = false;
            for ilk in self.ilks.values_mut() {
                ilk.tag = Some(Decimal::ONE / ilk.spot);
            }
        }

        /// Mints debt units out of thin air, to fund test accounts.
        pub fn mint_debt_units(&mut self, amount: Decimal) -> Bucket {
            self.debt_unit_manager.mint(amount)
        }

        pub fn deposit_collateral(&mut self, owner: ComponentAddress, collateral: Bucket) {
            let resource = collateral.resource_address();
            assert!(self.ilks.contains_key(&resource), "BaseLedger: Unknown collateral");

            let mut urn = self.urn(resource, owner);
            urn.ink += collateral.amount();
            self.urns.insert((resource, owner), urn);
            self.vaults.get_mut(&resource).unwrap().put(collateral);
        }

        pub fn withdraw_collateral(
            &mut self,
            owner: ComponentAddress,
            collateral: ResourceAddress,
            amount: Decimal,
        ) -> Bucket {
            Runtime::assert_access_rule(rule!(require(global_caller(owner))));
            let ilk = self.ilk(collateral);
            let mut urn = self.urn(collateral, owner);
            assert!(urn.ink >= amount, "BaseLedger: Not enough collateral");
            urn.ink -= amount;
            assert!(urn.is_safe(&ilk), "BaseLedger: Not safe");
            self.urns.insert((collateral, owner), urn);

            self.vaults.get_mut(&collateral).unwrap().take(amount)
        }

        /// Draws `art` normalized debt, minting `art * rate` debt units.
        pub fn increase_debt(
            &mut self,
            owner: ComponentAddress,
            collateral: ResourceAddress,
            art: Decimal,
        ) -> Bucket {
            Runtime::assert_access_rule(rule!(require(global_caller(owner))));
            assert!(self.live, "BaseLedger: Not live");
            let ilk = self.ilk(collateral);
            let mut urn = self.urn(collateral, owner);
            urn.art += art;
            assert!(urn.is_safe(&ilk), "BaseLedger: Not safe");
            self.urns.insert((collateral, owner), urn);

            self.debt_unit_manager.mint(art * ilk.rate)
        }

        /// Repays debt of an urn with `payment`; any excess is returned.
        pub fn decrease_debt(
            &mut self,
            owner: ComponentAddress,
            collateral: ResourceAddress,
            mut payment: Bucket,
        ) -> Bucket {
            assert!(
                payment.resource_address() == self.debt_unit_manager.address(),
                "BaseLedger: Payment must be in debt units"
            );
            let ilk = self.ilk(collateral);
            let mut urn = self.urn(collateral, owner);
            let owed = urn.art * ilk.rate;

            if payment.amount() >= owed {
                payment.take(owed).burn();
                urn.art = Decimal::ZERO;
            } else {
                let art = payment.amount() / ilk.rate;
                payment.take(art * ilk.rate).burn();
                urn.art -= art;
            }
            self.urns.insert((collateral, owner), urn);

            payment
        }

        /// Moves `ink` collateral and `art` normalized debt from `source`'s urn to `destination`'s urn.
        pub fn fork(
            &mut self,
            collateral: ResourceAddress,
            source: ComponentAddress,
            destination: ComponentAddress,
            ink: Decimal,
            art: Decimal,
        ) {
            Runtime::assert_access_rule(rule!(require(global_caller(source))));
            let ilk = self.ilk(collateral);
            let mut from = self.urn(collateral, source);
            let mut to = self.urn(collateral, destination);
            assert!(from.ink >= ink && from.art >= art, "BaseLedger: Not enough in urn");

            from.ink -= ink;
            from.art -= art;
            to.ink += ink;
            to.art += art;
            assert!(from.is_safe(&ilk) && to.is_safe(&ilk), "BaseLedger: Not safe");

            self.urns.insert((collateral, source), from);
            self.urns.insert((collateral, destination), to);
        }

        pub fn get_rate(&self, collateral: ResourceAddress) -> Decimal {
            self.ilk(collateral).rate
        }

        pub fn get_spot(&self, collateral: ResourceAddress) -> Decimal {
            self.ilk(collateral).spot
        }

        /// Returns `(ink, art)`.
        pub fn get_urn(&self, collateral: ResourceAddress, owner: ComponentAddress) -> (Decimal, Decimal) {
            let urn = self.urn(collateral, owner);
            (urn.ink, urn.art)
        }

        pub fn get_final_tag(&self, collateral: ResourceAddress) -> Decimal {
            self.ilk(collateral).tag.expect("BaseLedger: Not caged")
        }

        pub fn is_live(&self) -> bool {
            self.live
        }

        pub fn get_debt_unit_address(&self) -> ResourceAddress {
            self.debt_unit_manager.address()
        }

        fn ilk(&self, collateral: ResourceAddress) -> Ilk {
            self.ilks
                .get(&collateral)
                .cloned()
                .expect("BaseLedger: Unknown collateral")
        }

        fn ilk_mut(&mut self, collateral: ResourceAddress) -> &mut Ilk {
            self.ilks
                .get_mut(&collateral)
                .expect("BaseLedger: Unknown collateral")
        }

        fn urn(&self, collateral: ResourceAddress, owner: ComponentAddress) -> Urn {
            self.urns
                .get(&(collateral, owner))
                .map(|urn| urn.clone())
                .unwrap_or_default()
        }
    }
}
