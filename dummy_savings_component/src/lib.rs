//! # Dummy Savings Blueprint
//! Wraps the debt unit into a yield-bearing savings token at an exchange rate set by the owner. Stands in for
//! the external savings asset in tests.

use scrypto::prelude::*;

#[blueprint]
mod savings {
    enable_method_auth! {
        methods {
            join => PUBLIC;
            exit => PUBLIC;
            get_exchange_rate => PUBLIC;
            get_savings_address => PUBLIC;
            set_exchange_rate => restrict_to: [OWNER];
            fund => restrict_to: [OWNER];
        }
    }

    struct Savings {
        /// Debt units backing the savings token.
        debt_unit_vault: Vault,
        savings_manager: ResourceManager,
        /// Debt units per savings unit.
        exchange_rate: Decimal,
    }

    impl Savings {
        pub fn instantiate_savings(debt_unit_address: ResourceAddress, exchange_rate: Decimal) -> Global<Savings> {
            let (address_reservation, component_address) =
                Runtime::allocate_component_address(Savings::blueprint_id());

            let savings_manager: ResourceManager = ResourceBuilder::new_fungible(OwnerRole::None)
                .divisibility(DIVISIBILITY_MAXIMUM)
                .metadata(metadata!(
                    init {
                        "name" => "Dummy Chai", locked;
                        "symbol" => "CHAI", locked;
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
                debt_unit_vault: Vault::new(debt_unit_address),
                savings_manager,
                exchange_rate,
            }
            .instantiate()
            .prepare_to_globalize(OwnerRole::None)
            .with_address(address_reservation)
            .metadata(metadata! {
                init {
                    "name" => "Tenor Dummy Savings".to_string(), updatable;
                    "description" => "A dummy savings asset used for testing Tenor".to_string(), updatable;
                }
            })
            .globalize()
        }

        /// Converts debt units into savings units.
        pub fn join(&mut self, debt: Bucket) -> Bucket {
            let savings_amount = debt.amount() / self.exchange_rate;
            self.debt_unit_vault.put(debt);
            self.savings_manager.mint(savings_amount)
        }

        /// Converts savings units back into debt units.
        pub fn exit(&mut self, savings: Bucket) -> Bucket {
            assert!(
                savings.resource_address() == self.savings_manager.address(),
                "Savings: Wrong resource"
            );
            let debt_amount = savings.amount() * self.exchange_rate;
            savings.burn();
            self.debt_unit_vault.take(debt_amount)
        }

        pub fn get_exchange_rate(&self) -> Decimal {
            self.exchange_rate
        }

        pub fn get_savings_address(&self) -> ResourceAddress {
            self.savings_manager.address()
        }

        pub fn set_exchange_rate(&mut self, exchange_rate: Decimal) {
            assert!(exchange_rate >= self.exchange_rate, "Savings: Rate can only grow");
            self.exchange_rate = exchange_rate;
        }

        /// Adds debt units that back accrued yield.
        pub fn fund(&mut self, debt: Bucket) {
            self.debt_unit_vault.put(debt);
        }
    }
}
