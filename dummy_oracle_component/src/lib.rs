//! # Dummy Oracle Blueprint
//! Component for testing collateral valuation without external dependencies. Prices are quoted in debt
//! units per collateral unit and set by the owner.

use scrypto::prelude::*;

#[blueprint]
mod oracle {
    enable_method_auth! {
        methods {
            get_price => PUBLIC;
            get_prices => PUBLIC;
            set_price => restrict_to: [OWNER];
            remove_price => restrict_to: [OWNER];
        }
    }

    struct Oracle {
        prices: HashMap<ResourceAddress, Decimal>,
    }

    impl Oracle {
        pub fn instantiate_oracle() -> Global<Oracle> {
            Self {
                prices: HashMap::new(),
            }
            .instantiate()
            .prepare_to_globalize(OwnerRole::None)
            .metadata(metadata! {
                init {
                    "name" => "Tenor Dummy Oracle".to_string(), updatable;
                    "description" => "A dummy oracle used for testing Tenor".to_string(), updatable;
                }
            })
            .globalize()
        }

        pub fn get_price(&self, collateral: ResourceAddress) -> Decimal {
            self.prices
                .get(&collateral)
                .cloned()
                .expect("Price not set for this collateral")
        }

        pub fn get_prices(&self, collaterals: Vec<ResourceAddress>) -> Vec<(ResourceAddress, Decimal)> {
            collaterals
                .into_iter()
                .map(|collateral| (collateral, self.get_price(collateral)))
                .collect()
        }

        pub fn set_price(&mut self, collateral: ResourceAddress, price: Decimal) {
            assert!(price > Decimal::ZERO, "Price must be positive");
            self.prices.insert(collateral, price);
        }

        pub fn remove_price(&mut self, collateral: ResourceAddress) {
            self.prices.remove(&collateral);
        }
    }
}
