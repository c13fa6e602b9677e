//! # Accounting primitives
//!
//! Pure arithmetic used by the Ledger, Custodian, Migrator and Unwinder. Nothing in here touches component
//! state, which keeps the collateralization and settlement rules unit-testable outside the engine.
//!
//! Units:
//! - **debt units**: the BaseLedger's stablecoin.
//! - **face units**: a series' zero-coupon unit. Worth one debt unit until maturity, `accrual` debt units after.
//! - **normalized debt**: BaseLedger urn debt. Worth `rate` debt units.
//! - prices are quoted in debt units per collateral unit.

use scrypto::prelude::*;

/// Smallest representable `Decimal` step.
pub fn atto() -> Decimal {
    dec!("0.000000000000000001")
}

/// Division rounded towards positive infinity, for non-negative operands.
pub fn div_up(numerator: Decimal, denominator: Decimal) -> Decimal {
    let quotient = numerator / denominator;
    if quotient * denominator < numerator {
        quotient + atto()
    } else {
        quotient
    }
}

pub fn collateral_value(amount: Decimal, price: Decimal) -> Decimal {
    amount * price
}

/// Debt units owed for `face` face units.
pub fn debt_value(face: Decimal, accrual: Decimal) -> Decimal {
    face * accrual
}

/// Face units extinguished by a payment of `payment` debt units.
pub fn face_for_payment(payment: Decimal, accrual: Decimal) -> Decimal {
    payment / accrual
}

/// Accrual of a matured series: growth of the base rate since the maturity snapshot.
/// Unmatured series accrue nothing.
pub fn rate_growth(rate_now: Decimal, rate_at_maturity: Option<Decimal>) -> Decimal {
    match rate_at_maturity {
        Some(rate_then) if rate_then > Decimal::ZERO && rate_now > rate_then => rate_now / rate_then,
        _ => Decimal::ONE,
    }
}

/// Normalized BaseLedger debt for `debt` debt units, rounded down.
pub fn normalized_debt(debt: Decimal, rate: Decimal) -> Decimal {
    debt / rate
}

/// Normalized BaseLedger debt that mints at least `debt` debt units.
pub fn normalized_debt_up(debt: Decimal, rate: Decimal) -> Decimal {
    div_up(debt, rate)
}

/// Normalized debt to draw from an urn for `wanted` debt units, and the debt units it mints. Rounds up so
/// `wanted` is covered unless that leaves the urn unsafe, in which case it rounds down.
pub fn draw_amounts(
    wanted: Decimal,
    ink: Decimal,
    spot: Decimal,
    art: Decimal,
    rate: Decimal,
) -> (Decimal, Decimal) {
    let mut art_delta = normalized_debt_up(wanted, rate);
    if !urn_is_safe(ink, spot, art + art_delta, rate) {
        art_delta = normalized_debt(wanted, rate);
    }
    (art_delta, art_delta * rate)
}

/// Debt units an urn can still draw: `ink * spot - art * rate`, never negative.
pub fn urn_capacity(ink: Decimal, spot: Decimal, art: Decimal, rate: Decimal) -> Decimal {
    let capacity = ink * spot - art * rate;
    if capacity > Decimal::ZERO {
        capacity
    } else {
        Decimal::ZERO
    }
}

pub fn urn_is_safe(ink: Decimal, spot: Decimal, art: Decimal, rate: Decimal) -> bool {
    art * rate <= ink * spot
}

/// Net Custodian position in savings units. Savings posted by users as collateral and the Custodian's own
/// BaseLedger debt are deducted. Negative when the Custodian is in deficit.
pub fn skim_profit(
    savings_held: Decimal,
    savings_reserved: Decimal,
    base_debt: Decimal,
    exchange_rate: Decimal,
) -> Decimal {
    savings_held - savings_reserved - div_up(base_debt, exchange_rate)
}

/// Collateral seized from one collateral type at settlement.
#[derive(Clone, Debug, PartialEq)]
pub struct SettlementPart<K> {
    pub key: K,
    /// Collateral units forfeited.
    pub tokens: Decimal,
    /// Debt units covered by `tokens`.
    pub debt: Decimal,
    /// Face units extinguished by `tokens`.
    pub face: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SettlementPlan<K> {
    pub parts: Vec<SettlementPart<K>>,
    /// Debt units left uncovered once every holding is exhausted.
    pub shortfall: Decimal,
}

/// Plans the settlement of `face` face units against `holdings` of `(key, posted, price)`, consumed in
/// order. Each holding gives up just enough to cover what is left, rounded up in favour of the protocol
/// and capped at what is posted.
pub fn plan_settlement<K: Clone>(
    face: Decimal,
    accrual: Decimal,
    holdings: &[(K, Decimal, Decimal)],
) -> SettlementPlan<K> {
    let total_debt = debt_value(face, accrual);
    let mut remaining = total_debt;
    let mut face_remaining = face;
    let mut parts = Vec::new();

    for (key, posted, price) in holdings {
        if remaining <= Decimal::ZERO {
            break;
        }
        if *posted <= Decimal::ZERO || *price <= Decimal::ZERO {
            continue;
        }

        let tokens = div_up(remaining, *price).min(*posted);
        let covered = collateral_value(tokens, *price).min(remaining);
        let face_part = if covered == remaining {
            face_remaining
        } else {
            (face * covered / total_debt).min(face_remaining)
        };

        remaining -= covered;
        face_remaining -= face_part;
        parts.push(SettlementPart {
            key: key.clone(),
            tokens,
            debt: covered,
            face: face_part,
        });
    }

    SettlementPlan {
        parts,
        shortfall: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_up_rounds_towards_infinity() {
        assert_eq!(div_up(dec!(150), dec!("1.5")), dec!(100));
        assert_eq!(div_up(dec!(1), dec!(3)), dec!(1) / dec!(3) + atto());
    }

    #[test]
    fn rate_growth_is_one_before_maturity() {
        assert_eq!(rate_growth(dec!("1.5"), None), Decimal::ONE);
        assert_eq!(rate_growth(dec!("1.5"), Some(dec!("1.25"))), dec!("1.2"));
        assert_eq!(rate_growth(dec!("1.25"), Some(dec!("1.25"))), Decimal::ONE);
    }

    #[test]
    fn urn_capacity_matches_spot_and_rate() {
        assert_eq!(urn_capacity(dec!(100), dec!("1.5"), Decimal::ZERO, dec!("1.25")), dec!(150));
        assert_eq!(urn_capacity(dec!(100), dec!("1.5"), dec!(120), dec!("1.25")), Decimal::ZERO);
        assert!(urn_is_safe(dec!(100), dec!("1.5"), dec!(120), dec!("1.25")));
        assert!(!urn_is_safe(dec!(99), dec!("1.5"), dec!(120), dec!("1.25")));
    }

    #[test]
    fn normalized_debt_of_weth_position() {
        assert_eq!(normalized_debt(dec!(150), dec!("1.25")), dec!(120));
        assert_eq!(normalized_debt_up(dec!(150), dec!("1.25")), dec!(120));
    }

    #[test]
    fn draw_amounts_round_up_when_safe() {
        let (art_delta, minted) = draw_amounts(dec!(1), dec!(10), dec!(1), Decimal::ZERO, dec!(3));
        assert_eq!(art_delta, dec!(1) / dec!(3) + atto());
        assert!(minted >= dec!(1));
    }

    #[test]
    fn draw_amounts_round_down_at_urn_limit() {
        // Capacity is exactly one debt unit; rounding up would overshoot it
        let (art_delta, minted) = draw_amounts(dec!(1), dec!(1), dec!(1), Decimal::ZERO, dec!(3));
        assert_eq!(art_delta, dec!(1) / dec!(3));
        assert!(urn_is_safe(dec!(1), dec!(1), art_delta, dec!(3)));
        assert!(minted < dec!(1));
        assert!(dec!(1) - minted <= dec!(3) * atto() + atto());
    }

    #[test]
    fn skim_profit_excludes_posted_savings_and_debt() {
        assert_eq!(skim_profit(dec!(1375), dec!(125), Decimal::ZERO, dec!("1.2")), dec!(1250));
        assert_eq!(skim_profit(dec!(1250), Decimal::ZERO, dec!(150), dec!("1.2")), dec!(1125));
        assert!(skim_profit(Decimal::ZERO, Decimal::ZERO, dec!(150), dec!("1.2")) < Decimal::ZERO);
    }

    #[test]
    fn settlement_takes_only_needed_collateral() {
        let plan = plan_settlement(dec!(150), Decimal::ONE, &[("weth", dec!(101), dec!("1.5"))]);

        assert_eq!(plan.shortfall, Decimal::ZERO);
        assert_eq!(
            plan.parts,
            vec![SettlementPart {
                key: "weth",
                tokens: dec!(100),
                debt: dec!(150),
                face: dec!(150),
            }]
        );
    }

    #[test]
    fn settlement_walks_holdings_in_order() {
        let plan = plan_settlement(
            dec!(150),
            Decimal::ONE,
            &[
                ("empty", Decimal::ZERO, dec!(2)),
                ("weth", dec!(50), dec!("1.5")),
                ("chai", dec!(100), dec!("1.2")),
            ],
        );

        assert_eq!(plan.shortfall, Decimal::ZERO);
        assert_eq!(plan.parts.len(), 2);
        assert_eq!(plan.parts[0].tokens, dec!(50));
        assert_eq!(plan.parts[0].debt, dec!(75));
        assert_eq!(plan.parts[0].face, dec!(75));
        assert_eq!(plan.parts[1].key, "chai");
        assert_eq!(plan.parts[1].tokens, dec!("62.5"));
        assert_eq!(plan.parts[1].face, dec!(75));
    }

    #[test]
    fn settlement_reports_shortfall() {
        let plan = plan_settlement(dec!(100), dec!("1.5"), &[("weth", dec!(60), dec!("1.5"))]);

        assert_eq!(plan.parts[0].tokens, dec!(60));
        assert_eq!(plan.parts[0].debt, dec!(90));
        assert_eq!(plan.parts[0].face, dec!(60));
        assert_eq!(plan.shortfall, dec!(60));
    }

    #[test]
    fn settlement_of_nothing_is_empty() {
        let plan = plan_settlement(Decimal::ZERO, Decimal::ONE, &[("weth", dec!(10), dec!(1))]);
        assert!(plan.parts.is_empty());
        assert_eq!(plan.shortfall, Decimal::ZERO);
    }
}
