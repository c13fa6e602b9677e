use helper::{assert_fails_with, Helper};
use tenor_protocol::shared_structs::*;

use scrypto_test::prelude::*;

#[test]
fn test_cage_requires_base_ledger_shutdown() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();

    let result = helper.unwinder.cage(&mut helper.env);
    assert_fails_with(result, "Unwinder: Base ledger not caged");
    assert_eq!(helper.unwinder.get_state(&mut helper.env)?, UnwinderState::Idle);

    helper.cage()?;

    assert_eq!(helper.unwinder.get_state(&mut helper.env)?, UnwinderState::Caged);
    assert!(!helper.ledger.is_live(&mut helper.env)?);
    assert!(!helper.custodian.is_live(&mut helper.env)?);

    let result = helper.unwinder.cage(&mut helper.env);
    assert!(result.is_err(), "Caging twice should fail");

    Ok(())
}

#[test]
fn test_no_borrowing_or_migration_after_cage() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(100))?;
    let destination = helper.create_account()?;
    let maturity = helper.maturity;

    helper.cage()?;

    let result = helper.borrow(&badge, maturity, user.clone(), dec!(10));
    assert_fails_with(result, "Shutdown active");

    let proof = helper.proof(&badge)?;
    let result = helper.migrator.migrate_collateral(proof, user.clone(), destination, helper.weth_address, dec!(10), &mut helper.env);
    assert_fails_with(result, "Shutdown active");

    // Collateral without debt can still be withdrawn
    let proof = helper.proof(&badge)?;
    let weth = helper.ledger.withdraw(proof, user, helper.weth_address, dec!(100), &mut helper.env)?;
    helper.assert_bucket_eq(&weth, helper.weth_address, dec!(100))?;

    Ok(())
}

#[test]
fn test_no_borrowing_or_migration_once_base_ledger_caged() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(200))?;
    let destination = helper.create_account()?;
    let maturity = helper.maturity;

    // Protocol savings could fund the borrow without touching the base ledger
    let chai = helper.get_chai(dec!(125))?;
    helper.custodian.deposit_savings(chai, &mut helper.env)?;

    helper.cage_base_ledger()?;
    assert_eq!(helper.unwinder.get_state(&mut helper.env)?, UnwinderState::Idle);

    let result = helper.borrow(&badge, maturity, user.clone(), dec!(60));
    assert_fails_with(result, "Shutdown active");

    let proof = helper.proof(&badge)?;
    let result = helper.migrator.migrate_collateral(proof, user.clone(), destination, helper.weth_address, dec!(10), &mut helper.env);
    assert_fails_with(result, "Shutdown active");

    let proof = helper.proof(&badge)?;
    let result = helper.migrator.migrate_position(proof, maturity, user.clone(), destination, &mut helper.env);
    assert_fails_with(result, "Shutdown active");

    assert_eq!(helper.ledger.get_posted(user, helper.weth_address, &mut helper.env)?, dec!(200));
    assert_eq!(helper.custodian.get_savings_balance(&mut helper.env)?, dec!(125));

    Ok(())
}

#[test]
fn test_finalize_requires_admin() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let maturity = helper.maturity;

    helper.cage()?;

    let result = helper.unwinder.finalize_series(maturity, &mut helper.env);
    assert!(result.is_err(), "Only the admin should be able to finalize a series");

    let result = helper.unwinder.finalize_all_series(&mut helper.env);
    assert!(result.is_err(), "Only the admin should be able to finalize all series");

    assert_eq!(helper.unwinder.get_state(&mut helper.env)?, UnwinderState::Caged);
    assert!(helper.ledger.get_series(maturity, &mut helper.env)?.settlement.is_none());

    Ok(())
}

#[test]
fn test_finalize_series() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let maturity = helper.maturity;

    let result = helper.finalize(maturity);
    assert_fails_with(result, "Unwinder: Base ledger not caged");

    helper.env.disable_auth_module();
    helper.base_ledger.set_spot(helper.weth_address, dec!(2), &mut helper.env)?;
    helper.env.enable_auth_module();

    helper.cage()?;
    helper.finalize(maturity)?;

    assert_eq!(helper.unwinder.get_state(&mut helper.env)?, UnwinderState::SeriesSettling);

    // Pre-maturity series settle at face value, weth at the final base ledger price
    let series = helper.ledger.get_series(maturity, &mut helper.env)?;
    let settlement = series.settlement.unwrap();
    assert!(series.matured);
    assert_eq!(settlement.accrual, Decimal::ONE);
    assert_eq!(settlement.prices.get(&helper.weth_address), Some(&dec!(2)));
    assert_eq!(settlement.prices.get(&helper.chai_address), Some(&dec!("1.2")));

    let result = helper.finalize(maturity);
    assert_fails_with(result, "Unwinder: Series already finalized");

    Ok(())
}

#[test]
fn test_finalize_all_series() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let maturity = helper.maturity;
    let later_maturity = helper.later_maturity;

    helper.cage()?;
    helper.finalize(maturity)?;
    helper.finalize_all()?;

    assert!(helper.ledger.get_series(maturity, &mut helper.env)?.settlement.is_some());
    assert!(helper.ledger.get_series(later_maturity, &mut helper.env)?.settlement.is_some());

    Ok(())
}

#[test]
fn test_settle_position_at_fixed_prices() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(101))?;
    let maturity = helper.maturity;

    let _dai = helper.borrow(&badge, maturity, user.clone(), dec!(150))?;

    helper.env.disable_auth_module();
    helper.base_ledger.set_spot(helper.weth_address, dec!(2), &mut helper.env)?;
    helper.env.enable_auth_module();

    helper.cage()?;

    let result = helper.unwinder.settle_position(maturity, user.clone(), &mut helper.env);
    assert_fails_with(result, "Unwinder: Series not finalized");

    helper.finalize(maturity)?;

    // The oracle still says 1.5, but the fixed price is 2
    helper.unwinder.settle_position(maturity, user.clone(), &mut helper.env)?;

    assert_eq!(helper.ledger.get_posted(user.clone(), helper.weth_address, &mut helper.env)?, dec!(26));
    assert_eq!(helper.ledger.get_face_debt(maturity, user.clone(), &mut helper.env)?, dec!(0));

    // The rest of the collateral is free to go
    let proof = helper.proof(&badge)?;
    let weth = helper.ledger.withdraw(proof, user, helper.weth_address, dec!(26), &mut helper.env)?;
    helper.assert_bucket_eq(&weth, helper.weth_address, dec!(26))?;

    Ok(())
}

#[test]
fn test_skim_profit() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let destination = helper.create_account()?;

    for _ in 0..10 {
        let chai = helper.get_chai(dec!(125))?;
        helper.custodian.deposit_savings(chai, &mut helper.env)?;
    }

    helper.env.disable_auth_module();
    let result = helper.unwinder.skim(destination, &mut helper.env);
    helper.env.enable_auth_module();
    assert_fails_with(result, "Unwinder: Base ledger not caged");

    helper.cage()?;
    assert_eq!(helper.unwinder.get_skimmable_profit(&mut helper.env)?, dec!(1250));

    let result = helper.unwinder.skim(destination, &mut helper.env);
    assert!(result.is_err(), "Only the admin should be able to skim");

    helper.env.disable_auth_module();
    let skimmed = helper.unwinder.skim(destination, &mut helper.env)?;
    let skimmed_again = helper.unwinder.skim(destination, &mut helper.env)?;
    helper.env.enable_auth_module();

    assert_eq!(skimmed, dec!(1250));
    assert_eq!(skimmed_again, dec!(0));
    assert_eq!(helper.unwinder.get_state(&mut helper.env)?, UnwinderState::ProfitSkimmed);
    assert_eq!(helper.custodian.get_savings_balance(&mut helper.env)?, dec!(0));

    let chai = helper.withdraw_from_account(destination, helper.chai_address, dec!(1250))?;
    helper.assert_bucket_eq(&chai, helper.chai_address, dec!(1250))?;

    Ok(())
}

#[test]
fn test_skim_leaves_user_collateral() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let destination = helper.create_account()?;
    let (_badge, user) = helper.open_account()?;

    for _ in 0..10 {
        let chai = helper.get_chai(dec!(125))?;
        helper.custodian.deposit_savings(chai, &mut helper.env)?;
    }

    let chai = helper.get_chai(dec!(125))?;
    helper.ledger.post(user.clone(), chai, &mut helper.env)?;

    helper.cage()?;

    helper.env.disable_auth_module();
    let skimmed = helper.unwinder.skim(destination, &mut helper.env)?;
    helper.env.enable_auth_module();

    assert_eq!(skimmed, dec!(1250));
    assert_eq!(helper.custodian.get_savings_balance(&mut helper.env)?, dec!(125));
    assert_eq!(helper.ledger.get_posted(user, helper.chai_address, &mut helper.env)?, dec!(125));

    Ok(())
}

#[test]
fn test_finalize_matured_series_uses_accrued_rate() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(200))?;
    let maturity = helper.maturity;

    let _dai = helper.borrow(&badge, maturity, user.clone(), dec!(150))?;

    // Matures at rate 1.25, the base ledger rate then moves to 1.5
    helper.advance_past(maturity)?;
    helper.ledger.mature(maturity, &mut helper.env)?;
    helper.set_rate(dec!("1.5"))?;

    helper.env.disable_auth_module();
    helper.base_ledger.set_spot(helper.weth_address, dec!(2), &mut helper.env)?;
    helper.env.enable_auth_module();

    helper.cage()?;
    helper.finalize(maturity)?;

    let settlement = helper.ledger.get_series(maturity, &mut helper.env)?.settlement.unwrap();
    assert_eq!(settlement.accrual, dec!("1.2"));
    assert_eq!(settlement.prices.get(&helper.weth_address), Some(&dec!(2)));

    // 150 face at 1.2 is 180 debt units, i.e. 90 weth at the fixed price of 2
    helper.unwinder.settle_position(maturity, user.clone(), &mut helper.env)?;
    assert_eq!(helper.ledger.get_posted(user.clone(), helper.weth_address, &mut helper.env)?, dec!(110));
    assert_eq!(helper.ledger.get_face_debt(maturity, user, &mut helper.env)?, dec!(0));

    Ok(())
}

#[test]
fn test_finalize_prices_disabled_collateral() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(101))?;
    let maturity = helper.maturity;

    let _dai = helper.borrow(&badge, maturity, user.clone(), dec!(150))?;

    helper.env.disable_auth_module();
    helper.ledger.set_collateral_enabled(helper.weth_address, false, &mut helper.env)?;
    helper.ledger.set_collateral_enabled(helper.chai_address, false, &mut helper.env)?;
    helper.base_ledger.set_spot(helper.weth_address, dec!(2), &mut helper.env)?;
    helper.env.enable_auth_module();

    helper.cage()?;
    helper.finalize(maturity)?;

    let settlement = helper.ledger.get_series(maturity, &mut helper.env)?.settlement.unwrap();
    assert_eq!(settlement.prices.get(&helper.weth_address), Some(&dec!(2)));
    assert_eq!(settlement.prices.get(&helper.chai_address), Some(&dec!("1.2")));

    // Settles at the fixed price of 2, not the oracle's 1.5
    helper.unwinder.settle_position(maturity, user.clone(), &mut helper.env)?;
    assert_eq!(helper.ledger.get_posted(user, helper.weth_address, &mut helper.env)?, dec!(26));

    Ok(())
}
