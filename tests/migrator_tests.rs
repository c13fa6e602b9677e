use helper::{assert_fails_with, Helper};

use scrypto_test::prelude::*;

#[test]
fn test_migrate_collateral() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(100))?;
    let destination = helper.create_account()?;

    let proof = helper.proof(&badge)?;
    helper.migrator.migrate_collateral(proof, user.clone(), destination, helper.weth_address, dec!(40), &mut helper.env)?;

    assert_eq!(helper.urn(destination)?, (dec!(40), dec!(0)));
    let custodian_address = helper.custodian_address();
    assert_eq!(helper.urn(custodian_address)?, (dec!(60), dec!(0)));
    assert_eq!(helper.ledger.get_posted(user, helper.weth_address, &mut helper.env)?, dec!(60));
    assert_eq!(helper.custodian.get_reserved(helper.weth_address, &mut helper.env)?, dec!(60));

    Ok(())
}

#[test]
fn test_migrate_collateral_requires_owner_or_delegate() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(100))?;
    let (other_badge, other_user) = helper.open_account()?;
    let destination = helper.create_account()?;

    let proof = helper.proof(&other_badge)?;
    let result = helper.migrator.migrate_collateral(proof, user.clone(), destination, helper.weth_address, dec!(40), &mut helper.env);
    assert_fails_with(result, "Migrator: Only owner or delegate");
    assert_eq!(helper.ledger.get_posted(user.clone(), helper.weth_address, &mut helper.env)?, dec!(100));

    let owner_proof = helper.proof(&badge)?;
    helper.ledger.add_delegate(owner_proof, other_user, &mut helper.env)?;

    let proof = helper.proof(&other_badge)?;
    helper.migrator.migrate_collateral(proof, user, destination, helper.weth_address, dec!(40), &mut helper.env)?;
    assert_eq!(helper.urn(destination)?.0, dec!(40));

    Ok(())
}

#[test]
fn test_migrate_collateral_keeps_position_collateralized() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(100))?;
    let destination = helper.create_account()?;
    let maturity = helper.maturity;

    let _dai = helper.borrow(&badge, maturity, user.clone(), dec!(120))?;

    // 20 weth left would be worth 30 against 120 debt
    let proof = helper.proof(&badge)?;
    let result = helper.migrator.migrate_collateral(proof, user.clone(), destination, helper.weth_address, dec!(80), &mut helper.env);
    assert_fails_with(result, "Ledger: Insufficient collateral");

    let proof = helper.proof(&badge)?;
    helper.migrator.migrate_collateral(proof, user, destination, helper.weth_address, dec!(20), &mut helper.env)?;
    assert_eq!(helper.urn(destination)?, (dec!(20), dec!(0)));

    Ok(())
}

#[test]
fn test_migrate_savings_collateral_fails() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.open_account()?;
    let destination = helper.create_account()?;

    let chai = helper.get_chai(dec!(100))?;
    helper.ledger.post(user.clone(), chai, &mut helper.env)?;

    let proof = helper.proof(&badge)?;
    let result = helper.migrator.migrate_collateral(proof, user, destination, helper.chai_address, dec!(10), &mut helper.env);
    assert_fails_with(result, "Migrator: Collateral not held in base ledger");

    Ok(())
}

#[test]
fn test_migrate_position() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(100))?;
    let destination = helper.create_account()?;
    let maturity = helper.maturity;

    let _dai = helper.borrow(&badge, maturity, user.clone(), dec!(150))?;

    let proof = helper.proof(&badge)?;
    helper.migrator.migrate_position(proof, maturity, user.clone(), destination, &mut helper.env)?;

    // 150 debt units at rate 1.25 become 120 normalized debt
    assert_eq!(helper.urn(destination)?, (dec!(100), dec!(120)));
    let custodian_address = helper.custodian_address();
    assert_eq!(helper.urn(custodian_address)?, (dec!(0), dec!(0)));

    assert_eq!(helper.ledger.get_face_debt(maturity, user.clone(), &mut helper.env)?, dec!(0));
    assert_eq!(helper.ledger.get_posted(user, helper.weth_address, &mut helper.env)?, dec!(0));
    assert_eq!(helper.custodian.get_reserved(helper.weth_address, &mut helper.env)?, dec!(0));

    Ok(())
}

#[test]
fn test_migrate_position_with_other_debt() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(200))?;
    let destination = helper.create_account()?;
    let maturity = helper.maturity;
    let later_maturity = helper.later_maturity;

    let _dai = helper.borrow(&badge, maturity, user.clone(), dec!(150))?;
    let _dai = helper.borrow(&badge, later_maturity, user.clone(), dec!(60))?;

    let proof = helper.proof(&badge)?;
    helper.migrator.migrate_position(proof, maturity, user.clone(), destination, &mut helper.env)?;

    // Only the collateral backing the migrated debt moves: 150 / 1.5
    assert_eq!(helper.urn(destination)?, (dec!(100), dec!(120)));
    assert_eq!(helper.ledger.get_posted(user.clone(), helper.weth_address, &mut helper.env)?, dec!(100));
    assert_eq!(helper.ledger.get_face_debt(later_maturity, user, &mut helper.env)?, dec!(60));

    let custodian_address = helper.custodian_address();
    assert_eq!(helper.urn(custodian_address)?, (dec!(100), dec!(48)));

    Ok(())
}

#[test]
fn test_migrate_position_after_maturity_fails() -> Result<(), RuntimeError> {
    let mut helper = Helper::new().unwrap();
    let (badge, user) = helper.account_with_weth(dec!(100))?;
    let destination = helper.create_account()?;
    let maturity = helper.maturity;

    let _dai = helper.borrow(&badge, maturity, user.clone(), dec!(150))?;
    helper.advance_past(maturity)?;

    let proof = helper.proof(&badge)?;
    let result = helper.migrator.migrate_position(proof, maturity, user, destination, &mut helper.env);
    assert_fails_with(result, "Ledger: Series already matured");

    Ok(())
}
