/// lifecycle - a collateralized loan from origination to release
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use collateral_ledger::loans::to_timestamp;
use collateral_ledger::{
    AssetRegistry, InMemoryNftBank, LedgerConfig, NftBank, LoanLedger, LoanTerms, NftCustodyRegistrar,
    Party, RightsRegistry, SafeTimeProvider, TimeSource,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== collateralized loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let control = time.test_control().unwrap();

    let controller = Party::generate();
    let config = LedgerConfig::new(controller);
    config.validate()?;

    let mut ledger = LoanLedger::new(&config);
    let mut assets = AssetRegistry::new(&config);
    let mut rights = RightsRegistry::new(&config);

    // borrower hands an nft over as collateral
    let nfts = Arc::new(InMemoryNftBank::new());
    let custody = Arc::new(NftCustodyRegistrar::new(Party::generate(), &assets, nfts.clone()));
    let collection = Party::generate();
    let lender = Party::generate();
    let borrower = Party::generate();
    nfts.mint(collection, 1, borrower)?;

    let asset_id = custody.receive(&mut assets, borrower, collection, 1, borrower)?;
    assets.reserve(controller, asset_id)?;
    println!("collateral asset {} reserved", asset_id);

    // one era per day, 1% per era, 30 eras, 10 tokens minimum
    let terms = LoanTerms::builder()
        .duration(30)
        .era_duration(2)
        .interest_fraction(dec!(0.01))
        .principal(1_000_000_000u64.into())
        .min_payment(10_000_000u64.into())
        .build_with_time(&time)?;
    let loan_id = ledger.open(&terms)?;
    let rights_id = rights.register(controller, lender, borrower)?;
    println!("loan {} opened, rights {} minted", loan_id, rights_id);

    // pay three days on time, then the rest in one go
    for _ in 0..3 {
        control.advance(Duration::days(1));
        let accrual = ledger.pay_next(loan_id, 50_000_000u64.into())?;
        println!(
            "era {}: interest {}, outstanding {}",
            accrual.last_era, accrual.interest, accrual.closing
        );
    }

    control.advance(Duration::hours(30));
    ledger.pay_current_at(loan_id, 100_000_000u64.into(), &time)?;

    let outstanding = ledger.loan(loan_id)?.outstanding;
    let payoff = collateral_ledger::accrue_once(outstanding, terms.interest_rate, 0u64.into())?;
    let accrual = ledger.pay_next(loan_id, payoff)?;
    println!("final era {} paid off, outstanding {}", accrual.last_era, accrual.closing);

    ledger.try_close(loan_id)?;
    println!("\nloan state:");
    println!("{}", ledger.view(loan_id, to_timestamp(time.now()))?.to_json_pretty()?);

    // collateral goes back to whoever holds the borrower rights
    let owner = rights.borrower_of(rights_id)?;
    assets.release_asset_to(controller, asset_id, owner)?;
    rights.delete_lender_of(controller, rights_id)?;
    rights.delete_borrower_of(controller, rights_id)?;

    println!("\nnft returned to borrower: {}", nfts.owner_of(collection, 1) == Some(borrower));
    println!("live rights tokens: {}", rights.total_supply());

    Ok(())
}
