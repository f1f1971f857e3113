/// payments - promising received tokens and paying them out
use std::sync::Arc;

use collateral_ledger::{Amount, InMemoryTokenBank, LedgerConfig, Party, PaymentsManager, TokenBank};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("=== payments example ===\n");

    let config = LedgerConfig::strict(Party::generate());
    let bank = Arc::new(InMemoryTokenBank::new());
    let mut payments = PaymentsManager::new(&config, bank.clone());

    let token = Party::generate();
    let lender = Party::generate();
    let treasury = Party::generate();

    // a repayment lands on the holder
    bank.mint(token, payments.holder(), Amount::from_whole(1_000, 6)?)?;
    println!("available: {}", payments.get_available(token));

    payments.assign_available_to(token, Amount::from_whole(900, 6)?, lender)?;
    println!("assigned 900 to lender, available: {}", payments.get_available(token));

    // over-assignment is rejected in strict mode
    if let Err(e) = payments.assign_available_to(token, Amount::from_whole(200, 6)?, lender) {
        println!("rejected: {} ({:?})", e, e.kind());
    }

    payments.release_pending_balance(token, lender, Amount::from_whole(400, 6)?)?;
    println!(
        "lender withdrew 400, pending {}, stored {}",
        payments.pending_balance_of(token, lender),
        payments.stored_balance_of(token)
    );

    let skimmed = payments.skim_all_to(token, treasury)?;
    println!("skimmed {} to treasury", skimmed);

    println!("\nbalances:");
    println!("  lender:   {}", bank.balance_of(token, lender));
    println!("  treasury: {}", bank.balance_of(token, treasury));
    println!("  holder:   {}", bank.balance_of(token, payments.holder()));

    for event in payments.events.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
