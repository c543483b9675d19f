// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use panel_ledger::models::order::CreateOrderRequest;
use panel_ledger::models::user::BalanceAction;
use panel_ledger::services::{LedgerService, StatsService};
use panel_ledger::store::{MemoryStore, Store};

/// Helper to create the two services over a fresh in-memory store.
pub fn test_services() -> (LedgerService, StatsService) {
    let (_, ledger, stats) = test_stack();
    (ledger, stats)
}

/// Same, but also hands back the raw store for tests that plant documents
/// directly (integrity verification).
pub fn test_stack() -> (Arc<dyn Store>, LedgerService, StatsService) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    (
        Arc::clone(&store),
        LedgerService::new(Arc::clone(&store)),
        StatsService::new(Arc::clone(&store)),
    )
}

/// Create a user and credit an opening balance.
pub async fn funded_user(ledger: &LedgerService, id: &str, balance_cents: i64) -> Result<()> {
    ledger.create_user(id, &format!("{id}@example.com")).await?;
    if balance_cents > 0 {
        ledger
            .adjust_balance(id, balance_cents, BalanceAction::Add)
            .await?;
    }
    Ok(())
}

/// A plausible order request with the descriptive fields filled in.
pub fn order_request(user_id: &str, amount_cents: i64, quantity: u32) -> CreateOrderRequest {
    CreateOrderRequest {
        user_id: user_id.to_string(),
        service: "Instagram Followers".to_string(),
        service_id: "instagram_followers".to_string(),
        platform: "Instagram".to_string(),
        plan: "normal".to_string(),
        target: "someaccount".to_string(),
        utr: "TXN123456".to_string(),
        amount_cents,
        quantity,
    }
}
