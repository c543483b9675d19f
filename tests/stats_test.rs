mod common;

use std::time::Duration;

use anyhow::Result;
use panel_ledger::error::AppError;
use panel_ledger::models::order::OrderStatus;
use serde_json::json;

#[tokio::test]
async fn empty_store_yields_empty_lists_and_zero_stats() -> Result<()> {
    let (_, stats) = common::test_services();

    assert!(stats.list_users().await?.is_empty());
    assert!(stats.list_orders(None).await?.is_empty());
    assert!(stats.list_orders_for_user("u1").await?.is_empty());

    let order_stats = stats.order_stats().await?;
    assert_eq!(order_stats.total_orders, 0);
    assert_eq!(order_stats.total_revenue_cents, 0);

    let user_stats = stats.user_stats().await?;
    assert_eq!(user_stats.total_users, 0);
    assert_eq!(user_stats.total_balance_cents, 0);
    Ok(())
}

#[tokio::test]
async fn order_stats_count_by_status_and_sum_all_amounts() -> Result<()> {
    let (ledger, stats) = common::test_services();
    common::funded_user(&ledger, "u1", 1000).await?;

    let first = ledger.create_order(common::order_request("u1", 80, 10)).await?;
    let second = ledger.create_order(common::order_request("u1", 120, 10)).await?;
    ledger
        .update_order_status(&second.id, OrderStatus::Completed)
        .await?;

    let order_stats = stats.order_stats().await?;
    assert_eq!(order_stats.total_orders, 2);
    assert_eq!(order_stats.pending_orders, 1);
    assert_eq!(order_stats.completed_orders, 1);
    // Revenue counts every order regardless of status.
    assert_eq!(order_stats.total_revenue_cents, 200);

    // Rejected orders drop out of both counters but stay in the revenue.
    ledger
        .update_order_status(&first.id, OrderStatus::Rejected)
        .await?;
    let order_stats = stats.order_stats().await?;
    assert_eq!(order_stats.total_orders, 2);
    assert_eq!(order_stats.pending_orders, 0);
    assert_eq!(order_stats.completed_orders, 1);
    assert_eq!(order_stats.total_revenue_cents, 200);
    Ok(())
}

#[tokio::test]
async fn user_stats_sum_balances() -> Result<()> {
    let (ledger, stats) = common::test_services();
    common::funded_user(&ledger, "u1", 300).await?;
    common::funded_user(&ledger, "u2", 120).await?;
    common::funded_user(&ledger, "u3", 0).await?;

    let user_stats = stats.user_stats().await?;
    assert_eq!(user_stats.total_users, 3);
    assert_eq!(user_stats.total_balance_cents, 420);
    Ok(())
}

#[tokio::test]
async fn orders_list_newest_first_with_status_filter() -> Result<()> {
    let (ledger, stats) = common::test_services();
    common::funded_user(&ledger, "u1", 1000).await?;
    common::funded_user(&ledger, "u2", 1000).await?;

    let oldest = ledger.create_order(common::order_request("u1", 10, 1)).await?;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let middle = ledger.create_order(common::order_request("u2", 20, 1)).await?;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newest = ledger.create_order(common::order_request("u1", 30, 1)).await?;

    let all = stats.list_orders(None).await?;
    let ids: Vec<&str> = all.iter().map(|order| order.id.as_str()).collect();
    assert_eq!(ids, [newest.id.as_str(), middle.id.as_str(), oldest.id.as_str()]);

    ledger
        .update_order_status(&middle.id, OrderStatus::Completed)
        .await?;
    let pending = stats.list_orders(Some(OrderStatus::Pending)).await?;
    let ids: Vec<&str> = pending.iter().map(|order| order.id.as_str()).collect();
    assert_eq!(ids, [newest.id.as_str(), oldest.id.as_str()]);

    let for_user = stats.list_orders_for_user("u1").await?;
    let ids: Vec<&str> = for_user.iter().map(|order| order.id.as_str()).collect();
    assert_eq!(ids, [newest.id.as_str(), oldest.id.as_str()]);

    assert!(stats.list_orders_for_user("ghost").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn verify_user_accepts_ledger_written_documents() -> Result<()> {
    let (ledger, stats) = common::test_services();
    common::funded_user(&ledger, "u1", 100).await?;

    let report = stats.verify_user("u1").await?;
    assert!(report.valid, "unexpected issues: {:?}", report.issues);
    Ok(())
}

#[tokio::test]
async fn verify_user_flags_broken_documents() -> Result<()> {
    let (store, _, stats) = common::test_stack();

    // Planted directly, the way a botched migration would leave it.
    store
        .put("users", "broken", json!({ "email": "", "balance_cents": -5 }))
        .await?;

    let report = stats.verify_user("broken").await?;
    assert!(!report.valid);
    assert!(report.issues.contains(&"missing email".to_string()));
    assert!(report.issues.contains(&"negative balance".to_string()));
    assert!(report.issues.contains(&"missing created_at".to_string()));
    Ok(())
}

#[tokio::test]
async fn verify_order_enforces_shape_and_minimum_amount() -> Result<()> {
    let (ledger, stats) = common::test_services();
    common::funded_user(&ledger, "u1", 10_000).await?;

    let order = ledger
        .create_order(common::order_request("u1", 8000, 1000))
        .await?;
    let report = stats.verify_order(&order.id).await?;
    assert!(report.valid, "unexpected issues: {:?}", report.issues);

    // Below the 3000-cent floor the order still exists but gets flagged.
    let small = ledger.create_order(common::order_request("u1", 80, 10)).await?;
    let report = stats.verify_order(&small.id).await?;
    assert!(!report.valid);
    assert!(
        report
            .issues
            .iter()
            .any(|issue| issue.contains("minimum"))
    );
    Ok(())
}

#[tokio::test]
async fn verify_order_flags_missing_fields() -> Result<()> {
    let (store, _, stats) = common::test_stack();

    store
        .put("orders", "broken", json!({ "status": "shipped", "quantity": 0 }))
        .await?;

    let report = stats.verify_order("broken").await?;
    assert!(!report.valid);
    assert!(report.issues.contains(&"missing user_id".to_string()));
    assert!(report.issues.contains(&"missing service".to_string()));
    assert!(report.issues.contains(&"invalid status".to_string()));
    assert!(report.issues.contains(&"missing amount".to_string()));
    assert!(report.issues.contains(&"quantity must be positive".to_string()));
    Ok(())
}

#[tokio::test]
async fn verification_requires_the_document_to_exist() {
    let (_, stats) = common::test_services();

    let err = stats.verify_user("ghost").await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));

    let err = stats.verify_order("ghost").await.unwrap_err();
    assert!(matches!(err, AppError::OrderNotFound));
}
