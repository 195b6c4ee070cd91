use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::ledger_model::*;
use crate::holdings::Holding;

fn holding(quantity: Decimal, average_cost: Decimal) -> Holding {
    Holding::new("u1", "AAPL", quantity, average_cost)
}

// ---------------------------------------------------------------------------
// validate_order
// ---------------------------------------------------------------------------

#[test]
fn test_zero_quantity_rejected() {
    let err = validate_order(
        OrderSide::Buy,
        "AAPL",
        dec!(0),
        dec!(150),
        dec!(10000),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, OrderRejection::InvalidQuantity { .. }));
}

#[test]
fn test_negative_quantity_rejected() {
    let err = validate_order(
        OrderSide::Sell,
        "AAPL",
        dec!(-5),
        dec!(150),
        dec!(10000),
        Some(&holding(dec!(10), dec!(150))),
    )
    .unwrap_err();
    assert!(matches!(err, OrderRejection::InvalidQuantity { .. }));
}

#[test]
fn test_buy_over_cash_rejected_with_shortfall() {
    let err = validate_order(
        OrderSide::Buy,
        "AAPL",
        dec!(100),
        dec!(150),
        dec!(10000),
        None,
    )
    .unwrap_err();
    assert_eq!(
        err,
        OrderRejection::InsufficientFunds {
            required: dec!(15000),
            available: dec!(10000),
            shortfall: dec!(5000),
        }
    );
}

#[test]
fn test_buy_exactly_equal_to_cash_passes() {
    // Equality must pass, not fail.
    assert!(validate_order(
        OrderSide::Buy,
        "AAPL",
        dec!(100),
        dec!(100),
        dec!(10000),
        None,
    )
    .is_ok());
}

#[test]
fn test_sell_without_holding_rejected() {
    let err = validate_order(
        OrderSide::Sell,
        "AAPL",
        dec!(5),
        dec!(150),
        dec!(10000),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, OrderRejection::NoHolding { .. }));
}

#[test]
fn test_sell_over_owned_rejected_with_owned_amount() {
    let err = validate_order(
        OrderSide::Sell,
        "AAPL",
        dec!(15),
        dec!(150),
        dec!(10000),
        Some(&holding(dec!(10), dec!(150))),
    )
    .unwrap_err();
    assert_eq!(
        err,
        OrderRejection::InsufficientShares {
            requested: dec!(15),
            owned: dec!(10),
        }
    );
}

#[test]
fn test_sell_exactly_owned_passes() {
    assert!(validate_order(
        OrderSide::Sell,
        "AAPL",
        dec!(10),
        dec!(150),
        dec!(0),
        Some(&holding(dec!(10), dec!(150))),
    )
    .is_ok());
}

#[test]
fn test_invalid_quantity_wins_over_funds_check() {
    // First failure wins: a zero-quantity buy with no cash reports the
    // quantity problem, not the funds problem.
    let err = validate_order(OrderSide::Buy, "AAPL", dec!(0), dec!(150), dec!(0), None).unwrap_err();
    assert!(matches!(err, OrderRejection::InvalidQuantity { .. }));
}

// ---------------------------------------------------------------------------
// plan_order
// ---------------------------------------------------------------------------

#[test]
fn test_first_buy_opens_position_at_fill_price() {
    let plan = plan_order(
        OrderSide::Buy,
        "AAPL",
        dec!(10),
        dec!(150),
        dec!(10000),
        None,
    )
    .unwrap();

    assert_eq!(plan.total_amount, dec!(1500));
    assert_eq!(plan.new_cash_balance, dec!(8500));
    assert_eq!(
        plan.outcome,
        OrderOutcome::NewPosition {
            quantity: dec!(10),
            average_cost: dec!(150),
        }
    );
}

#[test]
fn test_second_buy_weights_average_cost() {
    // 10 @ 150 already held, buy 5 @ 180: avg = (10*150 + 5*180) / 15 = 160.
    let plan = plan_order(
        OrderSide::Buy,
        "AAPL",
        dec!(5),
        dec!(180),
        dec!(8500),
        Some(&holding(dec!(10), dec!(150))),
    )
    .unwrap();

    assert_eq!(plan.new_cash_balance, dec!(7600));
    assert_eq!(
        plan.outcome,
        OrderOutcome::AddToPosition {
            new_quantity: dec!(15),
            new_average_cost: dec!(160),
        }
    );
}

#[test]
fn test_partial_sell_keeps_average_cost() {
    let plan = plan_order(
        OrderSide::Sell,
        "AAPL",
        dec!(5),
        dec!(170),
        dec!(7600),
        Some(&holding(dec!(15), dec!(160))),
    )
    .unwrap();

    assert_eq!(plan.total_amount, dec!(850));
    assert_eq!(plan.new_cash_balance, dec!(8450));
    assert_eq!(
        plan.outcome,
        OrderOutcome::ReducePosition {
            new_quantity: dec!(10),
            average_cost: dec!(160),
            realized_gain: dec!(50),
        }
    );
}

#[test]
fn test_full_sell_closes_position() {
    let plan = plan_order(
        OrderSide::Sell,
        "AAPL",
        dec!(15),
        dec!(170),
        dec!(7600),
        Some(&holding(dec!(15), dec!(160))),
    )
    .unwrap();

    assert_eq!(plan.new_cash_balance, dec!(10150));
    assert_eq!(
        plan.outcome,
        OrderOutcome::ClosePosition {
            realized_gain: dec!(150),
        }
    );
}

#[test]
fn test_sell_at_a_loss_reports_negative_gain() {
    let plan = plan_order(
        OrderSide::Sell,
        "AAPL",
        dec!(4),
        dec!(140),
        dec!(0),
        Some(&holding(dec!(10), dec!(160))),
    )
    .unwrap();

    assert_eq!(plan.outcome.realized_gain(), Some(dec!(-80)));
}

#[test]
fn test_plan_rejects_what_validation_rejects() {
    let err = plan_order(
        OrderSide::Buy,
        "AAPL",
        dec!(100),
        dec!(150),
        dec!(10),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, OrderRejection::InsufficientFunds { .. }));
}

// ---------------------------------------------------------------------------
// Weighted-average invariant: for any sequence of buys,
// sum of costs ~= final quantity * final average cost.
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_weighted_average_conserves_total_cost(
        buys in prop::collection::vec((1u32..500, 1u32..10_000), 1..12)
    ) {
        let tolerance = dec!(0.000001);
        let mut position: Option<Holding> = None;
        let mut total_cost = Decimal::ZERO;

        for (qty, cents) in buys {
            let quantity = Decimal::from(qty);
            let unit_price = Decimal::from(cents) / dec!(100);
            // Cash is irrelevant to the invariant; keep it ample.
            let plan = plan_order(
                OrderSide::Buy,
                "AAPL",
                quantity,
                unit_price,
                dec!(1000000000),
                position.as_ref(),
            )
            .unwrap();
            total_cost += plan.total_amount;

            position = Some(match plan.outcome {
                OrderOutcome::NewPosition { quantity, average_cost } => {
                    Holding::new("u1", "AAPL", quantity, average_cost)
                }
                OrderOutcome::AddToPosition { new_quantity, new_average_cost } => {
                    Holding::new("u1", "AAPL", new_quantity, new_average_cost)
                }
                other => panic!("buy produced {:?}", other),
            });
        }

        let final_position = position.unwrap();
        let implied_cost = final_position.quantity * final_position.average_cost;
        prop_assert!((implied_cost - total_cost).abs() <= tolerance);
    }
}
