//! Ledger module - order validation, planning, execution, and valuation.

mod ledger_model;
mod ledger_service;
pub mod valuation;

#[cfg(test)]
mod ledger_model_tests;


// Re-export the public interface
pub use ledger_model::{
    plan_order, validate_order, ExecutionResult, ExecutionStep, OrderOutcome, OrderPlan,
    OrderRejection, OrderSide,
};
pub use ledger_service::LedgerService;
pub use valuation::{
    market_value, portfolio_totals, position_view, price_for, total_account_value,
    unrealized_gain, unrealized_gain_percent, PortfolioTotals, PositionView,
};
