//! Ledger service - applies orders to cash and holdings.
//!
//! The mutation sequence is validate -> plan -> persist cash -> persist
//! holding -> append transaction -> update in-memory state. The store calls
//! are independently durable; there is no cross-call transaction. A failed
//! step halts execution and reports exactly which steps completed, so an
//! out-of-band reconciliation pass can correct the ledger. Nothing is
//! rolled back and nothing is retried blindly.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use log::{info, warn};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::ledger_model::{
    plan_order, ExecutionResult, ExecutionStep, OrderOutcome, OrderSide,
};
use crate::constants::DEFAULT_STORE_CALL_TIMEOUT;
use crate::errors::{Error, Result, StoreError};
use crate::holdings::{Holding, HoldingStore};
use crate::profiles::ProfileStore;
use crate::transactions::{Transaction, TransactionStore};

/// In-memory mirror of the persisted account state.
struct AccountState {
    cash_balance: Decimal,
    holdings: HashMap<String, Holding>,
}

/// One user's position ledger.
///
/// Owns the cash balance and holdings set in memory, mirroring the stores.
/// The ledger receives price values from its callers, never a cache handle,
/// so it can be tested against the stores alone.
pub struct LedgerService {
    user_id: String,
    state: RwLock<AccountState>,
    /// Serializes mutation sequences; reads stay lock-free of it.
    exec_gate: Mutex<()>,
    profile_store: Arc<dyn ProfileStore>,
    holding_store: Arc<dyn HoldingStore>,
    transaction_store: Arc<dyn TransactionStore>,
    store_timeout: Duration,
}

impl LedgerService {
    /// Build a ledger from the loaded profile state.
    pub fn new(
        user_id: impl Into<String>,
        cash_balance: Decimal,
        holdings: Vec<Holding>,
        profile_store: Arc<dyn ProfileStore>,
        holding_store: Arc<dyn HoldingStore>,
        transaction_store: Arc<dyn TransactionStore>,
    ) -> Self {
        let holdings = holdings
            .into_iter()
            .map(|h| (h.symbol.clone(), h))
            .collect();
        Self {
            user_id: user_id.into(),
            state: RwLock::new(AccountState {
                cash_balance,
                holdings,
            }),
            exec_gate: Mutex::new(()),
            profile_store,
            holding_store,
            transaction_store,
            store_timeout: DEFAULT_STORE_CALL_TIMEOUT,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn cash_balance(&self) -> Decimal {
        self.read_state().cash_balance
    }

    /// Snapshot of all holdings.
    pub fn holdings(&self) -> Vec<Holding> {
        self.read_state().holdings.values().cloned().collect()
    }

    /// Snapshot of one holding, if present.
    pub fn holding(&self, symbol: &str) -> Option<Holding> {
        self.read_state().holdings.get(symbol).cloned()
    }

    /// Execute a market order at the given unit price.
    ///
    /// Validation is re-run here against the current snapshot regardless of
    /// any earlier confirmation-time check. Effects are persisted in the
    /// canonical order cash -> holding -> transaction; a failure surfaces as
    /// [`Error::ExecutionHalted`] naming the failed step and the completed
    /// steps. On full success the in-memory state is updated exactly once,
    /// atomically with respect to readers.
    pub async fn execute_order(
        &self,
        side: OrderSide,
        symbol: &str,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<ExecutionResult> {
        let _gate = self.exec_gate.lock().await;

        let (cash_balance, old_holding) = {
            let state = self.read_state();
            (state.cash_balance, state.holdings.get(symbol).cloned())
        };

        let plan = plan_order(
            side,
            symbol,
            quantity,
            unit_price,
            cash_balance,
            old_holding.as_ref(),
        )?;

        let mut completed: Vec<ExecutionStep> = Vec::new();

        self.store_call(
            ExecutionStep::CashBalance,
            &completed,
            self.profile_store
                .update_cash_balance(&self.user_id, plan.new_cash_balance),
        )
        .await?;
        completed.push(ExecutionStep::CashBalance);

        let new_holding = match &plan.outcome {
            OrderOutcome::NewPosition {
                quantity,
                average_cost,
            } => Some(Holding::new(&self.user_id, symbol, *quantity, *average_cost)),
            OrderOutcome::AddToPosition {
                new_quantity,
                new_average_cost,
            } => Some(Holding::new(
                &self.user_id,
                symbol,
                *new_quantity,
                *new_average_cost,
            )),
            OrderOutcome::ReducePosition {
                new_quantity,
                average_cost,
                ..
            } => Some(Holding::new(
                &self.user_id,
                symbol,
                *new_quantity,
                *average_cost,
            )),
            OrderOutcome::ClosePosition { .. } => None,
        };

        match &new_holding {
            Some(holding) => {
                self.store_call(
                    ExecutionStep::Holding,
                    &completed,
                    self.holding_store.upsert(holding),
                )
                .await?
            }
            None => {
                self.store_call(
                    ExecutionStep::Holding,
                    &completed,
                    self.holding_store.delete(&self.user_id, symbol),
                )
                .await?
            }
        }
        completed.push(ExecutionStep::Holding);

        let transaction = Transaction::new(
            &self.user_id,
            symbol,
            side,
            quantity,
            unit_price,
            plan.total_amount,
        );
        self.store_call(
            ExecutionStep::Transaction,
            &completed,
            self.transaction_store.append(&transaction),
        )
        .await?;

        // All steps durable; mirror them in memory in one critical section.
        {
            let mut state = self.write_state();
            state.cash_balance = plan.new_cash_balance;
            match &new_holding {
                Some(holding) => {
                    state.holdings.insert(symbol.to_string(), holding.clone());
                }
                None => {
                    state.holdings.remove(symbol);
                }
            }
        }

        info!(
            "Executed {} {} {} @ {} for user {} (cash {})",
            side, quantity, symbol, unit_price, self.user_id, plan.new_cash_balance
        );

        let realized_gain = plan.outcome.realized_gain();
        Ok(ExecutionResult {
            transaction,
            outcome: plan.outcome,
            new_cash_balance: plan.new_cash_balance,
            holding: new_holding,
            realized_gain,
        })
    }

    /// Run one store call under the bounded timeout, mapping any failure to
    /// `ExecutionHalted` with the step bookkeeping reconciliation needs.
    async fn store_call<F>(
        &self,
        step: ExecutionStep,
        completed: &[ExecutionStep],
        call: F,
    ) -> Result<()>
    where
        F: Future<Output = std::result::Result<(), StoreError>>,
    {
        let result = match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(format!(
                "step {} exceeded {:?}",
                step, self.store_timeout
            ))),
        };

        result.map_err(|source| Error::ExecutionHalted {
            step,
            completed: completed.to_vec(),
            source,
        })
    }

    /// Lock the state for reading, recovering from poison. The state holds
    /// plain data and is only replaced after all stores succeeded.
    fn read_state(&self) -> RwLockReadGuard<'_, AccountState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Ledger state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AccountState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Ledger state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
