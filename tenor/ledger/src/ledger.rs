use {
    crate::{LedgerError, LedgerResult, LedgerState},
    tracing::{info, warn},
};

/// Owns a [`LedgerState`] and applies operations to it atomically.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    state: LedgerState,
}

impl Ledger {
    pub fn new(genesis_time: u64) -> Self {
        Self {
            state: LedgerState::new(genesis_time),
        }
    }

    pub fn from_state(state: LedgerState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn into_state(self) -> LedgerState {
        self.state
    }

    pub fn block_time(&self) -> u64 {
        self.state.block_time
    }

    /// Advances the external clock. Time never goes backwards.
    pub fn set_block_time(&mut self, block_time: u64) -> LedgerResult<()> {
        if block_time < self.state.block_time {
            let err = LedgerError::ClockWentBackwards {
                current: self.state.block_time,
                new: block_time,
            };

            warn!(err = err.to_string(), "Failed to set block time");

            return Err(err);
        }

        self.state.block_time = block_time;

        info!(block_time, "Set block time");

        Ok(())
    }

    /// Runs `op` against a copy of the state and keeps the result only if `op`
    /// succeeds. On error the ledger is left exactly as it was.
    pub fn transact<F, T>(&mut self, op: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut LedgerState) -> LedgerResult<T>,
    {
        let mut buffer = self.state.clone();
        let output = op(&mut buffer)?;

        buffer.commit();
        self.state = buffer;

        Ok(output)
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        tenor_math::Int128,
        tenor_types::Addr,
    };

    #[test]
    fn failed_transaction_is_discarded() {
        let mut ledger = Ledger::new(100);
        let before = ledger.state().clone();

        let result: LedgerResult<()> = ledger.transact(|state| {
            state.add_cash(Addr::mock(1), 1, Int128::new(10))?;
            Err(LedgerError::NonPositiveAmount {
                amount: Int128::ZERO,
            })
        });

        assert!(result.is_err());
        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn successful_transaction_is_committed() {
        let mut ledger = Ledger::new(100);

        ledger
            .transact(|state| state.add_cash(Addr::mock(1), 1, Int128::new(10)))
            .unwrap();

        assert_eq!(ledger.state().cash_balance(&Addr::mock(1), 1), Int128::new(10));
        assert!(
            ledger
                .state()
                .account_context(&Addr::mock(1))
                .active_currencies
                .is_set(1)
        );
    }

    #[test]
    fn clock_only_moves_forward() {
        let mut ledger = Ledger::new(100);

        ledger.set_block_time(100).unwrap();
        ledger.set_block_time(200).unwrap();

        assert_eq!(
            ledger.set_block_time(199),
            Err(LedgerError::ClockWentBackwards {
                current: 200,
                new: 199,
            })
        );
        assert_eq!(ledger.block_time(), 200);
    }
}
