use {
    crate::ResultExt,
    tenor_audit::{AuditReport, AuditResult, audited, check_system_invariants},
    tenor_ledger::{
        EvtDeposit, EvtInitializeMarkets, EvtMintPerpetual, EvtRedeemPerpetual, EvtTrade,
        EvtWithdraw, Ledger, LedgerResult, LedgerState, Trade,
    },
    tenor_math::Int128,
    tenor_types::{
        Addr, CashGroup, CurrencyId, DepositParameters, InitializationParameters, QUARTER,
    },
};

/// A ledger whose every operation is followed by a full audit. An operation
/// that leaves the ledger inconsistent fails with the violation and is rolled
/// back.
pub struct TestSuite {
    ledger: Ledger,
}

impl TestSuite {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn state(&self) -> &LedgerState {
        self.ledger.state()
    }

    pub fn block_time(&self) -> u64 {
        self.ledger.block_time()
    }

    pub fn advance_time(&mut self, seconds: u64) {
        let block_time = self.block_time() + seconds;
        self.ledger.set_block_time(block_time).should_succeed();
    }

    pub fn advance_quarter(&mut self) {
        self.advance_time(QUARTER);
    }

    /// Panics with the first violation, if any.
    pub fn check_invariants(&self) -> AuditReport {
        check_system_invariants(self.state()).should_succeed()
    }

    pub fn execute<F, T>(&mut self, op: F) -> AuditResult<T>
    where
        F: FnOnce(&mut Ledger) -> LedgerResult<T>,
    {
        audited(&mut self.ledger, op)
    }

    pub fn deposit(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        amount: Int128,
    ) -> AuditResult<EvtDeposit> {
        self.execute(|ledger| ledger.deposit(account, currency_id, amount))
    }

    pub fn withdraw(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        amount: Int128,
    ) -> AuditResult<EvtWithdraw> {
        self.execute(|ledger| ledger.withdraw(account, currency_id, amount))
    }

    pub fn update_cash_group(
        &mut self,
        currency_id: CurrencyId,
        cash_group: CashGroup,
    ) -> AuditResult<()> {
        self.execute(|ledger| ledger.update_cash_group(currency_id, cash_group))
    }

    pub fn update_deposit_parameters(
        &mut self,
        currency_id: CurrencyId,
        params: DepositParameters,
    ) -> AuditResult<()> {
        self.execute(|ledger| ledger.update_deposit_parameters(currency_id, params))
    }

    pub fn update_initialization_parameters(
        &mut self,
        currency_id: CurrencyId,
        params: InitializationParameters,
    ) -> AuditResult<()> {
        self.execute(|ledger| ledger.update_initialization_parameters(currency_id, params))
    }

    pub fn mint_perpetual(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        amount: Int128,
        use_cash_balance: bool,
    ) -> AuditResult<EvtMintPerpetual> {
        self.execute(|ledger| ledger.mint_perpetual(account, currency_id, amount, use_cash_balance))
    }

    pub fn redeem_perpetual(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        tokens: Int128,
    ) -> AuditResult<EvtRedeemPerpetual> {
        self.execute(|ledger| ledger.redeem_perpetual(account, currency_id, tokens))
    }

    pub fn initialize_markets(&mut self, currency_id: CurrencyId) -> AuditResult<EvtInitializeMarkets> {
        self.execute(|ledger| ledger.initialize_markets(currency_id))
    }

    pub fn apply_trade(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        trade: Trade,
    ) -> AuditResult<EvtTrade> {
        self.execute(|ledger| ledger.apply_trade(account, currency_id, trade))
    }
}
