use {
    crate::{AuditError, AuditResult, InvariantViolation, Law},
    serde::Serialize,
    std::collections::BTreeMap,
    tenor_ledger::{Ledger, LedgerResult, LedgerState},
    tenor_math::{Int128, Number, checked_sum},
    tenor_types::{
        AccountContext, Addr, AssetKind, CurrencyId, Market, QuarterBoundaries, market_index_for,
    },
    tracing::debug,
};

/// What an audit looked at.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub currencies: usize,
    pub ladders: usize,
    pub markets: usize,
    pub accounts: usize,
}

/// Checks every conservation law against `state`, returning the first
/// violation found.
///
/// The audit is read-only: running it any number of times gives the same
/// result and leaves the state untouched.
pub fn check_system_invariants(state: &LedgerState) -> Result<AuditReport, InvariantViolation> {
    audit(state, &mut Violations::fail_fast())
}

/// Checks every conservation law against `state`, returning every violation
/// found.
pub fn collect_violations(state: &LedgerState) -> Vec<InvariantViolation> {
    let mut violations = Violations::collect_all();
    let _ = audit(state, &mut violations);
    violations.found
}

/// Runs `op` against the ledger and audits the result. If the audit fails the
/// ledger is restored to what it was before `op`.
pub fn audited<F, T>(ledger: &mut Ledger, op: F) -> AuditResult<T>
where
    F: FnOnce(&mut Ledger) -> LedgerResult<T>,
{
    let snapshot = ledger.state().clone();
    let output = op(ledger)?;

    if let Err(violation) = check_system_invariants(ledger.state()) {
        *ledger = Ledger::from_state(snapshot);
        return Err(AuditError::Violation(violation));
    }

    Ok(output)
}

// ---------------------------------- engine -----------------------------------

struct Violations {
    fail_fast: bool,
    found: Vec<InvariantViolation>,
}

impl Violations {
    fn fail_fast() -> Self {
        Self {
            fail_fast: true,
            found: vec![],
        }
    }

    fn collect_all() -> Self {
        Self {
            fail_fast: false,
            found: vec![],
        }
    }

    /// In fail-fast mode the violation is handed back to stop the audit.
    /// Otherwise it is recorded and the audit carries on.
    fn report(&mut self, violation: InvariantViolation) -> Result<(), InvariantViolation> {
        if self.fail_fast {
            return Err(violation);
        }

        self.found.push(violation);

        Ok(())
    }
}

fn audit(state: &LedgerState, violations: &mut Violations) -> Result<AuditReport, InvariantViolation> {
    let mut report = AuditReport {
        accounts: state.accounts().count(),
        ..Default::default()
    };

    for currency in state.currencies() {
        let ladders = QuarterBoundaries::new(currency.listing_time, state.block_time())
            .map(|settlement_date| {
                state
                    .markets_settled_at(currency.id, settlement_date)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let markets = ladders.iter().flatten().copied().collect::<Vec<_>>();

        report.currencies += 1;
        report.ladders += ladders.len();
        report.markets += markets.len();

        check_cash_conservation(state, currency.id, &markets, violations)?;
        check_token_supply(state, currency.id, violations)?;
        check_fcash_net_zero(state, currency.id, &markets, violations)?;
        check_liquidity_accounting(state, currency.id, &markets, violations)?;

        debug!(
            currency_id = currency.id,
            ladders = ladders.len(),
            markets = markets.len(),
            "Audited currency"
        );
    }

    check_context_consistency(state, violations)?;

    Ok(report)
}

fn sum<I>(law: Law, currency_id: CurrencyId, values: I) -> Result<Int128, InvariantViolation>
where
    I: IntoIterator<Item = Int128>,
{
    checked_sum(values).map_err(|err| InvariantViolation::Overflow {
        law,
        currency_id,
        err,
    })
}

/// Adds `value` into `acc`, reporting an overflow as a violation of `law`.
fn accumulate(
    law: Law,
    currency_id: CurrencyId,
    acc: &mut Int128,
    value: Int128,
) -> Result<(), InvariantViolation> {
    *acc = acc
        .checked_add(value)
        .map_err(|err| InvariantViolation::Overflow {
            law,
            currency_id,
            err,
        })?;

    Ok(())
}

// ----------------------------------- laws ------------------------------------

/// Everything in custody is either someone's cash or sits in a market.
fn check_cash_conservation(
    state: &LedgerState,
    currency_id: CurrencyId,
    markets: &[&Market],
    violations: &mut Violations,
) -> Result<(), InvariantViolation> {
    let account_cash = state
        .accounts()
        .map(|(_, account)| account.cash_balance(currency_id));
    let market_cash = markets.iter().map(|market| market.total_cash);

    let accounted = match sum(Law::CashConservation, currency_id, account_cash.chain(market_cash))
    {
        Ok(accounted) => accounted,
        Err(violation) => return violations.report(violation),
    };

    let custodial = state.custodial_balance(currency_id);

    if custodial != accounted {
        violations.report(InvariantViolation::CashNotConserved {
            currency_id,
            custodial,
            accounted,
        })?;
    }

    Ok(())
}

/// Supply equals tokens held, and the perpetual token keeps to its own
/// currency.
fn check_token_supply(
    state: &LedgerState,
    currency_id: CurrencyId,
    violations: &mut Violations,
) -> Result<(), InvariantViolation> {
    let held = state
        .accounts()
        .map(|(_, account)| account.perpetual_token_balance(currency_id));

    let held = match sum(Law::TokenSupply, currency_id, held) {
        Ok(held) => held,
        Err(violation) => return violations.report(violation),
    };

    let total_supply = state
        .perpetual_tokens
        .get(&currency_id)
        .map(|token| token.total_supply)
        .unwrap_or_default();

    if total_supply != held {
        violations.report(InvariantViolation::SupplyMismatch {
            currency_id,
            total_supply,
            held,
        })?;
    }

    let Some(perp) = state.account(&Addr::perpetual_token(currency_id)) else {
        return Ok(());
    };

    for (other_currency_id, balance) in &perp.balances {
        let foreign_cash = *other_currency_id != currency_id && !balance.cash_balance.is_zero();

        if foreign_cash || !balance.perpetual_token_balance.is_zero() {
            violations.report(InvariantViolation::ForeignBalance {
                currency_id,
                other_currency_id: *other_currency_id,
                cash_balance: balance.cash_balance,
                perpetual_token_balance: balance.perpetual_token_balance,
            })?;
        }
    }

    for key in perp.portfolio.keys() {
        if key.currency_id != currency_id {
            violations.report(InvariantViolation::ForeignAsset {
                currency_id,
                asset_currency_id: key.currency_id,
                maturity: key.maturity,
            })?;
        }
    }

    Ok(())
}

/// Every unit of fCash owed is owned by someone, and markets are never short.
fn check_fcash_net_zero(
    state: &LedgerState,
    currency_id: CurrencyId,
    markets: &[&Market],
    violations: &mut Violations,
) -> Result<(), InvariantViolation> {
    let mut net = BTreeMap::<u64, Int128>::new();

    for (_, account) in state.accounts() {
        for (key, notional) in account.portfolio.iter() {
            if key.currency_id != currency_id || !key.kind.is_fcash() {
                continue;
            }

            let acc = net.entry(key.maturity).or_default();
            if let Err(violation) = accumulate(Law::FCashNetZero, currency_id, acc, *notional) {
                return violations.report(violation);
            }
        }
    }

    for market in markets {
        if market.total_fcash.is_negative() {
            violations.report(InvariantViolation::NegativeMarketFCash {
                currency_id,
                maturity: market.maturity,
                settlement_date: market.settlement_date,
                total_fcash: market.total_fcash,
            })?;
        }

        let acc = net.entry(market.maturity).or_default();
        if let Err(violation) = accumulate(Law::FCashNetZero, currency_id, acc, market.total_fcash) {
            return violations.report(violation);
        }
    }

    for (maturity, net) in net {
        if !net.is_zero() {
            violations.report(InvariantViolation::FCashNotNetZero {
                currency_id,
                maturity,
                net,
            })?;
        }
    }

    Ok(())
}

/// Liquidity tokens held match each market's supply exactly, and no token
/// outlives its market.
fn check_liquidity_accounting(
    state: &LedgerState,
    currency_id: CurrencyId,
    markets: &[&Market],
    violations: &mut Violations,
) -> Result<(), InvariantViolation> {
    let mut held = BTreeMap::<(u64, u8), Int128>::new();

    for (_, account) in state.accounts() {
        for (key, notional) in account.portfolio.iter() {
            let AssetKind::LiquidityToken { market_index } = key.kind else {
                continue;
            };

            if key.currency_id != currency_id {
                continue;
            }

            let acc = held.entry((key.maturity, market_index)).or_default();
            if let Err(violation) =
                accumulate(Law::LiquidityAccounting, currency_id, acc, *notional)
            {
                return violations.report(violation);
            }
        }
    }

    for market in markets {
        let market_index = market_index_for(market.settlement_date, market.maturity).unwrap_or(0);
        let supply = market.total_liquidity;
        let holdings = held.remove(&(market.maturity, market_index));

        if supply.is_negative() {
            violations.report(InvariantViolation::NegativeLiquiditySupply {
                currency_id,
                maturity: market.maturity,
                market_index,
                supply,
            })?;
            continue;
        }

        // A zero supply must have no holder at all, not merely holders that
        // net to zero.
        let mismatch = match holdings {
            Some(holdings) => supply.is_zero() || holdings != supply,
            None => !supply.is_zero(),
        };

        if mismatch {
            violations.report(InvariantViolation::LiquidityMismatch {
                currency_id,
                maturity: market.maturity,
                market_index,
                supply,
                held: holdings.unwrap_or_default(),
            })?;
        }
    }

    for ((maturity, market_index), held) in held {
        violations.report(InvariantViolation::OrphanLiquidityToken {
            currency_id,
            maturity,
            market_index,
            held,
        })?;
    }

    Ok(())
}

/// The cached context of every account is what its balances and portfolio
/// say it should be.
fn check_context_consistency(
    state: &LedgerState,
    violations: &mut Violations,
) -> Result<(), InvariantViolation> {
    for (address, account) in state.accounts() {
        let computed = AccountContext::compute(account);

        if computed != account.context {
            violations.report(InvariantViolation::StaleAccountContext {
                account: *address,
                cached: account.context.clone(),
                computed,
            })?;
        }
    }

    Ok(())
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        tenor_types::{
            AssetKey, CashGroup, CurrencyConfig, DepositParameters, InitializationParameters,
            QUARTER,
        },
        test_case::test_case,
    };

    const DAI: CurrencyId = 2;
    const USDC: CurrencyId = 3;

    fn currency_config(currency_id: CurrencyId) -> CurrencyConfig {
        CurrencyConfig {
            currency_id,
            symbol: format!("TOKEN{currency_id}"),
            decimals: 8,
            cash_group: CashGroup {
                max_market_index: 2,
                rate_oracle_time_window: 1200,
                rate_scalars: vec![Int128::new(100); 2],
                liquidity_token_haircuts: vec![99, 98],
            },
            deposit: Some(DepositParameters {
                deposit_shares: vec![Int128::new(40_000_000), Int128::new(60_000_000)],
                leverage_thresholds: vec![Int128::new(800_000_000); 2],
            }),
            initialization: Some(InitializationParameters {
                rate_anchors: vec![Int128::new(1_020_000_000); 2],
                proportions: vec![Int128::new(500_000_000); 2],
            }),
        }
    }

    /// Two currencies, DAI with initialized markets and USDC with a deposit.
    fn mock_ledger() -> Ledger {
        let mut ledger = Ledger::new(QUARTER + 1);
        ledger.list_currency(currency_config(DAI)).unwrap();
        ledger.list_currency(currency_config(USDC)).unwrap();
        ledger
            .mint_perpetual(Addr::mock(1), DAI, Int128::new(100_000_00000000), false)
            .unwrap();
        ledger.initialize_markets(DAI).unwrap();
        ledger
            .deposit(Addr::mock(2), USDC, Int128::new(500_00000000))
            .unwrap();
        ledger
    }

    fn perp_maturity(state: &LedgerState) -> u64 {
        state.active_markets(DAI)[0].maturity
    }

    #[test]
    fn consistent_state_passes() {
        let ledger = mock_ledger();

        let report = check_system_invariants(ledger.state()).unwrap();
        assert_eq!(report, AuditReport {
            currencies: 2,
            ladders: 2,
            markets: 2,
            accounts: 3,
        });
        assert!(collect_violations(ledger.state()).is_empty());
    }

    #[test]
    fn audit_is_repeatable_and_read_only() {
        let ledger = mock_ledger();
        let before = ledger.state().clone();

        let first = check_system_invariants(ledger.state());
        let second = check_system_invariants(ledger.state());

        assert_eq!(first, second);
        assert_eq!(ledger.state(), &before);
    }

    #[test_case(Law::CashConservation ; "cash conservation")]
    #[test_case(Law::TokenSupply ; "token supply")]
    #[test_case(Law::FCashNetZero ; "fcash net zero")]
    #[test_case(Law::LiquidityAccounting ; "liquidity accounting")]
    #[test_case(Law::ContextConsistency ; "context consistency")]
    fn corruption_is_caught(law: Law) {
        let mut state = mock_ledger().into_state();
        let maturity = perp_maturity(&state);
        let perp = Addr::perpetual_token(DAI);

        match law {
            Law::CashConservation => {
                state.custody.insert(DAI, Int128::new(1));
            },
            Law::TokenSupply => {
                state.perpetual_tokens.get_mut(&DAI).unwrap().total_supply = Int128::new(1);
            },
            Law::FCashNetZero => {
                let account = state.accounts.get_mut(&perp).unwrap();
                account
                    .portfolio
                    .add(AssetKey::fcash(DAI, maturity), Int128::new(-1))
                    .unwrap();
            },
            Law::LiquidityAccounting => {
                let account = state.accounts.get_mut(&perp).unwrap();
                account
                    .portfolio
                    .add(AssetKey::liquidity_token(DAI, maturity, 1), Int128::new(1))
                    .unwrap();
            },
            Law::ContextConsistency => {
                state.accounts.get_mut(&perp).unwrap().context.has_debt = false;
            },
        }

        let violation = check_system_invariants(&state).unwrap_err();
        assert_eq!(violation.law(), law);
    }

    #[test]
    fn perpetual_token_may_not_hold_foreign_cash() {
        let mut state = mock_ledger().into_state();
        let perp = Addr::perpetual_token(DAI);

        // Keep cash conserved so only the supply law is broken.
        state
            .accounts
            .get_mut(&perp)
            .unwrap()
            .balance_mut(USDC)
            .cash_balance = Int128::new(7);
        state.accounts.get_mut(&Addr::mock(2)).unwrap().balance_mut(USDC).cash_balance =
            Int128::new(500_00000000 - 7);
        for (_, account) in state.accounts.iter_mut() {
            account.context = AccountContext::compute(account);
        }

        assert_eq!(collect_violations(&state), vec![InvariantViolation::ForeignBalance {
            currency_id: DAI,
            other_currency_id: USDC,
            cash_balance: Int128::new(7),
            perpetual_token_balance: Int128::ZERO,
        }]);
    }

    #[test]
    fn orphan_and_negative_liquidity_are_fatal() {
        let mut state = mock_ledger().into_state();
        let perp = Addr::perpetual_token(DAI);

        // A token for a slot that was never initialized.
        let orphan_maturity = 10 * QUARTER;
        state
            .accounts
            .get_mut(&perp)
            .unwrap()
            .portfolio
            .add(AssetKey::liquidity_token(DAI, orphan_maturity, 2), Int128::new(5))
            .unwrap();

        let market_key = state.active_markets(DAI)[1].key();
        state.markets.get_mut(&market_key).unwrap().total_liquidity = Int128::new(-1);

        let violations = collect_violations(&state);

        assert!(violations.iter().any(|violation| matches!(
            violation,
            InvariantViolation::OrphanLiquidityToken {
                maturity,
                market_index: 2,
                ..
            } if *maturity == orphan_maturity
        )));
        assert!(violations.iter().any(|violation| matches!(
            violation,
            InvariantViolation::NegativeLiquiditySupply { market_index: 2, .. }
        )));
    }

    #[test]
    fn negative_market_fcash_is_caught() {
        let mut state = mock_ledger().into_state();
        let market_key = state.active_markets(DAI)[0].key();
        state.markets.get_mut(&market_key).unwrap().total_fcash = Int128::new(-1);

        assert!(collect_violations(&state).iter().any(|violation| matches!(
            violation,
            InvariantViolation::NegativeMarketFCash { .. }
        )));
    }

    #[test]
    fn failed_audit_restores_ledger() {
        let mut ledger = mock_ledger();
        let before = ledger.state().clone();

        // Depositing is sound, so the audit passes.
        audited(&mut ledger, |ledger| {
            ledger.deposit(Addr::mock(3), DAI, Int128::new(10))
        })
        .unwrap();

        let after_deposit = ledger.state().clone();
        assert_ne!(after_deposit, before);

        // An operation that leaves the books inconsistent is rolled back.
        let result = audited(&mut ledger, |ledger| {
            let mut state = ledger.state().clone();
            state.custody.insert(DAI, Int128::ZERO);
            *ledger = Ledger::from_state(state);
            Ok(())
        });

        assert!(matches!(result, Err(AuditError::Violation(_))));
        assert_eq!(ledger.state(), &after_deposit);
    }
}
