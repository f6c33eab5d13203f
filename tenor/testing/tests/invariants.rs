use {
    proptest::{collection::vec, prelude::*},
    tenor_audit::{AuditError, AuditResult, collect_violations},
    tenor_ledger::Trade,
    tenor_math::Int128,
    tenor_testing::{
        DAI, INITIAL_CASH_AMOUNT, ResultExt, TestAccounts, TestBuilder, TestSuite, USDC,
        deposit_parameters, initialization_parameters, mock_currency,
    },
    tenor_types::{CurrencyId, QUARTER, time_ref},
};

fn setup_test() -> (TestSuite, TestAccounts) {
    let mut builder = TestBuilder::new()
        .set_tracing_level(None)
        .add_currency(mock_currency(DAI, "DAI", 2))
        .add_currency(mock_currency(USDC, "USDC", 3));

    for name in ["owner", "lender"] {
        builder = builder
            .add_account(name, [
                (DAI, INITIAL_CASH_AMOUNT),
                (USDC, INITIAL_CASH_AMOUNT),
            ])
            .unwrap();
    }

    let (mut suite, accounts) = builder.build().unwrap();

    suite
        .update_deposit_parameters(
            DAI,
            deposit_parameters([40_000_000, 60_000_000], [800_000_000, 800_000_000]),
        )
        .should_succeed();
    suite
        .update_initialization_parameters(
            DAI,
            initialization_parameters([1_010_000_000, 1_021_000_000], [
                500_000_000,
                500_000_000,
            ]),
        )
        .should_succeed();

    suite
        .update_deposit_parameters(
            USDC,
            deposit_parameters([40_000_000, 40_000_000, 20_000_000], [
                800_000_000,
                800_000_000,
                800_000_000,
            ]),
        )
        .should_succeed();
    suite
        .update_initialization_parameters(
            USDC,
            initialization_parameters([1_010_000_000, 1_021_000_000, 1_070_000_000], [
                500_000_000,
                500_000_000,
                500_000_000,
            ]),
        )
        .should_succeed();

    for currency_id in [DAI, USDC] {
        suite
            .mint_perpetual(accounts["owner"], currency_id, INITIAL_CASH_AMOUNT, false)
            .should_succeed();
        suite.initialize_markets(currency_id).should_succeed();
    }

    (suite, accounts)
}

#[derive(Debug, Clone)]
enum Action {
    Mint {
        currency_id: CurrencyId,
        amount: i128,
        use_cash_balance: bool,
    },
    Redeem {
        currency_id: CurrencyId,
        percent: u8,
    },
    Lend {
        currency_id: CurrencyId,
        market_index: u8,
        cash: i128,
    },
    Withdraw {
        currency_id: CurrencyId,
        amount: i128,
    },
    /// Moves the clock forward without leaving the current quarter.
    AdvanceTime {
        seconds: u64,
    },
    /// Moves into the next quarter and rolls every currency's markets.
    RollQuarter,
}

fn currency() -> impl Strategy<Value = CurrencyId> {
    prop_oneof![Just(DAI), Just(USDC)]
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (currency(), 1i128..=10_000, any::<bool>()).prop_map(
            |(currency_id, whole, use_cash_balance)| Action::Mint {
                currency_id,
                amount: whole * 100_000_000,
                use_cash_balance,
            }
        ),
        2 => (currency(), 1u8..=50).prop_map(|(currency_id, percent)| Action::Redeem {
            currency_id,
            percent,
        }),
        3 => (
            prop_oneof![(Just(DAI), 1u8..=2), (Just(USDC), 1u8..=3)],
            1i128..=1_000
        )
            .prop_map(|((currency_id, market_index), whole)| Action::Lend {
                currency_id,
                market_index,
                cash: whole * 100_000_000,
            }),
        2 => (currency(), 1i128..=5_000).prop_map(|(currency_id, whole)| Action::Withdraw {
            currency_id,
            amount: whole * 100_000_000,
        }),
        2 => (0..=QUARTER / 8).prop_map(|seconds| Action::AdvanceTime { seconds }),
        1 => Just(Action::RollQuarter),
    ]
}

/// Runs an action and returns the outcome of every ledger operation it made.
fn perform(
    suite: &mut TestSuite,
    accounts: &TestAccounts,
    action: Action,
) -> Vec<AuditResult<()>> {
    let owner = accounts["owner"];
    let lender = accounts["lender"];

    match action {
        Action::Mint {
            currency_id,
            amount,
            use_cash_balance,
        } => vec![
            suite
                .mint_perpetual(owner, currency_id, Int128::new(amount), use_cash_balance)
                .map(|_| ()),
        ],
        Action::Redeem {
            currency_id,
            percent,
        } => {
            let balance = suite.state().perpetual_token_balance(&owner, currency_id);
            let tokens = Int128::new(balance.into_inner() * percent as i128 / 100);

            vec![suite.redeem_perpetual(owner, currency_id, tokens).map(|_| ())]
        },
        Action::Lend {
            currency_id,
            market_index,
            cash,
        } => vec![
            suite
                .apply_trade(lender, currency_id, Trade {
                    market_index,
                    fcash_to_account: Int128::new(cash + cash / 100),
                    cash_to_account: Int128::new(-cash),
                    implied_rate: Int128::new(50_000_000),
                })
                .map(|_| ()),
        ],
        Action::Withdraw {
            currency_id,
            amount,
        } => vec![
            suite
                .withdraw(owner, currency_id, Int128::new(amount))
                .map(|_| ()),
        ],
        Action::AdvanceTime { seconds } => {
            let now = suite.block_time();
            let quarter_end = time_ref(now) + QUARTER - 1;
            suite.advance_time(seconds.min(quarter_end - now));

            vec![]
        },
        Action::RollQuarter => {
            let now = suite.block_time();
            suite.advance_time(time_ref(now) + QUARTER + 1 - now);

            [DAI, USDC]
                .into_iter()
                .map(|currency_id| suite.initialize_markets(currency_id).map(|_| ()))
                .collect()
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever sequence of operations is attempted, each one either fails
    /// cleanly or leaves the ledger consistent.
    #[test]
    fn operations_preserve_invariants(actions in vec(action(), 1..24)) {
        let (mut suite, accounts) = setup_test();
        let mut attempted = 0;
        let mut committed = 0;

        for action in actions {
            for outcome in perform(&mut suite, &accounts, action.clone()) {
                attempted += 1;

                match outcome {
                    Ok(()) => committed += 1,
                    Err(AuditError::Violation(violation)) => {
                        prop_assert!(false, "{action:?} broke an invariant: {violation}");
                    },
                    Err(AuditError::Ledger(_)) => {},
                }
            }
        }

        // The first operation of any sequence is valid in the freshly
        // initialized ledger, so a run that commits nothing is broken.
        prop_assert!(
            attempted == 0 || committed > 0,
            "none of {attempted} operations committed"
        );
        prop_assert!(collect_violations(suite.state()).is_empty());
    }
}

#[test]
fn audit_counts_what_it_looked_at() {
    let (suite, _) = setup_test();

    let report = suite.check_invariants();

    assert_eq!(report.currencies, 2);
    assert_eq!(report.markets, 5);
    assert_eq!(report.ladders, 2);
}
