// --------------------------------- Constants ---------------------------------

pub const DAY: u64 = 86_400;

/// Markets settle and the ladder rolls forward every 90 days.
pub const QUARTER: u64 = 90 * DAY;

/// Rates are annualized over a 360-day year.
pub const YEAR: u64 = 360 * DAY;

/// Number of canonical maturities a ladder can hold.
pub const MAX_MARKET_INDEX: u8 = 9;

// ------------------------------- Maturity ladder -------------------------------

/// The quarter boundary at or before `time`.
pub const fn time_ref(time: u64) -> u64 {
    time - time % QUARTER
}

/// Distance from the quarter boundary to the maturity of market `index`
/// (1-based): 3 months, 6 months, then 1, 2, 5, 7, 10, 15 and 20 years.
pub const fn market_offset(index: u8) -> Option<u64> {
    match index {
        1 => Some(QUARTER),
        2 => Some(2 * QUARTER),
        3 => Some(YEAR),
        4 => Some(2 * YEAR),
        5 => Some(5 * YEAR),
        6 => Some(7 * YEAR),
        7 => Some(10 * YEAR),
        8 => Some(15 * YEAR),
        9 => Some(20 * YEAR),
        _ => None,
    }
}

/// The ordered maturities of the first `max_market_index` markets of the
/// ladder that is active at `time`.
pub fn maturity_ladder(time: u64, max_market_index: u8) -> Vec<u64> {
    let t_ref = time_ref(time);

    (1..=max_market_index.min(MAX_MARKET_INDEX))
        .filter_map(market_offset)
        .map(|offset| t_ref + offset)
        .collect()
}

/// Which slot of the ladder settled at `settlement_date` holds `maturity`, if
/// any.
pub fn market_index_for(settlement_date: u64, maturity: u64) -> Option<u8> {
    let offset = maturity.checked_sub(settlement_date)?;

    (1..=MAX_MARKET_INDEX).find(|index| market_offset(*index) == Some(offset))
}

/// The quarter boundary of the ladder that created a liquidity token of the
/// given market index at the given maturity.
pub fn settlement_date_for(maturity: u64, market_index: u8) -> Option<u64> {
    maturity.checked_sub(market_offset(market_index)?)
}

// ------------------------------ Quarter iterator -------------------------------

/// Lazy, restartable walk over every quarter boundary from the one a currency
/// was listed in up to and including the one containing `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterBoundaries {
    next: Option<u64>,
    last: u64,
}

impl QuarterBoundaries {
    pub fn new(listing_time: u64, now: u64) -> Self {
        Self {
            next: Some(time_ref(listing_time)),
            last: time_ref(now),
        }
    }
}

impl Iterator for QuarterBoundaries {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|next| *next <= self.last)?;
        self.next = current.checked_add(QUARTER);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(next) if next <= self.last => {
                let remaining = ((self.last - next) / QUARTER + 1) as usize;
                (remaining, Some(remaining))
            },
            _ => (0, Some(0)),
        }
    }
}

// ----------------------------------- tests -----------------------------------
