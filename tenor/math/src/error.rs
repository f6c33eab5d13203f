use {std::any::type_name, thiserror::Error};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("failed to parse string `{value}` into {ty}: {reason}")]
    ParseNumber {
        ty: &'static str,
        value: String,
        reason: String,
    },

    #[error("conversion overflow: {source_type}({value}) does not fit in {target_type}")]
    OverflowConversion {
        source_type: &'static str,
        target_type: &'static str,
        value: String,
    },

    #[error("addition overflow: {a} + {b}")]
    OverflowAdd { a: String, b: String },

    #[error("subtraction overflow: {a} - {b}")]
    OverflowSub { a: String, b: String },

    #[error("multiplication overflow: {a} * {b}")]
    OverflowMul { a: String, b: String },

    #[error("negation overflow: -{a}")]
    OverflowNeg { a: String },

    #[error("division by zero: {a} / 0")]
    DivisionByZero { a: String },

    #[error("logarithm of non-positive number: ln({a})")]
    NonPositiveLog { a: String },

    #[error("exponent too large: exp({a})")]
    OverflowExp { a: String },
}

impl MathError {
    pub fn parse_number<A>(value: impl ToString, reason: impl ToString) -> Self {
        Self::ParseNumber {
            ty: type_name::<A>(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn overflow_conversion<A: ToString, B>(source: A) -> Self {
        Self::OverflowConversion {
            source_type: type_name::<A>(),
            target_type: type_name::<B>(),
            value: source.to_string(),
        }
    }

    pub fn overflow_add(a: impl ToString, b: impl ToString) -> Self {
        Self::OverflowAdd {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    pub fn overflow_sub(a: impl ToString, b: impl ToString) -> Self {
        Self::OverflowSub {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    pub fn overflow_mul(a: impl ToString, b: impl ToString) -> Self {
        Self::OverflowMul {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    pub fn overflow_neg(a: impl ToString) -> Self {
        Self::OverflowNeg { a: a.to_string() }
    }

    pub fn division_by_zero(a: impl ToString) -> Self {
        Self::DivisionByZero { a: a.to_string() }
    }

    pub fn non_positive_log(a: impl ToString) -> Self {
        Self::NonPositiveLog { a: a.to_string() }
    }

    pub fn overflow_exp(a: impl ToString) -> Self {
        Self::OverflowExp { a: a.to_string() }
    }
}

pub type MathResult<T> = core::result::Result<T, MathError>;
