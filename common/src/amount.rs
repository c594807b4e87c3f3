use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Micro-tokens per whole token. Amounts are stored with six decimals.
pub const MICROS_PER_TOKEN: u64 = 1_000_000;

/// Largest amount a single tip may move.
pub const MAX_TIP: TokenAmount = TokenAmount(1_000_000 * MICROS_PER_TOKEN);

/// A non-negative token quantity, stored as micro-tokens.
///
/// On the wire an amount is a JSON number of whole tokens (`10`, `0.5`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(u64);

/// Reasons an amount could not be accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountError {
    NotANumber,
    NotFinite,
    NotPositive,
    BelowMinimum,
    AboveMaximum { max: TokenAmount },
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => write!(f, "amount must be a number"),
            Self::NotFinite => write!(f, "amount must be a finite number"),
            Self::NotPositive => write!(f, "amount must be greater than zero"),
            Self::BelowMinimum => write!(f, "amount is below the smallest unit (0.000001)"),
            Self::AboveMaximum { max } => write!(f, "amount exceeds the maximum of {max}"),
        }
    }
}

impl std::error::Error for AmountError {}

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn from_whole(tokens: u64) -> Self {
        Self(tokens.saturating_mul(MICROS_PER_TOKEN))
    }

    pub const fn micros(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Amount in whole tokens, for display and the wire format.
    pub fn as_tokens(self) -> f64 {
        self.0 as f64 / MICROS_PER_TOKEN as f64
    }

    /// Convert a whole-token float, rounding to the nearest micro-token.
    /// Zero is allowed here; negative and non-finite values are not.
    pub fn from_tokens(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        if value < 0.0 {
            return Err(AmountError::NotPositive);
        }
        let micros = (value * MICROS_PER_TOKEN as f64).round();
        if micros >= u64::MAX as f64 {
            return Err(AmountError::AboveMaximum {
                max: TokenAmount(u64::MAX),
            });
        }
        Ok(Self(micros as u64))
    }

    /// Parse the `amount` field of a tip request.
    ///
    /// Only JSON numbers are accepted; strings such as `"10"` are rejected
    /// so that nothing downstream ever coerces user input.
    pub fn parse_tip(value: &serde_json::Value) -> Result<Self, AmountError> {
        let raw = match value {
            serde_json::Value::Number(n) => n.as_f64().ok_or(AmountError::NotFinite)?,
            _ => return Err(AmountError::NotANumber),
        };
        if !raw.is_finite() {
            return Err(AmountError::NotFinite);
        }
        if raw <= 0.0 {
            return Err(AmountError::NotPositive);
        }
        let amount = Self::from_tokens(raw)?;
        if amount.is_zero() {
            return Err(AmountError::BelowMinimum);
        }
        if amount > MAX_TIP {
            return Err(AmountError::AboveMaximum { max: MAX_TIP });
        }
        Ok(amount)
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }

    pub fn saturating_add(self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_sub(other.0))
    }
}

impl std::iter::Sum for TokenAmount {
    fn sum<I: Iterator<Item = TokenAmount>>(iter: I) -> Self {
        iter.fold(TokenAmount::ZERO, TokenAmount::saturating_add)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / MICROS_PER_TOKEN;
        let frac = self.0 % MICROS_PER_TOKEN;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:06}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_tokens())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        TokenAmount::from_tokens(value).map_err(serde::de::Error::custom)
    }
}
