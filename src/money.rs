//! Money Conversion Module
//!
//! Unified conversion between the internal integer representation and the
//! client-facing string representation. All conversions MUST go through
//! this module.
//!
//! ## Internal Representation
//! - Posting amounts are `u64`, balances are `i64` (signed, because
//!   concurrent debits may cross zero)
//! - Everything is scaled by `10^WALLET_DECIMALS` minor units
//!
//! ## Usage
//! ```ignore
//! let internal = parse_amount("40")?;
//! assert_eq!(internal, 4_000); // 40.00 in minor units
//!
//! let display = format_amount(4_000);
//! assert_eq!(display, "40.00");
//! ```

use rust_decimal::prelude::*;
use thiserror::Error;

/// Wallet currency scale. Single currency, two decimal places.
pub const WALLET_DECIMALS: u32 = 2;

/// Money conversion errors
#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Convert a client amount string to internal minor units
///
/// # Errors
/// * `PrecisionOverflow` - more decimal places than the wallet carries
/// * `InvalidAmount` - zero or signed input
/// * `Overflow` - result would overflow u64
/// * `InvalidFormat` - anything that is not a plain decimal number
pub fn parse_amount(amount_str: &str) -> Result<u64, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    // Signs are rejected outright; direction comes from the transfer kind
    if amount_str.starts_with('-') || amount_str.starts_with('+') {
        return Err(MoneyError::InvalidAmount);
    }

    let parts: Vec<&str> = amount_str.split('.').collect();
    let (whole, frac) = match parts.len() {
        1 => (parts[0], ""),
        2 => {
            // Strict check: both sides of the dot must be non-empty.
            // This prevents ambiguous formats like ".5" or "5."
            if parts[0].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing leading zero (e.g., use 0.5 instead of .5)".into(),
                ));
            }
            if parts[1].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            (parts[0], parts[1])
        }
        _ => return Err(MoneyError::InvalidFormat("multiple decimal points".into())),
    };

    // No silent truncation of sub-minor-unit digits
    if frac.len() > WALLET_DECIMALS as usize {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: WALLET_DECIMALS,
        });
    }

    let whole_num: u64 = whole.parse::<u64>().map_err(|e| {
        let err_str = e.to_string();
        if err_str.contains("too large") || err_str.contains("overflow") {
            MoneyError::Overflow
        } else {
            MoneyError::InvalidFormat(format!("invalid character in whole part: {}", whole))
        }
    })?;

    let frac_num: u64 = if frac.is_empty() {
        0
    } else {
        // Pad fractional part to the wallet scale
        let frac_padded = format!("{:0<width$}", frac, width = WALLET_DECIMALS as usize);
        frac_padded[..WALLET_DECIMALS as usize]
            .parse::<u64>()
            .map_err(|_| MoneyError::InvalidFormat("invalid fractional part".into()))?
    };

    let multiplier = 10u64.pow(WALLET_DECIMALS);
    let amount = whole_num
        .checked_mul(multiplier)
        .and_then(|v: u64| v.checked_add(frac_num))
        .ok_or(MoneyError::Overflow)?;

    if amount == 0 {
        return Err(MoneyError::InvalidAmount);
    }

    Ok(amount)
}

/// Convert internal minor units to a display string ("4000" -> "40.00")
pub fn format_amount(value: u64) -> String {
    let decimal_value = Decimal::from(value) / Decimal::from(10u64.pow(WALLET_DECIMALS));
    format!("{:.prec$}", decimal_value, prec = WALLET_DECIMALS as usize)
}

/// Convert an internal i64 balance to a display string (may be negative)
pub fn format_amount_signed(value: i64) -> String {
    let abs_value = value.unsigned_abs();
    let formatted = format_amount(abs_value);
    if value < 0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}
