// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Display amount <-> base unit conversion.
//!
//! Everything sent to the ledger is an integer count of base units. Everything
//! kept in the registry or shown to a user is `base_units / 10^decimals`.
//! Both directions always take the token's own decimals.

/// Largest precision accepted when creating a token.
pub const MAX_DECIMALS: u8 = 9;

/// Default precision for newly created tokens.
pub const DEFAULT_DECIMALS: u8 = 9;

/// Lamports per native coin.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Errors produced when turning a display amount into base units.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AmountError {
    #[error("amount must be a finite number")]
    NotFinite,

    #[error("amount must be greater than zero (got {0})")]
    NonPositive(f64),

    #[error("amount {amount} has more than {decimals} fractional digits")]
    ExcessPrecision { amount: f64, decimals: u8 },

    #[error("amount {0} does not fit in base units")]
    Overflow(f64),

    #[error("decimals {0} out of range")]
    DecimalsOutOfRange(u8),
}

/// Convert a display amount into base units using `decimals`.
///
/// The conversion works on the shortest round-trip decimal text of `amount`,
/// so `0.3` with 9 decimals is exactly `300_000_000` and never
/// `299_999_999`. Digits beyond `decimals` are rejected rather than dropped.
pub fn to_base_units(amount: f64, decimals: u8) -> Result<u64, AmountError> {
    if !amount.is_finite() {
        return Err(AmountError::NotFinite);
    }
    if amount <= 0.0 {
        return Err(AmountError::NonPositive(amount));
    }

    let scale = 10u64
        .checked_pow(u32::from(decimals))
        .ok_or(AmountError::DecimalsOutOfRange(decimals))?;

    // f64 Display never uses exponent notation.
    let text = amount.to_string();
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));

    if frac.len() > decimals as usize {
        return Err(AmountError::ExcessPrecision { amount, decimals });
    }

    let whole: u64 = whole.parse().map_err(|_| AmountError::Overflow(amount))?;
    let frac_units: u64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<width$}", width = decimals as usize)
            .parse()
            .map_err(|_| AmountError::Overflow(amount))?
    };

    whole
        .checked_mul(scale)
        .and_then(|units| units.checked_add(frac_units))
        .ok_or(AmountError::Overflow(amount))
}

/// Convert base units into a display amount using `decimals`.
pub fn from_base_units(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(i32::from(decimals))
}

/// Format a base-unit amount for logs and API responses.
///
/// Shows at most 6 fractional digits, trailing zeros trimmed.
pub fn format_amount(raw: u64, decimals: u8) -> String {
    if raw == 0 {
        return "0".to_string();
    }

    let divisor = 10u128.pow(u32::from(decimals));
    let raw = u128::from(raw);
    let whole = raw / divisor;
    let remainder = raw % divisor;

    if remainder == 0 {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, &trimmed[..trimmed.len().min(6)])
        }
    }
}
