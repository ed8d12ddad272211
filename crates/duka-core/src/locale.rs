//! # Currency Formatting
//!
//! Symbols and display formatting for the currencies Duka shops trade in.
//!
//! Formatting is for rendering only. Stored and aggregated amounts are never
//! rounded; [`Currency::format`] rounds a copy at the last moment.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, DISPLAY_DECIMALS};

/// A display currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    /// ISO 4217 code, upper case.
    pub code: String,
    pub symbol: String,
    /// Decimal places shown.
    pub decimals: u32,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::from_code("KES")
    }
}

impl Currency {
    /// Looks up a currency by code. Unknown codes display as the code itself.
    ///
    /// ## Example
    /// ```rust
    /// use duka_core::locale::Currency;
    ///
    /// assert_eq!(Currency::from_code("kes").symbol, "KSh");
    /// assert_eq!(Currency::from_code("CHF").symbol, "CHF");
    /// ```
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        let (symbol, decimals) = match code.as_str() {
            "KES" => ("KSh", DISPLAY_DECIMALS),
            "USD" => ("$", DISPLAY_DECIMALS),
            "EUR" => ("€", DISPLAY_DECIMALS),
            "GBP" => ("£", DISPLAY_DECIMALS),
            "UGX" => ("USh", 0),
            "TZS" => ("TSh", DISPLAY_DECIMALS),
            "NGN" => ("₦", DISPLAY_DECIMALS),
            other => (other, DISPLAY_DECIMALS),
        };

        Currency {
            symbol: symbol.to_string(),
            code,
            decimals,
        }
    }

    /// Formats an amount with symbol and thousands separators.
    ///
    /// ## Example
    /// ```rust
    /// use duka_core::locale::Currency;
    /// use duka_core::money::Money;
    ///
    /// let kes = Currency::from_code("KES");
    /// assert_eq!(kes.format(Money::from(1234) + "0.5".parse().unwrap()), "KSh 1,234.50");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let number = format_number(amount, self.decimals);
        let (sign, digits) = match number.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", number.as_str()),
        };

        // Letter symbols read better with a space: "KSh 10.00" but "$10.00".
        let gap = if self.symbol.chars().all(char::is_alphabetic) {
            " "
        } else {
            ""
        };

        format!("{}{}{}{}", sign, self.symbol, gap, digits)
    }
}

/// Rounds for display and groups thousands: `1234567.891` → `1,234,567.89`.
pub fn format_number(amount: Money, decimals: u32) -> String {
    let mut rounded = amount.round_for_display(decimals).amount();
    rounded.rescale(decimals);

    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + text.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbols() {
        assert_eq!(Currency::from_code("USD").symbol, "$");
        assert_eq!(Currency::from_code("ngn").symbol, "₦");
        assert_eq!(Currency::default().code, "KES");
    }

    #[test]
    fn test_format_groups_thousands() {
        let kes = Currency::from_code("KES");
        assert_eq!(kes.format(Money::new(dec!(1234567.891))), "KSh 1,234,567.89");
        assert_eq!(kes.format(Money::from(999)), "KSh 999.00");
        assert_eq!(kes.format(Money::zero()), "KSh 0.00");
    }

    #[test]
    fn test_format_symbol_without_gap() {
        let usd = Currency::from_code("USD");
        assert_eq!(usd.format(Money::new(dec!(1000.5))), "$1,000.50");
        assert_eq!(usd.format(Money::from(-20)), "-$20.00");
    }

    #[test]
    fn test_format_zero_decimal_currency() {
        let ugx = Currency::from_code("UGX");
        assert_eq!(ugx.format(Money::new(dec!(15000.4))), "USh 15,000");
    }

    #[test]
    fn test_format_uses_bankers_rounding() {
        assert_eq!(format_number(Money::new(dec!(2.345)), 2), "2.34");
        assert_eq!(format_number(Money::new(dec!(2.355)), 2), "2.36");
    }
}
