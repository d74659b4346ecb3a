//! # Store Settings
//!
//! Shop-level settings edited from the admin screen and persisted as
//! key/value rows in the `settings` table.
//!
//! ```text
//! settings table                 StoreSettings
//! ┌─────────────────────┐        ┌──────────────────────────────┐
//! │ store_name      ... │  ───►  │ store_name: "Mini Market"    │
//! │ currency_symbol  $  │        │ currency_symbol: "$"         │
//! │ low_stock_thr... 5  │        │ low_stock_threshold: 5       │
//! └─────────────────────┘        └──────────────────────────────┘
//! ```
//!
//! Unknown keys are ignored and malformed values fall back to the default,
//! so a hand-edited row can never stop the shop from opening.
//!
//! Edits arrive as a [`SettingsPatch`]: keys left out of the request keep
//! their current value.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{validate_low_stock_threshold, ValidationResult};
use crate::DEFAULT_LOW_STOCK_THRESHOLD;

pub const KEY_STORE_NAME: &str = "store_name";
pub const KEY_CURRENCY_CODE: &str = "currency_code";
pub const KEY_CURRENCY_SYMBOL: &str = "currency_symbol";
pub const KEY_CURRENCY_DECIMALS: &str = "currency_decimals";
pub const KEY_LOW_STOCK_THRESHOLD: &str = "low_stock_threshold";
pub const KEY_RECEIPT_FOOTER: &str = "receipt_footer";

/// Largest number of minor-unit digits a currency can be displayed with.
pub const MAX_CURRENCY_DECIMALS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoreSettings {
    /// Printed at the top of receipts.
    pub store_name: String,

    /// ISO 4217 code.
    pub currency_code: String,

    pub currency_symbol: String,

    pub currency_decimals: u32,

    /// Products at or below this stock show up in the low-stock list.
    pub low_stock_threshold: i64,

    pub receipt_footer: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            store_name: "Mini Market".to_string(),
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            receipt_footer: "Thank you for shopping with us!".to_string(),
        }
    }
}

impl StoreSettings {
    /// Builds settings from `(key, value)` rows on top of the defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut settings = StoreSettings::default();

        for (key, value) in pairs {
            let value: String = value.into();
            match key.as_ref() {
                KEY_STORE_NAME => settings.store_name = value,
                KEY_CURRENCY_CODE => settings.currency_code = value,
                KEY_CURRENCY_SYMBOL => settings.currency_symbol = value,
                KEY_CURRENCY_DECIMALS => {
                    if let Ok(d) = value.trim().parse::<u32>() {
                        if d <= MAX_CURRENCY_DECIMALS {
                            settings.currency_decimals = d;
                        }
                    }
                }
                KEY_LOW_STOCK_THRESHOLD => {
                    if let Ok(t) = value.trim().parse::<i64>() {
                        if validate_low_stock_threshold(t).is_ok() {
                            settings.low_stock_threshold = t;
                        }
                    }
                }
                KEY_RECEIPT_FOOTER => settings.receipt_footer = value,
                _ => {}
            }
        }

        settings
    }

    /// The `(key, value)` rows to persist.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_STORE_NAME, self.store_name.clone()),
            (KEY_CURRENCY_CODE, self.currency_code.clone()),
            (KEY_CURRENCY_SYMBOL, self.currency_symbol.clone()),
            (KEY_CURRENCY_DECIMALS, self.currency_decimals.to_string()),
            (KEY_LOW_STOCK_THRESHOLD, self.low_stock_threshold.to_string()),
            (KEY_RECEIPT_FOOTER, self.receipt_footer.clone()),
        ]
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if self.store_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "storeName".to_string(),
            });
        }

        let code = self.currency_code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidFormat {
                field: "currencyCode".to_string(),
                reason: "must be a 3-letter ISO 4217 code".to_string(),
            });
        }

        if self.currency_decimals > MAX_CURRENCY_DECIMALS {
            return Err(ValidationError::OutOfRange {
                field: "currencyDecimals".to_string(),
                min: 0,
                max: MAX_CURRENCY_DECIMALS as i64,
            });
        }

        validate_low_stock_threshold(self.low_stock_threshold)
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use minimarket_core::settings::StoreSettings;
    ///
    /// let settings = StoreSettings::default();
    /// assert_eq!(settings.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

/// A partial settings edit. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettingsPatch {
    pub store_name: Option<String>,
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    pub currency_decimals: Option<u32>,
    pub low_stock_threshold: Option<i64>,
    pub receipt_footer: Option<String>,
}

impl SettingsPatch {
    /// Overlays the present fields on `base`. The result is not validated.
    pub fn apply_to(self, base: StoreSettings) -> StoreSettings {
        StoreSettings {
            store_name: self.store_name.unwrap_or(base.store_name),
            currency_code: self.currency_code.unwrap_or(base.currency_code),
            currency_symbol: self.currency_symbol.unwrap_or(base.currency_symbol),
            currency_decimals: self.currency_decimals.unwrap_or(base.currency_decimals),
            low_stock_threshold: self.low_stock_threshold.unwrap_or(base.low_stock_threshold),
            receipt_footer: self.receipt_footer.unwrap_or(base.receipt_footer),
        }
    }
}
