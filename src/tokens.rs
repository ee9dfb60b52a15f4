// Token model and amount conversions.
//
// Tokens are immutable once constructed and compared by (chain_id, address)
// only; symbol and name are display metadata. Human-unit amounts cross the
// API boundary as `Decimal` and are converted to smallest-unit integers
// before any pool math runs.

use std::collections::HashMap;
use std::str::FromStr;

use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ConnectorError;
use crate::settings::TokenSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: u64,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

impl Eq for Token {}

/// How a caller referred to a token. Requests may carry a symbol, a raw
/// address string, or an already-resolved token; resolution happens once at
/// the boundary, before route discovery.
#[derive(Debug, Clone)]
pub enum TokenRef {
    Symbol(String),
    Address(String),
    Resolved(Token),
}

impl TokenRef {
    /// The caller-supplied spelling, for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenRef::Symbol(s) => s.clone(),
            TokenRef::Address(a) => a.clone(),
            TokenRef::Resolved(t) => t.symbol.clone(),
        }
    }
}

impl From<&str> for TokenRef {
    /// Classifies a raw request string: well-formed hex addresses resolve by
    /// address, everything else by symbol.
    fn from(raw: &str) -> Self {
        if raw.len() == 42 && raw.starts_with("0x") && Address::from_str(raw).is_ok() {
            TokenRef::Address(raw.to_string())
        } else {
            TokenRef::Symbol(raw.to_string())
        }
    }
}

/// Per-network token list with symbol and address lookups.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    by_symbol: HashMap<String, Token>,
    by_address: HashMap<Address, Token>,
}

impl TokenRegistry {
    pub fn from_settings(chain_id: u64, tokens: &[TokenSettings]) -> Result<Self, ConnectorError> {
        let mut registry = Self::default();
        for entry in tokens {
            let address =
                Address::from_str(&entry.address).map_err(|_| ConnectorError::InvalidToken {
                    token: entry.address.clone(),
                })?;
            registry.insert(Token {
                chain_id,
                address,
                decimals: entry.decimals,
                symbol: entry.symbol.clone(),
                name: entry.name.clone(),
            });
        }
        Ok(registry)
    }

    pub fn insert(&mut self, token: Token) {
        self.by_symbol
            .insert(token.symbol.to_uppercase(), token.clone());
        self.by_address.insert(token.address, token);
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.by_symbol.get(&symbol.to_uppercase())
    }

    pub fn by_address(&self, address: Address) -> Option<&Token> {
        self.by_address.get(&address)
    }

    /// Resolves a token reference, falling back from symbol to address lookup
    /// the way the request schemas allow either spelling.
    pub fn resolve(&self, reference: &TokenRef) -> Result<Token, ConnectorError> {
        match reference {
            TokenRef::Resolved(token) => Ok(token.clone()),
            TokenRef::Symbol(symbol) => {
                self.by_symbol(symbol)
                    .cloned()
                    .ok_or_else(|| ConnectorError::InvalidToken {
                        token: symbol.clone(),
                    })
            }
            TokenRef::Address(raw) => {
                let address =
                    Address::from_str(raw).map_err(|_| ConnectorError::InvalidToken {
                        token: raw.clone(),
                    })?;
                self.by_address(address)
                    .cloned()
                    .ok_or_else(|| ConnectorError::InvalidToken { token: raw.clone() })
            }
        }
    }
}

/// Converts a human-unit amount to smallest units, truncating precision
/// beyond the token's decimals (matching a fixed-decimal `toFixed` cut).
pub fn to_raw_amount(amount: Decimal, decimals: u8) -> Result<U256, ConnectorError> {
    if amount.is_sign_negative() {
        return Err(ConnectorError::InvalidToken {
            token: format!("negative amount {amount}"),
        });
    }
    // integer and fractional parts are scaled separately through U256:
    // rescaling the whole amount can overflow the 96-bit Decimal mantissa,
    // which rescale() resolves by silently capping the scale
    let truncated = amount.trunc_with_scale(decimals as u32);
    let integral = truncated.trunc();
    let mut fractional = truncated - integral;
    fractional.rescale(decimals as u32);

    let whole =
        U256::from_dec_str(&integral.to_string()).map_err(|_| ConnectorError::InvalidToken {
            token: format!("amount {amount} is not a valid integer quantity"),
        })?;
    whole
        .checked_mul(U256::exp10(decimals as usize))
        .and_then(|raw| raw.checked_add(U256::from(fractional.mantissa() as u128)))
        .ok_or_else(|| ConnectorError::InvalidToken {
            token: format!("amount {amount} overflows the raw range"),
        })
}

/// Converts a smallest-unit integer back to human units. Values too large for
/// a `Decimal` mantissa are reported as an invalid-token condition rather
/// than silently truncated.
pub fn from_raw_amount(value: U256, decimals: u8) -> Result<Decimal, ConnectorError> {
    let as_decimal =
        Decimal::from_str(&value.to_string()).map_err(|_| ConnectorError::InvalidToken {
            token: format!("amount {value} overflows decimal range"),
        })?;
    let divisor = Decimal::from(10u128.pow(decimals as u32));
    Ok(as_decimal / divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn token(address: &str, symbol: &str, decimals: u8) -> Token {
        Token {
            chain_id: 8453,
            address: address.parse().unwrap(),
            decimals,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
        }
    }

    #[test]
    fn equality_ignores_metadata() {
        let mut a = token("0x4200000000000000000000000000000000000006", "WETH", 18);
        let b = token("0x4200000000000000000000000000000000000006", "wrapped-eth", 6);
        assert_eq!(a, b);
        a.chain_id = 1;
        assert_ne!(a, b);
    }

    #[test]
    fn registry_resolves_symbol_and_address() {
        let mut registry = TokenRegistry::default();
        registry.insert(token(
            "0x940181a94A35A4569E4529A3CDfB74e38FD98631",
            "AERO",
            18,
        ));

        let by_symbol = registry.resolve(&TokenRef::Symbol("aero".into())).unwrap();
        assert_eq!(by_symbol.symbol, "AERO");

        let by_address = registry
            .resolve(&TokenRef::Address(
                "0x940181a94A35A4569E4529A3CDfB74e38FD98631".into(),
            ))
            .unwrap();
        assert_eq!(by_symbol, by_address);

        let missing = registry.resolve(&TokenRef::Symbol("WETH".into()));
        assert!(matches!(
            missing,
            Err(ConnectorError::InvalidToken { token }) if token == "WETH"
        ));
    }

    #[test]
    fn token_ref_classifies_raw_strings() {
        assert!(matches!(
            TokenRef::from("0x4200000000000000000000000000000000000006"),
            TokenRef::Address(_)
        ));
        assert!(matches!(TokenRef::from("WETH"), TokenRef::Symbol(_)));
        // hex-ish but wrong length stays a symbol
        assert!(matches!(TokenRef::from("0x1234"), TokenRef::Symbol(_)));
    }

    #[test]
    fn raw_amount_round_trip() {
        let raw = to_raw_amount(dec!(1.5), 18).unwrap();
        assert_eq!(raw, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(from_raw_amount(raw, 18).unwrap(), dec!(1.5));

        // precision beyond the token decimals is truncated, not rounded
        let raw = to_raw_amount(dec!(0.1234567), 6).unwrap();
        assert_eq!(raw, U256::from(123_456u64));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(to_raw_amount(dec!(-1), 18).is_err());
    }

    #[test]
    fn large_amounts_keep_full_raw_scale() {
        // 1e11 tokens at 18 decimals is 1e29 raw units, past the Decimal
        // mantissa range for a single rescale
        let raw = to_raw_amount(dec!(100_000_000_000), 18).unwrap();
        assert_eq!(raw, U256::exp10(29));

        let raw = to_raw_amount(dec!(100_000_000_000.5), 18).unwrap();
        let expected = U256::exp10(29) + U256::exp10(17) * U256::from(5u64);
        assert_eq!(raw, expected);
    }
}
