// Quote construction.
//
// Turns a discovered route into a slippage-bounded quote plus the universal
// router calldata needed to execute it. Quotes are transient: built fresh
// per request, never persisted, and unusable after the embedded deadline.

use chrono::Utc;
use ethers::abi::{self, Token as AbiToken};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::keccak256;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::ConnectorError;
use crate::pools::{FeeTier, PoolFamily};
use crate::router::{Route, RoutePool, TradeType};
use crate::tokens::{from_raw_amount, to_raw_amount};

/// Seconds until the built call data expires.
const DEADLINE_SECONDS: i64 = 30 * 60;

/// Significant digits kept when reporting price impact.
const PRICE_IMPACT_SIGNIFICANT_DIGITS: i32 = 6;

// Universal router command bytes.
const CMD_V3_SWAP_EXACT_IN: u8 = 0x00;
const CMD_V3_SWAP_EXACT_OUT: u8 = 0x01;
const CMD_V2_SWAP_EXACT_IN: u8 = 0x08;
const CMD_V2_SWAP_EXACT_OUT: u8 = 0x09;

/// Trade side from the caller's point of view: SELL trades an exact base
/// amount in, BUY acquires an exact base amount out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn trade_type(&self) -> TradeType {
        match self {
            Side::Sell => TradeType::ExactInput,
            Side::Buy => TradeType::ExactOutput,
        }
    }
}

/// A fully built swap quote.
#[derive(Debug, Clone)]
pub struct SwapQuote {
    pub quote_id: String,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    /// Execution price: token_out per token_in.
    pub price: Decimal,
    pub price_impact_pct: f64,
    /// Exact-input bound; equals `amount_out` scaled down by the tolerance.
    pub min_amount_out: Decimal,
    /// Exact-output bound; equals `amount_in` scaled up by the tolerance.
    pub max_amount_in: Decimal,
    pub calldata: Bytes,
    /// Universal router the calldata targets.
    pub to: Address,
    /// Native value to send with the call.
    pub value: U256,
    pub route_path: String,
    /// Unix timestamp embedded in the calldata.
    pub deadline: u64,
    /// Filled in by the gas estimator after construction.
    pub estimated_gas_used: U256,
}

pub struct QuoteBuilder {
    universal_router: Address,
}

impl QuoteBuilder {
    pub fn new(universal_router: Address) -> Self {
        Self { universal_router }
    }

    /// Builds the quote for a discovered route. `slippage_pct` must already
    /// be validated into [0, 100].
    pub fn build(
        &self,
        route: &Route,
        trade_type: TradeType,
        slippage_pct: Decimal,
        recipient: Address,
    ) -> Result<SwapQuote, ConnectorError> {
        let amount_in = from_raw_amount(route.amount_in, route.token_in.decimals)?;
        let amount_out = from_raw_amount(route.amount_out, route.token_out.decimals)?;

        let price = if amount_in.is_zero() {
            Decimal::ZERO
        } else {
            amount_out / amount_in
        };

        let (min_amount_out, max_amount_in) =
            slippage_bounds(amount_in, amount_out, slippage_pct, trade_type);
        let price_impact_pct = price_impact_pct(route.spot_price, amount_in, amount_out);

        let deadline = (Utc::now().timestamp() + DEADLINE_SECONDS) as u64;
        let min_out_raw = to_raw_amount(min_amount_out, route.token_out.decimals)?;
        let max_in_raw = to_raw_amount(max_amount_in, route.token_in.decimals)?;
        let calldata = encode_execute_call(
            route,
            trade_type,
            recipient,
            min_out_raw,
            max_in_raw,
            deadline,
        );

        let route_path = format!("{} -> {}", route.token_in.symbol, route.token_out.symbol);

        Ok(SwapQuote {
            quote_id: Uuid::new_v4().to_string(),
            token_in: route.token_in.address,
            token_out: route.token_out.address,
            amount_in,
            amount_out,
            price,
            price_impact_pct,
            min_amount_out,
            max_amount_in,
            calldata,
            to: self.universal_router,
            value: U256::zero(), // ERC-20 to ERC-20; no native value attached
            route_path,
            deadline,
            estimated_gas_used: U256::zero(),
        })
    }
}

/// Slippage-bounded amounts. The exact-input bound scales the output down,
/// the exact-output bound scales the input up; the untraded side keeps its
/// nominal amount as its own bound.
pub fn slippage_bounds(
    amount_in: Decimal,
    amount_out: Decimal,
    slippage_pct: Decimal,
    trade_type: TradeType,
) -> (Decimal, Decimal) {
    let fraction = slippage_pct / Decimal::from(100u32);
    match trade_type {
        TradeType::ExactInput => {
            let min_out = amount_out * (Decimal::ONE - fraction);
            (min_out, amount_in)
        }
        TradeType::ExactOutput => {
            let max_in = amount_in * (Decimal::ONE + fraction);
            (amount_out, max_in)
        }
    }
}

/// Percentage deviation of the execution price from the pre-trade spot
/// price, rounded to a fixed significant-digit count.
pub fn price_impact_pct(spot_price: f64, amount_in: Decimal, amount_out: Decimal) -> f64 {
    if spot_price <= 0.0 || amount_in.is_zero() {
        return 0.0;
    }
    let execution = to_f64(amount_out) / to_f64(amount_in);
    let impact = ((spot_price - execution) / spot_price * 100.0).abs();
    round_significant(impact, PRICE_IMPACT_SIGNIFICANT_DIGITS)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Rounds to `digits` significant digits.
pub fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return 0.0;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}

/// Encodes the universal router `execute(bytes,bytes[],uint256)` call for
/// the route's family and direction.
fn encode_execute_call(
    route: &Route,
    trade_type: TradeType,
    recipient: Address,
    min_out_raw: U256,
    max_in_raw: U256,
    deadline: u64,
) -> Bytes {
    let payer_is_user = AbiToken::Bool(true);

    let (command, input) = match (&route.pool, trade_type) {
        (RoutePool::Clmm { pool, .. }, TradeType::ExactInput) => {
            let path = clmm_path(route.token_in.address, pool.fee, route.token_out.address);
            let input = abi::encode(&[
                AbiToken::Address(recipient),
                AbiToken::Uint(route.amount_in),
                AbiToken::Uint(min_out_raw),
                AbiToken::Bytes(path),
                payer_is_user,
            ]);
            (CMD_V3_SWAP_EXACT_IN, input)
        }
        (RoutePool::Clmm { pool, .. }, TradeType::ExactOutput) => {
            // exact-output paths are encoded output-first
            let path = clmm_path(route.token_out.address, pool.fee, route.token_in.address);
            let input = abi::encode(&[
                AbiToken::Address(recipient),
                AbiToken::Uint(route.amount_out),
                AbiToken::Uint(max_in_raw),
                AbiToken::Bytes(path),
                payer_is_user,
            ]);
            (CMD_V3_SWAP_EXACT_OUT, input)
        }
        (RoutePool::Amm { .. }, TradeType::ExactInput) => {
            let input = abi::encode(&[
                AbiToken::Address(recipient),
                AbiToken::Uint(route.amount_in),
                AbiToken::Uint(min_out_raw),
                amm_path(route.token_in.address, route.token_out.address),
                payer_is_user,
            ]);
            (CMD_V2_SWAP_EXACT_IN, input)
        }
        (RoutePool::Amm { .. }, TradeType::ExactOutput) => {
            let input = abi::encode(&[
                AbiToken::Address(recipient),
                AbiToken::Uint(route.amount_out),
                AbiToken::Uint(max_in_raw),
                amm_path(route.token_in.address, route.token_out.address),
                payer_is_user,
            ]);
            (CMD_V2_SWAP_EXACT_OUT, input)
        }
    };

    let selector = &keccak256("execute(bytes,bytes[],uint256)")[..4];
    let arguments = abi::encode(&[
        AbiToken::Bytes(vec![command]),
        AbiToken::Array(vec![AbiToken::Bytes(input)]),
        AbiToken::Uint(U256::from(deadline)),
    ]);

    let mut calldata = Vec::with_capacity(4 + arguments.len());
    calldata.extend_from_slice(selector);
    calldata.extend_from_slice(&arguments);
    Bytes::from(calldata)
}

/// V3-style packed path: token (20) ‖ fee pips (3, big-endian) ‖ token (20).
fn clmm_path(first: Address, fee: FeeTier, second: Address) -> Vec<u8> {
    let mut path = Vec::with_capacity(43);
    path.extend_from_slice(first.as_bytes());
    let pips = fee.pips();
    path.extend_from_slice(&[(pips >> 16) as u8, (pips >> 8) as u8, pips as u8]);
    path.extend_from_slice(second.as_bytes());
    path
}

fn amm_path(token_in: Address, token_out: Address) -> AbiToken {
    AbiToken::Array(vec![
        AbiToken::Address(token_in),
        AbiToken::Address(token_out),
    ])
}

/// The command byte a quote was encoded with; used by tests and diagnostics.
pub fn command_byte(family: PoolFamily, trade_type: TradeType) -> u8 {
    match (family, trade_type) {
        (PoolFamily::Clmm, TradeType::ExactInput) => CMD_V3_SWAP_EXACT_IN,
        (PoolFamily::Clmm, TradeType::ExactOutput) => CMD_V3_SWAP_EXACT_OUT,
        (PoolFamily::Amm, TradeType::ExactInput) => CMD_V2_SWAP_EXACT_IN,
        (PoolFamily::Amm, TradeType::ExactOutput) => CMD_V2_SWAP_EXACT_OUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn exact_input_slippage_bound() {
        let (min_out, max_in) =
            slippage_bounds(dec!(10), dec!(1000), dec!(1), TradeType::ExactInput);
        assert_eq!(min_out, dec!(990));
        assert_eq!(max_in, dec!(10));
    }

    #[test]
    fn exact_output_slippage_bound() {
        let (min_out, max_in) =
            slippage_bounds(dec!(500), dec!(20), dec!(2), TradeType::ExactOutput);
        assert_eq!(max_in, dec!(510));
        assert_eq!(min_out, dec!(20));
    }

    #[test]
    fn bounds_never_cross_nominal_amounts() {
        let (min_out, _) = slippage_bounds(dec!(1), dec!(1234.5), dec!(0.5), TradeType::ExactInput);
        assert!(min_out <= dec!(1234.5));
        let (_, max_in) = slippage_bounds(dec!(777), dec!(1), dec!(0.5), TradeType::ExactOutput);
        assert!(max_in >= dec!(777));
    }

    #[test]
    fn price_impact_is_rounded_to_significant_digits() {
        // spot 2.0, execution 1.8 -> 10% impact
        let impact = price_impact_pct(2.0, dec!(100), dec!(180));
        assert!((impact - 10.0).abs() < 1e-9);

        let noisy = round_significant(10.123456789, 6);
        assert!((noisy - 10.1235).abs() < 1e-9);
        assert_eq!(round_significant(0.0, 6), 0.0);
    }

    #[test]
    fn side_maps_to_trade_type() {
        assert_eq!(Side::Sell.trade_type(), TradeType::ExactInput);
        assert_eq!(Side::Buy.trade_type(), TradeType::ExactOutput);
    }

    #[test]
    fn command_bytes_match_router_dispatch() {
        assert_eq!(command_byte(PoolFamily::Clmm, TradeType::ExactInput), 0x00);
        assert_eq!(command_byte(PoolFamily::Clmm, TradeType::ExactOutput), 0x01);
        assert_eq!(command_byte(PoolFamily::Amm, TradeType::ExactInput), 0x08);
        assert_eq!(command_byte(PoolFamily::Amm, TradeType::ExactOutput), 0x09);
    }
}
