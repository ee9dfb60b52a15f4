// src/pools.rs

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::tokens::Token;

/// Protocol family a route was discovered in. Never mixed within one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolFamily {
    Clmm,
    Amm,
}

impl PoolFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolFamily::Clmm => "clmm",
            PoolFamily::Amm => "amm",
        }
    }
}

/// Slipstream fee tiers, in pips (parts per million of traded amount).
///
/// `ALL` is the fixed discovery order: lowest fee first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeTier {
    Lowest,
    Low,
    Medium,
    High,
}

impl FeeTier {
    pub const ALL: [FeeTier; 4] = [FeeTier::Lowest, FeeTier::Low, FeeTier::Medium, FeeTier::High];

    pub fn pips(&self) -> u32 {
        match self {
            FeeTier::Lowest => 100,
            FeeTier::Low => 500,
            FeeTier::Medium => 3_000,
            FeeTier::High => 10_000,
        }
    }

    pub fn tick_spacing(&self) -> i32 {
        match self {
            FeeTier::Lowest => 1,
            FeeTier::Low => 10,
            FeeTier::Medium => 60,
            FeeTier::High => 200,
        }
    }

    pub fn from_pips(pips: u32) -> Option<FeeTier> {
        FeeTier::ALL.iter().copied().find(|t| t.pips() == pips)
    }
}

/// Aerodrome AMM pair with constant-product reserves.
///
/// Tokens are held in canonical (address-ascending) order; reserves are
/// re-fetched on every request and never cached across calls.
#[derive(Debug, Clone)]
pub struct AmmPool {
    pub address: Address,
    pub token0: Token,
    pub token1: Token,
    pub reserve0: u128,
    pub reserve1: u128,
}

impl AmmPool {
    pub fn has_liquidity(&self) -> bool {
        self.reserve0 > 0 && self.reserve1 > 0
    }

    /// Reserves oriented for a swap entering with `token_in`.
    pub fn reserves_for(&self, token_in: &Token) -> (u128, u128) {
        if token_in.address == self.token0.address {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    /// Pre-trade spot price of `token_in` denominated in the other token,
    /// adjusted for decimals.
    pub fn spot_price(&self, token_in: &Token) -> f64 {
        let (reserve_in, reserve_out) = self.reserves_for(token_in);
        if reserve_in == 0 {
            return 0.0;
        }
        let (dec_in, dec_out) = if token_in.address == self.token0.address {
            (self.token0.decimals, self.token1.decimals)
        } else {
            (self.token1.decimals, self.token0.decimals)
        };
        let out = reserve_out as f64 / 10f64.powi(dec_out as i32);
        let inn = reserve_in as f64 / 10f64.powi(dec_in as i32);
        out / inn
    }
}

/// Slipstream pool snapshot: current sqrt price, active tick, in-range
/// liquidity and fee tier. Tick-level liquidity distribution is NOT fetched;
/// trade math runs over a synthetic uniform window (see `clmm_math`).
#[derive(Debug, Clone)]
pub struct ClmmPool {
    pub address: Address,
    pub token0: Token,
    pub token1: Token,
    pub fee: FeeTier,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
}

impl ClmmPool {
    pub fn has_liquidity(&self) -> bool {
        self.liquidity > 0 && !self.sqrt_price_x96.is_zero()
    }

    /// Price of token0 in token1 units, decimal-adjusted.
    ///
    /// price = (sqrt_price_x96 / 2^96)^2 * 10^(d0 - d1)
    pub fn price_token0_in_token1(&self) -> f64 {
        if self.sqrt_price_x96.is_zero() {
            return 0.0;
        }
        let sqrt = u256_to_f64_lossy(self.sqrt_price_x96) / (1u128 << 96) as f64;
        let raw_price = sqrt * sqrt;
        let scale = self.token0.decimals as i32 - self.token1.decimals as i32;
        raw_price * 10f64.powi(scale)
    }

    /// Pre-trade spot price oriented for a swap entering with `token_in`.
    pub fn spot_price(&self, token_in: &Token) -> f64 {
        let p = self.price_token0_in_token1();
        if token_in.address == self.token0.address {
            p
        } else if p > 0.0 {
            1.0 / p
        } else {
            0.0
        }
    }

}

/// Lossy scientific conversion of U256 to f64 without intermediate u128 casts.
pub fn u256_to_f64_lossy(v: U256) -> f64 {
    if v.is_zero() {
        return 0.0;
    }
    let s = v.to_string();
    let len = s.len();
    let take = len.min(18);
    let (mantissa_str, _rest) = s.split_at(take);
    let mantissa = mantissa_str.parse::<f64>().unwrap_or(0.0);
    mantissa * 10f64.powi((len - take) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(address: &str, decimals: u8) -> Token {
        Token {
            chain_id: 8453,
            address: address.parse().unwrap(),
            decimals,
            symbol: "T".into(),
            name: "T".into(),
        }
    }

    const Q96_SHIFT: usize = 96;

    #[test]
    fn fee_tiers_are_ordered_lowest_first() {
        let pips: Vec<u32> = FeeTier::ALL.iter().map(|t| t.pips()).collect();
        assert_eq!(pips, vec![100, 500, 3_000, 10_000]);
        assert_eq!(FeeTier::from_pips(500), Some(FeeTier::Low));
        assert_eq!(FeeTier::from_pips(123), None);
    }

    #[test]
    fn amm_reserves_orient_by_token_in() {
        let t0 = token("0x1000000000000000000000000000000000000000", 18);
        let t1 = token("0x2000000000000000000000000000000000000000", 18);
        let pool = AmmPool {
            address: Address::zero(),
            token0: t0.clone(),
            token1: t1.clone(),
            reserve0: 1_000,
            reserve1: 2_000,
        };
        assert_eq!(pool.reserves_for(&t0), (1_000, 2_000));
        assert_eq!(pool.reserves_for(&t1), (2_000, 1_000));
        assert!((pool.spot_price(&t0) - 2.0).abs() < 1e-12);
        assert!((pool.spot_price(&t1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn clmm_price_at_unit_sqrt_is_one() {
        let t0 = token("0x1000000000000000000000000000000000000000", 18);
        let t1 = token("0x2000000000000000000000000000000000000000", 18);
        let pool = ClmmPool {
            address: Address::zero(),
            token0: t0.clone(),
            token1: t1,
            fee: FeeTier::Low,
            sqrt_price_x96: U256::one() << Q96_SHIFT,
            tick: 0,
            liquidity: 1,
        };
        assert!((pool.price_token0_in_token1() - 1.0).abs() < 1e-9);
        assert!((pool.spot_price(&t0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn u256_to_f64_handles_large_values() {
        let v = U256::exp10(30);
        let f = u256_to_f64_lossy(v);
        assert!((f - 1e30).abs() / 1e30 < 1e-9);
    }
}
