// Route discovery across the two pool families.
//
// Families are tried in a fixed priority order, CLMM before AMM, and the
// first family with a viable pool wins. This is priority selection, not
// best-price selection: when both families have liquidity the CLMM route is
// returned even if the AMM pool would quote better. Per-tier and per-pair
// read failures are recorded as skipped attempts and the loop continues;
// only total exhaustion surfaces to the caller.

use ethers::core::types::U512;
use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clmm_math::{self, SwapMathError, TickWindow};
use crate::connector::ConnectorContracts;
use crate::derive;
use crate::errors::ConnectorError;
use crate::pools::{AmmPool, ClmmPool, FeeTier, PoolFamily};
use crate::state_reader::PoolStateSource;
use crate::tokens::Token;

/// Trade direction: `SELL` maps to exact-input, `BUY` to exact-output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeType {
    ExactInput,
    ExactOutput,
}

/// One pool the route trades through.
#[derive(Debug, Clone)]
pub enum RoutePool {
    Clmm { pool: ClmmPool, window: TickWindow },
    Amm { pool: AmmPool },
}

/// A single-hop route with its computed trade amounts.
#[derive(Debug, Clone)]
pub struct Route {
    pub family: PoolFamily,
    pub pool: RoutePool,
    pub token_in: Token,
    pub token_out: Token,
    /// Input consumed, smallest units, fees included.
    pub amount_in: U256,
    /// Output produced, smallest units.
    pub amount_out: U256,
    /// Pre-trade spot price (token_out per token_in, human units).
    pub spot_price: f64,
}

impl Route {
    pub fn pool_address(&self) -> Address {
        match &self.pool {
            RoutePool::Clmm { pool, .. } => pool.address,
            RoutePool::Amm { pool } => pool.address,
        }
    }
}

/// Why a candidate pool was skipped during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ZeroLiquidity,
    /// The pool exists but could not fill the trade (window exhausted or
    /// reserves too small).
    InsufficientLiquidity,
    /// The state read failed; usually the pool is simply not deployed.
    ProviderError(String),
}

/// A candidate that was tried and rejected, kept for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct RouteAttempt {
    pub family: PoolFamily,
    pub fee_tier: Option<FeeTier>,
    pub pool_address: Address,
    pub reason: SkipReason,
}

/// Explicit discovery result: the winning route, if any, plus every skipped
/// candidate with its reason.
#[derive(Debug)]
pub struct DiscoveryOutcome {
    pub route: Option<Route>,
    pub attempts: Vec<RouteAttempt>,
}

pub struct RouteDiscoveryEngine {
    state: Arc<dyn PoolStateSource>,
    contracts: ConnectorContracts,
    amm_fee_pips: u32,
}

impl RouteDiscoveryEngine {
    pub fn new(
        state: Arc<dyn PoolStateSource>,
        contracts: ConnectorContracts,
        amm_fee_pips: u32,
    ) -> Self {
        Self {
            state,
            contracts,
            amm_fee_pips,
        }
    }

    /// The underlying state source, shared with callers that read pool state
    /// outside of discovery.
    pub fn state_source(&self) -> &Arc<dyn PoolStateSource> {
        &self.state
    }

    /// Finds the first viable route for the pair, CLMM fee tiers first
    /// (lowest to highest), then the AMM pair. Families and tiers are probed
    /// strictly sequentially; the ordering is the tie-break.
    pub async fn discover(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount: U256,
        trade_type: TradeType,
    ) -> Result<DiscoveryOutcome, ConnectorError> {
        let mut attempts = Vec::new();

        if let Some(route) = self
            .find_clmm_route(token_in, token_out, amount, trade_type, &mut attempts)
            .await?
        {
            info!(
                pool = ?route.pool_address(),
                "found clmm route for {} -> {}",
                token_in.symbol,
                token_out.symbol
            );
            return Ok(DiscoveryOutcome {
                route: Some(route),
                attempts,
            });
        }

        if let Some(route) = self
            .find_amm_route(token_in, token_out, amount, trade_type, &mut attempts)
            .await?
        {
            info!(
                pool = ?route.pool_address(),
                "found amm route for {} -> {}",
                token_in.symbol,
                token_out.symbol
            );
            return Ok(DiscoveryOutcome {
                route: Some(route),
                attempts,
            });
        }

        warn!(
            "no route found for {} -> {} after {} attempts",
            token_in.symbol,
            token_out.symbol,
            attempts.len()
        );
        Ok(DiscoveryOutcome {
            route: None,
            attempts,
        })
    }

    async fn find_clmm_route(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount: U256,
        trade_type: TradeType,
        attempts: &mut Vec<RouteAttempt>,
    ) -> Result<Option<Route>, ConnectorError> {
        for tier in FeeTier::ALL {
            let pool_address = derive::clmm_pool_address(
                self.contracts.clmm_factory,
                self.contracts.clmm_pool_init_code_hash,
                token_in.address,
                token_out.address,
                tier,
            )?;

            let state = match self.state.clmm_state(pool_address).await {
                Ok(state) => state,
                Err(e) => {
                    debug!("clmm tier {:?} unavailable at {pool_address:?}: {e}", tier);
                    attempts.push(RouteAttempt {
                        family: PoolFamily::Clmm,
                        fee_tier: Some(tier),
                        pool_address,
                        reason: SkipReason::ProviderError(e.to_string()),
                    });
                    continue;
                }
            };

            if state.liquidity == 0 || state.sqrt_price_x96.is_zero() {
                attempts.push(RouteAttempt {
                    family: PoolFamily::Clmm,
                    fee_tier: Some(tier),
                    pool_address,
                    reason: SkipReason::ZeroLiquidity,
                });
                continue;
            }

            let (token0, token1) = if token_in.address < token_out.address {
                (token_in.clone(), token_out.clone())
            } else {
                (token_out.clone(), token_in.clone())
            };
            let pool = ClmmPool {
                address: pool_address,
                token0,
                token1,
                fee: tier,
                sqrt_price_x96: state.sqrt_price_x96,
                tick: state.tick,
                liquidity: state.liquidity,
            };
            let window = TickWindow::around(state.tick, tier.tick_spacing());
            let zero_for_one = token_in.address == pool.token0.address;

            let simulation = clmm_math::simulate_swap(
                pool.sqrt_price_x96,
                pool.tick,
                pool.liquidity,
                window,
                amount,
                trade_type == TradeType::ExactInput,
                zero_for_one,
                tier.pips(),
            );
            match simulation {
                Ok(sim) => {
                    let spot_price = pool.spot_price(token_in);
                    return Ok(Some(Route {
                        family: PoolFamily::Clmm,
                        pool: RoutePool::Clmm { pool, window },
                        token_in: token_in.clone(),
                        token_out: token_out.clone(),
                        amount_in: sim.amount_in,
                        amount_out: sim.amount_out,
                        spot_price,
                    }));
                }
                Err(SwapMathError::ZeroLiquidity) => {
                    attempts.push(RouteAttempt {
                        family: PoolFamily::Clmm,
                        fee_tier: Some(tier),
                        pool_address,
                        reason: SkipReason::ZeroLiquidity,
                    });
                }
                Err(e) => {
                    debug!("clmm tier {tier:?} cannot fill trade: {e}");
                    attempts.push(RouteAttempt {
                        family: PoolFamily::Clmm,
                        fee_tier: Some(tier),
                        pool_address,
                        reason: SkipReason::InsufficientLiquidity,
                    });
                }
            }
        }

        Ok(None)
    }

    async fn find_amm_route(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount: U256,
        trade_type: TradeType,
        attempts: &mut Vec<RouteAttempt>,
    ) -> Result<Option<Route>, ConnectorError> {
        let pair_address = derive::amm_pair_address(
            self.contracts.amm_factory,
            self.contracts.amm_pair_init_code_hash,
            token_in.address,
            token_out.address,
        )?;

        let state = match self.state.amm_state(pair_address).await {
            Ok(state) => state,
            Err(e) => {
                debug!("amm pair unavailable at {pair_address:?}: {e}");
                attempts.push(RouteAttempt {
                    family: PoolFamily::Amm,
                    fee_tier: None,
                    pool_address: pair_address,
                    reason: SkipReason::ProviderError(e.to_string()),
                });
                return Ok(None);
            }
        };

        if !state.has_liquidity() {
            attempts.push(RouteAttempt {
                family: PoolFamily::Amm,
                fee_tier: None,
                pool_address: pair_address,
                reason: SkipReason::ZeroLiquidity,
            });
            return Ok(None);
        }

        let (token0, token1) = if state.token0 == token_in.address {
            (token_in.clone(), token_out.clone())
        } else {
            (token_out.clone(), token_in.clone())
        };
        let pool = AmmPool {
            address: pair_address,
            token0,
            token1,
            reserve0: state.reserve0,
            reserve1: state.reserve1,
        };

        let (reserve_in, reserve_out) = pool.reserves_for(token_in);
        let trade = match trade_type {
            TradeType::ExactInput => {
                amm_amount_out(reserve_in, reserve_out, amount, self.amm_fee_pips)
                    .map(|amount_out| (amount, amount_out))
            }
            TradeType::ExactOutput => {
                amm_amount_in(reserve_in, reserve_out, amount, self.amm_fee_pips)
                    .map(|amount_in| (amount_in, amount))
            }
        };

        match trade {
            Some((amount_in, amount_out)) => {
                let spot_price = pool.spot_price(token_in);
                Ok(Some(Route {
                    family: PoolFamily::Amm,
                    pool: RoutePool::Amm { pool },
                    token_in: token_in.clone(),
                    token_out: token_out.clone(),
                    amount_in,
                    amount_out,
                    spot_price,
                }))
            }
            None => {
                attempts.push(RouteAttempt {
                    family: PoolFamily::Amm,
                    fee_tier: None,
                    pool_address: pair_address,
                    reason: SkipReason::InsufficientLiquidity,
                });
                Ok(None)
            }
        }
    }
}

const FEE_DENOMINATOR: u64 = 1_000_000;

/// Constant-product exact-input amount:
/// `out = reserve_out - ceil(reserve_in * reserve_out / (reserve_in + in'))`
/// where `in'` is the input net of the protocol fee (in pips). Rounding is
/// always in the pool's favour.
pub fn amm_amount_out(
    reserve_in: u128,
    reserve_out: u128,
    amount_in: U256,
    fee_pips: u32,
) -> Option<U256> {
    if reserve_in == 0 || reserve_out == 0 || amount_in.is_zero() {
        return None;
    }
    let reserve_in = U256::from(reserve_in);
    let reserve_out = U256::from(reserve_out);

    let amount_in_net = amount_in
        .full_mul(U256::from(FEE_DENOMINATOR - fee_pips as u64))
        .checked_div(U512::from(FEE_DENOMINATOR))?;
    let amount_in_net: U256 = amount_in_net.try_into().ok()?;

    let k = reserve_in.full_mul(reserve_out);
    let denominator = U512::from(reserve_in.checked_add(amount_in_net)?);
    let mut quotient: U256 = (k / denominator).try_into().ok()?;
    if k % denominator != U512::zero() {
        quotient = quotient.checked_add(U256::one())?;
    }

    let amount_out = reserve_out.checked_sub(quotient)?;
    (!amount_out.is_zero()).then_some(amount_out)
}

/// Constant-product exact-output amount, solved symmetrically and grossed up
/// for the protocol fee. `None` when the pool cannot supply the requested
/// output.
pub fn amm_amount_in(
    reserve_in: u128,
    reserve_out: u128,
    amount_out: U256,
    fee_pips: u32,
) -> Option<U256> {
    if reserve_in == 0 || reserve_out == 0 || amount_out.is_zero() {
        return None;
    }
    let reserve_in = U256::from(reserve_in);
    let reserve_out = U256::from(reserve_out);
    if amount_out >= reserve_out {
        return None;
    }

    let numerator = U256::from(reserve_in).full_mul(amount_out);
    let denominator = U512::from(reserve_out - amount_out);
    let mut amount_in: U256 = (numerator / denominator).try_into().ok()?;
    if numerator % denominator != U512::zero() {
        amount_in = amount_in.checked_add(U256::one())?;
    }

    // gross up for the fee, rounding up
    let gross = amount_in.full_mul(U256::from(FEE_DENOMINATOR));
    let fee_denominator = U512::from(FEE_DENOMINATOR - fee_pips as u64);
    let mut grossed: U256 = (gross / fee_denominator).try_into().ok()?;
    if gross % fee_denominator != U512::zero() {
        grossed = grossed.checked_add(U256::one())?;
    }
    Some(grossed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_product_exact_input_matches_formula() {
        // reserves (1000, 2000) in 18-decimal units, amount_in = 100, no fee:
        // out = 2000 - (1000 * 2000) / 1100 = 181.8181...
        let reserve_in = 1_000u128 * 10u128.pow(18);
        let reserve_out = 2_000u128 * 10u128.pow(18);
        let amount_in = U256::from(100u128 * 10u128.pow(18));

        let out = amm_amount_out(reserve_in, reserve_out, amount_in, 0).unwrap();
        let expected = U256::from_dec_str("181818181818181818181").unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn exact_output_inverts_exact_input() {
        let reserve_in = 1_000u128 * 10u128.pow(18);
        let reserve_out = 2_000u128 * 10u128.pow(18);
        let amount_in = U256::from(100u128 * 10u128.pow(18));

        let out = amm_amount_out(reserve_in, reserve_out, amount_in, 200).unwrap();
        let back_in = amm_amount_in(reserve_in, reserve_out, out, 200).unwrap();

        // rounding in the pool's favour means we never get back less
        assert!(back_in >= amount_in);
        let slack = amount_in / U256::from(1_000_000u64);
        assert!(back_in - amount_in <= slack.max(U256::from(2u64)));
    }

    #[test]
    fn fee_reduces_output() {
        let reserve_in = 1_000u128 * 10u128.pow(18);
        let reserve_out = 2_000u128 * 10u128.pow(18);
        let amount_in = U256::from(100u128 * 10u128.pow(18));

        let no_fee = amm_amount_out(reserve_in, reserve_out, amount_in, 0).unwrap();
        let with_fee = amm_amount_out(reserve_in, reserve_out, amount_in, 200).unwrap();
        assert!(with_fee < no_fee);
    }

    #[test]
    fn requesting_the_whole_reserve_fails() {
        let out = amm_amount_in(1_000, 2_000, U256::from(2_000u64), 0);
        assert!(out.is_none());
    }
}
