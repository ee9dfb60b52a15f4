// Pool state reads.
//
// All reads go through `PoolStateSource` so route discovery can be driven by
// an in-memory source in tests; the production implementation wraps an HTTP
// provider. Independent queries against the same pool are issued
// concurrently and joined; there is no retry here, a failed read surfaces as
// `UpstreamProviderError` and the discovery loop decides whether that is
// fatal. Pool state is never cached across calls.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};

use crate::contracts::{IAerodromePair, ISlipstreamPool};
use crate::errors::ConnectorError;

/// Raw AMM pair state: reserves plus the constituent token addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmmState {
    pub reserve0: u128,
    pub reserve1: u128,
    pub token0: Address,
    pub token1: Address,
}

impl AmmState {
    pub fn has_liquidity(&self) -> bool {
        self.reserve0 > 0 && self.reserve1 > 0
    }
}

/// Raw Slipstream pool state: liquidity, slot data and the fee in pips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClmmState {
    pub liquidity: u128,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub fee_pips: u32,
}

#[async_trait]
pub trait PoolStateSource: Send + Sync {
    async fn amm_state(&self, pair: Address) -> Result<AmmState, ConnectorError>;
    async fn clmm_state(&self, pool: Address) -> Result<ClmmState, ConnectorError>;
}

/// Reads pool state through read-only contract calls.
pub struct PoolStateReader {
    provider: Arc<Provider<Http>>,
}

impl PoolStateReader {
    pub fn new(provider: Arc<Provider<Http>>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl PoolStateSource for PoolStateReader {
    async fn amm_state(&self, pair: Address) -> Result<AmmState, ConnectorError> {
        let contract = IAerodromePair::new(pair, Arc::clone(&self.provider));

        // calls are bound first so the builders outlive the join
        let reserves_call = contract.get_reserves();
        let token0_call = contract.token_0();
        let token1_call = contract.token_1();
        let (reserves, token0, token1) = tokio::try_join!(
            reserves_call.call(),
            token0_call.call(),
            token1_call.call(),
        )
        .map_err(|e| ConnectorError::upstream(format!("amm state read for {pair:?}"), e))?;

        let (reserve0, reserve1, _block_timestamp_last) = reserves;
        Ok(AmmState {
            reserve0,
            reserve1,
            token0,
            token1,
        })
    }

    async fn clmm_state(&self, pool: Address) -> Result<ClmmState, ConnectorError> {
        let contract = ISlipstreamPool::new(pool, Arc::clone(&self.provider));

        let liquidity_call = contract.liquidity();
        let slot0_call = contract.slot_0();
        let fee_call = contract.fee();
        let (liquidity, slot0, fee_pips) = tokio::try_join!(
            liquidity_call.call(),
            slot0_call.call(),
            fee_call.call(),
        )
        .map_err(|e| ConnectorError::upstream(format!("clmm state read for {pool:?}"), e))?;

        let (sqrt_price_x96, tick, ..) = slot0;
        Ok(ClmmState {
            liquidity,
            sqrt_price_x96,
            tick,
            fee_pips,
        })
    }
}
