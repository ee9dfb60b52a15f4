//! Integration tests for route discovery
//!
//! Tests cover:
//! - CLMM-before-AMM family priority
//! - Fee-tier iteration and skip reasons
//! - AMM fallback and exhaustion
//!
//! Pool state is served by an in-memory source; no node is contacted.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, U256};

use aerodrome_connector::connector::ConnectorContracts;
use aerodrome_connector::derive;
use aerodrome_connector::errors::ConnectorError;
use aerodrome_connector::pools::{FeeTier, PoolFamily};
use aerodrome_connector::router::{RouteDiscoveryEngine, SkipReason, TradeType};
use aerodrome_connector::state_reader::{AmmState, ClmmState, PoolStateSource};
use aerodrome_connector::tokens::Token;

const Q96_SHIFT: u32 = 96;

struct FixtureStateSource {
    amm: HashMap<Address, AmmState>,
    clmm: HashMap<Address, ClmmState>,
}

impl FixtureStateSource {
    fn empty() -> Self {
        Self {
            amm: HashMap::new(),
            clmm: HashMap::new(),
        }
    }
}

#[async_trait]
impl PoolStateSource for FixtureStateSource {
    async fn amm_state(&self, pair: Address) -> Result<AmmState, ConnectorError> {
        self.amm
            .get(&pair)
            .copied()
            .ok_or_else(|| ConnectorError::PoolNotFound {
                address: format!("{pair:#x}"),
            })
    }

    async fn clmm_state(&self, pool: Address) -> Result<ClmmState, ConnectorError> {
        self.clmm
            .get(&pool)
            .copied()
            .ok_or_else(|| ConnectorError::PoolNotFound {
                address: format!("{pool:#x}"),
            })
    }
}

fn weth() -> Token {
    Token {
        chain_id: 8453,
        address: "0x4200000000000000000000000000000000000006".parse().unwrap(),
        decimals: 18,
        symbol: "WETH".to_string(),
        name: "Wrapped Ether".to_string(),
    }
}

fn usdc() -> Token {
    Token {
        chain_id: 8453,
        address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".parse().unwrap(),
        decimals: 6,
        symbol: "USDC".to_string(),
        name: "USD Coin".to_string(),
    }
}

/// Deep pool priced 1:1 at tick zero.
fn healthy_clmm_state() -> ClmmState {
    ClmmState {
        liquidity: 1_000_000_000_000_000_000_000_000u128,
        sqrt_price_x96: U256::one() << Q96_SHIFT,
        tick: 0,
        fee_pips: FeeTier::Lowest.pips(),
    }
}

fn healthy_amm_state(contracts: &ConnectorContracts) -> (Address, AmmState) {
    let pair = derive::amm_pair_address(
        contracts.amm_factory,
        contracts.amm_pair_init_code_hash,
        weth().address,
        usdc().address,
    )
    .unwrap();
    let state = AmmState {
        reserve0: 1_000u128 * 10u128.pow(18),
        reserve1: 2_000_000u128 * 10u128.pow(6),
        token0: weth().address,
        token1: usdc().address,
    };
    (pair, state)
}

fn clmm_address(contracts: &ConnectorContracts, tier: FeeTier) -> Address {
    derive::clmm_pool_address(
        contracts.clmm_factory,
        contracts.clmm_pool_init_code_hash,
        weth().address,
        usdc().address,
        tier,
    )
    .unwrap()
}

fn engine(source: FixtureStateSource) -> RouteDiscoveryEngine {
    RouteDiscoveryEngine::new(Arc::new(source), ConnectorContracts::for_base(), 200)
}

/// Test that a viable CLMM pool wins even when the AMM pair has liquidity
#[tokio::test]
async fn test_clmm_family_takes_priority() {
    let contracts = ConnectorContracts::for_base();
    let mut source = FixtureStateSource::empty();
    source
        .clmm
        .insert(clmm_address(&contracts, FeeTier::Lowest), healthy_clmm_state());
    let (pair, amm_state) = healthy_amm_state(&contracts);
    source.amm.insert(pair, amm_state);

    let outcome = engine(source)
        .discover(
            &weth(),
            &usdc(),
            U256::exp10(18),
            TradeType::ExactInput,
        )
        .await
        .unwrap();

    let route = outcome.route.expect("route");
    assert_eq!(route.family, PoolFamily::Clmm);
    assert!(outcome.attempts.is_empty());
    assert!(!route.amount_out.is_zero());
}

/// Test that dead fee tiers are skipped and the next tier wins
#[tokio::test]
async fn test_zero_liquidity_tier_is_skipped() {
    let contracts = ConnectorContracts::for_base();
    let mut source = FixtureStateSource::empty();
    let drained = ClmmState {
        liquidity: 0,
        ..healthy_clmm_state()
    };
    source
        .clmm
        .insert(clmm_address(&contracts, FeeTier::Lowest), drained);
    source
        .clmm
        .insert(clmm_address(&contracts, FeeTier::Low), healthy_clmm_state());

    let outcome = engine(source)
        .discover(&weth(), &usdc(), U256::exp10(18), TradeType::ExactInput)
        .await
        .unwrap();

    let route = outcome.route.expect("route");
    assert_eq!(route.family, PoolFamily::Clmm);
    assert_eq!(route.pool_address(), clmm_address(&contracts, FeeTier::Low));

    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.attempts[0].fee_tier, Some(FeeTier::Lowest));
    assert_eq!(outcome.attempts[0].reason, SkipReason::ZeroLiquidity);
}

/// Test that discovery falls back to the AMM pair when no tier is deployed
#[tokio::test]
async fn test_amm_fallback_when_no_clmm_pool_exists() {
    let contracts = ConnectorContracts::for_base();
    let mut source = FixtureStateSource::empty();
    let (pair, amm_state) = healthy_amm_state(&contracts);
    source.amm.insert(pair, amm_state);

    let outcome = engine(source)
        .discover(&weth(), &usdc(), U256::exp10(18), TradeType::ExactInput)
        .await
        .unwrap();

    let route = outcome.route.expect("route");
    assert_eq!(route.family, PoolFamily::Amm);
    assert_eq!(route.pool_address(), pair);

    // four undeployed tiers were probed and recorded
    assert_eq!(outcome.attempts.len(), 4);
    for attempt in &outcome.attempts {
        assert_eq!(attempt.family, PoolFamily::Clmm);
        assert!(matches!(attempt.reason, SkipReason::ProviderError(_)));
    }
}

/// Test exact-output routing against the AMM pair
#[tokio::test]
async fn test_amm_exact_output_route() {
    let contracts = ConnectorContracts::for_base();
    let mut source = FixtureStateSource::empty();
    let (pair, amm_state) = healthy_amm_state(&contracts);
    source.amm.insert(pair, amm_state);

    // acquire 1000 USDC (6 decimals), paying WETH
    let wanted = U256::from(1_000u64) * U256::exp10(6);
    let outcome = engine(source)
        .discover(&weth(), &usdc(), wanted, TradeType::ExactOutput)
        .await
        .unwrap();

    let route = outcome.route.expect("route");
    assert_eq!(route.amount_out, wanted);
    assert!(!route.amount_in.is_zero());
}

/// Test that total exhaustion reports every attempt and no route
#[tokio::test]
async fn test_exhaustion_yields_no_route_with_attempts() {
    let outcome = engine(FixtureStateSource::empty())
        .discover(&weth(), &usdc(), U256::exp10(18), TradeType::ExactInput)
        .await
        .unwrap();

    assert!(outcome.route.is_none());
    // four CLMM tiers plus the AMM pair
    assert_eq!(outcome.attempts.len(), 5);
    assert_eq!(outcome.attempts[4].family, PoolFamily::Amm);
}

/// Test that a 1:1 deep CLMM pool quotes near par for a small trade
#[tokio::test]
async fn test_deep_pool_quotes_near_par() {
    let contracts = ConnectorContracts::for_base();
    let mut source = FixtureStateSource::empty();
    source
        .clmm
        .insert(clmm_address(&contracts, FeeTier::Lowest), healthy_clmm_state());

    let amount_in = U256::exp10(15);
    let outcome = engine(source)
        .discover(&weth(), &usdc(), amount_in, TradeType::ExactInput)
        .await
        .unwrap();

    let route = outcome.route.expect("route");
    assert_eq!(route.amount_in, amount_in);
    // output is input minus the 0.01% tier fee and price movement
    let floor = amount_in - amount_in / U256::from(1_000u64);
    assert!(route.amount_out > floor);
    assert!(route.amount_out < amount_in);
}
