// Aerodrome connector.
//
// One instance per (connector, network) pair. Construction resolves the
// network's RPC endpoint and token list; after that every public operation
// is a read against the chain plus pure math, and instances hold no mutable
// state of their own.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, H256, U256};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::constants::{
    AMM_FACTORY_ADDRESS, AMM_PAIR_INIT_CODE_HASH, AMM_ROUTER_ADDRESS, CLMM_FACTORY_ADDRESS,
    CLMM_POOL_INIT_CODE_HASH, POSITION_MANAGER_ADDRESS, UNIVERSAL_ROUTER_ADDRESS,
};
use crate::errors::ConnectorError;
use crate::gas::GasEstimator;
use crate::pools::PoolFamily;
use crate::position::PositionAuthorizationChecker;
use crate::quote::{QuoteBuilder, Side, SwapQuote};
use crate::router::RouteDiscoveryEngine;
use crate::settings::Settings;
use crate::state_reader::{PoolStateReader, PoolStateSource};
use crate::tokens::{from_raw_amount, to_raw_amount, Token, TokenRef, TokenRegistry};
use crate::validator::parse_pool_address;

/// Deployed contract addresses the connector talks to. One fixed set per
/// network; Base is the only deployment today.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorContracts {
    pub amm_router: Address,
    pub amm_factory: Address,
    pub amm_pair_init_code_hash: H256,
    pub clmm_factory: Address,
    pub clmm_pool_init_code_hash: H256,
    pub position_manager: Address,
    pub universal_router: Address,
}

impl ConnectorContracts {
    pub fn for_base() -> Self {
        Self {
            amm_router: *AMM_ROUTER_ADDRESS,
            amm_factory: *AMM_FACTORY_ADDRESS,
            amm_pair_init_code_hash: *AMM_PAIR_INIT_CODE_HASH,
            clmm_factory: *CLMM_FACTORY_ADDRESS,
            clmm_pool_init_code_hash: *CLMM_POOL_INIT_CODE_HASH,
            position_manager: *POSITION_MANAGER_ADDRESS,
            universal_router: *UNIVERSAL_ROUTER_ADDRESS,
        }
    }
}

/// Pool kind as spelled in requests and pool-registry entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolType {
    Amm,
    Clmm,
}

impl PoolType {
    pub fn family(&self) -> PoolFamily {
        match self {
            PoolType::Amm => PoolFamily::Amm,
            PoolType::Clmm => PoolFamily::Clmm,
        }
    }
}

/// A pool known to the gateway's pool registry.
#[derive(Debug, Clone)]
pub struct RegisteredPool {
    pub address: Address,
    pub pool_type: PoolType,
    pub base_symbol: String,
    pub quote_symbol: String,
}

/// Lookup service for curated default pools, keyed by trading pair. Backed
/// by the gateway's pool lists in production and by fixtures in tests.
#[async_trait]
pub trait PoolRegistry: Send + Sync {
    async fn find_pool(
        &self,
        network: &str,
        base_symbol: &str,
        quote_symbol: &str,
        pool_type: PoolType,
    ) -> Option<RegisteredPool>;
}

/// Snapshot of an AMM pair for the pool-info endpoint. Amounts are human
/// units; `price` is quote per base.
#[derive(Debug, Clone, Serialize)]
pub struct PoolInfo {
    pub address: Address,
    pub base_token_address: Address,
    pub quote_token_address: Address,
    /// Swap fee in percent.
    pub fee_pct: Decimal,
    pub price: Decimal,
    pub base_token_amount: Decimal,
    pub quote_token_amount: Decimal,
}

/// Connector metadata served by the connector listing.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectorInfo {
    pub name: String,
    pub trading_types: Vec<String>,
    pub chain: String,
    pub networks: Vec<String>,
}

/// All connectors this gateway exposes: this one plus any configured
/// siblings.
pub fn list_connectors(settings: &Settings) -> Vec<ConnectorInfo> {
    let mut connectors = vec![ConnectorInfo {
        name: "aerodrome".to_string(),
        trading_types: vec!["amm".to_string(), "clmm".to_string(), "router".to_string()],
        chain: "ethereum".to_string(),
        networks: settings.network_names(),
    }];
    for sibling in &settings.sibling_connectors {
        connectors.push(ConnectorInfo {
            name: sibling.name.clone(),
            trading_types: sibling.trading_types.clone(),
            chain: sibling.chain.clone(),
            networks: sibling.networks.clone(),
        });
    }
    connectors
}

pub struct Aerodrome {
    network: String,
    chain_id: u64,
    tokens: TokenRegistry,
    contracts: ConnectorContracts,
    engine: RouteDiscoveryEngine,
    quotes: QuoteBuilder,
    gas: GasEstimator,
    positions: PositionAuthorizationChecker,
    default_slippage_pct: Decimal,
    amm_fee_pips: u32,
}

impl Aerodrome {
    /// Builds a connector bound to one configured network.
    pub fn init(network: &str, settings: &Settings) -> Result<Self, ConnectorError> {
        let net = settings
            .network(network)
            .ok_or_else(|| ConnectorError::UnsupportedNetwork {
                network: network.to_string(),
            })?;

        let provider = Provider::<Http>::try_from(net.rpc_url.as_str())
            .map_err(|e| ConnectorError::upstream("provider construction", e))?;
        let provider = Arc::new(provider);

        let tokens = TokenRegistry::from_settings(net.chain_id, &net.tokens)?;
        let contracts = ConnectorContracts::for_base();
        let state: Arc<dyn PoolStateSource> = Arc::new(PoolStateReader::new(Arc::clone(&provider)));

        info!(network, chain_id = net.chain_id, "aerodrome connector initialized");
        Ok(Self {
            network: network.to_string(),
            chain_id: net.chain_id,
            tokens,
            contracts,
            engine: RouteDiscoveryEngine::new(state, contracts, settings.amm_fee_pips),
            quotes: QuoteBuilder::new(contracts.universal_router),
            gas: GasEstimator::new(
                Arc::clone(&provider),
                settings.gas.default_estimate,
                settings.gas.limit_pad,
            ),
            positions: PositionAuthorizationChecker::new(provider, contracts.position_manager),
            default_slippage_pct: settings.slippage_pct,
            amm_fee_pips: settings.amm_fee_pips,
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn contracts(&self) -> &ConnectorContracts {
        &self.contracts
    }

    pub fn token_by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.tokens.by_symbol(symbol)
    }

    pub fn token_by_address(&self, address: Address) -> Option<&Token> {
        self.tokens.by_address(address)
    }

    pub fn resolve_token(&self, reference: &TokenRef) -> Result<Token, ConnectorError> {
        self.tokens.resolve(reference)
    }

    /// Quotes a swap of `amount` base tokens against the quote token.
    ///
    /// SELL trades the exact base amount in; BUY acquires the exact base
    /// amount out, spending quote tokens. Gas estimation runs last and never
    /// fails the quote.
    pub async fn quote_swap(
        &self,
        base: &TokenRef,
        quote: &TokenRef,
        amount: Decimal,
        side: Side,
        slippage_pct: Option<Decimal>,
        wallet: Option<Address>,
    ) -> Result<SwapQuote, ConnectorError> {
        let base_token = self.resolve_token(base)?;
        let quote_token = self.resolve_token(quote)?;

        let (token_in, token_out) = match side {
            Side::Sell => (base_token.clone(), quote_token.clone()),
            Side::Buy => (quote_token.clone(), base_token.clone()),
        };
        let trade_type = side.trade_type();
        // the amount is always denominated in base tokens
        let raw_amount = to_raw_amount(amount, base_token.decimals)?;

        let slippage = clamp_slippage(slippage_pct.unwrap_or(self.default_slippage_pct));

        let outcome = self
            .engine
            .discover(&token_in, &token_out, raw_amount, trade_type)
            .await?;
        let route = outcome.route.ok_or_else(|| {
            debug!(attempts = outcome.attempts.len(), "route discovery exhausted");
            ConnectorError::NoRouteFound {
                base: base_token.symbol.clone(),
                quote: quote_token.symbol.clone(),
            }
        })?;

        let recipient = wallet.unwrap_or_else(Address::zero);
        let mut swap_quote = self.quotes.build(&route, trade_type, slippage, recipient)?;

        swap_quote.estimated_gas_used = self
            .gas
            .estimate(
                recipient,
                swap_quote.to,
                swap_quote.calldata.clone(),
                swap_quote.value,
            )
            .await;

        Ok(swap_quote)
    }

    /// Reads an AMM pair by address and reports reserves and price in human
    /// units. Both pool tokens must be known to the network's token list.
    pub async fn amm_pool_info(&self, pool_address: &str) -> Result<PoolInfo, ConnectorError> {
        let address = parse_pool_address(pool_address)?;

        let state = self
            .engine
            .state_source()
            .amm_state(address)
            .await
            .map_err(|_| ConnectorError::PoolNotFound {
                address: pool_address.to_string(),
            })?;

        let base_token =
            self.tokens
                .by_address(state.token0)
                .ok_or_else(|| ConnectorError::InvalidToken {
                    token: format!("{:#x}", state.token0),
                })?;
        let quote_token =
            self.tokens
                .by_address(state.token1)
                .ok_or_else(|| ConnectorError::InvalidToken {
                    token: format!("{:#x}", state.token1),
                })?;

        let base_amount = from_raw_amount(U256::from(state.reserve0), base_token.decimals)?;
        let quote_amount = from_raw_amount(U256::from(state.reserve1), quote_token.decimals)?;
        let price = if base_amount.is_zero() {
            Decimal::ZERO
        } else {
            quote_amount / base_amount
        };

        Ok(PoolInfo {
            address,
            base_token_address: base_token.address,
            quote_token_address: quote_token.address,
            fee_pct: Decimal::from(self.amm_fee_pips) / Decimal::from(10_000u32),
            price,
            base_token_amount: base_amount,
            quote_token_amount: quote_amount,
        })
    }

    /// Looks up the curated default pool for a pair, if the registry has one.
    pub async fn find_default_pool(
        &self,
        registry: &dyn PoolRegistry,
        base_symbol: &str,
        quote_symbol: &str,
        pool_type: PoolType,
    ) -> Option<Address> {
        registry
            .find_pool(&self.network, base_symbol, quote_symbol, pool_type)
            .await
            .map(|pool| pool.address)
    }

    pub async fn check_position_ownership(
        &self,
        position_id: U256,
        wallet: Address,
    ) -> Result<(), ConnectorError> {
        self.positions.check_ownership(position_id, wallet).await
    }

    /// Checks that `operator` may act on the wallet's position. Pass the
    /// position manager itself when vetting liquidity-modifying calls.
    pub async fn check_position_approval(
        &self,
        position_id: U256,
        owner: Address,
        operator: Address,
    ) -> Result<(), ConnectorError> {
        self.positions
            .check_approval(position_id, owner, operator)
            .await
    }
}

/// Slippage tolerance clamped to the meaningful percent range.
pub fn clamp_slippage(pct: Decimal) -> Decimal {
    pct.clamp(Decimal::ZERO, Decimal::from(100u32))
}
