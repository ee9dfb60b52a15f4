// Error taxonomy for the Aerodrome connector.
//
// Discovery-internal failures (a dead fee tier, a pair that is not deployed)
// are recovered locally inside the route discovery loop and never reach this
// enum; everything here is a caller-visible failure and carries enough
// context to diagnose without re-querying the chain.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// A token symbol or address could not be resolved against the
    /// per-network token registry.
    #[error("invalid token: {token}")]
    InvalidToken { token: String },

    /// The supplied pool address is not a well-formed 20-byte hex address.
    #[error("invalid pool address: {address}")]
    InvalidPoolAddress { address: String },

    /// The address is well-formed but does not resolve to a readable pool.
    #[error("pool not found at {address}")]
    PoolNotFound { address: String },

    /// Neither the CLMM fee tiers nor the AMM pair yielded a viable route.
    #[error("no route found for {base} -> {quote}")]
    NoRouteFound { base: String, quote: String },

    /// The position NFT exists but is owned by a different wallet.
    #[error("position {position_id} is not owned by wallet {wallet}")]
    PositionOwnership { position_id: String, wallet: String },

    /// The position NFT is neither directly approved for the operator nor
    /// covered by an approved-for-all delegation.
    #[error(
        "insufficient approval for position {position_id}: approve the position manager ({operator})"
    )]
    PositionApproval { position_id: String, operator: String },

    /// The position id does not resolve to an existing NFT.
    #[error("invalid position id {position_id}")]
    InvalidPosition { position_id: String },

    /// The requested network has no entry in the connector configuration.
    #[error("network {network} is not configured")]
    UnsupportedNetwork { network: String },

    /// A read call against the node provider failed or timed out.
    #[error("upstream provider call failed during {context}: {source}")]
    UpstreamProvider {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ConnectorError {
    /// Wraps an arbitrary provider/contract error with the phase it happened in.
    pub fn upstream<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConnectorError::UpstreamProvider {
            context: context.into(),
            source: anyhow::Error::new(source),
        }
    }
}
