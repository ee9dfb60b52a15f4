// Gas estimation with a guaranteed fallback.
//
// A quote is still useful when `eth_estimateGas` reverts, so estimation
// failures never propagate: the configured default is returned instead.
// Permit2 allowance expiry is the common revert for wallets that have not
// approved the router yet and is logged at info level rather than warn.

use std::sync::Arc;

use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256};
use tracing::{debug, info, warn};

use crate::constants::PERMIT2_ALLOWANCE_EXPIRED_SELECTOR;

pub struct GasEstimator {
    provider: Arc<Provider<Http>>,
    default_estimate: u64,
    limit_pad: u64,
}

impl GasEstimator {
    pub fn new(provider: Arc<Provider<Http>>, default_estimate: u64, limit_pad: u64) -> Self {
        Self {
            provider,
            default_estimate,
            limit_pad,
        }
    }

    /// Gas limit to attach to a transaction built from `estimate`.
    pub fn gas_limit(&self, estimate: U256) -> U256 {
        estimate + U256::from(self.limit_pad)
    }

    /// Estimates gas for a router call. Never fails: reverts and transport
    /// errors fall back to the configured default.
    pub async fn estimate(
        &self,
        from: Address,
        to: Address,
        calldata: Bytes,
        value: U256,
    ) -> U256 {
        // the request carries the padded default as its gas-limit hint so
        // nodes that cap estimation at the supplied limit still succeed
        let request = TransactionRequest::new()
            .from(from)
            .to(to)
            .data(calldata)
            .value(value)
            .gas(self.gas_limit(U256::from(self.default_estimate)));
        let typed: TypedTransaction = request.into();

        match self.provider.estimate_gas(&typed, None).await {
            Ok(estimate) => {
                debug!(%estimate, "gas estimated");
                estimate
            }
            Err(err) => {
                let message = err.to_string();
                if is_permit2_approval_error(&message) {
                    info!(
                        "gas estimation reverted with Permit2 allowance expiry, \
                         using default of {}",
                        self.default_estimate
                    );
                } else {
                    warn!(error = %message, "gas estimation failed, using default of {}", self.default_estimate);
                }
                U256::from(self.default_estimate)
            }
        }
    }
}

/// True when an estimation error carries the Permit2 `AllowanceExpired`
/// selector. That revert means the wallet has no live Permit2 approval for
/// the router, which is expected pre-trade.
pub fn is_permit2_approval_error(message: &str) -> bool {
    // providers surface revert data both with and without the 0x prefix
    message.contains(PERMIT2_ALLOWANCE_EXPIRED_SELECTOR.trim_start_matches("0x"))
}
