// Concentrated-liquidity position authorization checks.
//
// Position NFTs gate every liquidity-modifying call, so ownership and
// operator approval are verified on chain before such a call is built.

use std::sync::Arc;

use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};
use tracing::debug;

use crate::contracts::ISlipstreamPositionManager;
use crate::errors::ConnectorError;

pub struct PositionAuthorizationChecker {
    manager: ISlipstreamPositionManager<Provider<Http>>,
}

impl PositionAuthorizationChecker {
    pub fn new(provider: Arc<Provider<Http>>, manager_address: Address) -> Self {
        Self {
            manager: ISlipstreamPositionManager::new(manager_address, provider),
        }
    }

    /// Verifies that `wallet` owns the position NFT. An `ownerOf` revert
    /// means the token does not exist and maps to `InvalidPosition`.
    pub async fn check_ownership(
        &self,
        position_id: U256,
        wallet: Address,
    ) -> Result<(), ConnectorError> {
        let owner = self
            .manager
            .owner_of(position_id)
            .call()
            .await
            .map_err(|_| ConnectorError::InvalidPosition {
                position_id: position_id.to_string(),
            })?;

        debug!(%position_id, ?owner, "position owner fetched");
        if addresses_match(owner, wallet) {
            Ok(())
        } else {
            Err(ConnectorError::PositionOwnership {
                position_id: position_id.to_string(),
                wallet: format!("{wallet:#x}"),
            })
        }
    }

    /// Verifies that `operator` may act on the position, either through a
    /// per-token approval or an operator-wide one granted by `owner`.
    pub async fn check_approval(
        &self,
        position_id: U256,
        owner: Address,
        operator: Address,
    ) -> Result<(), ConnectorError> {
        let approved_call = self.manager.get_approved(position_id);
        let operator_wide_call = self.manager.is_approved_for_all(owner, operator);
        let (approved, operator_wide) = tokio::try_join!(
            approved_call.call(),
            operator_wide_call.call(),
        )
        .map_err(|e| ConnectorError::upstream("position approval lookup", e))?;

        if operator_wide || addresses_match(approved, operator) {
            Ok(())
        } else {
            Err(ConnectorError::PositionApproval {
                position_id: position_id.to_string(),
                operator: format!("{operator:#x}"),
            })
        }
    }
}

/// Address comparison is case-insensitive by construction: `Address` stores
/// raw bytes, so checksummed and lowercased inputs compare equal once parsed.
pub fn addresses_match(a: Address, b: Address) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_ignores_input_casing() {
        let checksummed: Address = "0x940181a94A35A4569E4529A3CDfB74e38FD98631"
            .parse()
            .unwrap();
        let lowercased: Address = "0x940181a94a35a4569e4529a3cdfb74e38fd98631"
            .parse()
            .unwrap();
        assert!(addresses_match(checksummed, lowercased));
    }

    #[test]
    fn different_addresses_do_not_match() {
        let a: Address = "0x4200000000000000000000000000000000000006".parse().unwrap();
        let b: Address = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".parse().unwrap();
        assert!(!addresses_match(a, b));
    }
}
