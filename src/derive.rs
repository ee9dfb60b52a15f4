// Deterministic pool address derivation (CREATE2).
//
// Both families derive pool addresses locally instead of round-tripping to
// the factory's getter: canonicalize token order, hash the family-specific
// salt, and apply the CREATE2 formula with the factory's init-code hash.
// Pure; the only failure mode is a malformed token pair, rejected before
// hashing.

use ethers::types::{Address, H256, U256};
use ethers::utils::{get_create2_address_from_hash, keccak256};

use crate::errors::ConnectorError;
use crate::pools::FeeTier;

/// Orders a token pair canonically (ascending by address).
pub fn canonical_order(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn check_pair(a: Address, b: Address) -> Result<(), ConnectorError> {
    if a.is_zero() || b.is_zero() {
        return Err(ConnectorError::InvalidToken {
            token: Address::zero().to_string(),
        });
    }
    if a == b {
        return Err(ConnectorError::InvalidToken {
            token: format!("{a:?} paired with itself"),
        });
    }
    Ok(())
}

/// AMM pair address: salt = keccak256(token0 ‖ token1) over the canonical
/// order. Argument order does not affect the result.
pub fn amm_pair_address(
    factory: Address,
    init_code_hash: H256,
    token_a: Address,
    token_b: Address,
) -> Result<Address, ConnectorError> {
    check_pair(token_a, token_b)?;
    let (token0, token1) = canonical_order(token_a, token_b);

    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.as_bytes());
    packed[20..].copy_from_slice(token1.as_bytes());
    let salt = keccak256(packed);

    Ok(get_create2_address_from_hash(
        factory,
        salt,
        init_code_hash.as_bytes().to_vec(),
    ))
}

/// Slipstream pool address: salt = keccak256(abi.encode(token0, token1,
/// tickSpacing)) over the canonical order, keyed by the fee tier's spacing.
pub fn clmm_pool_address(
    factory: Address,
    init_code_hash: H256,
    token_a: Address,
    token_b: Address,
    fee: FeeTier,
) -> Result<Address, ConnectorError> {
    check_pair(token_a, token_b)?;
    let (token0, token1) = canonical_order(token_a, token_b);

    let encoded = ethers::abi::encode(&[
        ethers::abi::Token::Address(token0),
        ethers::abi::Token::Address(token1),
        ethers::abi::Token::Int(U256::from(fee.tick_spacing() as u64)),
    ]);
    let salt = keccak256(encoded);

    Ok(get_create2_address_from_hash(
        factory,
        salt,
        init_code_hash.as_bytes().to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AMM_FACTORY_ADDRESS, AMM_PAIR_INIT_CODE_HASH};
    use crate::constants::{CLMM_FACTORY_ADDRESS, CLMM_POOL_INIT_CODE_HASH};

    fn weth() -> Address {
        "0x4200000000000000000000000000000000000006".parse().unwrap()
    }

    fn aero() -> Address {
        "0x940181a94A35A4569E4529A3CDfB74e38FD98631".parse().unwrap()
    }

    #[test]
    fn pair_derivation_is_order_independent() {
        let ab = amm_pair_address(*AMM_FACTORY_ADDRESS, *AMM_PAIR_INIT_CODE_HASH, weth(), aero())
            .unwrap();
        let ba = amm_pair_address(*AMM_FACTORY_ADDRESS, *AMM_PAIR_INIT_CODE_HASH, aero(), weth())
            .unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn clmm_derivation_is_order_independent_and_tier_specific() {
        for tier in FeeTier::ALL {
            let ab = clmm_pool_address(
                *CLMM_FACTORY_ADDRESS,
                *CLMM_POOL_INIT_CODE_HASH,
                weth(),
                aero(),
                tier,
            )
            .unwrap();
            let ba = clmm_pool_address(
                *CLMM_FACTORY_ADDRESS,
                *CLMM_POOL_INIT_CODE_HASH,
                aero(),
                weth(),
                tier,
            )
            .unwrap();
            assert_eq!(ab, ba);
        }

        let low = clmm_pool_address(
            *CLMM_FACTORY_ADDRESS,
            *CLMM_POOL_INIT_CODE_HASH,
            weth(),
            aero(),
            FeeTier::Low,
        )
        .unwrap();
        let high = clmm_pool_address(
            *CLMM_FACTORY_ADDRESS,
            *CLMM_POOL_INIT_CODE_HASH,
            weth(),
            aero(),
            FeeTier::High,
        )
        .unwrap();
        assert_ne!(low, high);
    }

    #[test]
    fn malformed_pairs_are_rejected_before_hashing() {
        let zero = Address::zero();
        assert!(
            amm_pair_address(*AMM_FACTORY_ADDRESS, *AMM_PAIR_INIT_CODE_HASH, zero, aero()).is_err()
        );
        assert!(amm_pair_address(
            *AMM_FACTORY_ADDRESS,
            *AMM_PAIR_INIT_CODE_HASH,
            weth(),
            weth()
        )
        .is_err());
    }
}
