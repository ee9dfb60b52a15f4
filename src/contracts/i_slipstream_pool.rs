use ethers::prelude::*;

// Slipstream concentrated-liquidity pool.
//
// IMPORTANT: these are the exact Solidity types of the deployed contract:
// - uint160 for sqrtPriceX96 (NOT uint256)
// - int24 for tick
// - uint24 for fee
// - uint128 for liquidity
// Slipstream's slot0 has no feeProtocol field, unlike canonical Uniswap V3.

abigen!(
    ISlipstreamPool,
    r#"[
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, bool unlocked)
        function liquidity() external view returns (uint128)
        function fee() external view returns (uint24)
        function tickSpacing() external view returns (int24)
        function token0() external view returns (address)
        function token1() external view returns (address)
    ]"#
);
