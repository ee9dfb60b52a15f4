use ethers::prelude::*;

// Aerodrome AMM pair (V2-style constant product pool).
//
// Reserve types are the exact Solidity widths: uint112 reserves and a uint32
// timestamp. Widening them changes the decoded layout and fails silently.

abigen!(
    IAerodromePair,
    r#"[
        function getReserves() external view returns (uint112 _reserve0, uint112 _reserve1, uint32 _blockTimestampLast)
        function token0() external view returns (address)
        function token1() external view returns (address)
    ]"#
);
