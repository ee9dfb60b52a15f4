// Aerodrome deployment constants for Base mainnet.
//
// Addresses are the canonical Base deployments; the init-code hashes feed the
// CREATE2 derivation in `derive.rs` and must track the deployed pool
// implementations.

use ethers::types::{Address, H256};
use once_cell::sync::Lazy;

/// Aerodrome AMM router (classic volatile/stable pools).
pub static AMM_ROUTER_ADDRESS: Lazy<Address> = Lazy::new(|| {
    "0xcF77a3Ba9A5CA399B7c97c74d54e5b1Beb874E43"
        .parse()
        .expect("static address")
});

/// Aerodrome AMM pool factory.
pub static AMM_FACTORY_ADDRESS: Lazy<Address> = Lazy::new(|| {
    "0x420DD381b31aEf6683db6B902084cB0FFECe40Da"
        .parse()
        .expect("static address")
});

/// Slipstream (concentrated liquidity) pool factory.
pub static CLMM_FACTORY_ADDRESS: Lazy<Address> = Lazy::new(|| {
    "0x5e7BB104d84c7CB9B682AaC2F3d509f5F406809A"
        .parse()
        .expect("static address")
});

/// Slipstream nonfungible position manager (position NFTs).
pub static POSITION_MANAGER_ADDRESS: Lazy<Address> = Lazy::new(|| {
    "0x827922686190790b37229fd06084350E74485b72"
        .parse()
        .expect("static address")
});

/// Universal router targeted by the built swap calldata.
pub static UNIVERSAL_ROUTER_ADDRESS: Lazy<Address> = Lazy::new(|| {
    "0x6Cb442acF35158D5eDa88fe602221b67B400Be3E"
        .parse()
        .expect("static address")
});

/// Init-code hash of the AMM pair contract (CREATE2 pair derivation).
pub static AMM_PAIR_INIT_CODE_HASH: Lazy<H256> = Lazy::new(|| {
    "0x96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f"
        .parse()
        .expect("static hash")
});

/// Init-code hash of the Slipstream pool contract (CREATE2 pool derivation).
pub static CLMM_POOL_INIT_CODE_HASH: Lazy<H256> = Lazy::new(|| {
    "0xe34f199b19b2b4f47f68442619d555527d244f78a3297ea89325f843f87b8b54"
        .parse()
        .expect("static hash")
});

/// Revert selector of Permit2 `AllowanceExpired(uint256)`. Gas estimation
/// failing with this selector means the wallet has not yet approved the
/// router's spending delegate, which is an expected pre-trade state.
pub const PERMIT2_ALLOWANCE_EXPIRED_SELECTOR: &str = "0xd81b2f2e";

/// Chain id of Base mainnet, the default network.
pub const BASE_CHAIN_ID: u64 = 8453;
