use ethers::prelude::*;

// ERC-721 surface of the Slipstream nonfungible position manager, limited to
// the ownership and approval reads the authorization checks need.

abigen!(
    ISlipstreamPositionManager,
    r#"[
        function ownerOf(uint256 tokenId) external view returns (address owner)
        function getApproved(uint256 tokenId) external view returns (address operator)
        function isApprovedForAll(address owner, address operator) external view returns (bool)
    ]"#
);
