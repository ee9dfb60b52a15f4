// Pool Address Validator
//
// Syntactic vetting of candidate pool addresses before their on-chain state
// is trusted. A passing verdict only means the string is a well-formed
// 20-byte hex address: it does not confirm a deployed pool of the expected
// type, and downstream state reads may still fail. A stronger check would
// attempt a lightweight state read and treat decode failure as "not a pool";
// this layer stays deliberately cheap.

use std::str::FromStr;

use ethers::types::Address;

use crate::errors::ConnectorError;

/// Reason a candidate pool address was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum InvalidReason {
    /// Not 42 characters or missing the `0x` prefix
    Malformed,
    /// Right shape but not parseable hex
    NotHex,
    /// The zero address (factory "no pool" sentinel)
    ZeroAddress,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::Malformed => "malformed",
            InvalidReason::NotHex => "not_hex",
            InvalidReason::ZeroAddress => "zero_address",
        }
    }
}

/// Verdict of the syntactic pool address check.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(Address),
    Invalid(InvalidReason),
}

/// Checks that `candidate` is a plausible pool reference.
pub fn validate_pool_address(candidate: &str) -> ValidationResult {
    if candidate.len() != 42 || !candidate.starts_with("0x") {
        return ValidationResult::Invalid(InvalidReason::Malformed);
    }
    let address = match Address::from_str(candidate) {
        Ok(address) => address,
        Err(_) => return ValidationResult::Invalid(InvalidReason::NotHex),
    };
    if address.is_zero() {
        return ValidationResult::Invalid(InvalidReason::ZeroAddress);
    }
    ValidationResult::Valid(address)
}

/// Same check, surfaced as the connector's typed error.
pub fn parse_pool_address(candidate: &str) -> Result<Address, ConnectorError> {
    match validate_pool_address(candidate) {
        ValidationResult::Valid(address) => Ok(address),
        ValidationResult::Invalid(_) => Err(ConnectorError::InvalidPoolAddress {
            address: candidate.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_addresses() {
        let result = validate_pool_address("0x420DD381b31aEf6683db6B902084cB0FFECe40Da");
        assert!(matches!(result, ValidationResult::Valid(_)));
    }

    #[test]
    fn rejects_with_typed_reasons() {
        assert_eq!(
            validate_pool_address("420DD381b31aEf6683db6B902084cB0FFECe40Da"),
            ValidationResult::Invalid(InvalidReason::Malformed)
        );
        assert_eq!(
            validate_pool_address("0x42"),
            ValidationResult::Invalid(InvalidReason::Malformed)
        );
        assert_eq!(
            validate_pool_address("0xZZ0DD381b31aEf6683db6B902084cB0FFECe40Da"),
            ValidationResult::Invalid(InvalidReason::NotHex)
        );
        assert_eq!(
            validate_pool_address("0x0000000000000000000000000000000000000000"),
            ValidationResult::Invalid(InvalidReason::ZeroAddress)
        );
    }

    #[test]
    fn parse_maps_to_invalid_pool_address_error() {
        let err = parse_pool_address("not-an-address").unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::InvalidPoolAddress { address } if address == "not-an-address"
        ));
    }
}
