//! # Aerodrome Connector
//!
//! A Rust connector for the Aerodrome DEX on Base: route discovery across the
//! AMM and Slipstream (CLMM) pool families, slippage-bounded swap quoting with
//! universal-router calldata, AMM pool inspection, and concentrated-liquidity
//! position authorization checks.
//!
//! ## Overview
//!
//! The connector is read-only: it never signs or submits transactions. A quote
//! bundles everything an execution layer needs, the calldata, the router
//! address, the slippage bounds, and a gas estimate.
//!
//! - **Routing**: CLMM fee tiers are probed before the AMM pair, first viable
//!   pool wins
//! - **Derivation**: pool addresses are computed locally via CREATE2, no
//!   factory round-trips
//! - **Quoting**: amounts are simulated with exact fixed-point pool math and
//!   bounded by the slippage tolerance
//! - **Lifecycle**: instances are cached per network behind a registry and
//!   rebuilt after close

// Core types
/// Token model, registry and amount conversions
pub mod tokens;
/// Pool families, fee tiers and pool snapshots
pub mod pools;
/// Caller-visible error taxonomy
pub mod errors;

// Chain access
/// Generated contract bindings
pub mod contracts;
/// Pool state reads behind a mockable trait
pub mod state_reader;
/// CREATE2 pool address derivation
pub mod derive;
/// Pool address validation
pub mod validator;

// Math
/// Tick, sqrt-price and swap-step math for the CLMM family
pub mod clmm_math;

// Routing and quoting
/// Route discovery across pool families
pub mod router;
/// Quote construction and universal-router calldata
pub mod quote;
/// Gas estimation with fallback
pub mod gas;

// Connector surface
/// Connector instance and public operations
pub mod connector;
/// Position NFT authorization checks
pub mod position;
/// Per-network instance registry
pub mod registry;
/// Configuration
pub mod settings;
/// Deployed addresses and protocol constants
pub mod constants;

pub use connector::{Aerodrome, ConnectorContracts, PoolInfo, PoolType};
pub use errors::ConnectorError;
pub use quote::{Side, SwapQuote};
pub use registry::ConnectorRegistry;
pub use router::{DiscoveryOutcome, Route, TradeType};
pub use settings::Settings;
pub use tokens::{Token, TokenRef};
