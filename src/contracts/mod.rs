// Contracts Module - Read-only ABIs

pub mod i_aerodrome_pair;
pub mod i_slipstream_pool;
pub mod i_slipstream_position_manager;

// Public exports
pub use i_aerodrome_pair::IAerodromePair;
pub use i_slipstream_pool::ISlipstreamPool;
pub use i_slipstream_position_manager::ISlipstreamPositionManager;
