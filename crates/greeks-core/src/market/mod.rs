pub mod conventions;
pub mod underlying;

pub use conventions::{trading_conventions, trading_days_per_year, TradingConvention};
pub use underlying::{Settlement, Underlying};
