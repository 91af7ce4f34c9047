pub mod bank;
pub mod patterns;
pub mod ta;

// Re-export the indicator bank
pub use self::bank::{IndicatorBank, IndicatorSnapshot};
