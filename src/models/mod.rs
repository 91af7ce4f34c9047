pub mod candle;
pub mod market;
pub mod outcome;

pub use candle::{Candle, CandleData};
pub use market::{Bias, Direction, FibonacciLevel, LevelType};
pub use outcome::Outcome;
