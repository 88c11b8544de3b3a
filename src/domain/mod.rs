pub mod grid;
pub mod kinds;
pub mod matcher;
pub mod rewards;
pub mod token;
