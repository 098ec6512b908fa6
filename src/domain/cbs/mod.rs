pub mod calculator;
pub mod delay_bounds;
pub mod port;
