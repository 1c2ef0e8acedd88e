pub mod parse;
pub mod rounding;

pub use parse::{parse_points, points_from_columns};
pub use rounding::{format_point, round_to};
