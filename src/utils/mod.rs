pub mod bit_rate;
pub mod flow_parser;
pub mod time_format;

pub use bit_rate::*;
pub use flow_parser::*;
pub use time_format::*;
