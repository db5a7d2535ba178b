pub mod addr;
pub mod types;

pub use addr::{
    format_area, parse_bit, parse_byte, resolve, AddressResolver, RequestItem, VAreaPolicy,
};
pub use types::{S7Area, VariableType};
