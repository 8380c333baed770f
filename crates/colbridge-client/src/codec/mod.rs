//! Value coercion engine.
//!
//! Wire decoding and encoding for every column type, the client value
//! model, and the typed accessors used by the row cursor.

mod coerce;
pub mod decode;
mod duration;
pub mod encode;
mod numeric;
mod temporal;
mod value;

pub use coerce::Cell;
pub use decode::{clean_custom_text, decode_element, decode_value};
pub use duration::CqlDuration;
pub use encode::encode_value;
pub use numeric::{Decimal, Varint};
pub use temporal::{SqlDate, SqlTime, SqlTimestamp};
pub use value::{TupleValue, UdtValue, Value, ValueMap, ValueSet};
