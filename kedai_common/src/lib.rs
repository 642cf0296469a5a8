mod phone;
mod rupiah;

pub mod op;

pub use phone::{normalize_phone, phones_match, COUNTRY_CALLING_CODE};
pub use rupiah::{Rupiah, RupiahConversionError, IDR_CURRENCY_CODE, IDR_NUMERIC_CODE};
