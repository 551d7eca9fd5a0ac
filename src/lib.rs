//! Conversion of MCSA model containers into interchange formats.

pub mod config;
pub mod convert;
pub mod wavefront;

pub use self::config::{Format, Settings};
pub use self::convert::{convert, convert_file, encode, output_path, ConvertError};
