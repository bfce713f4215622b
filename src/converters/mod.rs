/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Converters between the file formats of neighbouring codes

pub mod errors;
pub mod pic2genesis;

pub use errors::{ConverterError, Result};
pub use pic2genesis::{convert_pic_to_genesis, GenesisDistribution};
