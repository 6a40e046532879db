pub mod amounts;
pub mod dates;
