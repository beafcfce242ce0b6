pub mod classify;
pub mod migrate;
pub mod parse;
pub mod seed;
pub mod status;
