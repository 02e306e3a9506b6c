pub mod parse;
pub mod relay;
