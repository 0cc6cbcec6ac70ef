pub mod assembler;
pub mod deriver;
pub mod fetcher;

pub use assembler::Assembler;
