pub mod shutdown;
pub mod token;
