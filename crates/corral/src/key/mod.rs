mod generator;
mod id;
mod random;
#[cfg(test)]
mod tests;

pub use generator::*;
pub use id::*;
pub use random::*;
