//! Reel library exports for testing

pub mod core;
pub mod player;
pub mod prefetch;

#[cfg(test)]
pub mod test_support;
