pub mod bench;
pub mod crash;
