pub mod cli;
pub mod facts;
pub mod virt;

pub use facts::{VirtualFacts, VirtualType};
pub use virt::{Technology, Virtual};

/// Version of the virtfact package.
pub const VIRTFACT_VERSION: &str = env!("CARGO_PKG_VERSION");
