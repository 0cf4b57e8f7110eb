pub mod interrupts;
pub mod snapshot;
