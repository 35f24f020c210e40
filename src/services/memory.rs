use super::MemoryProbe;
use sysinfo::System;

/// Memory probe backed by the operating system
#[derive(Debug, Default)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn available_bytes(&self) -> Option<u64> {
        let mut system = System::new();
        system.refresh_memory();
        match system.available_memory() {
            0 => None,
            bytes => Some(bytes),
        }
    }
}
