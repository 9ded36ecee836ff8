use super::MemoryLr35902;

/// Flat 64KB byte array with no decoding or side effects.
///
/// Stands in for a real memory map in CPU tests and benchmarks.
#[derive(Clone)]
pub struct FlatMemory(pub Box<[u8; 0x10000]>);

impl FlatMemory {
    pub fn new() -> Self {
        Self(Box::new([0; 0x10000]))
    }

    /// Memory with `program` copied in starting at `origin`.
    pub fn with_program(origin: u16, program: &[u8]) -> Self {
        let mut mem = Self::new();
        mem.load(origin, program);
        mem
    }

    pub fn load(&mut self, origin: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.0[(origin as usize + i) & 0xFFFF] = b;
        }
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FlatMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatMemory").finish_non_exhaustive()
    }
}

impl MemoryLr35902 for FlatMemory {
    fn read(&self, addr: u16) -> u8 {
        self.0[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.0[addr as usize] = val;
    }
}
