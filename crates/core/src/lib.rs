//! Core emulator primitives and traits.

pub mod cpu_lr35902;
pub mod flags;
pub mod logging;
pub mod registers;
pub mod timing;

pub mod types {
    use serde::{Deserialize, Serialize};

    /// Outcome of running one frame's worth of instructions.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FrameReport {
        /// Machine cycles consumed during the frame
        pub cycles: u64,
        /// Instructions (and idle/interrupt slots) executed
        pub instructions: u64,
        /// Frame ended early because the caller asked to stop
        pub interrupted: bool,
    }
}

/// A CPU-like component that can be stepped; returns machine cycles consumed.
///
/// There is no reset: discard the instance and construct a new one.
pub trait Cpu {
    type Error: std::error::Error + Send + Sync + 'static;

    fn step(&mut self) -> Result<u32, Self::Error>;

    /// Running total of machine cycles.
    fn cycles(&self) -> u64;
}

/// A high-level System trait tying components together.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Rebuild every component from the loaded media.
    fn reset(&mut self);

    /// Execute a single instruction and return its machine cycles.
    fn step(&mut self) -> Result<u32, Self::Error>;

    /// Run until one frame's cycle budget is consumed.
    fn step_frame(&mut self) -> Result<types::FrameReport, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu_lr35902::{CpuLr35902, FlatMemory};

    struct MockSystem {
        cycles: u64,
    }

    impl System for MockSystem {
        type Error = std::convert::Infallible;

        fn reset(&mut self) {
            self.cycles = 0;
        }

        fn step(&mut self) -> Result<u32, Self::Error> {
            self.cycles += 1;
            Ok(1)
        }

        fn step_frame(&mut self) -> Result<types::FrameReport, Self::Error> {
            let mut report = types::FrameReport::default();
            while report.cycles < 4 {
                report.cycles += self.step()? as u64;
                report.instructions += 1;
            }
            Ok(report)
        }
    }

    #[test]
    fn mock_system_frame_report() {
        let mut sys = MockSystem { cycles: 0 };
        let report = sys.step_frame().unwrap();
        assert_eq!(report.cycles, 4);
        assert_eq!(report.instructions, 4);
        assert!(!report.interrupted);

        sys.reset();
        assert_eq!(sys.cycles, 0);
    }

    #[test]
    fn frame_report_serializes() {
        let report = types::FrameReport {
            cycles: 70221,
            instructions: 17000,
            interrupted: false,
        };
        let v = serde_json::to_value(report).expect("serialize");
        assert_eq!(v["cycles"], 70221);
    }

    fn run<C: Cpu>(cpu: &mut C, steps: usize) -> u64 {
        for _ in 0..steps {
            cpu.step().unwrap();
        }
        cpu.cycles()
    }

    #[test]
    fn cpu_trait_accumulates_cycles() {
        let mut cpu = CpuLr35902::new(FlatMemory::new());
        cpu.regs.pc = 0;
        assert_eq!(run(&mut cpu, 3), 3);
    }
}
