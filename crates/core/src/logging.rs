//! Category-gated logging for the emulator core.
//!
//! Each subsystem logs under a [`LogCategory`]. A process-global
//! [`LogConfig`] holds one atomic level per category plus a global fallback,
//! so a disabled category costs one relaxed load and the message closure is
//! never run. Enabled messages go to the `log` facade with target
//! `dmg::<category>`; the binary decides where they end up.
//!
//! ```rust
//! use dmg_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Cpu, LogLevel::Debug, || {
//!     format!("HALT at PC={:04X}", 0x0150)
//! });
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }

    /// Matching `log` crate level; `None` for `Off`.
    pub fn to_log_level(self) -> Option<log::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(log::Level::Error),
            LogLevel::Warn => Some(log::Level::Warn),
            LogLevel::Info => Some(log::Level::Info),
            LogLevel::Debug => Some(log::Level::Debug),
            LogLevel::Trace => Some(log::Level::Trace),
        }
    }
}

/// Log category for the emulator components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Instruction execution, HALT/STOP, illegal opcodes
    Cpu,
    /// Address decode and write interception
    Mmu,
    /// Cartridge loading and header inspection
    Cartridge,
    /// Interrupt dispatch
    Interrupts,
    /// Writes that hit hardware this core does not model
    Stubs,
}

impl LogCategory {
    pub const ALL: [LogCategory; 5] = [
        LogCategory::Cpu,
        LogCategory::Mmu,
        LogCategory::Cartridge,
        LogCategory::Interrupts,
        LogCategory::Stubs,
    ];

    /// Parse category name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Some(LogCategory::Cpu),
            "mmu" | "bus" => Some(LogCategory::Mmu),
            "cartridge" | "cart" => Some(LogCategory::Cartridge),
            "interrupts" | "irq" => Some(LogCategory::Interrupts),
            "stubs" => Some(LogCategory::Stubs),
            _ => None,
        }
    }

    /// `log` target used for this category.
    pub fn target(self) -> &'static str {
        match self {
            LogCategory::Cpu => "dmg::cpu",
            LogCategory::Mmu => "dmg::mmu",
            LogCategory::Cartridge => "dmg::cartridge",
            LogCategory::Interrupts => "dmg::interrupts",
            LogCategory::Stubs => "dmg::stubs",
        }
    }

    fn index(self) -> usize {
        match self {
            LogCategory::Cpu => 0,
            LogCategory::Mmu => 1,
            LogCategory::Cartridge => 2,
            LogCategory::Interrupts => 3,
            LogCategory::Stubs => 4,
        }
    }
}

/// Stored in a category slot that has no level of its own.
const UNSET: u8 = u8::MAX;

/// Global logging configuration
pub struct LogConfig {
    /// Applies to every category without its own level
    global_level: AtomicU8,
    category_levels: [AtomicU8; 5],
}

impl LogConfig {
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: [
                AtomicU8::new(UNSET),
                AtomicU8::new(UNSET),
                AtomicU8::new(UNSET),
                AtomicU8::new(UNSET),
                AtomicU8::new(UNSET),
            ],
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    /// Drop a category's own level so it follows the global one again.
    pub fn clear_level(&self, category: LogCategory) {
        self.category_levels[category.index()].store(UNSET, Ordering::Relaxed);
    }

    /// The category's own level, if one was set.
    pub fn get_level(&self, category: LogCategory) -> Option<LogLevel> {
        match self.category_levels[category.index()].load(Ordering::Relaxed) {
            UNSET => None,
            val => Some(LogLevel::from_u8(val)),
        }
    }

    /// Level a category actually logs at.
    pub fn effective_level(&self, category: LogCategory) -> LogLevel {
        self.get_level(category).unwrap_or_else(|| self.get_global_level())
    }

    /// A category's own level wins, including `Off`; otherwise the global
    /// level applies.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        level != LogLevel::Off && level <= self.effective_level(category)
    }

    /// Most verbose level any category can currently emit.
    pub fn max_level(&self) -> LogLevel {
        LogCategory::ALL
            .iter()
            .map(|&c| self.effective_level(c))
            .max()
            .unwrap_or(LogLevel::Off)
    }

    /// Global level back to Off and every category following it.
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.clear_level(category);
        }
    }
}

/// Log a lazily-built message under `category` at `level`.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    if !LogConfig::global().should_log(category, level) {
        return;
    }
    if let Some(lvl) = level.to_log_level() {
        log::log!(target: category.target(), lvl, "{}", message_fn());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::from_str("ERR"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_str("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("3"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("TRACE"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str("loud"), None);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(LogCategory::from_str("CPU"), Some(LogCategory::Cpu));
        assert_eq!(LogCategory::from_str("bus"), Some(LogCategory::Mmu));
        assert_eq!(LogCategory::from_str("irq"), Some(LogCategory::Interrupts));
        assert_eq!(LogCategory::from_str("ppu"), None);
    }

    #[test]
    fn test_should_log_with_category_level() {
        let config = LogConfig::new();
        config.set_level(LogCategory::Cpu, LogLevel::Info);

        assert!(config.should_log(LogCategory::Cpu, LogLevel::Error));
        assert!(config.should_log(LogCategory::Cpu, LogLevel::Info));
        assert!(!config.should_log(LogCategory::Cpu, LogLevel::Debug));
        assert!(!config.should_log(LogCategory::Mmu, LogLevel::Error));
    }

    #[test]
    fn test_category_level_overrides_global() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Error);
        config.set_level(LogCategory::Cpu, LogLevel::Debug);

        assert!(config.should_log(LogCategory::Cpu, LogLevel::Debug));
        assert!(!config.should_log(LogCategory::Mmu, LogLevel::Warn));
        assert!(config.should_log(LogCategory::Mmu, LogLevel::Error));
    }

    #[test]
    fn test_off_is_never_emitted() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Trace);
        assert!(!config.should_log(LogCategory::Stubs, LogLevel::Off));
    }

    #[test]
    fn test_category_off_silences_under_verbose_global() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Debug);
        config.set_level(LogCategory::Stubs, LogLevel::Off);

        assert_eq!(config.get_level(LogCategory::Stubs), Some(LogLevel::Off));
        assert!(!config.should_log(LogCategory::Stubs, LogLevel::Error));
        assert!(!config.should_log(LogCategory::Stubs, LogLevel::Debug));
        assert!(config.should_log(LogCategory::Cpu, LogLevel::Debug));

        config.clear_level(LogCategory::Stubs);
        assert_eq!(config.get_level(LogCategory::Stubs), None);
        assert!(config.should_log(LogCategory::Stubs, LogLevel::Debug));
    }

    #[test]
    fn test_max_level_and_reset() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Warn);
        config.set_level(LogCategory::Interrupts, LogLevel::Trace);
        assert_eq!(config.max_level(), LogLevel::Trace);

        config.set_level(LogCategory::Cpu, LogLevel::Off);
        assert_eq!(config.effective_level(LogCategory::Cpu), LogLevel::Off);
        assert_eq!(config.effective_level(LogCategory::Mmu), LogLevel::Warn);

        config.reset();
        assert_eq!(config.max_level(), LogLevel::Off);
        assert_eq!(config.get_level(LogCategory::Interrupts), None);
    }
}
