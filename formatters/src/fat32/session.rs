// Progress tracking for a formatting session

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::Layout;

/// One of the structures a session writes, in recommended order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatStep {
    MasterBootRecord,
    BootSector,
    FileSystemInfo,
    AllocationTables,
    RootDirectory,
}

impl FormatStep {
    pub const ALL: [FormatStep; 5] = [
        FormatStep::MasterBootRecord,
        FormatStep::BootSector,
        FormatStep::FileSystemInfo,
        FormatStep::AllocationTables,
        FormatStep::RootDirectory,
    ];

    /// Step that must have succeeded before this one. The MBR is optional,
    /// so nothing depends on it.
    pub fn prerequisite(self) -> Option<FormatStep> {
        match self {
            FormatStep::MasterBootRecord | FormatStep::BootSector => None,
            FormatStep::FileSystemInfo => Some(FormatStep::BootSector),
            FormatStep::AllocationTables => Some(FormatStep::FileSystemInfo),
            FormatStep::RootDirectory => Some(FormatStep::AllocationTables),
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for FormatStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatStep::MasterBootRecord => "master boot record",
            FormatStep::BootSector => "boot sector",
            FormatStep::FileSystemInfo => "FSInfo sector",
            FormatStep::AllocationTables => "FAT tables",
            FormatStep::RootDirectory => "root directory",
        };
        f.write_str(name)
    }
}

/// Steps that have completed successfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionProgress {
    completed: u8,
}

impl SessionProgress {
    pub fn mark(&mut self, step: FormatStep) {
        self.completed |= step.bit();
    }

    pub fn has(&self, step: FormatStep) -> bool {
        self.completed & step.bit() != 0
    }

    /// The prerequisite of `step` if it has not been written yet.
    pub fn missing_prerequisite(&self, step: FormatStep) -> Option<FormatStep> {
        step.prerequisite().filter(|&required| !self.has(required))
    }

    pub fn completed_steps(&self) -> Vec<FormatStep> {
        FormatStep::ALL.iter().copied().filter(|&s| self.has(s)).collect()
    }

    /// Everything a mountable volume needs has been written.
    pub fn is_complete(&self) -> bool {
        FormatStep::ALL
            .iter()
            .filter(|&&s| s != FormatStep::MasterBootRecord)
            .all(|&s| self.has(s))
    }
}

/// What a session did, returned when it is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub layout: Layout,
    pub completed_steps: Vec<FormatStep>,
    pub bytes_written: u64,
    pub complete: bool,
}
