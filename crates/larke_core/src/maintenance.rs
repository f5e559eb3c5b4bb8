//! Cache maintenance contract for the admin back office.
//!
//! The host framework owns the actual caches; this module fixes which tasks
//! a "clear cache" action runs and in which order.

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Message returned after every maintenance task succeeded.
pub const CLEAR_CACHE_SUCCESS_MESSAGE: &str = "Cache cleared successfully";

/// Host maintenance tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceTask {
    CacheClear,
    RouteCache,
    ConfigCache,
    ViewClear,
}

impl MaintenanceTask {
    /// Host command name for the task.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CacheClear => "cache:clear",
            Self::RouteCache => "route:cache",
            Self::ConfigCache => "config:cache",
            Self::ViewClear => "view:clear",
        }
    }
}

const CLEAR_CACHE_TASKS: &[MaintenanceTask] = &[
    MaintenanceTask::CacheClear,
    MaintenanceTask::RouteCache,
    MaintenanceTask::ConfigCache,
    MaintenanceTask::ViewClear,
];

/// Tasks run by [`clear_cache`], in order.
pub fn clear_cache_tasks() -> &'static [MaintenanceTask] {
    CLEAR_CACHE_TASKS
}

/// Host capability that executes maintenance tasks.
pub trait MaintenanceHost {
    fn run_task(&self, task: MaintenanceTask) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceError {
    pub task: MaintenanceTask,
    pub message: String,
}

impl Display for MaintenanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "maintenance task `{}` failed: {}", self.task.as_str(), self.message)
    }
}

impl Error for MaintenanceError {}

/// Runs every cache maintenance task, stopping at the first failure.
pub fn clear_cache(host: &impl MaintenanceHost) -> Result<&'static str, MaintenanceError> {
    for task in CLEAR_CACHE_TASKS {
        if let Err(message) = host.run_task(*task) {
            error!(
                "event=clear_cache module=maintenance status=error task={} error={}",
                task.as_str(),
                message
            );
            return Err(MaintenanceError {
                task: *task,
                message,
            });
        }
    }
    info!("event=clear_cache module=maintenance status=ok");
    Ok(CLEAR_CACHE_SUCCESS_MESSAGE)
}
