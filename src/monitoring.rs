// Run tracking for conversions: timings, row counts and throughput
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Configuration for the monitoring system
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub enable_run_tracking: bool,
    pub max_completed_runs: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_run_tracking: true,
            max_completed_runs: 1000,
        }
    }
}

/// Status of a conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    InProgress,
    Completed,
    Failed(String),
}

/// Metrics for one conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetric {
    pub run_id: String,
    pub source: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub rows_converted: u64,
    pub rows_failed: u64,
    pub throughput: Option<f64>, // rows per second
}

/// Aggregate statistics over all runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub active_runs: usize,
    pub completed_runs: usize,
    pub successful_runs: usize,
    pub failed_runs: usize,
    pub avg_duration_ms: f64,
    pub total_rows_converted: u64,
}

/// Handle for a run in progress
pub struct RunTracker {
    pub run_id: String,
    pub source: String,
    pub start_time: DateTime<Utc>,
    monitoring_system: Arc<MonitoringSystem>,
}

impl RunTracker {
    /// Mark the run as successfully completed
    pub fn complete_success(&self, rows_converted: u64, rows_failed: u64) {
        let duration_ms = self.elapsed_ms();

        info!(
            run_id = %self.run_id,
            source = %self.source,
            duration_ms,
            rows_converted,
            rows_failed,
            "Conversion run completed"
        );

        self.monitoring_system.complete_run(
            &self.run_id,
            RunStatus::Completed,
            duration_ms,
            rows_converted,
            rows_failed,
        );
    }

    /// Mark the run as failed
    pub fn complete_failure(&self, reason: &str) {
        let duration_ms = self.elapsed_ms();

        error!(
            run_id = %self.run_id,
            source = %self.source,
            duration_ms,
            error = reason,
            "Conversion run failed"
        );

        self.monitoring_system.complete_run(
            &self.run_id,
            RunStatus::Failed(reason.to_string()),
            duration_ms,
            0,
            0,
        );
    }

    fn elapsed_ms(&self) -> u64 {
        Utc::now()
            .signed_duration_since(self.start_time)
            .num_milliseconds()
            .max(0) as u64
    }
}

/// Registry of active and completed runs
pub struct MonitoringSystem {
    config: MonitoringConfig,
    active_runs: Mutex<HashMap<String, RunMetric>>,
    completed_runs: Mutex<Vec<RunMetric>>,
}

impl MonitoringSystem {
    pub fn new(config: MonitoringConfig) -> Self {
        Self {
            config,
            active_runs: Mutex::new(HashMap::new()),
            completed_runs: Mutex::new(Vec::new()),
        }
    }

    /// Start tracking a run over `source`
    pub fn start_run(self: &Arc<Self>, source: &str) -> RunTracker {
        let run_id = Uuid::new_v4().to_string();
        let start_time = Utc::now();

        if self.config.enable_run_tracking {
            let metric = RunMetric {
                run_id: run_id.clone(),
                source: source.to_string(),
                status: RunStatus::InProgress,
                start_time,
                end_time: None,
                duration_ms: None,
                rows_converted: 0,
                rows_failed: 0,
                throughput: None,
            };
            if let Ok(mut active) = self.active_runs.lock() {
                active.insert(run_id.clone(), metric);
            }
        }

        info!(run_id = %run_id, source, "Started conversion run");

        RunTracker {
            run_id,
            source: source.to_string(),
            start_time,
            monitoring_system: Arc::clone(self),
        }
    }

    fn complete_run(&self, run_id: &str, status: RunStatus, duration_ms: u64, rows_converted: u64, rows_failed: u64) {
        if !self.config.enable_run_tracking {
            return;
        }

        let metric = match self.active_runs.lock() {
            Ok(mut active) => active.remove(run_id),
            Err(_) => {
                warn!("Failed to lock active runs");
                None
            }
        };

        if let Some(mut metric) = metric {
            metric.status = status;
            metric.end_time = Some(Utc::now());
            metric.duration_ms = Some(duration_ms);
            metric.rows_converted = rows_converted;
            metric.rows_failed = rows_failed;
            if duration_ms > 0 {
                metric.throughput = Some(rows_converted as f64 / (duration_ms as f64 / 1000.0));
            }

            if let Ok(mut completed) = self.completed_runs.lock() {
                completed.push(metric);
                if completed.len() > self.config.max_completed_runs {
                    completed.remove(0);
                }
            }
        }
    }

    /// Completed runs, oldest first
    pub fn completed_runs(&self) -> Vec<RunMetric> {
        self.completed_runs
            .lock()
            .map(|completed| completed.clone())
            .unwrap_or_default()
    }

    pub fn get_system_stats(&self) -> SystemStats {
        let active_runs = self.active_runs.lock().map(|active| active.len()).unwrap_or(0);
        let completed = self.completed_runs();

        let successful_runs = completed
            .iter()
            .filter(|run| run.status == RunStatus::Completed)
            .count();
        let avg_duration_ms = if completed.is_empty() {
            0.0
        } else {
            completed.iter().filter_map(|run| run.duration_ms).sum::<u64>() as f64 / completed.len() as f64
        };

        SystemStats {
            active_runs,
            completed_runs: completed.len(),
            successful_runs,
            failed_runs: completed.len() - successful_runs,
            avg_duration_ms,
            total_rows_converted: completed.iter().map(|run| run.rows_converted).sum(),
        }
    }
}

static MONITORING_SYSTEM: OnceCell<Arc<MonitoringSystem>> = OnceCell::new();

/// Initialize the global monitoring system; later calls are ignored
pub fn initialize_monitoring(config: MonitoringConfig) {
    let _ = MONITORING_SYSTEM.set(Arc::new(MonitoringSystem::new(config)));
}

/// The global monitoring system, created with defaults on first use
pub fn monitoring_system() -> Arc<MonitoringSystem> {
    MONITORING_SYSTEM
        .get_or_init(|| Arc::new(MonitoringSystem::new(MonitoringConfig::default())))
        .clone()
}
