//! Structured logging utilities
//!
//! Field-structured tracing events for the scheduling service cluster.
//! Logging here is informational only and never load-bearing for
//! scheduling correctness.

use tracing::{error, info, warn};
use uuid::Uuid;

/// Structured logging utilities
pub struct StructuredLogger;

impl StructuredLogger {
    /// Log a successful task assignment
    pub fn log_task_assigned(task_id: i64, worker_id: &str, match_score: f64) {
        info!(
            event = "task_assigned",
            task.id = task_id,
            worker.id = worker_id,
            assignment.match_score = match_score,
            "Task assigned to worker"
        );
    }

    /// Log the outcome of a priority recalculation sweep
    pub fn log_priority_recalculated(scanned: usize, changed: usize, high_impact: usize) {
        info!(
            event = "priority_recalculated",
            priority.scanned = scanned,
            priority.changed = changed,
            priority.high_impact = high_impact,
            "Priority recalculation completed"
        );
    }

    /// Log how an urgent task was handled
    pub fn log_urgent_task_handled(task_id: i64, strategy: &str, preempted_task_id: Option<i64>) {
        match preempted_task_id {
            Some(victim_id) => warn!(
                event = "urgent_task_handled",
                task.id = task_id,
                urgent.strategy = strategy,
                urgent.preempted_task_id = victim_id,
                "Urgent task handled via preemption"
            ),
            None => info!(
                event = "urgent_task_handled",
                task.id = task_id,
                urgent.strategy = strategy,
                "Urgent task handled"
            ),
        }
    }

    /// Log batch scheduling completion
    pub fn log_batch_completed(
        batch_id: Uuid,
        total: usize,
        assigned: usize,
        assignment_rate: f64,
        duration_ms: u64,
    ) {
        info!(
            event = "batch_completed",
            batch.id = %batch_id,
            batch.total = total,
            batch.assigned = assigned,
            batch.assignment_rate = assignment_rate,
            batch.duration_ms = duration_ms,
            "Batch scheduling completed"
        );
    }

    /// Log a system-level error in a scheduling component
    pub fn log_system_error(component: &str, operation: &str, error: &dyn std::error::Error) {
        error!(
            event = "system_error",
            error.component = component,
            error.operation = operation,
            error.message = %error,
            "Scheduling component error"
        );
    }
}
