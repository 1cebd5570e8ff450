//! # agglo-proof
//!
//! Focused proofreading over a region adjacency graph.
//!
//! This crate provides:
//! - [`scheduler::EdgePriorityScheduler`]: interactive review of uncertain
//!   edges in priority order, with reversible decisions
//! - A process-wide session facade mirroring the external scheduler API:
//!   explicit `initialize`, accessors that fail with `NotInitialized`
//!   before it, and replacement of the previous instance on re-init
//!
//! The session facade is the in-process equivalent of the surface formerly
//! exposed as a language binding.

use agglo_core::{Label, RagError};
use agglo_train::{CentroidClassifier, MomentFeatures};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

pub mod scheduler;

pub use scheduler::EdgePriorityScheduler;

/// Scheduler carried by the ambient session: the built-in geometry
/// aggregator and an untrained classifier, so merge probabilities fall
/// back to the weights stored in the graph file.
pub type SessionScheduler = EdgePriorityScheduler<MomentFeatures, CentroidClassifier>;

/// Errors in proofreading sessions
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("scheduler not initialized")]
    NotInitialized,
    #[error("priority bounds not properly set: min {min}, max {max}, start {start}")]
    InvalidBounds { min: f64, max: f64, start: f64 },
    #[error(transparent)]
    Rag(#[from] RagError),
}

/// Result type for proofreading operations
pub type ProofResult<T> = Result<T, ProofError>;

// ============================================================================
// Process-wide session
// ============================================================================

/// The ambient scheduler instance: `None` at startup, set by `initialize`,
/// replaced wholesale on re-initialization.
static SESSION: Mutex<Option<SessionScheduler>> = Mutex::new(None);

fn session() -> MutexGuard<'static, Option<SessionScheduler>> {
    SESSION.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Start (or restart) the ambient session from a graph file.
///
/// Returns `Ok(true)` on success and `Ok(false)` when the file is missing
/// or malformed; illegal bounds fail with `InvalidBounds` before the file
/// is touched. Any previous session is released on replacement.
pub fn initialize(path: &Path, min_val: f64, max_val: f64, start_val: f64) -> ProofResult<bool> {
    let scheduler = match SessionScheduler::from_graph_file(path, min_val, max_val, start_val) {
        Ok(scheduler) => scheduler,
        Err(ProofError::Rag(RagError::IoFailure(_)))
        | Err(ProofError::Rag(RagError::MalformedInput(_))) => return Ok(false),
        Err(err) => return Err(err),
    };
    *session() = Some(scheduler);
    Ok(true)
}

/// Write the session's current graph. Returns `Ok(false)` on I/O failure.
pub fn export(path: &Path) -> ProofResult<bool> {
    let guard = session();
    let scheduler = guard.as_ref().ok_or(ProofError::NotInitialized)?;
    Ok(scheduler.export(path).is_ok())
}

/// The next edge to review with its boundary location, or `None` when the
/// session is finished.
pub fn get_next_edge() -> ProofResult<Option<((Label, Label), (u32, u32, u32))>> {
    let mut guard = session();
    let scheduler = guard.as_mut().ok_or(ProofError::NotInitialized)?;
    Ok(scheduler
        .get_top_edge()
        .map(|(u, v, [x, y, z])| ((u, v), (x, y, z))))
}

/// Record a review decision: `remove == true` merges the two bodies,
/// `remove == false` preserves the boundary.
pub fn set_edge_result(body_pair: (Label, Label), remove: bool) -> ProofResult<()> {
    let mut guard = session();
    let scheduler = guard.as_mut().ok_or(ProofError::NotInitialized)?;
    scheduler.remove_edge(body_pair, remove)
}

/// Estimated number of edges still awaiting review
pub fn get_estimated_num_remaining_edges() -> ProofResult<u32> {
    let guard = session();
    let scheduler = guard.as_ref().ok_or(ProofError::NotInitialized)?;
    Ok(scheduler.num_remaining())
}

/// Mean per-decision prediction error over the session so far
pub fn get_average_prediction_error() -> ProofResult<f64> {
    let guard = session();
    let scheduler = guard.as_ref().ok_or(ProofError::NotInitialized)?;
    Ok(scheduler.average_prediction_error())
}

/// Percentage of decisions agreeing with the stored predictions
pub fn get_percent_prediction_correct() -> ProofResult<f64> {
    let guard = session();
    let scheduler = guard.as_ref().ok_or(ProofError::NotInitialized)?;
    Ok(scheduler.percent_prediction_correct())
}

/// Revert the most recent decision; false when nothing remains to undo
pub fn undo() -> ProofResult<bool> {
    let mut guard = session();
    let scheduler = guard.as_mut().ok_or(ProofError::NotInitialized)?;
    scheduler.undo()
}
