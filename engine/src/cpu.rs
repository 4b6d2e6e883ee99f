//! CPU pinning and real-time scheduling for the engine's hot threads.
//!
//! Every pinned thread calls [`apply`] with its slot of `[cpu_config]`
//! once, immediately after spawn and before touching any hot-path state.
//! A core value of `-1` means "no affinity requested" and `apply` is a
//! no-op in that case, matching the config section's documented default.

use thiserror::Error;

/// Failure pinning or prioritizing the calling thread. Startup-only; never
/// returned from a hot-path call.
#[derive(Debug, Error)]
pub enum CpuError {
    /// The OS rejected the affinity request for the given core index.
    #[error("failed to pin thread to core {0}")]
    PinFailed(usize),
    /// The OS rejected the real-time scheduling request.
    #[error("failed to set real-time priority {0} (may need CAP_SYS_NICE or root)")]
    PriorityFailed(i32),
}

/// Pin the calling thread to `core`. No-op if `core` is negative.
///
/// # Errors
/// Returns [`CpuError::PinFailed`] if the OS rejects the affinity request.
pub fn pin_to_core(core: i32) -> Result<(), CpuError> {
    if core < 0 {
        return Ok(());
    }
    let core = core as usize;
    let id = core_affinity::CoreId { id: core };
    if core_affinity::set_for_current(id) {
        tracing::info!("pinned thread to CPU core {core}");
        Ok(())
    } else {
        Err(CpuError::PinFailed(core))
    }
}

/// Request real-time (`SCHED_FIFO`) scheduling at `priority` for the
/// calling thread. No-op on platforms other than Linux.
///
/// # Errors
/// Returns [`CpuError::PriorityFailed`] if the OS rejects the request,
/// typically for lack of `CAP_SYS_NICE`.
#[cfg(target_os = "linux")]
pub fn set_realtime_priority(priority: i32) -> Result<(), CpuError> {
    let param = libc::sched_param { sched_priority: priority };
    // SAFETY: `param` outlives the call and `sched_setscheduler` only reads it.
    let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if rc == 0 {
        tracing::info!("set thread priority to SCHED_FIFO:{priority}");
        Ok(())
    } else {
        Err(CpuError::PriorityFailed(priority))
    }
}

/// Request real-time scheduling (non-Linux platforms: a no-op).
///
/// # Errors
/// Never returns an error on this platform.
#[cfg(not(target_os = "linux"))]
pub fn set_realtime_priority(_priority: i32) -> Result<(), CpuError> {
    tracing::warn!("real-time priority is not supported on this platform");
    Ok(())
}

/// Number of cores the OS reports as available, for log/diagnostics use.
#[must_use]
pub fn num_cores() -> usize {
    core_affinity::get_core_ids().map(|ids| ids.len()).unwrap_or(1)
}

/// Pin the calling thread to `core` and, if `enable_realtime` is set,
/// request `priority`. Called once at the top of every hot thread's
/// `run` function with its slot of `[cpu_config]`.
///
/// # Errors
/// Propagates either step's failure; pinning is attempted first.
pub fn apply(core: i32, enable_realtime: bool, priority: i32) -> Result<(), CpuError> {
    pin_to_core(core)?;
    if enable_realtime {
        set_realtime_priority(priority)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_core_is_a_no_op() {
        assert!(pin_to_core(-1).is_ok());
    }

    #[test]
    fn num_cores_is_at_least_one() {
        assert!(num_cores() >= 1);
    }

    #[test]
    fn apply_with_realtime_disabled_only_attempts_pinning() {
        // Core -1 and realtime disabled: both steps are no-ops regardless
        // of sandbox privileges, so this must always succeed.
        assert!(apply(-1, false, 0).is_ok());
    }
}
