//! Recover-once retry decorator
//!
//! Wraps an operation so that an error matching a predicate triggers a recovery
//! action (e.g. reloading a credential) followed by exactly one retry of the
//! operation. Anything else is returned as-is.

use std::fmt::Display;
use std::future::Future;

use tracing::{debug, warn};

/// Runs `operation`, recovering and retrying once on a matching error
///
/// # Arguments
/// * `operation` - The operation to run; called at most twice
/// * `should_recover` - Decides whether an error is worth a recovery attempt
/// * `recover` - Recovery action run at most once, between the two attempts
///
/// # Returns
/// * The first attempt's result if it succeeded or did not match `should_recover`
/// * The original error if the recovery action failed
/// * Otherwise the result of the second attempt
pub async fn recover_once<T, E, Op, OpFut, P, R, RFut, RE>(
    mut operation: Op,
    should_recover: P,
    recover: R,
) -> Result<T, E>
where
    Op: FnMut() -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    R: FnOnce() -> RFut,
    RFut: Future<Output = Result<(), RE>>,
    E: Display,
    RE: Display,
{
    let error = match operation().await {
        Ok(value) => return Ok(value),
        Err(e) if should_recover(&e) => e,
        Err(e) => return Err(e),
    };

    debug!(error = %error, "attempting recovery before retry");
    if let Err(recovery_error) = recover().await {
        warn!(error = %error, recovery_error = %recovery_error, "recovery failed, giving up");
        return Err(error);
    }

    operation().await
}
