//! Apply a local change first, then confirm it with the server.

use std::future::Future;

/// Mutate `state` with `apply`, then run `reconcile`.
///
/// On `Ok` the change stays. On `Err` `state` is restored to the value it
/// had before `apply` and the error is returned.
///
/// # Errors
///
/// Returns whatever `reconcile` returns.
pub async fn apply_then_reconcile<S, T, E, A, R, Fut>(state: &mut S, apply: A, reconcile: R) -> Result<T, E>
where
    S: Clone,
    A: FnOnce(&mut S),
    R: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let snapshot = state.clone();
    apply(state);
    match reconcile().await {
        Ok(value) => Ok(value),
        Err(e) => {
            *state = snapshot;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keeps_change_on_success() {
        let mut available = false;
        let result: Result<&str, ()> =
            apply_then_reconcile(&mut available, |a| *a = true, || async { Ok("activated") }).await;
        assert_eq!(result, Ok("activated"));
        assert!(available);
    }

    #[tokio::test]
    async fn test_restores_on_failure() {
        let mut statuses = vec!["pending", "confirmed"];
        let result: Result<(), &str> = apply_then_reconcile(
            &mut statuses,
            |s| {
                if let Some(first) = s.first_mut() {
                    *first = "shipped";
                }
            },
            || async { Err("boom") },
        )
        .await;
        assert_eq!(result, Err("boom"));
        assert_eq!(statuses, ["pending", "confirmed"]);
    }
}
