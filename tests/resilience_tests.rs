//! Integration tests for the timeout guard and retry policy.

use cat_advisor::error::{classify, AuthenticationError, ErrorType, GeminiError};
use cat_advisor::resilience::{
    with_retry, with_timeout, with_timeout_detached, RetryOptions, TimeoutError,
};
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

fn transient() -> GeminiError {
    GeminiError::unexpected("HTTP 503: backend unavailable")
}

/// Paused-clock elapsed time, allowing for millisecond timer rounding.
fn assert_elapsed_ms(start: Instant, expected_ms: u64) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_millis(expected_ms)
            && elapsed < Duration::from_millis(expected_ms + 5),
        "expected ~{}ms, got {:?}",
        expected_ms,
        elapsed
    );
}

fn fast_options() -> RetryOptions<GeminiError> {
    RetryOptions::default()
        .with_initial_delay_ms(100)
        .with_max_delay_ms(1_000)
}

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_after_transient_failures() {
    // Arrange
    let calls = Arc::new(AtomicU32::new(0));
    let options = fast_options();

    // Act
    let start = Instant::now();
    let result = with_retry(
        || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok("advice")
                }
            }
        },
        &options,
    )
    .await;

    // Assert
    assert_eq!(result.unwrap(), "advice");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 100ms + 200ms of backoff.
    assert_elapsed_ms(start, 300);
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_wraps_last_error() {
    // Arrange
    let calls = Arc::new(AtomicU32::new(0));
    let options = fast_options().with_max_attempts(4).with_max_delay_ms(150);

    // Act
    let start = Instant::now();
    let result: Result<(), GeminiError> = with_retry(
        || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            }
        },
        &options,
    )
    .await;

    // Assert
    match result {
        Err(GeminiError::Retry(retry)) => {
            assert_eq!(retry.attempts, 4);
            assert_eq!(retry.last_error.to_string(), "HTTP 503: backend unavailable");
        }
        other => panic!("Expected Retry error, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    // 100 + 150 + 150: the cap applies from the second delay on.
    assert_elapsed_ms(start, 400);
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_is_returned_unchanged() {
    // Arrange
    let calls = Arc::new(AtomicU32::new(0));

    // Act
    let start = Instant::now();
    let result: Result<(), GeminiError> = with_retry(
        || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AuthenticationError::InvalidApiKey.into())
            }
        },
        &fast_options(),
    )
    .await;

    // Assert
    assert!(matches!(
        result,
        Err(GeminiError::Authentication(AuthenticationError::InvalidApiKey))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_elapsed_ms(start, 0);
}

#[tokio::test]
async fn test_single_attempt_always_wraps() {
    // Arrange
    let options = RetryOptions::<GeminiError>::no_retry();

    // Act
    let result: Result<(), GeminiError> =
        with_retry(|| async { Err(AuthenticationError::InvalidApiKey.into()) }, &options).await;

    // Assert
    match result {
        Err(GeminiError::Retry(retry)) => {
            assert_eq!(retry.attempts, 1);
            assert!(matches!(
                *retry.last_error,
                GeminiError::Authentication(AuthenticationError::InvalidApiKey)
            ));
        }
        other => panic!("Expected Retry error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_max_attempts_runs_once() {
    // Arrange
    let calls = Arc::new(AtomicU32::new(0));
    let options = fast_options().with_max_attempts(0);

    // Act
    let result: Result<(), GeminiError> = with_retry(
        || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            }
        },
        &options,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(GeminiError::Retry(ref retry)) if retry.attempts == 1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_custom_predicate_replaces_default() {
    // Arrange
    let calls = Arc::new(AtomicU32::new(0));
    let options = fast_options().with_should_retry(|_: &GeminiError| false);

    // Act
    let result: Result<(), GeminiError> = with_retry(
        || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            }
        },
        &options,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(GeminiError::Unexpected { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_inside_retry_is_classified_as_timeout() {
    // Arrange: every attempt outlives its 20ms deadline
    let calls = Arc::new(AtomicU32::new(0));
    let options = fast_options().with_should_retry(|e: &GeminiError| e.is_timeout());

    // Act
    let start = Instant::now();
    let result: Result<(), GeminiError> = with_retry(
        || {
            let calls = calls.clone();
            with_timeout(
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(50)).await;
                    Ok(())
                },
                20,
                None,
            )
        },
        &options,
    )
    .await;

    // Assert
    let error = result.unwrap_err();
    let details = classify(&error);
    assert_eq!(details.error_type, ErrorType::TimeoutError);
    assert_eq!(details.status_code, Some(504));
    assert!(!details.is_retryable);
    assert_eq!(
        details.error_message,
        "Operation failed after 3 attempts. Last error: Operation timed out after 20ms"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Three 20ms deadlines plus 100ms and 200ms of backoff.
    assert_elapsed_ms(start, 360);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fires_at_deadline() {
    // Arrange
    let start = Instant::now();

    // Act
    let result: Result<(), TimeoutError> =
        with_timeout(std::future::pending(), 50, None).await;

    // Assert
    let error = result.unwrap_err();
    assert_eq!(error.timeout_ms, 50);
    assert_eq!(error.to_string(), "Operation timed out after 50ms");
    assert_elapsed_ms(start, 50);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_fast_calls_pass_values_through() {
    // Arrange
    let start = Instant::now();

    // Act
    let results = join_all(
        (0..100u32).map(|i| with_timeout(async move { Ok::<_, TimeoutError>(i) }, 1_000, None)),
    )
    .await;

    // Assert
    let values: Vec<u32> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(values, (0..100u32).collect::<Vec<_>>());
    assert_eq!(values.iter().sum::<u32>(), 4950);
    // No deadline was reached, so the paused clock never advanced.
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_in_place_timeout_stops_operation() {
    // Arrange
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();

    // Act
    let result: Result<(), TimeoutError> = with_timeout(
        async move {
            sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        },
        10,
        None,
    )
    .await;
    sleep(Duration::from_millis(100)).await;

    // Assert
    assert_eq!(result.unwrap_err().timeout_ms, 10);
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_detached_timeout_lets_operation_finish() {
    // Arrange
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();

    // Act
    let result: Result<(), GeminiError> = with_timeout_detached(
        async move {
            sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        },
        10,
        Some("diagnosis took too long"),
    )
    .await;
    sleep(Duration::from_millis(100)).await;

    // Assert
    assert_eq!(result.unwrap_err().to_string(), "diagnosis took too long");
    assert!(finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_retries_are_independent() {
    // Arrange: each call fails once, then succeeds
    let total_calls = Arc::new(AtomicU32::new(0));
    let options = fast_options();

    // Act
    let results = join_all((0..100u32).map(|i| {
        let total_calls = total_calls.clone();
        let options = options.clone();
        async move {
            let own_calls = Arc::new(AtomicU32::new(0));
            with_retry(
                || {
                    let own_calls = own_calls.clone();
                    let total_calls = total_calls.clone();
                    async move {
                        total_calls.fetch_add(1, Ordering::SeqCst);
                        if own_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(transient())
                        } else {
                            Ok(i)
                        }
                    }
                },
                &options,
            )
            .await
        }
    }))
    .await;

    // Assert
    let values: Vec<u32> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(values, (0..100u32).collect::<Vec<_>>());
    assert_eq!(total_calls.load(Ordering::SeqCst), 200);
}
