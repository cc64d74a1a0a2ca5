//! The pre-fork ownership guard, exercised against a simulated buffer pool.

use bytes::{Bytes, BytesMut};
use perco_core::{BroadcastRequest, PercolateRequest};

/// A 1024-byte pooled buffer is handed to the request as a shared payload.
/// After the guard runs, the pool must be able to reclaim and overwrite its
/// buffer without the request's payload changing.
#[test]
fn guard_copies_shared_buffer_before_fork() {
    let mut pool = BytesMut::with_capacity(1024);
    pool.resize(1024, 0xa7);
    let view: Bytes = pool.freeze();

    let mut request = PercolateRequest::new("products", "item").source_shared(view.clone());
    assert!(request.payload().unwrap().is_shared());

    request.before_local_fork();

    // The request no longer references the pool's allocation: the view is
    // uniquely held, so the pool can take it back and reuse it.
    let mut reclaimed = view
        .try_into_mut()
        .expect("pool buffer must be uniquely held after the guard");
    reclaimed.fill(0x00);

    let payload = request.payload().unwrap();
    assert_eq!(payload.len(), 1024);
    assert!(
        payload.as_slice().iter().all(|&b| b == 0xa7),
        "defensive copy must be unaffected by buffer reuse"
    );
}

/// Calling the hook twice must not copy a second time.
#[test]
fn guard_is_idempotent_across_calls() {
    let mut request = PercolateRequest::new("products", "item")
        .source_shared(Bytes::from_static(b"pooled document"));

    request.before_local_fork();
    let first = request.payload().unwrap().as_slice().as_ptr();
    let bytes_after_first = request.payload().unwrap().as_slice().to_vec();

    request.before_local_fork();
    assert_eq!(request.payload().unwrap().as_slice().as_ptr(), first);
    assert_eq!(request.payload().unwrap().as_slice(), &bytes_after_first[..]);
}

/// Owned payloads never pay for a copy at the fork boundary.
#[test]
fn guard_never_copies_owned_payloads() {
    let mut request = PercolateRequest::new("products", "item").source_string("{}");
    let ptr = request.payload().unwrap().as_slice().as_ptr();
    request.before_local_fork();
    assert_eq!(request.payload().unwrap().as_slice().as_ptr(), ptr);
}
