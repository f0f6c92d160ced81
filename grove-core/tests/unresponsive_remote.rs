//! Fetching from a remote that accepts connections and never answers.
//!
//! Kept in its own test binary: it sets process-global libgit2 transport
//! options, which must happen before any other thread uses libgit2.

use std::io::Read;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use grove_core::git::configure_transport_timeouts;
use grove_core::{InspectionOutcome, InspectionRequest, RepositoryHandle, RepositoryInspector};
use grove_test_utils::{FleetGuard, INITIAL_BRANCH, add_remote};

#[tokio::test]
async fn silent_remote_is_abandoned_and_the_connection_closed() {
  let limit = Duration::from_millis(300);
  // SAFETY: the only test in this binary, and no libgit2 call has happened yet.
  unsafe { configure_transport_timeouts(limit) }.unwrap();

  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let port = listener.local_addr().unwrap().port();
  let (closed_tx, closed_rx) = mpsc::channel();
  thread::spawn(move || {
    let (mut stream, _) = listener.accept().unwrap();
    let mut buf = [0u8; 1024];
    // Swallow the request and never reply; a zero-length read means the
    // client hung up.
    while let Ok(read) = stream.read(&mut buf) {
      if read == 0 {
        break;
      }
    }
    let _ = closed_tx.send(Instant::now());
  });

  let fleet = FleetGuard::new();
  let repo = fleet.add_repo("alpha").unwrap();
  add_remote(&repo, "origin", &format!("http://127.0.0.1:{port}/alpha.git")).unwrap();

  let request = InspectionRequest::builder(INITIAL_BRANCH)
    .sync_before_inspect(true)
    .sync_timeout(limit)
    .build()
    .unwrap();
  let handle = RepositoryHandle::from_path(fleet.repo_path("alpha")).unwrap();

  let started = Instant::now();
  let result = RepositoryInspector::new().inspect(&handle, &request).await;
  let returned = Instant::now();

  assert!(returned - started < Duration::from_secs(5));
  assert!(!result.sync_succeeded);
  assert!(result.sync_error.as_deref().unwrap().contains("timed out"));
  assert_eq!(result.outcome(), InspectionOutcome::Satisfied);

  let closed_at = closed_rx
    .recv_timeout(Duration::from_secs(5))
    .expect("fetch still holds its connection");
  assert!(closed_at <= returned + Duration::from_secs(1));
}
