//! Remote synchronization before inspection.
//!
//! Fetches every configured remote with pruning so remote-tracking refs
//! reflect the server. Only remote-tracking refs change; the working tree and
//! local branches are left alone.

use std::cell::Cell;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use git2::{CertificateCheckStatus, Cred, CredentialType, FetchOptions, FetchPrune, RemoteCallbacks, Repository};
use tokio::task;
use tracing::{debug, info, warn};

use super::repository::open_for_sync;
use crate::error::SyncError;

/// Credential callbacks give up after this many attempts for one URL.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Something that can bring a repository's remote-tracking refs up to date.
///
/// The inspector enforces `timeout` around the returned future. Dropping the
/// future must stop the underlying transfer promptly; implementations that
/// cannot be interrupted should finish on their own within `timeout`.
pub trait RemoteSync: Send + Sync + 'static {
  fn sync(&self, repository_path: &Path, timeout: Duration) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Fetch all remotes through libgit2 on the blocking pool.
///
/// Transfers stop at the deadline or as soon as the returned future is
/// dropped. A connection that goes silent is only noticed once libgit2's
/// socket timeouts fire, see [`configure_transport_timeouts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Sync;

impl RemoteSync for Git2Sync {
  async fn sync(&self, repository_path: &Path, timeout: Duration) -> Result<(), SyncError> {
    let path = repository_path.to_path_buf();
    let cancelled = Arc::new(AtomicBool::new(false));
    let _guard = CancelOnDrop(Arc::clone(&cancelled));

    match task::spawn_blocking(move || fetch_all_remotes(&path, timeout, &cancelled)).await {
      Ok(result) => result,
      Err(e) => Err(SyncError::Aborted(e.to_string())),
    }
  }
}

/// Raises the flag when the owning future is dropped.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
  fn drop(&mut self) {
    self.0.store(true, Ordering::Relaxed);
  }
}

/// Bound libgit2's connect and socket read/write waits to `limit`.
///
/// Without this a remote that accepts a connection and never answers keeps a
/// fetch blocked inside libgit2, where no callback can stop it.
///
/// # Safety
///
/// Writes process-global libgit2 options without synchronization. Call it
/// before any other thread uses libgit2.
pub unsafe fn configure_transport_timeouts(limit: Duration) -> Result<(), git2::Error> {
  let millis = i32::try_from(limit.as_millis()).unwrap_or(i32::MAX).max(1);
  debug!(millis, "Configuring git transport timeouts");

  unsafe {
    git2::opts::set_server_connect_timeout_in_milliseconds(millis)?;
    git2::opts::set_server_timeout_in_milliseconds(millis)?;
  }
  Ok(())
}

/// Fetch every remote of the repository at `path`, pruning stale
/// remote-tracking branches.
///
/// Gives up with [`SyncError::TimedOut`] once `limit` has elapsed or
/// `cancelled` is raised; a transfer in progress is interrupted at its next
/// callback.
pub fn fetch_all_remotes(path: &Path, limit: Duration, cancelled: &AtomicBool) -> Result<(), SyncError> {
  let stop = Stop {
    deadline: Instant::now() + limit,
    cancelled,
  };

  let repo = open_for_sync(path)?;
  let remotes = repo.remotes().map_err(|source| SyncError::Remote {
    remote: "*".to_string(),
    source,
  })?;

  if remotes.is_empty() {
    debug!(path = %path.display(), "Repository has no remotes, nothing to sync");
    return Ok(());
  }

  let mut first_error = None;
  for remote_name in remotes.iter().flatten() {
    if stop.requested() {
      return Err(SyncError::TimedOut(limit));
    }
    info!(path = %path.display(), remote = remote_name, "Fetching remote");

    if let Err(source) = fetch_remote(&repo, remote_name, &stop) {
      if stop.requested() {
        debug!(path = %path.display(), remote = remote_name, error = %source, "Fetch interrupted");
        return Err(SyncError::TimedOut(limit));
      }
      warn!(path = %path.display(), remote = remote_name, error = %source, "Fetch failed");
      first_error.get_or_insert(SyncError::Remote {
        remote: remote_name.to_string(),
        source,
      });
    }
  }

  match first_error {
    Some(err) => Err(err),
    None => Ok(()),
  }
}

struct Stop<'a> {
  deadline: Instant,
  cancelled: &'a AtomicBool,
}

impl Stop<'_> {
  fn requested(&self) -> bool {
    self.cancelled.load(Ordering::Relaxed) || Instant::now() >= self.deadline
  }
}

fn fetch_remote(repo: &Repository, remote_name: &str, stop: &Stop<'_>) -> Result<(), git2::Error> {
  let config = repo.config()?;
  let attempts = Cell::new(0usize);

  let mut callbacks = RemoteCallbacks::new();
  callbacks.transfer_progress(|_| !stop.requested());
  callbacks.sideband_progress(|_| !stop.requested());
  callbacks.certificate_check(|_, _| {
    if stop.requested() {
      return Err(git2::Error::from_str("fetch cancelled"));
    }
    Ok(CertificateCheckStatus::CertificatePassthrough)
  });
  callbacks.credentials(|url, username, allowed| {
    if stop.requested() {
      return Err(git2::Error::from_str("fetch cancelled"));
    }
    attempts.set(attempts.get() + 1);
    if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
      return Err(git2::Error::from_str("no usable credentials for remote"));
    }

    if allowed.contains(CredentialType::SSH_KEY)
      && let Some(user) = username
    {
      return Cred::ssh_key_from_agent(user);
    }
    if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
      return Cred::credential_helper(&config, url, username);
    }
    Cred::default()
  });

  let mut fetch_options = FetchOptions::new();
  fetch_options.prune(FetchPrune::On);
  fetch_options.remote_callbacks(callbacks);

  let mut remote = repo.find_remote(remote_name)?;
  remote.fetch(&[] as &[&str], Some(&mut fetch_options), None)?;

  Ok(())
}
