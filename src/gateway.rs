//! Remote content store operations wrapped in bounded retry.
//!
//! [`RemoteContentGateway`] performs downloads and folder provisioning against a remote
//! content store through the object-safe [`ContentSession`] hooks, opening a
//! credential-backed session when the ambient one carries no authorization and retrying
//! transient faults through a [`ResilientExecutor`].

// self
use crate::{
	_prelude::*,
	credential::{CredentialCache, UserContext},
	retry::{FaultKind, ResilientExecutor, RetryPolicy, Sleeper},
};
#[cfg(feature = "tokio")] use crate::retry::TokioSleeper;

/// Future type returned by content session operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteFault>> + 'a + Send>>;

/// Error type produced by remote content operations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RemoteFault {
	/// Remote store throttled or glitched; a retry may succeed.
	#[error("Transient remote failure: {message}.")]
	Transient {
		/// Human-readable error payload.
		message: String,
	},
	/// Remote store rejected the operation; retrying cannot help.
	#[error("Permanent remote failure: {message}.")]
	Permanent {
		/// Human-readable error payload.
		message: String,
	},
	/// Requested item does not exist.
	#[error("Remote item not found: {path}.")]
	NotFound {
		/// Path of the missing item.
		path: String,
	},
}
impl RemoteFault {
	/// Retry verdict for this fault.
	pub fn kind(&self) -> FaultKind {
		match self {
			Self::Transient { .. } => FaultKind::Transient,
			Self::Permanent { .. } | Self::NotFound { .. } => FaultKind::Permanent,
		}
	}
}

/// Pull-based byte stream handed back by content sessions.
///
/// The transport retains ownership of the underlying connection, so callers must drain
/// the stream into an owned buffer before issuing further requests on the same session.
/// A partially-read stream shared across requests corrupts the remaining bytes.
pub trait ByteStream
where
	Self: Send,
{
	/// Reads the next chunk, returning `None` at end of stream.
	fn next_chunk(&mut self) -> SessionFuture<'_, Option<Vec<u8>>>;
}

/// Session against one site of the remote content store.
pub trait ContentSession
where
	Self: Send + Sync,
{
	/// Opens the file at `path` for reading.
	fn open_file<'a>(&'a self, path: &'a str) -> SessionFuture<'a, Box<dyn ByteStream>>;

	/// Probes whether a folder exists at `path`.
	///
	/// A missing folder is reported as [`RemoteFault::NotFound`].
	fn probe_folder<'a>(&'a self, path: &'a str) -> SessionFuture<'a, ()>;

	/// Creates the folder `name` under `parent_path`.
	fn create_folder<'a>(&'a self, parent_path: &'a str, name: &'a str) -> SessionFuture<'a, ()>;

	/// Executes any still-queued requests on this session.
	fn drain_pending(&self) -> SessionFuture<'_, ()>;

	/// Whether this session carries attached authorization.
	fn has_authorization(&self) -> bool;
}

/// Opens [`ContentSession`] values scoped to a site.
pub trait SessionOpener
where
	Self: Send + Sync,
{
	/// Opens a session against `site_address` under the supplied user context.
	fn open<'a>(
		&'a self,
		site_address: &'a str,
		user: &'a UserContext,
	) -> SessionFuture<'a, Arc<dyn ContentSession>>;
}

/// File content copied out of the remote store into an owned buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContent {
	/// Path the content was downloaded from.
	pub path: String,
	/// Downloaded bytes.
	pub bytes: Vec<u8>,
}

/// Retry-wrapped facade over the remote content store.
pub struct RemoteContentGateway<S> {
	executor: ResilientExecutor<S>,
	credentials: Arc<CredentialCache>,
	opener: Arc<dyn SessionOpener>,
}
#[cfg(feature = "tokio")]
impl RemoteContentGateway<TokioSleeper> {
	/// Creates a gateway running the default retry policy on the Tokio clock.
	pub fn new(credentials: Arc<CredentialCache>, opener: Arc<dyn SessionOpener>) -> Self {
		Self::with_executor(ResilientExecutor::new(RetryPolicy::default()), credentials, opener)
	}
}
impl<S> RemoteContentGateway<S>
where
	S: Sleeper,
{
	/// Creates a gateway with a custom retry executor.
	pub fn with_executor(
		executor: ResilientExecutor<S>,
		credentials: Arc<CredentialCache>,
		opener: Arc<dyn SessionOpener>,
	) -> Self {
		Self { executor, credentials, opener }
	}

	/// Downloads the file at `path` into an owned buffer.
	///
	/// When the ambient `session` carries no authorization, a fresh session scoped to
	/// `site_address` is opened under the cached credential for that site (anonymous when
	/// none is cached). Still-pending requests on the ambient session are drained before
	/// the content is returned.
	pub async fn download_file(
		&self,
		session: Arc<dyn ContentSession>,
		site_address: &str,
		path: &str,
	) -> Result<FileContent, RemoteFault> {
		let reader = if session.has_authorization() {
			Arc::clone(&session)
		} else {
			let user = self.credentials.user_context_for(site_address);

			tracing::debug!(
				site_address,
				anonymous = user.is_anonymous(),
				"Opening a scoped session for the download.",
			);

			self.opener.open(site_address, &user).await?
		};
		let content = self
			.executor
			.run(&RemoteFault::kind, || async {
				let mut stream = reader.open_file(path).await?;
				let mut bytes = Vec::new();

				while let Some(chunk) = stream.next_chunk().await? {
					bytes.extend_from_slice(&chunk);
				}

				Ok(FileContent { path: path.to_owned(), bytes })
			})
			.await?;

		self.drain_with_retry(&session).await?;

		Ok(content)
	}

	/// Ensures every segment of `folder_path` exists under `container_path`.
	///
	/// Segments are probed and created parent-first; a probe reporting
	/// [`RemoteFault::NotFound`] marks the segment for creation instead of failing the
	/// call. Returns the number of folders actually created, which is zero when the full
	/// path already exists.
	pub async fn ensure_folder_path(
		&self,
		session: &Arc<dyn ContentSession>,
		container_path: &str,
		folder_path: &str,
	) -> Result<u32, RemoteFault> {
		let mut created = 0;
		let mut current = container_path.trim_end_matches('/').to_owned();

		for segment in folder_path.split('/').filter(|segment| !segment.is_empty()) {
			let candidate = format!("{current}/{segment}");
			let exists = self
				.executor
				.run(&RemoteFault::kind, || async {
					match session.probe_folder(&candidate).await {
						Ok(()) => Ok(true),
						Err(RemoteFault::NotFound { .. }) => Ok(false),
						Err(other) => Err(other),
					}
				})
				.await?;

			if !exists {
				self.executor
					.run(&RemoteFault::kind, || session.create_folder(&current, segment))
					.await?;

				created += 1;

				tracing::debug!(folder = %candidate, "Created missing folder segment.");
			}

			current = candidate;
		}

		Ok(created)
	}

	async fn drain_with_retry(&self, session: &Arc<dyn ContentSession>) -> Result<(), RemoteFault> {
		self.executor.run(&RemoteFault::kind, || session.drain_pending()).await
	}
}
