//! Transport primitives for the authorization-code exchange.
//!
//! [`ExchangeTransport`] is the crate's only dependency on an HTTP stack. Each code exchange gets
//! a short-lived [`AsyncHttpClient`] handle carrying a [`ResponseTraceSlot`]; implementations call
//! [`ResponseTraceSlot::take`] before dispatching and [`ResponseTraceSlot::store`] once a status
//! or retry hint is known, so error mapping can classify failures with consistent trace data.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// HTTP transport able to execute token-endpoint requests while publishing response traces.
///
/// Implementations must be `Send + Sync + 'static` so one transport can serve every login
/// concurrently, and the handles they return must own their state so request futures stay `Send`
/// for the lifetime of the in-flight exchange.
pub trait ExchangeTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseTraceSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle that records request outcomes in `slot`.
	///
	/// Handles must clear the slot before submitting the request so stale traces never leak
	/// across attempts.
	fn with_trace(&self, slot: ResponseTraceSlot) -> Self::Handle;
}

/// Trace captured from the most recent token-endpoint response.
#[derive(Clone, Debug, Default)]
pub struct ResponseTrace {
	/// HTTP status code, if a response arrived.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot sharing a [`ResponseTrace`] between the transport and error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseTraceSlot(Arc<Mutex<Option<ResponseTrace>>>);
impl ResponseTraceSlot {
	/// Stores the trace for the current request.
	pub fn store(&self, trace: ResponseTrace) {
		*self.0.lock() = Some(trace);
	}

	/// Returns and clears the captured trace, if any.
	pub fn take(&self) -> Option<ResponseTrace> {
		self.0.lock().take()
	}
}

/// [`ExchangeTransport`] backed by [`ReqwestClient`].
///
/// Configure any custom client to not follow redirects; token endpoints return results directly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestExchange(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestExchange {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestExchange {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestExchange {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ExchangeTransport for ReqwestExchange {
	type Handle = TracedHandle;
	type TransportError = ReqwestError;

	fn with_trace(&self, slot: ResponseTraceSlot) -> Self::Handle {
		TracedHandle::new(self.0.clone(), slot)
	}
}

#[cfg(feature = "reqwest")]
struct TracedClient {
	client: ReqwestClient,
	slot: ResponseTraceSlot,
}

/// Handle returned by [`ReqwestExchange`]; records status and retry hints as requests resolve.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct TracedHandle(Arc<TracedClient>);
#[cfg(feature = "reqwest")]
impl TracedHandle {
	fn new(client: ReqwestClient, slot: ResponseTraceSlot) -> Self {
		Self(Arc::new(TracedClient { client, slot }))
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for TracedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let inner = Arc::clone(&self.0);

		Box::pin(async move {
			inner.slot.take();

			let response = inner
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = parse_retry_after(&headers);

			inner.slot.store(ResponseTrace { status: Some(status.as_u16()), retry_after });

			let mut mapped = HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*mapped.status_mut() = status;
			*mapped.headers_mut() = headers;

			Ok(mapped)
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn trace_slot_take_clears_the_slot() {
		let slot = ResponseTraceSlot::default();

		assert!(slot.take().is_none());
		slot.store(ResponseTrace { status: Some(429), retry_after: Some(Duration::seconds(3)) });

		let trace = slot.take().expect("Stored trace should be returned.");

		assert_eq!(trace.status, Some(429));
		assert!(slot.take().is_none());
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_parses_seconds_and_rfc2822() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "7".parse().unwrap());

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(7)));

		let future = (OffsetDateTime::now_utc() + Duration::minutes(2))
			.format(&Rfc2822)
			.expect("Formatting a timestamp should succeed.");

		headers.insert(RETRY_AFTER, future.parse().unwrap());

		let parsed = parse_retry_after(&headers).expect("Future timestamps should parse.");

		assert!(parsed > Duration::seconds(60));

		headers.insert(RETRY_AFTER, "not-a-hint".parse().unwrap());

		assert_eq!(parse_retry_after(&headers), None);
	}
}
