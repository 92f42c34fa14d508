//! Flight state shared by every clone of a gateway.
//!
//! The state is either idle or refreshing with a FIFO queue of parked callers. All transitions
//! happen under one `parking_lot` mutex that is never held across an `.await`: a caller either
//! becomes the refresher (receiving a [`RefreshGuard`]) or is parked (receiving a
//! [`PendingHandle`]) in a single critical section, so two refreshes can never overlap.

// std
use std::mem;
// crates.io
use futures::channel::oneshot;
// self
use crate::{_prelude::*, auth::TokenSecret, error::AuthError, gateway::GatewayMetrics};

pub(crate) type Continuation = oneshot::Sender<Result<TokenSecret, AuthError>>;

#[derive(Debug, Default)]
pub(crate) struct Flight {
	state: FlightState,
	next_ticket: u64,
}
impl Flight {
	pub(crate) fn is_refreshing(&self) -> bool {
		matches!(self.state, FlightState::Refreshing(_))
	}

	pub(crate) fn queued_len(&self) -> usize {
		match &self.state {
			FlightState::Idle => 0,
			FlightState::Refreshing(queue) => queue.len(),
		}
	}

	fn take_queue(&mut self) -> VecDeque<Pending> {
		match mem::replace(&mut self.state, FlightState::Idle) {
			FlightState::Idle => VecDeque::new(),
			FlightState::Refreshing(queue) => queue,
		}
	}
}

#[derive(Debug, Default)]
enum FlightState {
	#[default]
	Idle,
	Refreshing(VecDeque<Pending>),
}

/// Parked caller waiting for the in-flight refresh.
///
/// Only the continuation is parked. The caller keeps its own request and replays it on its own
/// task once the token arrives, so a dropped refresher can never strand a replay halfway.
pub(crate) struct Pending {
	ticket: u64,
	pub(crate) continuation: Continuation,
}
impl Debug for Pending {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Pending")
			.field("ticket", &self.ticket)
			.field("abandoned", &self.continuation.is_canceled())
			.finish()
	}
}

pub(crate) enum Admission {
	Lead(RefreshGuard),
	Wait(PendingHandle),
}

/// Becomes the refresher when idle, otherwise parks the caller at the queue tail.
pub(crate) fn admit(flight: &Arc<Mutex<Flight>>, metrics: &Arc<GatewayMetrics>) -> Admission {
	let mut guard = flight.lock();
	let Flight { state, next_ticket } = &mut *guard;

	if let FlightState::Refreshing(queue) = state {
		let ticket = *next_ticket;
		let (continuation, receiver) = oneshot::channel();

		queue.push_back(Pending { ticket, continuation });
		*next_ticket += 1;
		metrics.record_queued();

		return Admission::Wait(PendingHandle {
			ticket,
			receiver,
			flight: flight.clone(),
			metrics: metrics.clone(),
		});
	}

	*state = FlightState::Refreshing(VecDeque::new());

	Admission::Lead(RefreshGuard { flight: flight.clone(), armed: true })
}

/// Held by the refresher; returns the flight to idle when settled or dropped.
pub(crate) struct RefreshGuard {
	flight: Arc<Mutex<Flight>>,
	armed: bool,
}
impl RefreshGuard {
	/// Returns the flight to idle and hands over the parked callers in arrival order.
	pub(crate) fn settle(mut self) -> VecDeque<Pending> {
		self.armed = false;

		self.flight.lock().take_queue()
	}
}
impl Drop for RefreshGuard {
	fn drop(&mut self) {
		if self.armed {
			// Dropping the continuations outside the lock wakes every waiter with no outcome.
			let abandoned = self.flight.lock().take_queue();

			drop(abandoned);
		}
	}
}

/// Held by a parked caller; leaves the queue when dropped before the refresh resolves.
pub(crate) struct PendingHandle {
	ticket: u64,
	receiver: oneshot::Receiver<Result<TokenSecret, AuthError>>,
	flight: Arc<Mutex<Flight>>,
	metrics: Arc<GatewayMetrics>,
}
impl PendingHandle {
	/// Waits for the refresher; `None` means the refresher was dropped before resolving.
	pub(crate) async fn wait(mut self) -> Option<Result<TokenSecret, AuthError>> {
		(&mut self.receiver).await.ok()
	}
}
impl Drop for PendingHandle {
	fn drop(&mut self) {
		let removed = {
			let mut flight = self.flight.lock();

			match &mut flight.state {
				FlightState::Refreshing(queue) => queue
					.iter()
					.position(|pending| pending.ticket == self.ticket)
					.and_then(|index| queue.remove(index)),
				FlightState::Idle => None,
			}
		};

		if removed.is_some() {
			self.metrics.record_cancelled();
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn idle_flight() -> (Arc<Mutex<Flight>>, Arc<GatewayMetrics>) {
		(Arc::new(Mutex::new(Flight::default())), Arc::new(GatewayMetrics::default()))
	}

	#[test]
	fn first_caller_leads_and_later_callers_queue_in_order() {
		let (flight, metrics) = idle_flight();
		let Admission::Lead(guard) = admit(&flight, &metrics) else {
			panic!("First caller should lead the refresh.");
		};
		let Admission::Wait(first) = admit(&flight, &metrics) else {
			panic!("Second caller should wait.");
		};
		let Admission::Wait(second) = admit(&flight, &metrics) else {
			panic!("Third caller should wait.");
		};

		assert!(flight.lock().is_refreshing());
		assert_eq!(flight.lock().queued_len(), 2);

		let queued = guard.settle();
		let tickets = queued.iter().map(|pending| pending.ticket).collect::<Vec<_>>();

		assert_eq!(tickets, [first.ticket, second.ticket]);
		assert!(!flight.lock().is_refreshing());
		assert_eq!(metrics.queued(), 2);
		assert_eq!(metrics.cancelled(), 0);
	}

	#[test]
	fn settled_waiters_receive_the_token_in_order() {
		let (flight, metrics) = idle_flight();
		let Admission::Lead(guard) = admit(&flight, &metrics) else {
			panic!("First caller should lead the refresh.");
		};
		let Admission::Wait(handle) = admit(&flight, &metrics) else {
			panic!("Second caller should wait.");
		};

		for pending in guard.settle() {
			let _ = pending.continuation.send(Ok(TokenSecret::new("T2")));
		}

		let token = futures::executor::block_on(handle.wait())
			.expect("Waiter should be resolved.")
			.expect("Waiter should receive the refreshed token.");

		assert_eq!(token.expose(), "T2");
		assert_eq!(metrics.cancelled(), 0);
	}

	#[test]
	fn dropped_handle_leaves_the_queue() {
		let (flight, metrics) = idle_flight();
		let Admission::Lead(guard) = admit(&flight, &metrics) else {
			panic!("First caller should lead the refresh.");
		};
		let Admission::Wait(handle) = admit(&flight, &metrics) else {
			panic!("Second caller should wait.");
		};

		drop(handle);

		assert_eq!(flight.lock().queued_len(), 0);
		assert_eq!(metrics.cancelled(), 1);
		assert!(guard.settle().is_empty());
	}

	#[test]
	fn dropped_guard_resets_the_flight_and_wakes_waiters() {
		let (flight, metrics) = idle_flight();
		let Admission::Lead(guard) = admit(&flight, &metrics) else {
			panic!("First caller should lead the refresh.");
		};
		let Admission::Wait(handle) = admit(&flight, &metrics) else {
			panic!("Second caller should wait.");
		};

		drop(guard);

		assert!(!flight.lock().is_refreshing());
		assert!(futures::executor::block_on(handle.wait()).is_none());
		assert!(matches!(admit(&flight, &metrics), Admission::Lead(_)));
	}
}
