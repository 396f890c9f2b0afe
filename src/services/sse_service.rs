use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{sse::TimerStreamEvent, timer::TimerSnapshot},
    error::ServiceError,
    services::timer_service,
    state::SharedState,
};

const FORWARD_BUFFER: usize = 8;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Subscribe to an event's timer stream and read the current snapshot, in that order, so no
/// transition between the two is lost.
pub async fn subscribe_timer(
    state: &SharedState,
    event_id: Uuid,
) -> Result<(TimerSnapshot, broadcast::Receiver<TimerStreamEvent>), ServiceError> {
    let authority = state
        .authority(event_id)
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("event `{event_id}` not found")))?;
    let receiver = authority.hub().subscribe();
    let snapshot = timer_service::fetch_timer(state, event_id).await?;
    Ok((snapshot, receiver))
}

/// Turn a subscription into an SSE response. The current snapshot goes out first; the forwarder
/// task ends once the client disconnects.
pub fn to_sse_stream(
    event_id: Uuid,
    initial: TimerSnapshot,
    mut receiver: broadcast::Receiver<TimerStreamEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(FORWARD_BUFFER);

    tokio::spawn(async move {
        let mut next = Some(TimerStreamEvent::Updated(initial));
        loop {
            let item = match next.take() {
                Some(item) => item,
                None => tokio::select! {
                    _ = tx.closed() => break,
                    received = receiver.recv() => match received {
                        Ok(item) => item,
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Snapshots supersede each other; the next one resynchronises the client.
                            debug!(%event_id, skipped, "timer stream subscriber lagged");
                            continue;
                        }
                    },
                },
            };

            let Some(event) = to_event(event_id, &item) else {
                continue;
            };
            if tx.send(Ok(event)).await.is_err() {
                break;
            }
        }

        info!(%event_id, "timer SSE stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

fn to_event(event_id: Uuid, item: &TimerStreamEvent) -> Option<Event> {
    match item.data() {
        Ok(data) => Some(Event::default().event(item.name()).data(data)),
        Err(err) => {
            warn!(%event_id, event = item.name(), error = %err, "failed to serialize timer stream payload");
            None
        }
    }
}
