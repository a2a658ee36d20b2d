// Zenoh command link: command bytes arrive on one topic, status text leaves on another

use std::collections::VecDeque;
use tracing::{info, warn};
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::{Publisher, Subscriber};
use zenoh::sample::Sample;
use zenoh::{Session, Wait};

use super::{CommandSource, LinkError, LinkStatus};

pub struct ZenohLink {
    // Held so the session outlives its publisher and subscriber
    _session: Session,
    subscriber: Subscriber<FifoChannelHandler<Sample>>,
    publisher: Publisher<'static>,
    pending: VecDeque<u8>,
}

impl ZenohLink {
    pub fn open(cmd_topic: &str, status_topic: &str) -> Result<Self, LinkError> {
        info!("Opening Zenoh session...");
        let session = zenoh::open(zenoh::Config::default())
            .wait()
            .map_err(|e| LinkError::Zenoh(e.to_string()))?;

        let subscriber = session
            .declare_subscriber(cmd_topic.to_string())
            .wait()
            .map_err(|e| LinkError::Zenoh(e.to_string()))?;
        let publisher = session
            .declare_publisher(status_topic.to_string())
            .wait()
            .map_err(|e| LinkError::Zenoh(e.to_string()))?;

        info!("Subscribed to: {}", cmd_topic);
        info!("Publishing to: {}", status_topic);

        Ok(Self {
            _session: session,
            subscriber,
            publisher,
            pending: VecDeque::new(),
        })
    }
}

impl CommandSource for ZenohLink {
    fn receive_byte(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            // Drain all pending samples (non-blocking); each may carry several bytes
            while let Ok(Some(sample)) = self.subscriber.try_recv() {
                self.pending.extend(sample.payload().to_bytes().iter());
            }
        }
        self.pending.pop_front()
    }

    fn send(&mut self, text: &str) {
        if let Err(e) = self.publisher.put(text.to_string()).wait() {
            warn!("Failed to publish status: {}", e);
        }
    }

    fn readiness(&self) -> LinkStatus {
        LinkStatus::Ready
    }
}
