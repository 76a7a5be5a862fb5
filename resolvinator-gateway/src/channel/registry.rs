//! Durable record of what must be joined while connected.

use resolvinator_core::types::{ChannelTopic, ProjectId, StreamChannel};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

use super::frame::OutboundFrame;

/// Point-in-time copy of the registry's durable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionSnapshot {
    /// Tracked project ids.
    pub projects: Vec<ProjectId>,
    /// Singleton streams flagged for rejoin.
    pub streams: Vec<StreamChannel>,
    /// Every tracked topic, sorted.
    pub topics: Vec<ChannelTopic>,
}

#[derive(Debug, Clone)]
struct TrackedTopic {
    params: Value,
    /// Ref of the join sent on the current connection; `None` until sent.
    reference: Option<String>,
}

/// Subscription state that survives reconnects.
///
/// The registry never talks to the transport. Every mutation returns the
/// frames the caller must send, which are empty while disconnected: joins
/// requested then are tracked and go out with the next [`replay`](Self::replay).
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    projects: BTreeSet<ProjectId>,
    streams: BTreeSet<StreamChannel>,
    topics: BTreeMap<ChannelTopic, TrackedTopic>,
    last_ref: u64,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next reference. References are never reused.
    pub fn next_ref(&mut self) -> String {
        self.last_ref += 1;
        self.last_ref.to_string()
    }

    /// Tracks `topic` and, if connected, returns its join frame.
    ///
    /// Returns nothing for a topic already joined on the current connection.
    pub fn join(
        &mut self,
        topic: ChannelTopic,
        params: Value,
        connected: bool,
    ) -> Option<OutboundFrame> {
        if connected
            && self
                .topics
                .get(&topic)
                .is_some_and(|tracked| tracked.reference.is_some())
        {
            debug!(topic = %topic, "Channel already joined");
            return None;
        }

        let reference = connected.then(|| self.next_ref());
        let frame = reference
            .as_ref()
            .map(|r| OutboundFrame::join(&topic, params.clone(), r.clone()));
        if frame.is_some() {
            info!(topic = %topic, "Joining channel");
        } else {
            debug!(topic = %topic, "Join deferred until connected");
        }
        self.topics.insert(topic, TrackedTopic { params, reference });
        frame
    }

    /// Stops tracking `topic` and, if connected, returns a leave frame.
    ///
    /// Leaving a singleton stream also clears its flag. A project is
    /// forgotten once neither of its two streams is tracked.
    pub fn leave(&mut self, topic: &ChannelTopic, connected: bool) -> Option<OutboundFrame> {
        self.topics.remove(topic);
        if let Ok(stream) = topic.as_str().parse::<StreamChannel>()
            && stream.topic() == *topic
        {
            self.streams.remove(&stream);
        }
        if let Some(id) = project_of(topic)
            && !self.topics.contains_key(&ChannelTopic::risks(id))
            && !self.topics.contains_key(&ChannelTopic::project(id))
        {
            self.projects.remove(&id);
        }

        connected.then(|| {
            info!(topic = %topic, "Leaving channel");
            OutboundFrame::leave(topic, self.next_ref())
        })
    }

    /// Tracks a project's resource and metadata streams.
    pub fn subscribe_project(&mut self, id: ProjectId, connected: bool) -> Vec<OutboundFrame> {
        self.projects.insert(id);
        [ChannelTopic::risks(id), ChannelTopic::project(id)]
            .into_iter()
            .filter_map(|topic| self.join(topic, empty_params(), connected))
            .collect()
    }

    /// Forgets a project and leaves both of its streams.
    pub fn unsubscribe_project(&mut self, id: ProjectId, connected: bool) -> Vec<OutboundFrame> {
        self.projects.remove(&id);
        [ChannelTopic::risks(id), ChannelTopic::project(id)]
            .iter()
            .filter_map(|topic| self.leave(topic, connected))
            .collect()
    }

    /// Flags a singleton stream for automatic rejoin and joins it if connected.
    pub fn subscribe_stream(
        &mut self,
        stream: StreamChannel,
        params: Value,
        connected: bool,
    ) -> Option<OutboundFrame> {
        self.streams.insert(stream);
        self.join(stream.topic(), params, connected)
    }

    /// Issues fresh joins for every tracked topic after a connection opens.
    ///
    /// Order: project pairs, then flagged streams, then any other topic.
    pub fn replay(&mut self) -> Vec<OutboundFrame> {
        let mut order: Vec<ChannelTopic> = Vec::with_capacity(self.topics.len());
        for id in &self.projects {
            order.push(ChannelTopic::risks(*id));
            order.push(ChannelTopic::project(*id));
        }
        order.extend(self.streams.iter().map(StreamChannel::topic));
        order.extend(self.topics.keys().cloned());

        let mut seen = HashSet::new();
        let mut frames = Vec::new();
        for topic in order {
            if !seen.insert(topic.clone()) {
                continue;
            }
            let reference = self.next_ref();
            if let Some(tracked) = self.topics.get_mut(&topic) {
                tracked.reference = Some(reference.clone());
                frames.push(OutboundFrame::join(&topic, tracked.params.clone(), reference));
            }
        }

        info!(channels = frames.len(), "Rejoining tracked channels");
        frames
    }

    /// Tracked project ids.
    pub fn projects(&self) -> impl Iterator<Item = ProjectId> + '_ {
        self.projects.iter().copied()
    }

    /// Returns true if `stream` is flagged for automatic rejoin.
    #[must_use]
    pub fn is_stream_subscribed(&self, stream: StreamChannel) -> bool {
        self.streams.contains(&stream)
    }

    /// Every tracked topic.
    pub fn topics(&self) -> impl Iterator<Item = &ChannelTopic> {
        self.topics.keys()
    }

    /// Copies the durable state.
    #[must_use]
    pub fn snapshot(&self) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            projects: self.projects.iter().copied().collect(),
            streams: self.streams.iter().copied().collect(),
            topics: self.topics.keys().cloned().collect(),
        }
    }

    /// Forgets the refs of the previous connection.
    pub fn connection_lost(&mut self) {
        for tracked in self.topics.values_mut() {
            tracked.reference = None;
        }
    }

    /// Ref of the join sent for `topic` on the current connection.
    #[must_use]
    pub fn reference(&self, topic: &ChannelTopic) -> Option<&str> {
        self.topics.get(topic)?.reference.as_deref()
    }
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

/// Project whose resource or metadata stream `topic` is.
fn project_of(topic: &ChannelTopic) -> Option<ProjectId> {
    let id: ProjectId = topic.subtopic()?.parse().ok()?;
    (*topic == ChannelTopic::risks(id) || *topic == ChannelTopic::project(id)).then_some(id)
}
