use std::collections::HashMap;

use futures::{Stream, StreamExt as _, pin_mut};
use log::{debug, info, warn};
use serde_derive::Serialize;
use tokio::sync::mpsc;

use crate::config::{KnownNearable, ManagerConfig};
use crate::decoder::{DecodeError, Decoder};
use crate::messages::{Advertisement, EventKind, NearableEvent};
use crate::model::{Identifier, Nearable, NearableType};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Counters over everything the manager has been fed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub received: u64,
    pub decoded: u64,
    pub filtered: u64,
    pub too_short: u64,
    pub bad_signature: u64,
    pub invalid_rssi: u64,
}

impl ScanStats {
    pub fn rejected(&self) -> u64 {
        self.too_short + self.bad_signature + self.invalid_rssi
    }
}

/// Bounded channel the manager reports events through.
pub fn event_channel(
    config: &ManagerConfig,
) -> (mpsc::Sender<NearableEvent>, mpsc::Receiver<NearableEvent>) {
    mpsc::channel(
        config
            .channel_capacity
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY)
            .max(1),
    )
}

/// Keeps the latest record per identifier and reports what it sees.
pub struct Manager {
    decoder: Decoder,
    types: Vec<NearableType>,
    names: HashMap<Identifier, String>,
    nearables: HashMap<Identifier, Nearable>,
    stats: ScanStats,
    events: mpsc::Sender<NearableEvent>,
}

impl Manager {
    pub fn new(
        decoder: Decoder,
        config: &ManagerConfig,
        known: &[KnownNearable],
        events: mpsc::Sender<NearableEvent>,
    ) -> Self {
        let names = known
            .iter()
            .map(|n| (Identifier::from(n.identifier), n.name.clone()))
            .collect();

        Manager {
            decoder,
            types: config.types.clone().unwrap_or_default(),
            names,
            nearables: HashMap::new(),
            stats: ScanStats::default(),
            events,
        }
    }

    /// Decode one advertisement and update the cache. Returns the event to
    /// report, or `None` if the advertisement was rejected or filtered out.
    pub fn handle_advertisement(&mut self, advertisement: &Advertisement) -> Option<NearableEvent> {
        self.stats.received += 1;

        let nearable = match self
            .decoder
            .decode(&advertisement.payload, advertisement.rssi)
        {
            Ok(nearable) => nearable,
            Err(err) => {
                match err {
                    DecodeError::TooShort { .. } => self.stats.too_short += 1,
                    DecodeError::BadSignature { .. } => self.stats.bad_signature += 1,
                    DecodeError::InvalidRssi(_) => self.stats.invalid_rssi += 1,
                }
                debug!("Dropping advertisement: {}", err);
                return None;
            }
        };
        self.stats.decoded += 1;

        if !self.types.is_empty() && !self.types.contains(&nearable.nearable_type()) {
            self.stats.filtered += 1;
            debug!(
                "Ignoring {} nearable {}",
                nearable.nearable_type(),
                nearable.identifier()
            );
            return None;
        }

        let identifier = nearable.identifier();
        let kind = match self.nearables.insert(identifier, nearable.clone()) {
            None => {
                info!(
                    "Discovered {} nearable {}",
                    nearable.nearable_type(),
                    identifier
                );
                EventKind::Discovered
            }
            Some(_) => EventKind::Updated,
        };

        Some(NearableEvent {
            kind,
            name: self.names.get(&identifier).cloned(),
            nearable,
        })
    }

    /// Feed every advertisement of the stream through the decoder until the
    /// stream ends or nobody listens for events anymore.
    pub async fn run_loop<S>(&mut self, advertisements: S) -> ScanStats
    where
        S: Stream<Item = Advertisement>,
    {
        pin_mut!(advertisements);

        while let Some(advertisement) = advertisements.next().await {
            if let Some(event) = self.handle_advertisement(&advertisement) {
                if self.events.send(event).await.is_err() {
                    warn!("Event receiver closed, stopping");
                    break;
                }
            }
        }

        info!(
            "Processed {} advertisements: {} decoded, {} rejected, {} filtered, {} nearables",
            self.stats.received,
            self.stats.decoded,
            self.stats.rejected(),
            self.stats.filtered,
            self.nearables.len()
        );
        self.stats
    }

    pub fn nearable(&self, identifier: &Identifier) -> Option<&Nearable> {
        self.nearables.get(identifier)
    }

    pub fn nearables(&self) -> impl Iterator<Item = &Nearable> {
        self.nearables.values()
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}
