use serde_derive::Serialize;

use crate::model::Nearable;

/// Raw manufacturer data as handed over by the BLE stack, with the RSSI it
/// was received at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advertisement {
    pub payload: Vec<u8>,
    pub rssi: i16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// First advertisement seen from this identifier.
    Discovered,
    Updated,
}

#[derive(Clone, Debug, Serialize)]
pub struct NearableEvent {
    pub kind: EventKind,
    /// Configured friendly name, if the identifier is known.
    pub name: Option<String>,
    pub nearable: Nearable,
}
