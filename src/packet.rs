// Paquets échangés sur le réseau : LSA, donnée utilisateur et ACK.
//
// Seul point de l'arbre qui traverse la frontière octets <-> types ; tout le
// reste (routeur, host, LSDB, Dijkstra) opère sur `Packet`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Maximum size, in bytes, a single encoded packet may occupy on the wire.
pub const MAX_PACKET_BYTES: usize = 1024;

/// Link costs advertised by a router for its directly attached neighbors.
/// Always 1 in this system, but carried as an integer to keep Dijkstra general.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsaPayload {
    pub links: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPayload {
    pub content: String,
}

/// A single wire packet. Serializes to/from a tagged JSON object; the `type`
/// field selects the variant. Unknown extra fields are ignored by serde_json
/// by default; a missing required field fails deserialization with a message
/// naming that field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Packet {
    #[serde(rename = "lsa")]
    Lsa {
        sequence: u32,
        // Some source variants of this protocol named the originator field
        // `router_id` instead of `source`; accept either on decode, always
        // emit `source`.
        #[serde(alias = "router_id")]
        source: String,
        #[serde(default)]
        destination: Option<String>,
        payload: LsaPayload,
    },
    #[serde(rename = "data")]
    Data {
        sequence: u32,
        source: String,
        destination: String,
        ttl: u8,
        payload: DataPayload,
    },
    #[serde(rename = "ack")]
    Ack {
        sequence: u32,
        source: String,
        destination: String,
        timestamp: u64,
    },
}

impl Packet {
    pub fn lsa(source: impl Into<String>, sequence: u32, links: HashMap<String, u32>) -> Self {
        Packet::Lsa {
            sequence,
            source: source.into(),
            destination: None,
            payload: LsaPayload { links },
        }
    }

    pub fn data(
        source: impl Into<String>,
        destination: impl Into<String>,
        sequence: u32,
        ttl: u8,
        content: impl Into<String>,
    ) -> Self {
        Packet::Data {
            sequence,
            source: source.into(),
            destination: destination.into(),
            ttl,
            payload: DataPayload {
                content: content.into(),
            },
        }
    }

    pub fn ack(
        source: impl Into<String>,
        destination: impl Into<String>,
        sequence: u32,
        timestamp: u64,
    ) -> Self {
        Packet::Ack {
            sequence,
            source: source.into(),
            destination: destination.into(),
            timestamp,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Lsa { .. } => "lsa",
            Packet::Data { .. } => "data",
            Packet::Ack { .. } => "ack",
        }
    }

    pub fn sequence(&self) -> u32 {
        match self {
            Packet::Lsa { sequence, .. } => *sequence,
            Packet::Data { sequence, .. } => *sequence,
            Packet::Ack { sequence, .. } => *sequence,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Packet::Lsa { source, .. } => source,
            Packet::Data { source, .. } => source,
            Packet::Ack { source, .. } => source,
        }
    }

    /// Destination id, if this kind of packet carries one (LSAs do not).
    pub fn destination(&self) -> Option<&str> {
        match self {
            Packet::Lsa { destination, .. } => destination.as_deref(),
            Packet::Data { destination, .. } => Some(destination),
            Packet::Ack { destination, .. } => Some(destination),
        }
    }

    /// Encode to the JSON wire form, rejecting anything that would not fit in
    /// a single UDP datagram under `MAX_PACKET_BYTES`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() > MAX_PACKET_BYTES {
            return Err(AppError::CodecError(format!(
                "encoded {} packet is {} bytes, exceeds {}-byte datagram limit",
                self.kind(),
                bytes.len(),
                MAX_PACKET_BYTES
            )));
        }
        Ok(bytes)
    }

    /// Decode a datagram body into a typed packet. Malformed JSON, an unknown
    /// `type`, or a missing required field all surface as a `CodecError`
    /// naming the problem; callers log and drop per the spec's error policy.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_PACKET_BYTES {
            return Err(AppError::CodecError(format!(
                "datagram of {} bytes exceeds {}-byte limit",
                bytes.len(),
                MAX_PACKET_BYTES
            )));
        }
        serde_json::from_slice(bytes).map_err(|e| AppError::CodecError(e.to_string()))
    }
}
