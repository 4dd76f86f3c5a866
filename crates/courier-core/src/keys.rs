//! Key layouts for the messaging partitions.
//!
//! Three partitions, one composite key layout each. All components use the
//! order-preserving primitives from `courier_commons::storage_key`, so a
//! byte-wise scan walks entries in logical order:
//!
//! - `topic-metadata`: `namespace \0 name \0`
//! - `messages`:       `namespace \0 name \0 generation ts seq`
//! - `payloads`:       `namespace \0 name \0 write_pointer ts seq`
//!
//! The topic prefix is shared between layouts, so a prefix scan over one
//! topic never touches a neighboring topic, and the name terminator keeps
//! `app.events` from matching `app.events2`.

use courier_commons::storage_key::{
    push_i32, push_i64, push_str, push_u16, take_i32, take_i64, take_str, take_u16,
};
use courier_commons::{NamespaceId, TopicId};
use courier_store::Partition;

pub const METADATA_PARTITION: &str = "topic-metadata";
pub const MESSAGE_PARTITION: &str = "messages";
pub const PAYLOAD_PARTITION: &str = "payloads";

pub fn metadata_partition() -> Partition {
    Partition::new(METADATA_PARTITION)
}

pub fn message_partition() -> Partition {
    Partition::new(MESSAGE_PARTITION)
}

pub fn payload_partition() -> Partition {
    Partition::new(PAYLOAD_PARTITION)
}

/// `namespace \0 name \0` prefix shared by every key layout.
pub fn topic_prefix(topic_id: &TopicId) -> Vec<u8> {
    let mut buf = Vec::with_capacity(topic_id.namespace().as_str().len() + topic_id.name().len() + 2);
    push_str(&mut buf, topic_id.namespace().as_str());
    push_str(&mut buf, topic_id.name());
    buf
}

/// Metadata row key; identical to the topic prefix.
pub fn metadata_key(topic_id: &TopicId) -> Vec<u8> {
    topic_prefix(topic_id)
}

/// Prefix matching every metadata row in a namespace.
pub fn metadata_namespace_prefix(namespace: &NamespaceId) -> Vec<u8> {
    let mut buf = Vec::with_capacity(namespace.as_str().len() + 1);
    push_str(&mut buf, namespace.as_str());
    buf
}

pub fn decode_metadata_key(bytes: &[u8]) -> Option<TopicId> {
    let (namespace, rest) = take_str(bytes)?;
    let (name, rest) = take_str(rest)?;
    if !rest.is_empty() {
        return None;
    }
    Some(TopicId::new(NamespaceId::new(namespace), name))
}

/// Message log key: `topic_prefix generation ts seq`.
pub fn message_key(topic_id: &TopicId, generation: i32, timestamp_millis: i64, sequence_id: u16) -> Vec<u8> {
    let mut buf = message_prefix(topic_id, generation);
    push_i64(&mut buf, timestamp_millis);
    push_u16(&mut buf, sequence_id);
    buf
}

/// Prefix matching every message of one topic generation.
pub fn message_prefix(topic_id: &TopicId, generation: i32) -> Vec<u8> {
    let mut buf = topic_prefix(topic_id);
    push_i32(&mut buf, generation);
    buf
}

/// Decodes `(generation, timestamp_millis, sequence_id)` from a message key.
pub fn decode_message_key(bytes: &[u8]) -> Option<(i32, i64, u16)> {
    let (_, rest) = take_str(bytes)?;
    let (_, rest) = take_str(rest)?;
    let (generation, rest) = take_i32(rest)?;
    let (timestamp_millis, rest) = take_i64(rest)?;
    let (sequence_id, rest) = take_u16(rest)?;
    if !rest.is_empty() {
        return None;
    }
    Some((generation, timestamp_millis, sequence_id))
}

/// Payload store key: `topic_prefix write_pointer ts seq`.
pub fn payload_key(topic_id: &TopicId, write_pointer: i64, timestamp_millis: i64, sequence_id: u16) -> Vec<u8> {
    let mut buf = payload_prefix(topic_id, write_pointer);
    push_i64(&mut buf, timestamp_millis);
    push_u16(&mut buf, sequence_id);
    buf
}

/// Prefix matching every payload staged under one write pointer.
pub fn payload_prefix(topic_id: &TopicId, write_pointer: i64) -> Vec<u8> {
    let mut buf = topic_prefix(topic_id);
    push_i64(&mut buf, write_pointer);
    buf
}

/// Decodes `(write_pointer, timestamp_millis, sequence_id)` from a payload key.
pub fn decode_payload_key(bytes: &[u8]) -> Option<(i64, i64, u16)> {
    let (_, rest) = take_str(bytes)?;
    let (_, rest) = take_str(rest)?;
    let (write_pointer, rest) = take_i64(rest)?;
    let (timestamp_millis, rest) = take_i64(rest)?;
    let (sequence_id, rest) = take_u16(rest)?;
    if !rest.is_empty() {
        return None;
    }
    Some((write_pointer, timestamp_millis, sequence_id))
}
