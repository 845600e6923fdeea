//! HL7 v2 encoding layer
//!
//! - [`Delimiters`] and the escape scheme
//! - [`Hl7Message`], [`Segment`] and [`Field`], the in-memory message model
//! - [`codec`], single-segment ER7 encoding and decoding
//! - [`MessageMapper`], the domain model to ORU^R01 mapping
//! - [`Acknowledgment`], ACK parsing
//!
//! Everything here is synchronous and free of shared state.

pub mod ack;
pub mod codec;
pub mod datetime;
pub mod delimiters;
pub mod mapper;
pub mod message;

pub use ack::{AckCode, Acknowledgment};
pub use codec::{decode_segment, encode_segment};
pub use delimiters::Delimiters;
pub use mapper::{
    DecodedMessage, MappingOptions, MessageMapper, ObservationGrouping, PreservedSegment,
};
pub use message::{Field, Hl7Message, Segment, SEGMENT_TERMINATOR};
