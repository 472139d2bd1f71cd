//! # udpmux
//!
//! Carries UDP (often IP-multicast) packet streams across an untrusted or
//! narrow WAN by multiplexing many groups over a single long-lived TCP
//! (optionally TLS) connection, and demultiplexing them back to their UDP
//! destinations on the far side.
//!
//! Two cooperating endpoints are involved:
//!
//! - a **relay** ([`relay`]) subscribes to a set of local UDP or multicast
//!   groups, frames each received datagram with a routing tag and a content
//!   checksum, and writes the frames onto one outbound connection to a
//!   remote gateway;
//! - a **gateway** ([`gateway`]) accepts relay connections, decodes the
//!   framed stream, verifies checksums, and forwards each payload to the
//!   UDP destination bound to its routing tag.
//!
//! Egress bandwidth on the relay side can be paced with a token bucket
//! ([`pacing`]), and the outbound connection survives remote outages by
//! dropping frames while it re-dials in the background
//! ([`relay::RemoteWriter`]) so the real-time UDP producers are never
//! blocked.

pub mod config;
pub mod feed;
pub mod frame;
pub mod gateway;
pub mod pacing;
pub mod relay;
pub mod tls;
