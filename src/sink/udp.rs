use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use chrono::Utc;
use log::{debug, trace};
use serde::Serialize;
use tokio::net::{UdpSocket, lookup_host};

use super::{MetricSink, SinkError};

/// Event type tag carried by every envelope
const VALUE_METRIC_EVENT: &str = "ValueMetric";

/// Sends each metric as one JSON datagram to a metron agent
pub struct UdpSink {
    socket: UdpSocket,
    origin: String,
    target: SocketAddr,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    origin: &'a str,
    event_type: &'static str,
    timestamp: i64,
    value_metric: ValueMetric<'a>,
}

#[derive(Serialize)]
struct ValueMetric<'a> {
    name: &'a str,
    value: f64,
    unit: &'a str,
}

impl UdpSink {
    /// Resolve `addr` and open a socket connected to it
    pub async fn connect(addr: &str, origin: impl Into<String>) -> Result<Self, SinkError> {
        let target = lookup_host(addr)
            .await
            .map_err(|e| SinkError::Resolve {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| SinkError::Resolve {
                addr: addr.to_string(),
                reason: "no addresses found".to_string(),
            })?;

        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;

        debug!("UDP sink connected to {}", target);

        Ok(Self {
            socket,
            origin: origin.into(),
            target,
        })
    }

    /// The resolved destination
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn encode(&self, key: &str, value: f64, unit: &str) -> Result<Vec<u8>, SinkError> {
        let envelope = Envelope {
            origin: &self.origin,
            event_type: VALUE_METRIC_EVENT,
            timestamp: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            value_metric: ValueMetric {
                name: key,
                value,
                unit,
            },
        };

        Ok(serde_json::to_vec(&envelope)?)
    }
}

#[async_trait::async_trait]
impl MetricSink for UdpSink {
    async fn send_value(&self, key: &str, value: f64, unit: &str) -> Result<(), SinkError> {
        let datagram = self.encode(key, value, unit)?;
        let sent = self.socket.send(&datagram).await?;
        trace!("Sent {} byte envelope for {} to {}", sent, key, self.target);
        Ok(())
    }

    fn name(&self) -> &str {
        "udp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_envelope_shape() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap().to_string();
        let sink = UdpSink::connect(&addr, "p-service-origin").await.unwrap();

        let raw = sink.encode("loadMetric", 4.0, "Load").unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&raw).unwrap();

        assert_eq!(envelope["origin"], "p-service-origin");
        assert_eq!(envelope["eventType"], "ValueMetric");
        assert!(envelope["timestamp"].as_i64().unwrap() > 0);
        assert_eq!(envelope["valueMetric"]["name"], "loadMetric");
        assert_eq!(envelope["valueMetric"]["value"], 4.0);
        assert_eq!(envelope["valueMetric"]["unit"], "Load");
    }

    #[tokio::test]
    async fn test_connect_rejects_unresolvable_address() {
        let result = UdpSink::connect("not an address", "origin").await;
        assert!(matches!(result, Err(SinkError::Resolve { .. })));
    }

    #[tokio::test]
    async fn test_connect_requires_port() {
        let result = UdpSink::connect("127.0.0.1", "origin").await;
        assert!(result.is_err());
    }
}
