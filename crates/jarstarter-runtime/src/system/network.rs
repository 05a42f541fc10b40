//! Self-address detection for display.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::debug;

/// Address whose route decides the outbound interface. Nothing is sent.
const ROUTE_PROBE: &str = "192.0.2.1:9";

/// Best-effort primary IPv4 address of this machine.
///
/// Connecting a UDP socket only selects a route, so this works offline as long
/// as a default route exists. Falls back to loopback.
pub async fn local_ip() -> IpAddr {
    match route_local_ip().await {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            debug!(error = %e, "No outbound route, using loopback address");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

async fn route_local_ip() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(ROUTE_PROBE).await?;
    Ok(socket.local_addr()?.ip())
}

/// `<ip>:<port>` label shown next to the status.
pub async fn address_label(port: u16) -> String {
    SocketAddr::new(local_ip().await, port).to_string()
}
