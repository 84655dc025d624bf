use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Reachability class of an IP address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressClass {
    Public,
    Private,
    Loopback,
    LinkLocal,
    Unspecified,
    Multicast,

    /// Documentation, benchmarking, shared, broadcast and future-use ranges
    Reserved,
}

impl AddressClass {
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Loopback => "loopback",
            Self::LinkLocal => "link-local",
            Self::Unspecified => "unspecified",
            Self::Multicast => "multicast",
            Self::Reserved => "reserved",
        }
    }
}

impl fmt::Display for AddressClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an address
pub fn classify(ip: IpAddr) -> AddressClass {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => classify_v6(v6),
    }
}

fn classify_v4(ip: Ipv4Addr) -> AddressClass {
    if ip.is_unspecified() {
        AddressClass::Unspecified
    } else if ip.is_loopback() {
        AddressClass::Loopback
    } else if ip.is_link_local() {
        AddressClass::LinkLocal
    } else if ip.is_private() {
        AddressClass::Private
    } else if ip.is_multicast() {
        AddressClass::Multicast
    } else if is_reserved_v4(ip) {
        AddressClass::Reserved
    } else {
        AddressClass::Public
    }
}

/// Special-purpose IPv4 blocks with no geographic location
fn is_reserved_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    ip.is_broadcast()
        || ip.is_documentation()
        // 0.0.0.0/8 "this network"
        || a == 0
        // 100.64.0.0/10 shared address space
        || (a == 100 && (64..128).contains(&b))
        // 192.0.0.0/24 protocol assignments
        || (a == 192 && b == 0 && c == 0)
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b == 18 || b == 19))
        // 240.0.0.0/4 future use
        || a >= 240
}

fn classify_v6(ip: Ipv6Addr) -> AddressClass {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return classify_v4(v4);
    }

    let first = ip.segments()[0];
    if ip.is_unspecified() {
        AddressClass::Unspecified
    } else if ip.is_loopback() {
        AddressClass::Loopback
    } else if first & 0xffc0 == 0xfe80 {
        // fe80::/10
        AddressClass::LinkLocal
    } else if first & 0xfe00 == 0xfc00 {
        // fc00::/7 unique local
        AddressClass::Private
    } else if ip.is_multicast() {
        AddressClass::Multicast
    } else if is_reserved_v6(ip) {
        AddressClass::Reserved
    } else {
        AddressClass::Public
    }
}

/// Special-purpose IPv6 blocks with no geographic location
fn is_reserved_v6(ip: Ipv6Addr) -> bool {
    let seg = ip.segments();
    // 2001:db8::/32 documentation
    (seg[0] == 0x2001 && seg[1] == 0x0db8)
        // 2001:2::/48 benchmarking
        || (seg[0] == 0x2001 && seg[1] == 0x0002 && seg[2] == 0)
        // 100::/64 discard-only
        || (seg[0] == 0x0100 && seg[1..4] == [0, 0, 0])
}
