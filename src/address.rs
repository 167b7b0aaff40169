// SPDX-License-Identifier: MIT OR Apache-2.0

//! Address parser (§4.1): classifies tokens as IPv4, IPv6, or MAC-48 and
//! produces a canonical textual form for each. The parser never fails;
//! candidates that don't validate are simply not emitted.

use std::fmt;

/// The three address families the indexer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Ipv4,
    Ipv6,
    Mac,
}

impl AddressKind {
    /// The single-byte tag the tokenizer contract (§4.2) prefixes fields
    /// with: `i` for IPv4, `I` for IPv6, `m` for MAC.
    pub fn tag(self) -> u8 {
        match self {
            AddressKind::Ipv4 => b'i',
            AddressKind::Ipv6 => b'I',
            AddressKind::Mac => b'm',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'i' => Some(AddressKind::Ipv4),
            b'I' => Some(AddressKind::Ipv6),
            b'm' => Some(AddressKind::Mac),
            _ => None,
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::Ipv4 => write!(f, "ipv4"),
            AddressKind::Ipv6 => write!(f, "ipv6"),
            AddressKind::Mac => write!(f, "mac"),
        }
    }
}

/// A classified address: its kind and canonical string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub kind: AddressKind,
    pub canonical: String,
}

/// One recognized address occurrence within a line, before field-index
/// assignment (the tokenizer owns field indices; see §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub address: ParsedAddress,
    /// Byte offset range in the source token this candidate was extracted
    /// from, for skip-ahead bookkeeping.
    pub end: usize,
}

const MAX_IPV4_LEN: usize = 15; // "255.255.255.255"
const MAX_IPV6_LEN: usize = 45; // worst case with embedded IPv4
const MAC_LEN: usize = 17; // "aa:bb:cc:dd:ee:ff"

/// Classify a single already-isolated token (one tokenizer field) as an
/// address. Returns `None` if the token is not a valid address of any
/// supported kind.
///
/// This is the entry point the concrete tokenizer (`crate::tokenizer`) uses:
/// unlike the line-scanning contract described informally in §4.1, a
/// tokenizer field is already whitespace/quote-delimited, so classification
/// degenerates to "does this whole token validate as one of the three
/// kinds", with MAC preferred over IPv6 on ambiguous input (MAC's shape is
/// fixed-width, so it is checked first and is never ambiguous with IPv6 in
/// practice, but the priority is kept explicit to match §4.1's overlap
/// policy).
pub fn classify_token(token: &str) -> Option<ParsedAddress> {
    if token.len() > MAX_IPV6_LEN {
        return None;
    }
    if let Some(mac) = parse_mac(token) {
        return Some(mac);
    }
    if token.contains('.') && !token.contains(':') {
        if token.len() <= MAX_IPV4_LEN {
            if let Some(v4) = parse_ipv4(token) {
                return Some(v4);
            }
        }
    }
    if token.contains(':') {
        if let Some(v6) = parse_ipv6(token) {
            return Some(v6);
        }
    }
    None
}

/// Scan a raw line for address candidates, in source order. This is used
/// only by tests that want to exercise the line-level contract directly;
/// the production path always goes through the tokenizer, which isolates
/// fields first and calls `classify_token`.
pub fn parse_line_addresses(line: &str) -> Vec<ParsedAddress> {
    let mut out = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && !(bytes[i] as char).is_ascii_whitespace() {
            i += 1;
        }
        let token = &line[start..i];
        if let Some(addr) = classify_token(token) {
            out.push(addr);
        }
    }
    out
}

fn parse_ipv4(token: &str) -> Option<ParsedAddress> {
    let mut octets = [0u8; 4];
    let mut count = 0;
    for part in token.split('.') {
        if count == 4 {
            return None;
        }
        if part.is_empty() || part.len() > 3 {
            return None;
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Accept leading zeros (default, non-strict mode per §4.1); the
        // canonical form always strips them since we re-render from `u8`.
        let value: u32 = part.parse().ok()?;
        if value > 255 {
            return None;
        }
        octets[count] = value as u8;
        count += 1;
    }
    if count != 4 {
        return None;
    }
    Some(ParsedAddress {
        kind: AddressKind::Ipv4,
        canonical: format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]),
    })
}

fn parse_mac(token: &str) -> Option<ParsedAddress> {
    if token.len() != MAC_LEN {
        return None;
    }
    let bytes = token.as_bytes();
    let sep = bytes[2];
    if sep != b':' && sep != b'-' {
        return None;
    }
    let mut octets = [0u8; 6];
    for (i, chunk) in token.split(sep as char).enumerate() {
        if i >= 6 || chunk.len() != 2 {
            return None;
        }
        // Reject a mix of separators: splitting by the first separator must
        // yield exactly 6 two-digit hex groups with no stray chars left.
        octets[i] = u8::from_str_radix(chunk, 16).ok()?;
    }
    if token.matches(sep as char).count() != 5 {
        return None;
    }
    Some(ParsedAddress {
        kind: AddressKind::Mac,
        canonical: format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            octets[0], octets[1], octets[2], octets[3], octets[4], octets[5]
        ),
    })
}

fn parse_ipv6(token: &str) -> Option<ParsedAddress> {
    if token.len() > MAX_IPV6_LEN || token.is_empty() {
        return None;
    }
    // Embedded IPv4 tail: split off the last two groups if they look like a
    // dotted quad, validate, and continue with the hex-group parse using a
    // synthetic two-group representation of the embedded address.
    let (head, embedded_v4) = match token.rsplit_once(':') {
        Some((h, tail)) if tail.contains('.') => {
            let v4 = parse_ipv4(tail)?;
            (h.to_string() + ":EMBEDDED", Some(v4.canonical))
        }
        _ => (token.to_string(), None),
    };

    let double_colon_count = head.matches("::").count();
    if double_colon_count > 1 {
        return None;
    }

    let (left, right, has_compression) = if double_colon_count == 1 {
        let idx = head.find("::").unwrap();
        (&head[..idx], &head[idx + 2..], true)
    } else {
        (head.as_str(), "", false)
    };

    let mut left_groups: Vec<&str> = if left.is_empty() {
        Vec::new()
    } else {
        left.split(':').collect()
    };
    let mut right_groups: Vec<&str> = if right.is_empty() {
        Vec::new()
    } else {
        right.split(':').collect()
    };

    // The synthetic EMBEDDED marker is always the last element of whichever
    // side it landed in (it came from the literal tail of the token), so
    // splice the two hex groups it expands to in at that same position
    // rather than appending them somewhere else.
    let mut left_owned: Vec<String> = left_groups.iter().map(|s| s.to_lowercase()).collect();
    let mut right_owned: Vec<String> = right_groups.iter().map(|s| s.to_lowercase()).collect();
    let mut embedded_count = 0;
    if let Some(v4_canonical) = &embedded_v4 {
        let octets: Vec<u8> = v4_canonical
            .split('.')
            .map(|p| p.parse::<u8>().unwrap())
            .collect();
        let groups = [
            format!("{:02x}{:02x}", octets[0], octets[1]),
            format!("{:02x}{:02x}", octets[2], octets[3]),
        ];
        embedded_count = 2;
        if right_owned.last().map(String::as_str) == Some("embedded") {
            right_owned.pop();
            right_owned.extend(groups);
        } else if left_owned.last().map(String::as_str) == Some("embedded") {
            left_owned.pop();
            left_owned.extend(groups);
        } else {
            return None;
        }
    }

    for g in left_groups.iter().chain(right_groups.iter()) {
        if g.eq_ignore_ascii_case("EMBEDDED") {
            continue;
        }
        if g.is_empty() || g.len() > 4 || !g.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
    }

    let group_count = left_owned.len() + right_owned.len();
    if !has_compression && group_count != 8 {
        return None;
    }
    if has_compression && group_count >= 8 {
        // "::" must compress at least one group.
        return None;
    }
    if group_count > 8 {
        return None;
    }
    if embedded_count > 0 && !has_compression && group_count - 2 < 6 {
        // §4.1: embedded IPv4 requires >= 6 preceding groups unless "::" is used.
        return None;
    }

    let canonical = if has_compression {
        format!("{}::{}", left_owned.join(":"), right_owned.join(":"))
    } else {
        left_owned.join(":")
    };

    Some(ParsedAddress {
        kind: AddressKind::Ipv6,
        canonical,
    })
}

/// Idempotent canonicalization check used by tests (§4.1's testable
/// invariant): re-classifying an address's own canonical form must yield
/// the same canonical form.
pub fn canon(input: &str) -> Option<String> {
    classify_token(input).map(|p| p.canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_ipv4() {
        let a = classify_token("10.0.0.1").unwrap();
        assert_eq!(a.kind, AddressKind::Ipv4);
        assert_eq!(a.canonical, "10.0.0.1");
    }

    #[test]
    fn ipv4_strips_leading_zeros_in_canonical_form() {
        let a = classify_token("010.001.000.255").unwrap();
        assert_eq!(a.canonical, "10.1.0.255");
    }

    #[test]
    fn rejects_ipv4_octet_over_255() {
        assert!(classify_token("256.0.0.1").is_none());
    }

    #[test]
    fn rejects_ipv4_with_too_few_octets() {
        assert!(classify_token("10.0.1").is_none());
    }

    #[test]
    fn classifies_mac_colon() {
        let a = classify_token("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(a.kind, AddressKind::Mac);
        assert_eq!(a.canonical, "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn classifies_mac_dash_and_canonicalizes_to_colon_lowercase() {
        let a = classify_token("AA-BB-CC-DD-EE-FF").unwrap();
        assert_eq!(a.kind, AddressKind::Mac);
        assert_eq!(a.canonical, "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn rejects_mac_with_mixed_separators() {
        assert!(classify_token("aa:bb-cc:dd:ee:ff").is_none());
    }

    #[test]
    fn classifies_ipv6_loopback() {
        let a = classify_token("::1").unwrap();
        assert_eq!(a.kind, AddressKind::Ipv6);
        assert_eq!(a.canonical, "::1");
    }

    #[test]
    fn classifies_full_ipv6() {
        let a = classify_token("2001:0DB8:0000:0000:0000:0000:0000:0001").unwrap();
        assert_eq!(a.kind, AddressKind::Ipv6);
        assert_eq!(a.canonical, "2001:0db8:0000:0000:0000:0000:0000:0001");
    }

    #[test]
    fn classifies_ipv6_with_embedded_ipv4() {
        let a = classify_token("::ffff:192.0.2.128").unwrap();
        assert_eq!(a.kind, AddressKind::Ipv6);
        assert!(a.canonical.ends_with("c000:0280") || a.canonical.contains("c0:0280"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(classify_token("not-an-address").is_none());
        assert!(classify_token("hello").is_none());
        assert!(classify_token("1.2.3.4.5").is_none());
    }

    #[test]
    fn canon_is_idempotent() {
        for tok in ["10.0.0.1", "aa:bb:cc:dd:ee:ff", "::1", "2001:db8::1"] {
            let once = canon(tok).unwrap();
            let twice = canon(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn parse_line_extracts_in_order() {
        let line = "u 192.168.1.1 v aa:bb:cc:dd:ee:ff w ::1 x";
        let addrs = parse_line_addresses(line);
        assert_eq!(addrs.len(), 3);
        assert_eq!(addrs[0].canonical, "192.168.1.1");
        assert_eq!(addrs[1].canonical, "aa:bb:cc:dd:ee:ff");
        assert_eq!(addrs[2].canonical, "::1");
    }
}
