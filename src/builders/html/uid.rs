//! Object type identifiers of the form `<prefix>.<namespace>.<object>`.
//!
//! Both parts after the prefix are lowercase, unpadded base32. HTML file
//! types live in a fixed namespace that depends on the platform version,
//! and their object part is derived from the file content, so the same
//! content always maps to the same type.

use sha2::{Digest, Sha256};

/// Namespace of HTML file types on 5.0.3 platforms.
pub const HTML_NAMESPACE_5_0_3: &str = "nulr4l2rmpbelizyq3aoiagyee";
/// Namespace of HTML file types on every other platform version.
pub const HTML_NAMESPACE: &str = "apsutrxlanbe5eerqx5ddeybmm";

const NAMESPACE_BYTES: usize = 16;
const OBJECT_BYTES: usize = 20;

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// RFC 4648 base32 in lowercase, without padding.
pub fn base32_lower(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer: u16 = 0;
    let mut bits = 0;
    for &byte in data {
        buffer = (buffer << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[usize::from((buffer >> bits) & 0x1f)] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[usize::from((buffer << (5 - bits)) & 0x1f)] as char);
    }
    out
}

fn hashed_part(seed: &[u8], len: usize) -> String {
    let digest = Sha256::digest(seed);
    base32_lower(&digest[..len])
}

/// The HTML file namespace for a platform version.
pub fn html_namespace(version: &str) -> &'static str {
    if version.starts_with("5.0.3") {
        HTML_NAMESPACE_5_0_3
    } else {
        HTML_NAMESPACE
    }
}

/// Content-addressed identifier for an HTML file type.
///
/// ```
/// use ebo_factory::builders::html::uid::html_file_uid;
///
/// let uid = html_file_uid("<html></html>", "udt", "6.0.4.90");
/// assert!(uid.starts_with("udt.apsutrxlanbe5eerqx5ddeybmm."));
/// assert_eq!(uid.rsplit('.').next().unwrap().len(), 32);
/// ```
pub fn html_file_uid(content: &str, prefix: &str, version: &str) -> String {
    format!(
        "{}.{}.{}",
        prefix,
        html_namespace(version),
        hashed_part(content.as_bytes(), OBJECT_BYTES)
    )
}

/// Reproducible identifier with both parts derived from seeds.
pub fn seeded_uid(prefix: &str, namespace_seed: &str, object_seed: &str) -> String {
    format!(
        "{}.{}.{}",
        prefix,
        hashed_part(namespace_seed.as_bytes(), NAMESPACE_BYTES),
        hashed_part(object_seed.as_bytes(), OBJECT_BYTES)
    )
}

/// Reproducible identifier for an object of a project.
pub fn project_uid(prefix: &str, project: &str, name: &str) -> String {
    seeded_uid(
        prefix,
        &format!("project_{}", project),
        &format!("object_{}_{}", name, project),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base32_lower() {
        assert_eq!(base32_lower(b""), "");
        assert_eq!(base32_lower(b"f"), "my");
        assert_eq!(base32_lower(b"foobar"), "mzxw6ytboi");
        assert_eq!(base32_lower(&[0xff; 16]).len(), 26);
        assert_eq!(base32_lower(&[0xff; 20]).len(), 32);
    }

    #[test]
    fn test_html_file_uid() {
        assert_eq!(
            html_file_uid("<html></html>", "udt", "6.0.4.90"),
            "udt.apsutrxlanbe5eerqx5ddeybmm.wyz2lb6gklichbwe6fxyy33kvnzvfwl7"
        );
        assert_eq!(
            html_file_uid("<html></html>", "udt", "5.0.3.117"),
            "udt.nulr4l2rmpbelizyq3aoiagyee.wyz2lb6gklichbwe6fxyy33kvnzvfwl7"
        );
        assert_ne!(
            html_file_uid("<html></html>", "udt", "6.0.4.90"),
            html_file_uid("<html> </html>", "udt", "6.0.4.90")
        );
    }

    #[test]
    fn test_seeded_uid() {
        let uid = project_uid("udt", "site", "pump");
        assert_eq!(
            uid,
            "udt.t3mlrpeqq5u7qsv422uxpcwhoi.5sxjbv6tip7mvx3pg7vf36rgewcfspdx"
        );
        assert_eq!(uid, seeded_uid("udt", "project_site", "object_pump_site"));
    }
}
