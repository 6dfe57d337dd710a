//! Store path-segment derivation.

/// Characters the key-tree path syntax reserves.
const RESERVED: [char; 6] = ['.', '#', '$', '[', ']', '/'];

/// Derive the `Artists/{key}` segment from an email address.
///
/// Reserved characters become `_` and the first `@` becomes `AT`, so
/// `a.b@c.com` maps to `a_bATc_com`. The mapping is not injective: a
/// literal `_` in the local part collides with an escaped `.`.
pub fn artist_key(email: &str) -> String {
    let escaped: String = email
        .chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect();
    escaped.replacen('@', "AT", 1)
}
