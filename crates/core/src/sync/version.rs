//! Server-side version assignment for accepted sync writes.

/// Next monotonic version for a user's snapshot.
///
/// The result is strictly greater than both the server's last-known version
/// and whatever version the client declares, so a client can never observe a
/// version equal to or behind one it already fetched. Clients that ran ahead
/// locally (edits the server never saw) are respected rather than clamped.
/// Non-finite client values count as 0; values beyond the `i64` range
/// saturate at `i64::MAX` rather than wrapping.
pub fn next_version(previous_version: i64, client_declared_version: f64) -> i64 {
    let client = if client_declared_version.is_finite() {
        // Float-to-int casts saturate, so a huge declared version pins at
        // i64::MAX here instead of producing an out-of-range value.
        client_declared_version.floor() as i64
    } else {
        0
    };
    previous_version
        .saturating_add(1)
        .max(client.saturating_add(1))
}
