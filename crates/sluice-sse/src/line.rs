//! Line location over buffered bytes.

/// Find the next `\n`-terminated line in `buf`.
///
/// Returns `(line_end, next_start)`: the exclusive end of the line content,
/// with one `\r` before the `\n` excluded, and the offset just past the
/// `\n`. Returns `None` when no terminator is buffered yet.
pub(crate) fn find_line(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = memchr::memchr(b'\n', buf)?;
    let end = if lf > 0 && buf[lf - 1] == b'\r' { lf - 1 } else { lf };
    Some((end, lf + 1))
}

/// Strip leading and trailing spaces and tabs.
pub(crate) fn trim_ows(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}
