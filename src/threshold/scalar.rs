use super::table::LookupTable;

/// Map `src[start..]` through `table` into `dst[start..]`.
///
/// Four samples per iteration, then a remainder loop. `src` and `dst` must
/// have the same length; `start` is where a preceding vector pass stopped.
pub fn apply_row(src: &[u8], dst: &mut [u8], table: &LookupTable, start: usize) {
    assert_eq!(src.len(), dst.len(), "source and destination rows differ in length");
    if start >= src.len() {
        return;
    }

    let src = &src[start..];
    let dst = &mut dst[start..];

    let mut src_quads = src.chunks_exact(4);
    let mut dst_quads = dst.chunks_exact_mut(4);
    for (s, d) in (&mut src_quads).zip(&mut dst_quads) {
        let t0 = table.get(s[0]);
        let t1 = table.get(s[1]);
        d[0] = t0;
        d[1] = t1;

        let t0 = table.get(s[2]);
        let t1 = table.get(s[3]);
        d[2] = t0;
        d[3] = t1;
    }

    // Remainder
    for (s, d) in src_quads
        .remainder()
        .iter()
        .zip(dst_quads.into_remainder().iter_mut())
    {
        *d = table.get(*s);
    }
}
