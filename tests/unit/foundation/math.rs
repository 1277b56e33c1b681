use super::*;

#[test]
fn fnv_hash_is_order_sensitive_and_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"backdrop");
    a.write_u64(7);
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"backdrop");
    b.write_u64(7);
    assert_eq!(a.finish(), b.finish());

    let mut c = Fnv1a64::new_default();
    c.write_u64(7);
    c.write_bytes(b"backdrop");
    assert_ne!(a.finish(), c.finish());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premultiply_handles_alpha_extremes() {
    let mut px = vec![100u8, 50, 200, 128, 9, 9, 9, 0, 1, 2, 3, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(
        &px[0..4],
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[1, 2, 3, 255]);
}
