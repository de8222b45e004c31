/// Indices of the set bits among the low `width` bits of `bits`, ascending.
pub fn bits_to_list(bits: u16, width: u8) -> Vec<u8> {
    (0..width.min(16))
        .filter(|i| (bits >> *i) & 1 == 1)
        .collect()
}
