/// FNV mixing function for Cloverhash
///
/// This is the FNV-1 style combiner Ethash uses (multiply, then xor), not the
/// FNV-1a order. Arithmetic wraps at 32 bits; there is no extra reduction
/// modulo `u32::MAX`.

pub const FNV_PRIME: u32 = 0x0100_0193;

/// Combine two 32-bit values
#[inline(always)]
pub fn fnv(a: u32, b: u32) -> u32 {
    a.wrapping_mul(FNV_PRIME) ^ b
}

/// Left fold of four words: `fnv(fnv(fnv(a, b), c), d)`
#[inline(always)]
pub fn fnv_fold4(words: [u32; 4]) -> u32 {
    fnv(fnv(fnv(words[0], words[1]), words[2]), words[3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fnv_known_values() {
        assert_eq!(fnv(0x1234_5678, 0x9abc_def0), 0xbad8_c018);
        // 0xffffffff * prime wraps; a modulo-u32::MAX variant would differ here
        assert_eq!(fnv(0xffff_ffff, 0), 0xfeff_fe6d);
        assert_eq!(fnv(0, 0x55), 0x55);
    }

    #[test]
    fn test_fold_order() {
        assert_eq!(fnv_fold4([1, 2, 3, 4]), 0xefe1_b9c4);
        // Reversing the operands gives a different value
        assert_eq!(fnv_fold4([4, 3, 2, 1]), 0x6fa2_3f8c);
    }

    proptest! {
        #[test]
        fn fold_matches_nested_calls(a: u32, b: u32, c: u32, d: u32) {
            prop_assert_eq!(fnv_fold4([a, b, c, d]), fnv(fnv(fnv(a, b), c), d));
        }

        #[test]
        fn fnv_is_xor_of_scaled_input(a: u32, b: u32) {
            prop_assert_eq!(fnv(a, b) ^ fnv(a, 0), b);
        }
    }
}
