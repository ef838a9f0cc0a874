//! 256-bit arithmetic with EVM semantics
//!
//! Unsigned operations wrap mod 2^256. Signed operations read words as
//! two's complement. Division or modulo by zero yields zero.

use keel_primitives::{word, Word, U512};

fn sign_bit() -> Word {
    Word::one() << 255
}

fn low_word(value: U512) -> Word {
    let mut buf = [0u8; 64];
    value.to_big_endian(&mut buf);
    Word::from_big_endian(&buf[32..])
}

/// Unsigned division, zero divisor gives zero
pub fn div(a: Word, b: Word) -> Word {
    if b.is_zero() {
        Word::zero()
    } else {
        a / b
    }
}

/// Unsigned remainder, zero divisor gives zero
pub fn rem(a: Word, b: Word) -> Word {
    if b.is_zero() {
        Word::zero()
    } else {
        a % b
    }
}

/// Signed division truncating toward zero
pub fn sdiv(a: Word, b: Word) -> Word {
    if b.is_zero() {
        return Word::zero();
    }
    let (a_neg, a_mag) = word::to_sign_magnitude(a);
    let (b_neg, b_mag) = word::to_sign_magnitude(b);
    word::from_sign_magnitude(a_neg != b_neg, a_mag / b_mag)
}

/// Signed remainder, carrying the sign of the dividend
pub fn smod(a: Word, b: Word) -> Word {
    if b.is_zero() {
        return Word::zero();
    }
    let (a_neg, a_mag) = word::to_sign_magnitude(a);
    let (_, b_mag) = word::to_sign_magnitude(b);
    word::from_sign_magnitude(a_neg, a_mag % b_mag)
}

/// `(a + b) % n` without intermediate overflow
pub fn addmod(a: Word, b: Word, n: Word) -> Word {
    if n.is_zero() {
        return Word::zero();
    }
    low_word((U512::from(a) + U512::from(b)) % U512::from(n))
}

/// `(a * b) % n` without intermediate overflow
pub fn mulmod(a: Word, b: Word, n: Word) -> Word {
    if n.is_zero() {
        return Word::zero();
    }
    low_word(a.full_mul(b) % U512::from(n))
}

/// `base ** exponent` mod 2^256
pub fn exp(base: Word, exponent: Word) -> Word {
    base.overflowing_pow(exponent).0
}

/// Extend the sign of the `(b + 1)`-byte value held in the low bytes of `x`.
pub fn signextend(b: Word, x: Word) -> Word {
    if b >= Word::from(31u64) {
        return x;
    }
    let bit = b.low_u64() as usize * 8 + 7;
    let mask = (Word::one() << bit) - Word::one();
    if x.bit(bit) {
        x | !mask
    } else {
        x & mask
    }
}

/// Byte `i` of `x`, counting from the most significant byte
pub fn byte(i: Word, x: Word) -> Word {
    if i >= Word::from(32u64) {
        return Word::zero();
    }
    let shift = (31 - i.low_u64() as usize) * 8;
    (x >> shift) & Word::from(0xffu64)
}

/// Left shift; shifts of 256 or more give zero
pub fn shl(shift: Word, value: Word) -> Word {
    if shift >= Word::from(256u64) {
        Word::zero()
    } else {
        value << shift.low_u64() as usize
    }
}

/// Logical right shift; shifts of 256 or more give zero
pub fn shr(shift: Word, value: Word) -> Word {
    if shift >= Word::from(256u64) {
        Word::zero()
    } else {
        value >> shift.low_u64() as usize
    }
}

/// Arithmetic right shift
pub fn sar(shift: Word, value: Word) -> Word {
    let negative = word::is_negative(&value);
    if shift >= Word::from(256u64) {
        return if negative { Word::MAX } else { Word::zero() };
    }
    let shift = shift.low_u64() as usize;
    if negative {
        !((!value) >> shift)
    } else {
        value >> shift
    }
}

/// Signed less-than
pub fn slt(a: Word, b: Word) -> bool {
    (a ^ sign_bit()) < (b ^ sign_bit())
}

/// Signed greater-than
pub fn sgt(a: Word, b: Word) -> bool {
    (a ^ sign_bit()) > (b ^ sign_bit())
}

/// Number of significant bytes of an EXP exponent
pub fn exponent_bytes(exponent: &Word) -> u64 {
    (exponent.bits() as u64).div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: u64) -> Word {
        Word::from(v)
    }

    fn neg(v: u64) -> Word {
        word::negate(w(v))
    }

    #[test]
    fn test_wrapping_add_mul_sub() {
        assert_eq!(Word::MAX.overflowing_add(Word::MAX).0, Word::MAX - w(1));
        assert_eq!(w(0).overflowing_sub(w(1)).0, Word::MAX);
        assert_eq!((Word::one() << 255).overflowing_mul(w(2)).0, Word::zero());
    }

    #[test]
    fn test_unsigned_div_rem() {
        assert_eq!(div(w(10), w(3)), w(3));
        assert_eq!(div(w(10), w(0)), w(0));
        assert_eq!(rem(w(10), w(3)), w(1));
        assert_eq!(rem(w(10), w(0)), w(0));
    }

    #[test]
    fn test_sdiv() {
        assert_eq!(sdiv(neg(10), w(3)), neg(3));
        assert_eq!(sdiv(w(10), neg(3)), neg(3));
        assert_eq!(sdiv(neg(10), neg(3)), w(3));
        assert_eq!(sdiv(w(10), w(0)), w(0));
        // MIN / -1 overflows back to MIN
        let min = Word::one() << 255;
        assert_eq!(sdiv(min, Word::MAX), min);
    }

    #[test]
    fn test_smod() {
        assert_eq!(smod(neg(8), neg(3)), neg(2));
        assert_eq!(smod(w(8), neg(3)), w(2));
        assert_eq!(smod(neg(8), w(3)), neg(2));
        assert_eq!(smod(w(8), w(0)), w(0));
    }

    #[test]
    fn test_addmod_mulmod_wide() {
        assert_eq!(addmod(Word::MAX, w(2), w(2)), w(1));
        assert_eq!(addmod(w(10), w(10), w(8)), w(4));
        assert_eq!(addmod(w(1), w(2), w(0)), w(0));
        assert_eq!(mulmod(Word::MAX, Word::MAX, w(12)), w(9));
        assert_eq!(mulmod(w(10), w(10), w(8)), w(4));
        assert_eq!(mulmod(w(1), w(2), w(0)), w(0));
    }

    #[test]
    fn test_exp() {
        assert_eq!(exp(w(2), w(10)), w(1024));
        assert_eq!(exp(w(2), w(256)), w(0));
        assert_eq!(exp(w(0x0123_6512_4623), w(0)), w(1));
        assert_eq!(exponent_bytes(&w(0)), 0);
        assert_eq!(exponent_bytes(&w(0x16)), 1);
        assert_eq!(exponent_bytes(&w(0x100)), 2);
        assert_eq!(exponent_bytes(&Word::MAX), 32);
    }

    #[test]
    fn test_signextend() {
        assert_eq!(signextend(w(0), w(0xff)), Word::MAX);
        assert_eq!(signextend(w(0), w(0x7f)), w(0x7f));
        assert_eq!(signextend(w(1), w(0x0fff)), w(0x0fff));
        assert_eq!(signextend(w(2), w(0x0fff)), w(0x0fff));
        assert_eq!(signextend(w(32), w(0xff)), w(0xff));
    }

    #[test]
    fn test_byte() {
        assert_eq!(byte(w(31), w(0xff)), w(0xff));
        assert_eq!(byte(w(30), w(0xff00)), w(0xff));
        assert_eq!(byte(w(0), Word::MAX), w(0xff));
        assert_eq!(byte(w(32), Word::MAX), w(0));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(w(1), w(5)), w(10));
        assert_eq!(shl(w(256), w(5)), w(0));
        assert_eq!(shr(w(1), w(5)), w(2));
        assert_eq!(shr(w(300), Word::MAX), w(0));
        assert_eq!(sar(w(1), neg(1)), Word::MAX);
        assert_eq!(sar(w(2), w(0xff)), w(0x3f));
        assert_eq!(sar(w(4), neg(16)), neg(1));
        assert_eq!(sar(w(256), neg(16)), Word::MAX);
        assert_eq!(sar(w(256), w(16)), w(0));
    }

    #[test]
    fn test_signed_comparison() {
        assert!(slt(neg(1), w(0)));
        assert!(!slt(w(0), neg(1)));
        assert!(sgt(w(1), neg(1)));
        assert!(!sgt(neg(2), neg(1)));
        assert!(!slt(w(5), w(5)));
    }
}
