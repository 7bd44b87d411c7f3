//! Secondary bit-diffusion pass.
//!
//! Older region builds layer an extra invertible byte transform over the
//! block cipher: three rounds, each a forward sweep then a backward sweep
//! of rotate/chain/offset mixing. It is a compatibility shim inherited from
//! the client, not a security boundary, and runs only when the region and
//! version configuration selects it (see `ProtocolConfig::uses_diffusion`).
//!
//! `scramble` is applied before block-cipher encryption on send; `unscramble`
//! after decryption on receive.

const ROUNDS: usize = 3;
const FWD_SALT: u8 = 0x48;
const BWD_SALT: u8 = 0x13;

/// Forward transform, applied to plaintext before encryption.
pub fn scramble(data: &mut [u8]) {
    for _ in 0..ROUNDS {
        sweep_fwd_enc(data);
        sweep_bwd_enc(data);
    }
}

/// Inverse transform, applied to plaintext after decryption.
pub fn unscramble(data: &mut [u8]) {
    for _ in 0..ROUNDS {
        sweep_bwd_dec(data);
        sweep_fwd_dec(data);
    }
}

// Each sweep chains a running byte through the buffer. The chained value is
// the pre-offset mix result, so the inverse can rebuild the chain from the
// stored bytes alone.

fn sweep_fwd_enc(data: &mut [u8]) {
    let mut chain = 0u8;
    for (i, b) in data.iter_mut().enumerate() {
        let mixed = b.rotate_left(3) ^ chain;
        *b = mixed.wrapping_add(FWD_SALT.wrapping_add(i as u8));
        chain = mixed;
    }
}

fn sweep_fwd_dec(data: &mut [u8]) {
    let mut chain = 0u8;
    for (i, b) in data.iter_mut().enumerate() {
        let mixed = b.wrapping_sub(FWD_SALT.wrapping_add(i as u8));
        *b = (mixed ^ chain).rotate_right(3);
        chain = mixed;
    }
}

fn sweep_bwd_enc(data: &mut [u8]) {
    let mut chain = 0u8;
    for (i, b) in data.iter_mut().enumerate().rev() {
        let mixed = b.rotate_left(4) ^ chain;
        *b = mixed.wrapping_add(BWD_SALT.wrapping_add(i as u8));
        chain = mixed;
    }
}

fn sweep_bwd_dec(data: &mut [u8]) {
    let mut chain = 0u8;
    for (i, b) in data.iter_mut().enumerate().rev() {
        let mixed = b.wrapping_sub(BWD_SALT.wrapping_add(i as u8));
        *b = (mixed ^ chain).rotate_right(4);
        chain = mixed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_and_single_byte() {
        let mut empty: [u8; 0] = [];
        scramble(&mut empty);
        unscramble(&mut empty);

        let mut one = [0x42u8];
        scramble(&mut one);
        unscramble(&mut one);
        assert_eq!(one, [0x42]);
    }

    #[test]
    fn changes_the_buffer() {
        let mut data = [0u8; 64];
        scramble(&mut data);
        assert_ne!(data, [0u8; 64]);
    }

    proptest! {
        #[test]
        fn roundtrip(data in prop::collection::vec(any::<u8>(), 0..2048)) {
            let mut scrambled = data.clone();
            scramble(&mut scrambled);
            unscramble(&mut scrambled);
            prop_assert_eq!(scrambled, data);
        }
    }
}
