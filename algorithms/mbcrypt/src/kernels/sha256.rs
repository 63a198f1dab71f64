//! Portable SHA-256 compression function.

use super::constants::{SHA256_BLOCK_SIZE, SHA256_K};

#[inline(always)]
const fn big_sigma0(x: u32) -> u32 {
    x.rotate_right(2) ^ x.rotate_right(13) ^ x.rotate_right(22)
}

#[inline(always)]
const fn big_sigma1(x: u32) -> u32 {
    x.rotate_right(6) ^ x.rotate_right(11) ^ x.rotate_right(25)
}

#[inline(always)]
const fn small_sigma0(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline(always)]
const fn small_sigma1(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

/// Compress every complete 64-byte block of `data` into `state`.
///
/// `schedule` is caller-owned scratch so it can be wiped with the rest of the
/// hasher. Returns the number of bytes consumed (a multiple of 64).
pub fn compress_blocks(state: &mut [u32; 8], schedule: &mut [u32; 64], data: &[u8]) -> usize {
    let mut consumed = 0;

    for block in data.chunks_exact(SHA256_BLOCK_SIZE) {
        for (w, word) in schedule.iter_mut().zip(block.chunks_exact(4)) {
            *w = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
        }
        for t in 16..64 {
            schedule[t] = small_sigma1(schedule[t - 2])
                .wrapping_add(schedule[t - 7])
                .wrapping_add(small_sigma0(schedule[t - 15]))
                .wrapping_add(schedule[t - 16]);
        }

        let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

        for (k, w) in SHA256_K.iter().zip(schedule.iter()) {
            let t1 = h
                .wrapping_add(big_sigma1(e))
                .wrapping_add((e & f) ^ (!e & g))
                .wrapping_add(*k)
                .wrapping_add(*w);
            let t2 = big_sigma0(a).wrapping_add((a & b) ^ (a & c) ^ (b & c));

            h = g;
            g = f;
            f = e;
            e = d.wrapping_add(t1);
            d = c;
            c = b;
            b = a;
            a = t1.wrapping_add(t2);
        }

        state[0] = state[0].wrapping_add(a);
        state[1] = state[1].wrapping_add(b);
        state[2] = state[2].wrapping_add(c);
        state[3] = state[3].wrapping_add(d);
        state[4] = state[4].wrapping_add(e);
        state[5] = state[5].wrapping_add(f);
        state[6] = state[6].wrapping_add(g);
        state[7] = state[7].wrapping_add(h);

        consumed += SHA256_BLOCK_SIZE;
    }

    consumed
}
