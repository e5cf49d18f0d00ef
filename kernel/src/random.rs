//! xorshift64 generator for the lottery draw. Not cryptographic.

use rand_core::{RngCore, impls};

#[derive(Debug, Clone)]
pub struct KernelRng {
    state: u64,
}

impl KernelRng {
    pub fn new(seed: u64) -> Self {
        // xorshift 的状态不能为 0
        let state = if seed == 0 { 0xdead_beef_cafe_babe } else { seed };
        Self { state }
    }

    /// Uniform value in `[0, bound)`; 0 when `bound` is 0.
    pub fn next_bounded(&mut self, bound: u64) -> u64 {
        bounded(self, bound)
    }
}

impl RngCore for KernelRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Rejection sampling, so every value in `[0, bound)` is equally likely.
pub fn bounded<R: RngCore + ?Sized>(rng: &mut R, bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    let threshold = bound.wrapping_neg() % bound;
    loop {
        let val = rng.next_u64();
        if val >= threshold {
            return val % bound;
        }
    }
}
