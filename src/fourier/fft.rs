//! Iterative radix-2 decimation-in-time inverse transform.
//!
//! A [`ButterflyTable`] holds, for every pass and every output index, the two
//! input indices it combines and the twiddle factor applied to the second.
//! The first pass reads through a bit-reversal permutation; later passes use
//! straight indices.  A 2-D transform runs all passes along rows, then all
//! passes along columns, ping-ponging between two buffers, and finally flips
//! the sign of every odd cell (`(−1)^{x+z}`) to undo the half-grid shift of
//! the centred frequency indexing.
//!
//! Tables depend only on `N`.  [`butterfly_table`] builds each one once per
//! process and hands out shared references afterwards.

use std::{
    collections::HashMap,
    f64::consts::TAU,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use bevy::log::debug;
use num_complex::Complex32;
use rayon::prelude::*;

use super::{FourierSolver, PackedPair, ZERO_PAIR};

/// One output index of one pass: `out = in[top] + twiddle · in[bottom]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Butterfly {
    pub top: usize,
    pub bottom: usize,
    pub twiddle: Complex32,
}

/// Precomputed index pairs and twiddles for all `log2(N)` passes.
#[derive(Debug, PartialEq)]
pub struct ButterflyTable {
    size: usize,
    passes: usize,
    entries: Vec<Butterfly>,
}

impl ButterflyTable {
    /// Build the table for a power-of-two `size`.
    ///
    /// # Panics
    /// If `size` is not a power of two.
    pub fn new(size: usize) -> Self {
        assert!(size.is_power_of_two(), "butterfly size must be a power of two");
        let passes = size.trailing_zeros() as usize;
        let mut entries = vec![
            Butterfly {
                top: 0,
                bottom: 0,
                twiddle: Complex32::new(0.0, 0.0),
            };
            size * passes
        ];

        for pass in 0..passes {
            let blocks = 1usize << (passes - 1 - pass);
            let half = 1usize << pass;
            for block in 0..blocks {
                for k in 0..half {
                    let i1 = block * half * 2 + k;
                    let i2 = i1 + half;
                    let (top, bottom) = if pass == 0 {
                        (bit_reverse(i1, passes), bit_reverse(i2, passes))
                    } else {
                        (i1, i2)
                    };
                    let angle = TAU * (k * blocks) as f64 / size as f64;
                    let twiddle = Complex32::new(angle.cos() as f32, angle.sin() as f32);

                    entries[pass * size + i1] = Butterfly {
                        top,
                        bottom,
                        twiddle,
                    };
                    entries[pass * size + i2] = Butterfly {
                        top,
                        bottom,
                        twiddle: -twiddle,
                    };
                }
            }
        }

        Self {
            size,
            passes,
            entries,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// The `size` butterflies of pass `pass`, indexed by output position.
    pub fn stage(&self, pass: usize) -> &[Butterfly] {
        &self.entries[pass * self.size..(pass + 1) * self.size]
    }
}

/// Reverse the low `bits` bits of `i`.
fn bit_reverse(i: usize, bits: usize) -> usize {
    let mut out = 0;
    for b in 0..bits {
        out = (out << 1) | ((i >> b) & 1);
    }
    out
}

/// Shared butterfly table for `size`, built on first request.
pub fn butterfly_table(size: usize) -> Arc<ButterflyTable> {
    static CACHE: OnceLock<Mutex<HashMap<usize, Arc<ButterflyTable>>>> = OnceLock::new();
    let mut tables = CACHE
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(tables.entry(size).or_insert_with(|| {
        debug!("building {size}-point butterfly table");
        Arc::new(ButterflyTable::new(size))
    }))
}

#[inline]
fn apply(w: Complex32, a: &PackedPair, b: &PackedPair) -> PackedPair {
    [a[0] + w * b[0], a[1] + w * b[1]]
}

/// Butterfly FFT solver backed by a cached [`ButterflyTable`].
#[derive(Clone, Debug)]
pub struct ButterflyFft {
    table: Arc<ButterflyTable>,
}

impl ButterflyFft {
    pub fn new(size: usize) -> Self {
        Self {
            table: butterfly_table(size),
        }
    }

    pub fn table(&self) -> &Arc<ButterflyTable> {
        &self.table
    }
}

impl FourierSolver for ButterflyFft {
    fn size(&self) -> usize {
        self.table.size
    }

    fn transform(&self, input: &[PackedPair]) -> Vec<PackedPair> {
        let n = self.table.size;
        assert_eq!(input.len(), n * n, "input must be N×N");
        let mut src = input.to_vec();
        let mut dst = vec![ZERO_PAIR; n * n];

        // Rows: every row is independent.
        for pass in 0..self.table.passes {
            let stage = self.table.stage(pass);
            dst.par_chunks_mut(n)
                .zip(src.par_chunks(n))
                .for_each(|(out_row, in_row)| {
                    for (out, b) in out_row.iter_mut().zip(stage) {
                        *out = apply(b.twiddle, &in_row[b.top], &in_row[b.bottom]);
                    }
                });
            std::mem::swap(&mut src, &mut dst);
        }

        // Columns: output row z combines whole input rows `top` and `bottom`.
        for pass in 0..self.table.passes {
            let stage = self.table.stage(pass);
            let input = &src;
            dst.par_chunks_mut(n).enumerate().for_each(|(z, out_row)| {
                let b = stage[z];
                let top = &input[b.top * n..(b.top + 1) * n];
                let bottom = &input[b.bottom * n..(b.bottom + 1) * n];
                for ((out, a), c) in out_row.iter_mut().zip(top).zip(bottom) {
                    *out = apply(b.twiddle, a, c);
                }
            });
            std::mem::swap(&mut src, &mut dst);
        }

        // After the final swap the result is always in `src`, whatever the
        // parity of the pass count, so no trailing copy is needed.
        src.par_chunks_mut(n).enumerate().for_each(|(z, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                if (x + z) & 1 == 1 {
                    cell[0] = -cell[0];
                    cell[1] = -cell[1];
                }
            }
        });
        src
    }
}
