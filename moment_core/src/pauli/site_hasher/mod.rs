//! Bit-packed representation of a Pauli operator string (spec component D).
//!
//! Each site (qubit) takes 2 bits: `00` = identity/absent, `01` = X,
//! `10` = Y, `11` = Z. Up to 32 sites pack into one 64-bit "slide"; a
//! context with more than 256 qubits cannot be wrapped (see
//! `PauliContext::site_hasher`), so a `Datum` never needs more than
//! [`MAX_SLIDES`] of them.

pub const MAX_SLIDES: usize = 8;
pub const QUBITS_PER_SLIDE: usize = 32;

// Each site takes 2 bits, so a slide must pack exactly into one u64 with
// no spare bits left for `encode`/`decode` to accidentally shift into.
static_assertions::const_assert_eq!(QUBITS_PER_SLIDE * 2, 64);
// A signature/slot pair must fit the `Handle` a `PersistentStore` hands
// out, or `store::persistent_store::combine` silently truncates slots.
static_assertions::const_assert!(MAX_SLIDES * QUBITS_PER_SLIDE <= u32::MAX as usize);

/// A fixed-capacity bit-packed encoding of one operator string over up to
/// `MAX_SLIDES * QUBITS_PER_SLIDE` sites. Only `slides[..k]` are
/// meaningful; the rest are always zero.
#[derive(Debug, Clone, Copy)]
pub struct Datum {
    slides: [u64; MAX_SLIDES],
    k: usize,
}

impl Datum {
    pub fn zero(k: usize) -> Self {
        debug_assert!(k >= 1 && k <= MAX_SLIDES);
        Self {
            slides: [0; MAX_SLIDES],
            k,
        }
    }

    pub fn slides(&self) -> &[u64] {
        &self.slides[..self.k]
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.k == other.k && self.slides[..self.k] == other.slides[..self.k]
    }
}
impl Eq for Datum {}

impl PartialOrd for Datum {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order over datums: reverse lexicographic over slides, most
/// significant (highest-index) slide first. Used to find the orbit
/// minimum during canonicalization.
impl Ord for Datum {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        debug_assert_eq!(self.k, other.k);
        for idx in (0..self.k).rev() {
            match self.slides[idx].cmp(&other.slides[idx]) {
                std::cmp::Ordering::Equal => continue,
                ord => return ord,
            }
        }
        std::cmp::Ordering::Equal
    }
}

/// Fixed geometry a `Datum` was built against: total qubit count, the
/// lattice it is laid out on (`column_height` rows of `row_width`
/// columns; a chain is `column_height == qubits, row_width == 1`), and
/// the slide count `k = ceil(qubits / QUBITS_PER_SLIDE)`.
#[derive(Debug, Clone, Copy)]
pub struct WrappingSiteHasher {
    qubits: usize,
    column_height: usize,
    row_width: usize,
    k: usize,
}

impl WrappingSiteHasher {
    pub fn new(qubits: usize, column_height: usize, row_width: usize) -> Self {
        assert_eq!(column_height * row_width, qubits);
        let k = qubits.div_ceil(QUBITS_PER_SLIDE).max(1);
        assert!(k <= MAX_SLIDES, "wrapping requires at most 256 qubits");
        Self {
            qubits,
            column_height,
            row_width,
            k,
        }
    }

    pub fn qubits(&self) -> usize {
        self.qubits
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Packs a dense array of per-site axis codes (`0` = identity, `1..=3`
    /// for X/Y/Z) into a `Datum`.
    pub fn encode(&self, axes: &[u8]) -> Datum {
        debug_assert_eq!(axes.len(), self.qubits);
        let mut datum = Datum::zero(self.k);
        for (site, &axis) in axes.iter().enumerate() {
            if axis == 0 {
                continue;
            }
            let slide = site / QUBITS_PER_SLIDE;
            let offset = (site % QUBITS_PER_SLIDE) * 2;
            datum.slides[slide] |= (axis as u64) << offset;
        }
        datum
    }

    pub fn decode(&self, datum: &Datum) -> Vec<u8> {
        let mut axes = vec![0u8; self.qubits];
        for site in 0..self.qubits {
            let slide = site / QUBITS_PER_SLIDE;
            let offset = (site % QUBITS_PER_SLIDE) * 2;
            axes[site] = ((datum.slides[slide] >> offset) & 0b11) as u8;
        }
        axes
    }

    fn site_index(&self, row: usize, col: usize) -> usize {
        row * self.row_width + col
    }

    /// Rotates the whole chain of `qubits` sites cyclically by `offset`
    /// sites, ignoring any lattice structure. This is the primitive a
    /// 1-D periodic ring uses; `k == 1` keeps a direct bit-rotation fast
    /// path since the whole datum then fits in a single word.
    pub fn cyclic_shift(&self, datum: &Datum, offset: usize) -> Datum {
        let offset = offset % self.qubits;
        if offset == 0 {
            return *datum;
        }
        if self.k == 1 {
            let width = 2 * self.qubits;
            let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
            let bits = 2 * offset;
            let v = datum.slides[0];
            let rotated = ((v << bits) | (v >> (width - bits))) & mask;
            return Datum {
                slides: {
                    let mut s = [0u64; MAX_SLIDES];
                    s[0] = rotated;
                    s
                },
                k: 1,
            };
        }
        let axes = self.decode(datum);
        let mut shifted = vec![0u8; self.qubits];
        for (site, &axis) in axes.iter().enumerate() {
            shifted[(site + offset) % self.qubits] = axis;
        }
        self.encode(&shifted)
    }

    /// Shifts the row coordinate of every site cyclically by `offset`
    /// rows, leaving each site's column fixed: translation along the
    /// column_height axis of the lattice.
    pub fn row_cyclic_shift(&self, datum: &Datum, offset: usize) -> Datum {
        if self.column_height <= 1 {
            return *datum;
        }
        let offset = offset % self.column_height;
        if offset == 0 {
            return *datum;
        }
        let axes = self.decode(datum);
        let mut shifted = vec![0u8; self.qubits];
        for row in 0..self.column_height {
            let new_row = (row + offset) % self.column_height;
            for col in 0..self.row_width {
                shifted[self.site_index(new_row, col)] = axes[self.site_index(row, col)];
            }
        }
        self.encode(&shifted)
    }

    /// Shifts the column coordinate of every site cyclically by `offset`
    /// columns, leaving each site's row fixed.
    pub fn column_cyclic_shift(&self, datum: &Datum, offset: usize) -> Datum {
        if self.row_width <= 1 {
            return *datum;
        }
        let offset = offset % self.row_width;
        if offset == 0 {
            return *datum;
        }
        let axes = self.decode(datum);
        let mut shifted = vec![0u8; self.qubits];
        for row in 0..self.column_height {
            for col in 0..self.row_width {
                let new_col = (col + offset) % self.row_width;
                shifted[self.site_index(row, new_col)] = axes[self.site_index(row, col)];
            }
        }
        self.encode(&shifted)
    }

    /// General 2-D torus translation, combining a row and a column shift.
    pub fn lattice_shift(&self, datum: &Datum, row_offset: usize, col_offset: usize) -> Datum {
        let row_shifted = self.row_cyclic_shift(datum, row_offset);
        self.column_cyclic_shift(&row_shifted, col_offset)
    }

    /// Extracts the axis codes of a single column, ordered by row.
    pub fn extract_column(&self, datum: &Datum, col: usize) -> Vec<u8> {
        debug_assert!(col < self.row_width);
        let axes = self.decode(datum);
        (0..self.column_height)
            .map(|row| axes[self.site_index(row, col)])
            .collect()
    }

    /// A cheap, non-injective advisory fingerprint over the active
    /// slides (FNV-1a), handy for logging a `Datum` without printing the
    /// whole slide array. Not used by canonicalization.
    pub fn fingerprint(&self, datum: &Datum) -> u64 {
        const FNV_OFFSET: u64 = 0xcbf29ce484222325;
        const FNV_PRIME: u64 = 0x100000001b3;
        let mut h = FNV_OFFSET;
        for &slide in &datum.slides[..self.k] {
            for byte in slide.to_le_bytes() {
                h ^= byte as u64;
                h = h.wrapping_mul(FNV_PRIME);
            }
        }
        h
    }

    /// The shift that places occupied `site` at the origin (chain) or
    /// `(0, 0)` (lattice), leaving every other site's relative position
    /// unchanged.
    fn shift_site_to_origin(&self, datum: &Datum, site: usize) -> Datum {
        if self.row_width == 1 {
            let offset = (self.qubits - site) % self.qubits;
            self.cyclic_shift(datum, offset)
        } else {
            let row = site / self.row_width;
            let col = site % self.row_width;
            let row_offset = (self.column_height - row) % self.column_height;
            let col_offset = (self.row_width - col) % self.row_width;
            self.lattice_shift(datum, row_offset, col_offset)
        }
    }

    /// The orbit minimum of `datum` under this hasher's translation
    /// group, paired with `datum` itself: `(min, actual)`. Per spec §4.D,
    /// the search is restricted to translations that place some occupied
    /// site at the origin rather than the full translation group — the
    /// orbit minimum always admits such an alignment, so this costs one
    /// shift per occupied site instead of one per site in the whole
    /// context. An all-identity `datum` (the empty sequence) short-
    /// circuits to the zero datum for both halves of the pair.
    pub fn canonical_hash(&self, datum: &Datum) -> (Datum, Datum) {
        let axes = self.decode(datum);
        if axes.iter().all(|&axis| axis == 0) {
            let zero = Datum::zero(self.k);
            return (zero, zero);
        }
        let mut min = *datum;
        for (site, &axis) in axes.iter().enumerate() {
            if axis == 0 {
                continue;
            }
            let shifted = self.shift_site_to_origin(datum, site);
            if shifted < min {
                min = shifted;
            }
        }
        (min, *datum)
    }

    pub fn less(&self, a: &Datum, b: &Datum) -> bool {
        a < b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let hasher = WrappingSiteHasher::new(5, 5, 1);
        let axes = vec![1, 0, 3, 2, 0];
        let datum = hasher.encode(&axes);
        assert_eq!(hasher.decode(&datum), axes);
    }

    #[test]
    fn cyclic_shift_by_length_is_identity() {
        let hasher = WrappingSiteHasher::new(5, 5, 1);
        let axes = vec![1, 0, 3, 2, 1];
        let datum = hasher.encode(&axes);
        let shifted = hasher.cyclic_shift(&datum, 5);
        assert_eq!(shifted, datum);
    }

    #[test]
    fn cyclic_shift_moves_single_excitation() {
        let hasher = WrappingSiteHasher::new(5, 5, 1);
        let datum = hasher.encode(&[1, 0, 0, 0, 0]);
        let shifted = hasher.cyclic_shift(&datum, 1);
        assert_eq!(hasher.decode(&shifted), vec![0, 1, 0, 0, 0]);
    }

    #[test]
    fn single_qubit_excitation_hashes_to_its_bit_position() {
        // Axis code 1 (X) at site 0 occupies the two lowest bits alone.
        let hasher = WrappingSiteHasher::new(5, 5, 1);
        let mut axes = vec![0u8; 5];
        axes[0] = 1;
        let datum = hasher.encode(&axes);
        assert_eq!(datum.slides(), &[0x0000000000000001]);
        for k in 0..5 {
            let shifted = hasher.cyclic_shift(&datum, k);
            let mut expected_axes = vec![0u8; 5];
            expected_axes[k] = 1;
            assert_eq!(shifted, hasher.encode(&expected_axes));
        }
    }

    #[test]
    fn cross_slide_pattern_packs_each_qubit_into_its_own_slide() {
        // 40 qubits split across 2 slides; X@0 falls in slide 0, Z@33 in
        // slide 1 at bit offset 2*(33-32)=2, giving slide values (1, 0xc).
        let hasher = WrappingSiteHasher::new(40, 40, 1);
        let mut axes = vec![0u8; 40];
        axes[0] = 1;
        axes[33] = 3;
        let datum = hasher.encode(&axes);
        assert_eq!(datum.slides(), &[0x0000000000000001, 0x000000000000000c]);

        let shifted = hasher.cyclic_shift(&datum, 32);
        let mut expected_axes = vec![0u8; 40];
        expected_axes[32] = 1;
        expected_axes[(33 + 32) % 40] = 3;
        assert_eq!(shifted, hasher.encode(&expected_axes));
    }

    #[test]
    fn cyclic_shift_across_slide_boundary() {
        // 40 qubits needs 2 slides; shift crosses the boundary at site 32.
        let hasher = WrappingSiteHasher::new(40, 40, 1);
        let mut axes = vec![0u8; 40];
        axes[31] = 3;
        let datum = hasher.encode(&axes);
        let shifted = hasher.cyclic_shift(&datum, 2);
        let mut expected = vec![0u8; 40];
        expected[33] = 3;
        assert_eq!(hasher.decode(&shifted), expected);
    }

    #[test]
    fn row_cyclic_shift_moves_whole_row() {
        let hasher = WrappingSiteHasher::new(4, 2, 2);
        // rows: [1,0] / [0,2]
        let datum = hasher.encode(&[1, 0, 0, 2]);
        let shifted = hasher.row_cyclic_shift(&datum, 1);
        assert_eq!(hasher.decode(&shifted), vec![0, 2, 1, 0]);
    }

    #[test]
    fn extract_column_reads_down_a_column() {
        let hasher = WrappingSiteHasher::new(4, 2, 2);
        let datum = hasher.encode(&[1, 0, 0, 2]);
        assert_eq!(hasher.extract_column(&datum, 1), vec![0, 2]);
    }

    #[test]
    fn datum_ordering_is_reverse_lexicographic_over_slides() {
        let hasher = WrappingSiteHasher::new(40, 40, 1);
        let mut axes_a = vec![0u8; 40];
        axes_a[35] = 1; // slide 1
        let mut axes_b = vec![0u8; 40];
        axes_b[0] = 3; // slide 0, but slide 1 is zero
        let a = hasher.encode(&axes_a);
        let b = hasher.encode(&axes_b);
        assert!(b < a, "nonzero slide 1 outweighs any value in slide 0");
    }

    #[test]
    fn encode_decode_round_trips_for_random_strings() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let hasher = WrappingSiteHasher::new(40, 40, 1);
        for _ in 0..200 {
            let axes: Vec<u8> = (0..40).map(|_| rng.gen_range(0..=3)).collect();
            let datum = hasher.encode(&axes);
            assert_eq!(hasher.decode(&datum), axes);
        }
    }

    #[test]
    fn cyclic_shift_by_random_offset_then_back_is_identity() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let hasher = WrappingSiteHasher::new(40, 40, 1);
        for _ in 0..50 {
            let axes: Vec<u8> = (0..40).map(|_| rng.gen_range(0..=3)).collect();
            let datum = hasher.encode(&axes);
            let offset = rng.gen_range(0..40);
            let shifted = hasher.cyclic_shift(&datum, offset);
            let back = hasher.cyclic_shift(&shifted, (40 - offset) % 40);
            assert_eq!(hasher.decode(&back), axes);
        }
    }

    #[test]
    fn canonical_hash_of_empty_datum_short_circuits_to_zero() {
        let hasher = WrappingSiteHasher::new(5, 5, 1);
        let datum = Datum::zero(1);
        let (min, actual) = hasher.canonical_hash(&datum);
        assert_eq!(min, Datum::zero(1));
        assert_eq!(actual, Datum::zero(1));
    }

    #[test]
    fn canonical_hash_picks_the_cyclic_orbit_minimum() {
        let hasher = WrappingSiteHasher::new(5, 5, 1);
        let datum = hasher.encode(&[0, 0, 0, 0, 1]);
        let (min, actual) = hasher.canonical_hash(&datum);
        assert_eq!(actual, datum);
        assert_eq!(min, hasher.encode(&[1, 0, 0, 0, 0]));
    }

    #[test]
    fn canonical_hash_restricted_search_matches_full_orbit_search() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let hasher = WrappingSiteHasher::new(6, 6, 1);
        for _ in 0..50 {
            let axes: Vec<u8> = (0..6).map(|_| rng.gen_range(0..=3)).collect();
            let datum = hasher.encode(&axes);
            let (restricted_min, _) = hasher.canonical_hash(&datum);
            let full_min = (0..6).map(|offset| hasher.cyclic_shift(&datum, offset)).min().unwrap();
            assert_eq!(restricted_min, full_min);
        }
    }

    #[test]
    fn canonical_hash_on_lattice_aligns_an_occupied_site_to_origin() {
        let hasher = WrappingSiteHasher::new(4, 2, 2);
        let datum = hasher.encode(&[0, 0, 0, 2]);
        let (min, _) = hasher.canonical_hash(&datum);
        assert_eq!(hasher.decode(&min), vec![2, 0, 0, 0]);
    }
}
