//! Operator sequences and their construction modes (spec component A).

use std::cmp::Ordering;

use super::shortlex::ShortlexHasher;

/// A zero-based index into a context's operator alphabet.
pub type Operator = u32;

/// Scalar prefactor an `OperatorSequence` carries alongside its tuple of
/// operators. `Zero` marks a sequence that collapsed to nothing under
/// context-specific reduction (e.g. an operator fused with its own
/// inverse); such a sequence is kept around (rather than erased) so that
/// callers can still see *that* a cancellation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    Negative,
    Imaginary,
    NegImaginary,
    Zero,
}

impl Sign {
    pub fn negate(self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
            Sign::Imaginary => Sign::NegImaginary,
            Sign::NegImaginary => Sign::Imaginary,
            Sign::Zero => Sign::Zero,
        }
    }

    /// Multiplies two signs as if they were elements of `{1, -1, i, -i, 0}`.
    pub fn mul(self, other: Sign) -> Sign {
        use Sign::*;
        match (self, other) {
            (Zero, _) | (_, Zero) => Zero,
            (Positive, x) => x,
            (x, Positive) => x,
            (Negative, x) => x.negate(),
            (x, Negative) => x.negate(),
            (Imaginary, Imaginary) => Negative,
            (Imaginary, NegImaginary) => Positive,
            (NegImaginary, Imaginary) => Positive,
            (NegImaginary, NegImaginary) => Negative,
        }
    }
}

/// How an `OperatorSequence`'s raw tuple relates to its final, reduced
/// form at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceConstructionMode {
    /// The tuple and hash are taken verbatim; no reduction or reordering
    /// runs. Used when a caller has already done both (e.g. rehydrating
    /// a sequence whose hash was computed elsewhere).
    Raw,
    /// The tuple is already in commutation order; only same-site fusion
    /// runs.
    Presorted,
    /// Full normalization: a stable commutation sort followed by
    /// same-site fusion.
    Default,
}

/// Context-specific knowledge `OperatorSequence` needs to normalize a raw
/// tuple: which site an operator acts on (for commutation sorting) and
/// how two operators on the same site combine (for fusion).
pub trait SequenceReducer {
    fn hasher(&self) -> &ShortlexHasher;
    /// The site (qubit) index `op` acts on; operators on different sites
    /// commute freely and are sorted by this key.
    fn site_of(&self, op: Operator) -> usize;
    /// Combines two operators known to act on the same site, in the
    /// order given, returning the resulting operator (`None` if they
    /// fuse to the identity on that site) and the sign picked up.
    fn fuse(&self, left: Operator, right: Operator) -> (Option<Operator>, Sign);
}

#[derive(Debug, Clone)]
pub struct OperatorSequence {
    raw: Vec<Operator>,
    sign: Sign,
    hash: u64,
}

impl OperatorSequence {
    /// The canonical representation of a sequence that reduced to zero.
    pub fn zero() -> Self {
        Self {
            raw: Vec::new(),
            sign: Sign::Zero,
            hash: 0,
        }
    }

    /// Builds a sequence from an already-normalized tuple, hash, and
    /// sign, performing no further reduction.
    pub fn from_raw_parts(raw: Vec<Operator>, sign: Sign, hash: u64) -> Self {
        if matches!(sign, Sign::Zero) {
            return Self::zero();
        }
        Self { raw, sign, hash }
    }

    pub fn new<R: SequenceReducer>(
        mut raw: Vec<Operator>,
        sign: Sign,
        mode: SequenceConstructionMode,
        reducer: &R,
    ) -> Self {
        if matches!(sign, Sign::Zero) {
            return Self::zero();
        }
        match mode {
            SequenceConstructionMode::Raw => {
                let hash = reducer.hasher().hash(&raw);
                Self { raw, sign, hash }
            }
            SequenceConstructionMode::Presorted => Self::fuse_runs(raw, sign, reducer),
            SequenceConstructionMode::Default => {
                raw.sort_by_key(|&op| reducer.site_of(op));
                Self::fuse_runs(raw, sign, reducer)
            }
        }
    }

    fn fuse_runs<R: SequenceReducer>(raw: Vec<Operator>, mut sign: Sign, reducer: &R) -> Self {
        let mut reduced: Vec<Operator> = Vec::with_capacity(raw.len());
        let mut iter = raw.into_iter().peekable();
        while let Some(first) = iter.next() {
            let site = reducer.site_of(first);
            let mut active: Option<Operator> = Some(first);
            while let Some(&next) = iter.peek() {
                if reducer.site_of(next) != site {
                    break;
                }
                let next = iter.next().unwrap();
                active = match active {
                    Some(current) => {
                        let (fused, picked_up) = reducer.fuse(current, next);
                        sign = sign.mul(picked_up);
                        fused
                    }
                    None => Some(next),
                };
            }
            if let Some(op) = active {
                reduced.push(op);
            }
        }
        if matches!(sign, Sign::Zero) {
            return Self::zero();
        }
        let hash = reducer.hasher().hash(&reduced);
        Self {
            raw: reduced,
            sign,
            hash,
        }
    }

    pub fn raw(&self) -> &[Operator] {
        &self.raw
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        matches!(self.sign, Sign::Zero)
    }
}

impl PartialEq for OperatorSequence {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.sign == other.sign && self.raw == other.raw
    }
}
impl Eq for OperatorSequence {}

impl PartialOrd for OperatorSequence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OperatorSequence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash).then_with(|| self.raw.cmp(&other.raw))
    }
}
