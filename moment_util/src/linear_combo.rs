use std::ops::{Add, Mul};

/// A sparse linear combination of `(index, weight)` pairs, kept sorted by
/// index so that addition is a single merge pass and equality is a
/// straightforward slice comparison. Used for explicit-value-rule
/// synthesis and symbol polynomials where most coefficients are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCombo<Index, W> {
    data: Vec<(Index, W)>,
}

impl<Index, W> Default for LinearCombo<Index, W> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<Index, W> LinearCombo<Index, W>
where
    Index: Ord + Copy,
    W: Copy + PartialEq + Default,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a combination from unsorted `(index, weight)` pairs, sorting
    /// by index. Does not deduplicate repeated indices — callers that may
    /// produce them should route through `Add` instead.
    pub fn from_pairs(mut data: Vec<(Index, W)>) -> Self {
        data.sort_by_key(|(idx, _)| *idx);
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Index, W)> {
        self.data.iter()
    }
}

impl<Index, W> std::ops::Index<usize> for LinearCombo<Index, W> {
    type Output = (Index, W);
    fn index(&self, i: usize) -> &Self::Output {
        &self.data[i]
    }
}

impl<'a, Index, W> IntoIterator for &'a LinearCombo<Index, W> {
    type Item = &'a (Index, W);
    type IntoIter = std::slice::Iter<'a, (Index, W)>;
    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<Index, W> Add for LinearCombo<Index, W>
where
    Index: Ord + Copy,
    W: Copy + PartialEq + Default + Add<Output = W>,
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_empty() {
            return rhs;
        }
        if rhs.is_empty() {
            return self;
        }

        let mut output = Vec::with_capacity(self.len() + rhs.len());
        let mut lhs_iter = self.data.into_iter().peekable();
        let mut rhs_iter = rhs.data.into_iter().peekable();

        loop {
            match (lhs_iter.peek(), rhs_iter.peek()) {
                (Some(&(li, _)), Some(&(ri, _))) => {
                    if li < ri {
                        output.push(lhs_iter.next().unwrap());
                    } else if ri < li {
                        output.push(rhs_iter.next().unwrap());
                    } else {
                        let (idx, lw) = lhs_iter.next().unwrap();
                        let (_, rw) = rhs_iter.next().unwrap();
                        let sum = lw + rw;
                        if sum != W::default() {
                            output.push((idx, sum));
                        }
                    }
                }
                (Some(_), None) => output.push(lhs_iter.next().unwrap()),
                (None, Some(_)) => output.push(rhs_iter.next().unwrap()),
                (None, None) => break,
            }
        }

        Self { data: output }
    }
}

impl<Index, W> Mul<W> for LinearCombo<Index, W>
where
    Index: Ord + Copy,
    W: Copy + PartialEq + Default + Mul<Output = W>,
{
    type Output = Self;

    fn mul(self, factor: W) -> Self {
        let data = self
            .data
            .into_iter()
            .map(|(idx, w)| (idx, w * factor))
            .collect();
        Self { data }
    }
}
