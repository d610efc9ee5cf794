use crate::SyntaxKind;

const SIZE: usize = 1;

/// A constant bitset of [`SyntaxKind`]s, used for first sets and recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyntaxSet {
    bits: [u64; SIZE],
}

impl SyntaxSet {
    pub const EMPTY: Self = Self { bits: [0; SIZE] };
    const BITS_PER_SLOT: u16 = u64::BITS as u16;

    const fn slot_and_mask(kind: SyntaxKind) -> (usize, u64) {
        let kind = kind as u16;
        let slot_index = (kind / Self::BITS_PER_SLOT) as usize;

        debug_assert!(
            slot_index < SIZE,
            "Index out of bounds. Increase the size of the bitset array."
        );

        (slot_index, 1 << (kind % Self::BITS_PER_SLOT))
    }

    pub const fn new<const N: usize>(kinds: [SyntaxKind; N]) -> Self {
        let mut set = Self::EMPTY;

        let mut i = 0;
        while i < kinds.len() {
            set = set.with(kinds[i]);
            i += 1;
        }

        set
    }

    #[must_use]
    pub const fn with(mut self, kind: SyntaxKind) -> Self {
        let (slot, mask) = Self::slot_and_mask(kind);
        self.bits[slot] |= mask;
        self
    }

    #[must_use]
    pub const fn union(mut self, other: &Self) -> Self {
        let mut i = 0;

        while i < self.bits.len() {
            self.bits[i] |= other.bits[i];
            i += 1;
        }

        self
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let (slot, mask) = Self::slot_and_mask(kind);
        self.bits[slot] & mask != 0
    }

    pub const fn is_empty(&self) -> bool {
        let mut i = 0;

        while i < self.bits.len() {
            if self.bits[i] != 0 {
                return false;
            }
            i += 1;
        }

        true
    }

    pub fn iter(self) -> impl Iterator<Item = SyntaxKind> {
        SyntaxKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}
