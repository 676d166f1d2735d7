//! Fixed-capacity set of channel indices.
//!
//! Backed by a small bitset so that recording a failed channel on the audio
//! thread never allocates.

/// Maximum number of channels a [`ChannelSet`] can hold.
pub const MAX_CHANNELS: usize = 256;

const BITS_PER_WORD: usize = u64::BITS as usize;
const NUM_WORDS: usize = MAX_CHANNELS / BITS_PER_WORD;

/// A set of channel indices in `0..MAX_CHANNELS`.
///
/// Iteration is always in ascending order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChannelSet {
    words: [u64; NUM_WORDS],
}

impl ChannelSet {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self {
            words: [0; NUM_WORDS],
        }
    }

    /// Adds `channel` to the set.
    ///
    /// Returns `true` if the channel was not already present. Indices at or
    /// above [`MAX_CHANNELS`] are ignored and return `false`.
    #[inline]
    pub fn insert(&mut self, channel: usize) -> bool {
        if channel >= MAX_CHANNELS {
            return false;
        }
        let (word, mask) = Self::locate(channel);
        let was_present = self.words[word] & mask != 0;
        self.words[word] |= mask;
        !was_present
    }

    /// Returns `true` if `channel` is in the set.
    #[inline]
    pub fn contains(&self, channel: usize) -> bool {
        if channel >= MAX_CHANNELS {
            return false;
        }
        let (word, mask) = Self::locate(channel);
        self.words[word] & mask != 0
    }

    /// Number of channels in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if the set holds no channels.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns `true` if every channel in `self` is also in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & !b == 0)
    }

    /// Iterates the channels in ascending order.
    pub fn iter(&self) -> ChannelSetIter {
        ChannelSetIter {
            words: self.words,
            word: 0,
        }
    }

    fn locate(channel: usize) -> (usize, u64) {
        (channel / BITS_PER_WORD, 1 << (channel % BITS_PER_WORD))
    }
}

impl FromIterator<usize> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        for channel in iter {
            set.insert(channel);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ChannelSet {
    type Item = usize;
    type IntoIter = ChannelSetIter;

    fn into_iter(self) -> ChannelSetIter {
        self.iter()
    }
}

/// Ascending iterator over a [`ChannelSet`].
#[derive(Debug, Clone)]
pub struct ChannelSetIter {
    words: [u64; NUM_WORDS],
    word: usize,
}

impl Iterator for ChannelSetIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.word < NUM_WORDS {
            let bits = self.words[self.word];
            if bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                // Clear the lowest set bit.
                self.words[self.word] = bits & (bits - 1);
                return Some(self.word * BITS_PER_WORD + bit);
            }
            self.word += 1;
        }
        None
    }
}
