use crate::models::ThresholdRange;

/// 256-entry classification table: `fill` inside the band, 0 outside
#[derive(Clone, PartialEq, Eq)]
pub struct LookupTable {
    entries: [u8; 256],
}

impl LookupTable {
    /// Build the table in three fills: below, inside, above the band
    pub fn new(range: ThresholdRange) -> Self {
        let mut entries = [0u8; 256];
        let low = range.low as usize;
        let high = range.high as usize;

        entries[..low].fill(0);
        if low <= high {
            entries[low..=high].fill(range.fill);
        }
        entries[high + 1..].fill(0);

        Self { entries }
    }

    /// Output value for `sample`
    #[inline(always)]
    pub fn get(&self, sample: u8) -> u8 {
        self.entries[sample as usize]
    }

    /// Raw table
    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.entries
    }
}

impl std::fmt::Debug for LookupTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kept = self.entries.iter().filter(|&&v| v != 0).count();
        f.debug_struct("LookupTable")
            .field("nonzero_entries", &kept)
            .finish()
    }
}
