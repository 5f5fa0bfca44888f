use std::collections::HashMap;

use crate::proto::osmformat::StringTable;

/// Per-block string interner with two phases.
///
/// While a block is being filled, [`record`](StringTableBuilder::record)
/// hands out *interim* ids (dense, starting at 1; 0 is reserved as the
/// dense-node key/value terminator). At flush, [`finalize`] assigns *final*
/// ids: row 0 is always the empty string, the remaining rows are ordered by
/// descending use count with a lexicographic tie-break so that output is
/// reproducible. After `finalize`, [`map`] translates interim ids for the
/// one rewrite pass over the block, then [`clear`] resets everything.
///
/// [`finalize`]: StringTableBuilder::finalize
/// [`map`]: StringTableBuilder::map
#[derive(Debug, Default)]
pub(crate) struct StringTableBuilder {
    index: HashMap<String, u32>,
    /// Use count per interim id, at `interim - 1`.
    counts: Vec<u32>,
    /// Interim id -> final id, valid between `finalize` and `clear`.
    id_map: Vec<u32>,
}

impl StringTableBuilder {
    /// Records one use of `s` and returns its interim id (never 0).
    pub fn record(&mut self, s: &str) -> u32 {
        if let Some(&interim) = self.index.get(s) {
            self.counts[interim as usize - 1] += 1;
            interim
        } else {
            let interim = self.counts.len() as u32 + 1;
            self.index.insert(s.to_owned(), interim);
            self.counts.push(1);
            interim
        }
    }

    /// Assigns final ids and writes the table rows into `table` in final-id
    /// order. The interim -> final mapping stays available through
    /// [`map`](StringTableBuilder::map) until [`clear`](StringTableBuilder::clear).
    pub fn finalize(&mut self, table: &mut StringTable) {
        let mut entries: Vec<(String, u32)> = self.index.drain().collect();
        // The empty string never competes for a row; it is the fixed
        // sentinel at index 0.
        entries.retain(|(s, _)| !s.is_empty());
        entries.sort_unstable_by(|(a_str, a_id), (b_str, b_id)| {
            let a_count = self.counts[*a_id as usize - 1];
            let b_count = self.counts[*b_id as usize - 1];
            b_count.cmp(&a_count).then_with(|| a_str.cmp(b_str))
        });

        self.id_map = vec![0; self.counts.len() + 1];
        table.s.reserve(entries.len() + 1);
        table.s.push(Vec::new());
        for (final_id, (s, interim)) in entries.into_iter().enumerate() {
            self.id_map[interim as usize] = final_id as u32 + 1;
            table.s.push(s.into_bytes());
        }
    }

    /// Translates an interim id to its final id. `map(0)` is 0.
    ///
    /// Valid only after [`finalize`](StringTableBuilder::finalize).
    #[inline]
    pub fn map(&self, interim: u32) -> u32 {
        self.id_map[interim as usize]
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.counts.clear();
        self.id_map.clear();
    }
}
