//! Run-scoped accumulation of the tag vocabularies seen while extracting.

use std::collections::BTreeSet;
use std::io;

use dde_types::TagKind;

/// One `(display text, canonical name)` pair observed on a page.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TagRow {
    pub tag: String,
    pub name: String,
}

/// Distinct tags per kind. Membership only ever grows during a run.
#[derive(Clone, Debug, Default)]
pub struct TagRegistry {
    grammar: BTreeSet<TagRow>,
    usage: BTreeSet<TagRow>,
    geo: BTreeSet<TagRow>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tag; returns `true` the first time a pair is seen.
    pub fn register(&mut self, kind: TagKind, display_text: &str, canonical_name: &str) -> bool {
        self.set_mut(kind).insert(TagRow {
            tag: display_text.to_string(),
            name: canonical_name.to_string(),
        })
    }

    /// Rows of one kind, sorted by the pair.
    pub fn export(&self, kind: TagKind) -> Vec<TagRow> {
        self.set(kind).iter().cloned().collect()
    }

    pub fn len(&self, kind: TagKind) -> usize {
        self.set(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        TagKind::ALL.iter().all(|kind| self.set(*kind).is_empty())
    }

    /// Write one kind as a two-column `tag,name` table.
    pub fn write_csv<W: io::Write>(&self, kind: TagKind, writer: W) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(["tag", "name"])?;
        for row in self.set(kind) {
            out.write_record([row.tag.as_str(), row.name.as_str()])?;
        }
        out.flush()?;
        Ok(())
    }

    fn set(&self, kind: TagKind) -> &BTreeSet<TagRow> {
        match kind {
            TagKind::Grammar => &self.grammar,
            TagKind::Usage => &self.usage,
            TagKind::Geo => &self.geo,
        }
    }

    fn set_mut(&mut self, kind: TagKind) -> &mut BTreeSet<TagRow> {
        match kind {
            TagKind::Grammar => &mut self.grammar,
            TagKind::Usage => &mut self.usage,
            TagKind::Geo => &mut self.geo,
        }
    }
}
