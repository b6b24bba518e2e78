//! Media index: the archive's non-transcript entries and the lookup that
//! ties a message back to the file it mentions.

use crate::model::{MediaEntry, MessageCategory};
use std::collections::HashMap;

/// File extension of `name`, lower-cased, or `"unknown"` when the name has
/// no usable dot (none, leading, or trailing).
#[must_use]
pub fn extension(name: &str) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot < name.len() - 1 => name[dot + 1..].to_lowercase(),
        _ => "unknown".to_string(),
    }
}

/// Whether `name` ends in one of the category's accepted extensions.
#[must_use]
pub fn has_category_extension(name: &str, category: MessageCategory) -> bool {
    let lower = name.to_lowercase();
    category.extensions().iter().any(|ext| {
        lower
            .strip_suffix(ext)
            .is_some_and(|stem| stem.ends_with('.'))
    })
}

/// Media entries in archive order.
///
/// Order matters: when several entries match the same message, the first
/// one inserted wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaIndex {
    entries: Vec<MediaEntry>,
    positions: HashMap<String, usize>,
}

impl MediaIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Add an entry. An entry with exactly the same name replaces the
    /// earlier one in place.
    pub fn insert(&mut self, entry: MediaEntry) {
        if let Some(&at) = self.positions.get(&entry.name) {
            self.entries[at] = entry;
        } else {
            self.positions.insert(entry.name.clone(), self.entries.len());
            self.entries.push(entry);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaEntry> {
        self.entries.iter()
    }

    /// Case-insensitive lookup by entry name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MediaEntry> {
        if let Some(&at) = self.positions.get(name) {
            return self.entries.get(at);
        }
        let wanted = name.to_lowercase();
        self.entries.iter().find(|e| e.name.to_lowercase() == wanted)
    }

    /// Find the entry a message refers to.
    ///
    /// Candidates must carry an extension of `category`; the first whose
    /// name (as stored or lower-cased) occurs in the lower-cased content is
    /// returned.
    #[must_use]
    pub fn find_media(&self, content: &str, category: MessageCategory) -> Option<&MediaEntry> {
        let lc = content.to_lowercase();
        self.entries.iter().find(|entry| {
            has_category_extension(&entry.name, category)
                && (lc.contains(&entry.name) || lc.contains(&entry.name.to_lowercase()))
        })
    }
}

impl FromIterator<MediaEntry> for MediaIndex {
    fn from_iter<T: IntoIterator<Item = MediaEntry>>(iter: T) -> Self {
        let mut index = Self::new();
        for entry in iter {
            index.insert(entry);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[&str]) -> MediaIndex {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| MediaEntry::new(*name, (i as u64 + 1) * 100))
            .collect()
    }

    #[test]
    fn extension_rules() {
        assert_eq!(extension("IMG-1.JPG"), "jpg");
        assert_eq!(extension("archive.tar.gz"), "gz");
        assert_eq!(extension("README"), "unknown");
        assert_eq!(extension(".hidden"), "unknown");
        assert_eq!(extension("trailing."), "unknown");
    }

    #[test]
    fn category_extension_requires_dot() {
        assert!(has_category_extension("PTT-1.OPUS", MessageCategory::Audio));
        assert!(!has_category_extension("notjpg", MessageCategory::Image));
        assert!(!has_category_extension("clip.mp4", MessageCategory::Image));
        assert!(!has_category_extension("anything.txt", MessageCategory::Text));
    }

    #[test]
    fn finds_entry_named_in_content() {
        let idx = index(&["IMG-20240312-WA0004.jpg", "VID-1.mp4"]);
        let hit = idx
            .find_media("IMG-20240312-WA0004.jpg (file attached)", MessageCategory::Image)
            .unwrap();
        assert_eq!(hit.name, "IMG-20240312-WA0004.jpg");
        assert_eq!(hit.size_bytes, 100);
    }

    #[test]
    fn match_is_case_insensitive() {
        let idx = index(&["IMG-1.JPG"]);
        assert!(idx.find_media("img-1.jpg (file attached)", MessageCategory::Image).is_some());
    }

    #[test]
    fn wrong_category_is_never_returned() {
        let idx = index(&["report.pdf"]);
        assert!(idx
            .find_media("report.pdf (file attached)", MessageCategory::Image)
            .is_none());
        assert!(idx
            .find_media("report.pdf (file attached)", MessageCategory::Document)
            .is_some());
    }

    #[test]
    fn sticker_requires_webp() {
        let idx = index(&["STK-1.png", "STK-2.webp"]);
        let hit = idx
            .find_media("STK-1.png STK-2.webp (file attached)", MessageCategory::Sticker)
            .unwrap();
        assert_eq!(hit.name, "STK-2.webp");
    }

    #[test]
    fn first_inserted_candidate_wins() {
        let idx = index(&["a.jpg", "b.jpg"]);
        let hit = idx.find_media("b.jpg a.jpg", MessageCategory::Image).unwrap();
        assert_eq!(hit.name, "a.jpg");
    }

    #[test]
    fn duplicate_names_replace_in_place() {
        let mut idx = index(&["a.jpg", "b.jpg"]);
        idx.insert(MediaEntry::new("a.jpg", 7));
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.iter().next().unwrap().size_bytes, 7);
        assert_eq!(idx.get("A.JPG").unwrap().size_bytes, 7);
    }

    #[test]
    fn large_index_keeps_order_and_replaces_by_name() {
        let mut idx: MediaIndex = (0..20_000)
            .map(|i| MediaEntry::new(format!("IMG-{i:05}.jpg"), i))
            .collect();
        idx.insert(MediaEntry::new("IMG-10000.jpg", 1));
        idx.insert(MediaEntry::new("IMG-10000.jpg", 2));

        assert_eq!(idx.len(), 20_000);
        assert_eq!(idx.iter().nth(10_000).unwrap().size_bytes, 2);
        assert_eq!(idx.iter().last().unwrap().name, "IMG-19999.jpg");
        assert_eq!(idx.get("IMG-19999.jpg").unwrap().size_bytes, 19_999);
        assert_eq!(idx.get("img-00000.JPG").unwrap().size_bytes, 0);
    }

    #[test]
    fn text_category_has_no_media() {
        let idx = index(&["a.jpg"]);
        assert!(idx.find_media("a.jpg", MessageCategory::Text).is_none());
    }
}
