// FormatCatalog - ranked, deduplicated menu of formats
//
// Ranking is by (height, audio bitrate) descending; equal keys keep the
// order yt-dlp reported them in. The 1-based position of an entry is the
// number the user types to pick it.

use std::collections::HashSet;

use super::models::{CatalogEntry, FormatRecord};

/// Menu token for the best merged download
pub const BEST_TOKEN: &str = "0";
/// Menu token for MP3 extraction
pub const AUDIO_TOKEN: &str = "m";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatCatalog {
    entries: Vec<CatalogEntry>,
}

impl FormatCatalog {
    pub fn build(records: &[FormatRecord]) -> Self {
        let mut ranked: Vec<&FormatRecord> = records.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| {
            let (ha, aa) = rank_key(a);
            let (hb, ab) = rank_key(b);
            hb.cmp(&ha).then(ab.total_cmp(&aa))
        });

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for record in ranked {
            let id = match record.format_id.as_deref() {
                Some(id) if !id.is_empty() => id,
                _ => continue,
            };
            if !seen.insert(id) {
                continue;
            }
            entries.push(CatalogEntry {
                format_id: id.to_string(),
                ext: record.ext.clone().unwrap_or_default(),
                label: Self::label(record),
                codecs: Self::codecs(record),
            });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a 1-based menu index
    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// "1080p", "128kbps", the note, or nothing
    fn label(record: &FormatRecord) -> String {
        match (record.height, record.abr) {
            (Some(h), _) if h > 0 => format!("{}p", h),
            (_, Some(abr)) if abr > 0.0 => format!("{}kbps", abr as u64),
            _ => record.format_note.clone().unwrap_or_default(),
        }
    }

    fn codecs(record: &FormatRecord) -> String {
        let mut parts = Vec::new();
        if let Some(v) = present_codec(&record.vcodec) {
            parts.push(format!("v:{}", v));
        }
        if let Some(a) = present_codec(&record.acodec) {
            parts.push(format!("a:{}", a));
        }
        parts.join(",")
    }

    /// Menu text, reserved tokens first
    pub fn render(&self, title: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("\nFound video: {}\n", title));
        out.push_str("Available formats:\n");
        out.push_str(&format!(
            "  {}) [best] Best quality (bestvideo+bestaudio/best), merged\n",
            BEST_TOKEN
        ));
        out.push_str(&format!(
            "  {}) [mp3] Audio only, MP3 128kbps (converted)\n",
            AUDIO_TOKEN
        ));
        for (i, e) in self.entries.iter().enumerate() {
            out.push_str(&format!(
                " {:2}) format_id={:<8} ext={:<4} {:<7} {}\n",
                i + 1,
                e.format_id,
                e.ext,
                e.label,
                e.codecs
            ));
        }
        out.push_str(&format!(
            "\nEnter a number, a format_id, '{}' for best or '{}' for mp3.\n",
            BEST_TOKEN, AUDIO_TOKEN
        ));
        out
    }
}

fn rank_key(record: &FormatRecord) -> (u32, f64) {
    let abr = record.abr.filter(|a| a.is_finite()).unwrap_or(0.0);
    (record.height.unwrap_or(0), abr)
}

fn present_codec(codec: &Option<String>) -> Option<&str> {
    codec.as_deref().filter(|c| !c.is_empty() && *c != "none")
}
