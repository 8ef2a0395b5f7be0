// FormatSelector - turns the user's menu input into a download directive
//
// Never rejects input: anything that is not a reserved token or an in-range
// index goes to yt-dlp verbatim and fails there if it is not a valid selector.

use super::catalog::{FormatCatalog, AUDIO_TOKEN, BEST_TOKEN};
use super::models::{DownloadDirective, PostProcessor, DEFAULT_OUTPUT_TEMPLATE};

/// Best separate streams, else best single file
pub const BEST_FORMAT_SPEC: &str = "bestvideo+bestaudio/best";
pub const AUDIO_FORMAT_SPEC: &str = "bestaudio";
pub const AUDIO_CODEC: &str = "mp3";
pub const AUDIO_QUALITY: &str = "128";

pub struct FormatSelector;

impl FormatSelector {
    pub fn resolve(selection: &str, catalog: &FormatCatalog) -> DownloadDirective {
        if selection == BEST_TOKEN {
            return Self::best();
        }
        if selection.eq_ignore_ascii_case(AUDIO_TOKEN) {
            return Self::mp3();
        }
        if !selection.is_empty() && selection.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(entry) = selection.parse::<usize>().ok().and_then(|i| catalog.get(i)) {
                return DownloadDirective::format(entry.format_id.clone());
            }
        }
        DownloadDirective::format(selection)
    }

    pub fn best() -> DownloadDirective {
        DownloadDirective::format(BEST_FORMAT_SPEC)
    }

    pub fn mp3() -> DownloadDirective {
        DownloadDirective {
            format: AUDIO_FORMAT_SPEC.to_string(),
            postprocessors: vec![PostProcessor::ExtractAudio {
                codec: AUDIO_CODEC.to_string(),
                quality: AUDIO_QUALITY.to_string(),
            }],
            output_template: Some(DEFAULT_OUTPUT_TEMPLATE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::FormatRecord;

    fn catalog_of(n: usize) -> FormatCatalog {
        let records: Vec<FormatRecord> = (0..n)
            .map(|i| FormatRecord {
                format_id: Some(format!("f{}", i + 1)),
                // descending heights keep input order == rank order
                height: Some(2000 - i as u32 * 100),
                ..FormatRecord::default()
            })
            .collect();
        FormatCatalog::build(&records)
    }

    #[test]
    fn zero_is_best_regardless_of_catalog() {
        assert_eq!(FormatSelector::resolve("0", &catalog_of(0)).format, BEST_FORMAT_SPEC);
        let d = FormatSelector::resolve("0", &catalog_of(5));
        assert_eq!(d, FormatSelector::best());
        assert!(d.postprocessors.is_empty());
    }

    #[test]
    fn m_is_mp3_either_case() {
        for token in ["m", "M"] {
            let d = FormatSelector::resolve(token, &catalog_of(3));
            assert_eq!(d.format, "bestaudio");
            assert_eq!(
                d.postprocessors,
                vec![PostProcessor::ExtractAudio {
                    codec: "mp3".to_string(),
                    quality: "128".to_string()
                }]
            );
            assert_eq!(d.postprocessors[0].key(), "FFmpegExtractAudio");
            assert_eq!(d.output_template.as_deref(), Some("%(title)s.%(ext)s"));
        }
    }

    #[test]
    fn index_selects_ranked_entry() {
        let d = FormatSelector::resolve("3", &catalog_of(5));
        assert_eq!(d, DownloadDirective::format("f3"));
        assert_eq!(FormatSelector::resolve("1", &catalog_of(5)).format, "f1");
        assert_eq!(FormatSelector::resolve("5", &catalog_of(5)).format, "f5");
    }

    #[test]
    fn out_of_range_and_text_pass_through() {
        assert_eq!(FormatSelector::resolve("99", &catalog_of(5)), DownloadDirective::format("99"));
        assert_eq!(FormatSelector::resolve("6", &catalog_of(5)).format, "6");
        assert_eq!(FormatSelector::resolve("abc", &catalog_of(5)).format, "abc");
        assert_eq!(FormatSelector::resolve("137+140", &catalog_of(5)).format, "137+140");
        assert_eq!(FormatSelector::resolve("00", &catalog_of(5)).format, "00");
    }

    #[test]
    fn huge_number_passes_through() {
        let raw = "99999999999999999999999999";
        assert_eq!(FormatSelector::resolve(raw, &catalog_of(2)).format, raw);
    }

    #[test]
    fn mp3_template_is_title_based() {
        assert_eq!(FormatSelector::mp3().output_template(), DEFAULT_OUTPUT_TEMPLATE);
        assert_eq!(FormatSelector::best().output_template, None);
    }
}
