//! Record harvesting: resolve each paired block's brand and pull its serials.

use crate::config::{BrandWindow, ExtractionRules, UNKNOWN_BRAND};
use crate::error::BatchWarning;
use crate::output::{ExtractedRecord, TextExtraction};
use crate::pipeline::segment::{self, Block};
use tracing::{debug, warn};

/// The `width` characters immediately before byte offset `start`.
///
/// Clamped at the beginning of the text, so a marker at offset 0 yields "".
/// Counts characters rather than bytes so the slice never splits a code point.
pub fn lookbehind_window(text: &str, start: usize, width: usize) -> &str {
    let head = &text[..start];
    if width == 0 {
        return "";
    }
    let from = head
        .char_indices()
        .rev()
        .nth(width - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &head[from..]
}

/// The text searched for a block's brand, per the configured [`BrandWindow`].
pub fn brand_window<'a>(text: &'a str, block: &Block, rules: &ExtractionRules) -> &'a str {
    match rules.brand_window() {
        BrandWindow::Lookbehind => lookbehind_window(text, block.start, rules.lookbehind_chars()),
        BrandWindow::BlockInterior => block.text(text),
    }
}

/// Display name of the first vocabulary token in `window`, or [`UNKNOWN_BRAND`].
pub fn resolve_brand<'r>(window: &str, rules: &'r ExtractionRules) -> &'r str {
    rules
        .brand_regex()
        .and_then(|re| re.find(window))
        .map(|m| rules.display_name(m.as_str()))
        .unwrap_or(UNKNOWN_BRAND)
}

/// Every non-overlapping serial-pattern match in `block_text`, left to right.
pub fn serials<'a>(block_text: &'a str, rules: &ExtractionRules) -> Vec<&'a str> {
    rules
        .serial_regex()
        .find_iter(block_text)
        .map(|m| m.as_str())
        .collect()
}

/// Segment one text stream and harvest its records.
///
/// `document` names the source in unpaired-block warnings; pass `None` for a
/// stream built from several documents.
pub fn harvest_stream(
    text: &str,
    rules: &ExtractionRules,
    document: Option<&str>,
) -> TextExtraction {
    let seg = segment::segment(text, rules);
    let mut out = TextExtraction {
        start_markers: seg.start_markers,
        end_markers: seg.end_markers,
        blocks_paired: seg.blocks.len(),
        ..Default::default()
    };

    for &start_offset in &seg.unpaired {
        warn!(
            "No end marker found for block starting at offset {}{}; skipping",
            start_offset,
            document.map(|d| format!(" in '{d}'")).unwrap_or_default()
        );
        out.warnings.push(BatchWarning::UnpairedBlock {
            document: document.map(str::to_string),
            start_offset,
        });
    }

    for block in &seg.blocks {
        let brand = resolve_brand(brand_window(text, block, rules), rules);
        let found = serials(block.text(text), rules);
        debug!(
            "Block {}..{}: brand {}, {} serials",
            block.start,
            block.end,
            brand,
            found.len()
        );
        out.records
            .extend(found.into_iter().map(|s| ExtractedRecord::new(s, brand)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrandVocabulary, ExtractionConfig, StartMarker};

    const START: &str = "Shipped Serial Numbers/Asset Numbers";
    const END: &str = "58000.0605";

    fn rules() -> ExtractionRules {
        ExtractionRules::default()
    }

    #[test]
    fn test_serials_in_match_order() {
        let found = serials("...ULT1234567 more text ULTabcdefg...", &rules());
        assert_eq!(found, vec!["ULT1234567", "ULTabcdefg"]);
    }

    #[test]
    fn test_serial_prefix_is_case_sensitive() {
        assert!(serials("ult1234567 Ult1234567", &rules()).is_empty());
    }

    #[test]
    fn test_serial_takes_exactly_seven_word_chars() {
        assert_eq!(serials("ULT123456789", &rules()), vec!["ULT1234567"]);
        assert!(serials("ULT12345-67", &rules()).is_empty());
        assert_eq!(serials("ULT_abc_12", &rules()), vec!["ULT_abc_12"]);
    }

    #[test]
    fn test_brand_resolution_uses_display_map() {
        let r = rules();
        assert_eq!(resolve_brand("Model frazil cooler", &r), "FRAZIL");
        assert_eq!(resolve_brand("Item: CAFE TANGO 2000", &r), "CAFÉ TANGO");
        assert_eq!(resolve_brand("REFURB unit", &r), "FRAZIL");
        assert_eq!(resolve_brand("engy drink dispenser", &r), "ENERGY");
        assert_eq!(resolve_brand("nothing to see", &r), UNKNOWN_BRAND);
    }

    #[test]
    fn test_brand_tokens_match_whole_words_only() {
        let r = rules();
        assert_eq!(resolve_brand("FRAZILS", &r), UNKNOWN_BRAND);
        assert_eq!(resolve_brand("XENGY", &r), UNKNOWN_BRAND);
        assert_eq!(resolve_brand("(ENGY)", &r), "ENERGY");
    }

    #[test]
    fn test_first_token_in_window_wins() {
        assert_eq!(resolve_brand("REFURB then CAFE TANGO", &rules()), "FRAZIL");
        assert_eq!(resolve_brand("CAFE TANGO then REFURB", &rules()), "CAFÉ TANGO");
    }

    #[test]
    fn test_token_without_display_entry_is_unknown() {
        let mut vocab = BrandVocabulary::new().with("ACME", "Acme");
        vocab.tokens.push("ORPHAN".into());
        let config = ExtractionConfig::builder().brands(vocab).build().unwrap();
        assert_eq!(resolve_brand("ORPHAN", config.rules()), UNKNOWN_BRAND);
        assert_eq!(resolve_brand("acme", config.rules()), "Acme");
    }

    #[test]
    fn test_lookbehind_window_clamps_at_start() {
        assert_eq!(lookbehind_window("abc", 0, 50), "");
        assert_eq!(lookbehind_window("abcdef", 3, 50), "abc");
        assert_eq!(lookbehind_window("abcdef", 6, 2), "ef");
        assert_eq!(lookbehind_window("abcdef", 6, 0), "");
    }

    #[test]
    fn test_lookbehind_window_counts_characters() {
        let text = "ÉÉÉÉX";
        let start = text.find('X').unwrap();
        assert_eq!(lookbehind_window(text, start, 2), "ÉÉ");
        assert_eq!(lookbehind_window(text, start, 10), "ÉÉÉÉ");
    }

    #[test]
    fn test_start_marker_at_offset_zero_is_unknown_brand() {
        let text = format!("{START} ULT0000001 {END}");
        let out = harvest_stream(&text, &rules(), None);
        assert_eq!(out.records, vec![ExtractedRecord::new("ULT0000001", UNKNOWN_BRAND)]);
    }

    #[test]
    fn test_lookbehind_is_limited_to_fifty_characters() {
        let far = format!("FRAZIL{}{START} ULT0000001 {END}", " ".repeat(50));
        let out = harvest_stream(&far, &rules(), None);
        assert_eq!(out.records[0].brand, UNKNOWN_BRAND);

        let near = format!("FRAZIL{}{START} ULT0000001 {END}", " ".repeat(44));
        let out = harvest_stream(&near, &rules(), None);
        assert_eq!(out.records[0].brand, "FRAZIL");
    }

    #[test]
    fn test_block_interior_window_reads_inside_the_block() {
        let config = ExtractionConfig::builder()
            .brand_window(BrandWindow::BlockInterior)
            .build()
            .unwrap();
        let text = format!("FRAZIL {START} CAFE TANGO ULT0000001 {END}");
        let out = harvest_stream(&text, config.rules(), None);
        assert_eq!(out.records[0].brand, "CAFÉ TANGO");
    }

    #[test]
    fn test_serials_outside_blocks_are_ignored() {
        let text = format!("ULT9999999 FRAZIL {START} ULT0000001 {END} ULT8888888");
        let out = harvest_stream(&text, &rules(), None);
        assert_eq!(out.records, vec![ExtractedRecord::new("ULT0000001", "FRAZIL")]);
    }

    #[test]
    fn test_block_without_serials_yields_no_records() {
        let text = format!("FRAZIL {START} nothing here {END}");
        let out = harvest_stream(&text, &rules(), Some("a.pdf"));
        assert!(out.records.is_empty());
        assert_eq!(out.blocks_paired, 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_unpaired_start_warns_and_continues() {
        let text = format!(
            "FRAZIL {START} ULT0000001 {END} ENGY {START} ULT0000002 (no end marker)"
        );
        let second = text.rfind(START).unwrap();
        let out = harvest_stream(&text, &rules(), Some("march.pdf"));
        assert_eq!(out.records, vec![ExtractedRecord::new("ULT0000001", "FRAZIL")]);
        assert_eq!(
            out.warnings,
            vec![BatchWarning::UnpairedBlock {
                document: Some("march.pdf".into()),
                start_offset: second,
            }]
        );
    }

    #[test]
    fn test_no_start_marker_is_empty_without_warning() {
        let out = harvest_stream("ULT0000001 58000.0605", &rules(), None);
        assert!(out.records.is_empty());
        assert!(out.warnings.is_empty());
        assert_eq!(out.start_markers, 0);
    }

    #[test]
    fn test_records_follow_block_then_match_order() {
        let text = format!(
            "CAFE TANGO {START} ULT0000001 ULT0000002 {END}\n\
             REFURB {START} ULT0000003 {END}"
        );
        let out = harvest_stream(&text, &rules(), None);
        let got: Vec<(&str, &str)> = out
            .records
            .iter()
            .map(|r| (r.serial_number.as_str(), r.brand.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("ULT0000001", "CAFÉ TANGO"),
                ("ULT0000002", "CAFÉ TANGO"),
                ("ULT0000003", "FRAZIL"),
            ]
        );
    }

    #[test]
    fn test_flexible_marker_finds_reflowed_heading() {
        let config = ExtractionConfig::builder()
            .start_marker(StartMarker::Flexible(START.into()))
            .build()
            .unwrap();
        let text = format!("ENGY\nSHIPPED SERIAL\nNUMBERS / ASSET NUMBERS\nULT0000001\n{END}");
        let out = harvest_stream(&text, config.rules(), None);
        assert_eq!(out.records, vec![ExtractedRecord::new("ULT0000001", "ENERGY")]);
    }

    #[test]
    fn test_harvesting_is_deterministic() {
        let text = format!(
            "FRAZIL {START} ULT0000001 {END} {START} ULT0000002 {END} {START} ULT0000003"
        );
        let a = harvest_stream(&text, &rules(), Some("doc.pdf"));
        let b = harvest_stream(&text, &rules(), Some("doc.pdf"));
        assert_eq!(a, b);
    }
}
