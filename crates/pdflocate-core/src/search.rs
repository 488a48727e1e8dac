//! Literal text search over positioned content runs.

use regex::Regex;

use crate::accessor::{ContentRun, RunKind};
use crate::geometry::Region;

/// A single character with an approximate box, split out of a run.
struct Glyph {
    region: Region,
}

/// Find `needle` in the page text formed by `runs` and return one region per hit.
///
/// The algorithm:
/// 1. Split every text run into per-character boxes of equal width.
/// 2. Concatenate the run texts (separated by a space), tracking byte-offset → glyph-index.
/// 3. Match the escaped needle case-insensitively.
/// 4. Union the boxes of the glyphs each match covers.
///
/// Returns at most `max_hits` regions. An empty needle finds nothing.
pub fn search_runs(runs: &[ContentRun], needle: &str, max_hits: usize) -> Vec<Region> {
    if needle.trim().is_empty() || max_hits == 0 {
        return Vec::new();
    }

    let mut full_text = String::new();
    let mut glyphs: Vec<Glyph> = Vec::new();
    // byte_to_glyph[byte_offset] = index into glyphs; None for run separators
    let mut byte_to_glyph: Vec<Option<usize>> = Vec::new();

    for run in runs.iter().filter(|r| r.kind == RunKind::Text) {
        let count = run.text.chars().count();
        if count == 0 {
            continue;
        }
        if !full_text.is_empty() {
            full_text.push(' ');
            byte_to_glyph.push(None);
        }
        let r = run.region.normalized();
        let step = r.width() / count as f64;
        for (i, ch) in run.text.chars().enumerate() {
            let x0 = r.x0 + step * i as f64;
            glyphs.push(Glyph {
                region: Region::new(x0, r.y0, x0 + step, r.y1),
            });
            let idx = glyphs.len() - 1;
            for _ in 0..ch.len_utf8() {
                byte_to_glyph.push(Some(idx));
            }
            full_text.push(ch);
        }
    }

    let re = match Regex::new(&format!("(?i){}", regex::escape(needle))) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let mut results = Vec::new();
    for m in re.find_iter(&full_text) {
        let mut bbox: Option<Region> = None;
        for offset in m.start()..m.end() {
            if let Some(Some(idx)) = byte_to_glyph.get(offset) {
                let g = &glyphs[*idx].region;
                bbox = Some(match bbox {
                    Some(b) => b.union(g),
                    None => *g,
                });
            }
        }
        if let Some(b) = bbox {
            results.push(b);
        }
        if results.len() >= max_hits {
            break;
        }
    }
    results
}
