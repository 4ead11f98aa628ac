//! # Text Measurement
//!
//! Line breaking and height measurement for text blocks.
//!
//! A text block holds one string plus a list of styled ranges. Measuring it
//! means applying the block's letter case, breaking it into lines that fit
//! the block width (UAX#14 break opportunities, greedy fill) and summing the
//! line heights. Each line is as tall as its largest glyph times the line
//! height factor.

use serde::{Deserialize, Serialize};
use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::config::POINTS_PER_INCH;
use crate::font::FontContext;
use crate::model::{Color, TextCase, Typeface};

/// Character styling applied to a range of a text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    pub color: Color,
    pub typeface: Typeface,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_size: 12.0,
            color: Color::BLACK,
            typeface: Typeface::default(),
        }
    }
}

/// A style applied to the char range `start..end` of a text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledRange {
    pub start: usize,
    pub end: usize,
    pub style: TextStyle,
}

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width in points, trailing spaces excluded.
    pub width: f64,
    /// Largest font size on the line, in points.
    pub font_size: f64,
}

/// Result of measuring a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMetrics {
    pub lines: Vec<BrokenLine>,
    /// Total height in inches.
    pub height: f64,
    /// Widest line in inches.
    pub width: f64,
}

/// Apply a letter-case transform the way the canvas renders it.
pub fn apply_text_case(text: &str, case: TextCase) -> String {
    match case {
        TextCase::Normal => text.to_string(),
        TextCase::Uppercase => text.to_uppercase(),
        TextCase::Lowercase => text.to_lowercase(),
        TextCase::Titlecase => {
            let mut out = String::with_capacity(text.len());
            let mut at_word_start = true;
            for ch in text.chars() {
                if at_word_start && ch.is_alphabetic() {
                    out.extend(ch.to_uppercase());
                    at_word_start = false;
                } else {
                    out.push(ch);
                    if ch.is_whitespace() {
                        at_word_start = true;
                    } else if ch.is_alphabetic() {
                        at_word_start = false;
                    }
                }
            }
            out
        }
    }
}

/// Resolve the style of every char of `text`. Later ranges win over earlier
/// ones; chars outside every range use `base`.
pub fn resolve_char_styles<'a>(
    text: &str,
    base: &'a TextStyle,
    ranges: &'a [StyledRange],
) -> Vec<&'a TextStyle> {
    let count = text.chars().count();
    let mut styles = vec![base; count];
    for range in ranges {
        let end = range.end.min(count);
        for slot in styles.iter_mut().take(end).skip(range.start) {
            *slot = &range.style;
        }
    }
    styles
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the start of the next segment.
    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
            map[byte_idx] = char_idx;
        }
        map[text.len()] = char_count;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[derive(Default)]
pub struct TextLayout;

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break styled text into lines that fit within `max_width` points.
    ///
    /// Greedy: fill each line up to the last allowed break that fits, and
    /// force a break mid-word only when a single word is wider than the line.
    pub fn break_into_lines(
        &self,
        font_context: &FontContext,
        text: &str,
        styles: &[&TextStyle],
        max_width: f64,
    ) -> Vec<BrokenLine> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            let font_size = styles.first().map(|s| s.font_size).unwrap_or(0.0);
            return vec![BrokenLine {
                text: String::new(),
                width: 0.0,
                font_size,
            }];
        }

        let widths: Vec<f64> = chars
            .iter()
            .zip(styles.iter())
            .map(|(&ch, style)| font_context.char_width(ch, &style.typeface, style.font_size))
            .collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        let end = if is_newline(chars[i - 1]) { i - 1 } else { i };
                        lines.push(self.make_line(&chars, &widths, styles, line_start, end));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        last_break_point = Some(i - 1);
                    }
                    None => {}
                }
            }

            if is_newline(ch) {
                continue;
            }

            if line_width + widths[i] > max_width && line_start < i {
                let break_at = match last_break_point {
                    Some(bp) if bp >= line_start => bp + 1,
                    _ => i,
                };
                lines.push(self.make_line(&chars, &widths, styles, line_start, break_at));
                line_start = break_at;
                line_width = widths[line_start..=i].iter().sum();
                last_break_point = None;
                continue;
            }

            line_width += widths[i];
        }

        if line_start < chars.len() {
            lines.push(self.make_line(&chars, &widths, styles, line_start, chars.len()));
        }

        lines
    }

    fn make_line(
        &self,
        chars: &[char],
        widths: &[f64],
        styles: &[&TextStyle],
        start: usize,
        end: usize,
    ) -> BrokenLine {
        let end = end.max(start);
        let mut width: f64 = widths[start..end].iter().sum();

        // Trim trailing spaces from width calculation
        let mut i = end;
        while i > start && chars[i - 1] == ' ' {
            i -= 1;
            width -= widths[i];
        }

        let font_size = styles[start..end]
            .iter()
            .map(|s| s.font_size)
            .fold(0.0, f64::max);
        let font_size = if font_size > 0.0 {
            font_size
        } else {
            // Empty line (consecutive newlines) takes the style at its position.
            styles
                .get(start)
                .or_else(|| styles.last())
                .map(|s| s.font_size)
                .unwrap_or(0.0)
        };

        BrokenLine {
            text: chars[start..end].iter().collect(),
            width,
            font_size,
        }
    }

    /// Measure a text block laid out at `width_inches`.
    pub fn measure(
        &self,
        font_context: &FontContext,
        text: &str,
        base: &TextStyle,
        ranges: &[StyledRange],
        case: TextCase,
        width_inches: f64,
        line_height: f64,
    ) -> TextMetrics {
        let shown = apply_text_case(text, case);
        // Case mapping can change the char count (e.g. 'ß' → "SS"); styles
        // are resolved on the stored text and stretched to the shown text.
        let mut styles = resolve_char_styles(text, base, ranges);
        let shown_count = shown.chars().count();
        if styles.len() != shown_count {
            let last = styles.last().copied().unwrap_or(base);
            styles.resize(shown_count, last);
        }

        let max_width = width_inches.max(0.0) * POINTS_PER_INCH;
        let lines = self.break_into_lines(font_context, &shown, &styles, max_width);
        let height_pt: f64 = lines.iter().map(|l| l.font_size * line_height).sum();
        let width_pt = lines.iter().map(|l| l.width).fold(0.0, f64::max);

        TextMetrics {
            lines,
            height: height_pt / POINTS_PER_INCH,
            width: width_pt / POINTS_PER_INCH,
        }
    }
}
