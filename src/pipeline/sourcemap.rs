//! Line-level source maps.
//!
//! A bundle map records, for every generated line, which input file and line
//! it came from. The concatenation gives the first layout; each stage that
//! rewrites the text reports where its output lines came from in its input
//! and the layout is carried through. Every mapped line points column 0 at
//! column 0 of its source line.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Generated line -> `(input index, input line)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMap(Vec<Option<(u32, u32)>>);

impl LineMap {
    /// Layout of `contents` joined with `\n`.
    pub fn for_concat(contents: &[&str]) -> Self {
        let mut lines = Vec::new();
        for (index, content) in (0u32..).zip(contents) {
            lines.extend((0u32..).take(line_count(content)).map(|line| Some((index, line))));
        }
        Self(lines)
    }

    /// Carry the layout through a stage whose output line `i` came from its
    /// input line `origins[i]`.
    pub fn through(&self, origins: &[Option<u32>]) -> Self {
        Self(
            origins
                .iter()
                .map(|origin| origin.and_then(|line| self.0.get(line as usize).copied().flatten()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Version 3 source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    version: u8,
    file: String,
    sources: Vec<String>,
    sources_content: Vec<String>,
    names: Vec<String>,
    mappings: String,
}

impl SourceMap {
    /// `inputs` are `(source path, content)` in the order `lines` indexes them.
    pub fn new(file: &str, inputs: &[(String, &str)], lines: &LineMap) -> Self {
        let mut mappings = String::new();
        let (mut prev_source, mut prev_line) = (0i64, 0i64);

        for (i, origin) in lines.0.iter().enumerate() {
            if i > 0 {
                mappings.push(';');
            }
            let Some((source, line)) = *origin else {
                continue;
            };
            let (source, line) = (i64::from(source), i64::from(line));
            // [generated column, source index, source line, source column]
            encode_vlq(0, &mut mappings);
            encode_vlq(source - prev_source, &mut mappings);
            encode_vlq(line - prev_line, &mut mappings);
            encode_vlq(0, &mut mappings);
            (prev_source, prev_line) = (source, line);
        }

        Self {
            version: 3,
            file: file.to_string(),
            sources: inputs.iter().map(|(path, _)| path.clone()).collect(),
            sources_content: inputs.iter().map(|(_, c)| (*c).to_string()).collect(),
            names: Vec::new(),
            mappings,
        }
    }

    pub fn to_json(&self) -> String {
        // Only strings and integers: serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_data_url(&self) -> String {
        format!("{DATA_URL_PREFIX}{}", STANDARD.encode(self.to_json()))
    }

    /// Trailing comment linking a stylesheet to its map.
    pub fn css_comment(url: &str) -> String {
        format!("\n/*# sourceMappingURL={url} */\n")
    }

    /// Trailing comment linking a script to its map.
    pub fn js_comment(url: &str) -> String {
        format!("\n//# sourceMappingURL={url}\n")
    }
}

const DATA_URL_PREFIX: &str = "data:application/json;charset=utf-8;base64,";

fn line_count(content: &str) -> usize {
    content.split('\n').count()
}

/// Input line of each line of `output`, from `(generated line, source line)`
/// pairs in generated order. The first pair of a line wins.
pub fn origins_by_line(output: &str, pairs: impl IntoIterator<Item = (u32, u32)>) -> Vec<Option<u32>> {
    let mut origins = vec![None; line_count(output)];
    for (generated, source) in pairs {
        if let Some(slot @ None) = origins.get_mut(generated as usize) {
            *slot = Some(source);
        }
    }
    origins
}

/// The parts of a foreign map that line tracking needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForeignMap {
    #[serde(default)]
    sources_content: Vec<Option<String>>,
    mappings: String,
}

/// Input line of each line of `output`, read from a v3 map a tool produced
/// for a single input. When the map lists several sources, lines are only
/// kept for the one whose content is `input` (or the first).
pub fn origins_from_json(output: &str, json: &str, input: &str) -> Option<Vec<Option<u32>>> {
    let map: ForeignMap = serde_json::from_str(json).ok()?;
    let own = map
        .sources_content
        .iter()
        .position(|c| c.as_deref() == Some(input))
        .unwrap_or(0);
    let own = u32::try_from(own).ok()?;

    let pairs = decode_mappings(&map.mappings)
        .into_iter()
        .filter(|(_, source, _)| *source == own)
        .map(|(generated, _, line)| (generated, line));
    Some(origins_by_line(output, pairs))
}

/// Remove a trailing inline `sourceMappingURL` data URL from `output` and
/// return the decoded map JSON.
pub fn take_inline_map(output: &mut String) -> Option<String> {
    let marker = output.rfind("sourceMappingURL=data:application/json")?;
    let comment_start = output[..marker].rfind("/*#").or_else(|| output[..marker].rfind("//#"))?;
    let encoded = output[marker..].split_once("base64,")?.1;
    let encoded = encoded
        .split(|c: char| c.is_whitespace() || c == '*')
        .next()
        .unwrap_or_default();
    let json = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;

    output.truncate(comment_start);
    let kept = output.trim_end_matches(['\n', '\r', ' ']).len();
    output.truncate(kept);
    Some(json)
}

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Base64 VLQ: sign in the lowest bit, 5 data bits per digit, bit 6 continues.
fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64_DIGITS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn decode_vlq_segment(segment: &str) -> Option<Vec<i64>> {
    let mut values = Vec::new();
    let (mut value, mut shift) = (0i64, 0u32);
    for byte in segment.bytes() {
        let digit = BASE64_DIGITS.iter().position(|&d| d == byte)? as i64;
        value += (digit & 0b1_1111) << shift;
        if digit & 0b10_0000 != 0 {
            shift += 5;
            continue;
        }
        values.push(if value & 1 == 1 { -(value >> 1) } else { value >> 1 });
        (value, shift) = (0, 0);
    }
    Some(values)
}

/// `(generated line, source index, source line)` of every segment that
/// has a source. Malformed segments are skipped.
fn decode_mappings(mappings: &str) -> Vec<(u32, u32, u32)> {
    let mut out = Vec::new();
    let (mut source, mut line) = (0i64, 0i64);
    for (generated, segments) in (0u32..).zip(mappings.split(';')) {
        for segment in segments.split(',').filter(|s| !s.is_empty()) {
            let Some(fields) = decode_vlq_segment(segment) else {
                continue;
            };
            if fields.len() < 4 {
                continue;
            }
            source += fields[1];
            line += fields[2];
            if let (Ok(s), Ok(l)) = (u32::try_from(source), u32::try_from(line)) {
                out.push((generated, s, l));
            }
        }
    }
    out
}
