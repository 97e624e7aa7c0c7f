// src/analyze/multilang.rs
//! Multi-segment language breakdown.
//!
//! The text is cut into sentence-like segments, each segment is sent to language
//! detection on its own, and detections are averaged per ISO code. Detection is
//! best-effort: a segment whose call fails is skipped, never fatal.

use futures::stream::{self, StreamExt};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

use super::text_analytics::TextAnalytics;
use crate::error::Result;
use crate::record::LanguageInfo;

/// Languages whose average segment confidence falls below this are dropped.
pub const MULTI_LANGUAGE_THRESHOLD: f64 = 0.20;

static SEGMENT_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?\u{3002}\u{FF01}\u{FF1F}\r\n]+").expect("segment regex"));

/// Sentence-like segments, trimmed, empties dropped.
pub fn split_segments(text: &str) -> Vec<&str> {
    SEGMENT_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Detect per segment and rank. `concurrency` bounds in-flight calls; the
/// accumulation still walks segments in text order.
pub async fn detect_languages_multiline(
    client: &dyn TextAnalytics,
    text: &str,
    concurrency: usize,
) -> Vec<LanguageInfo> {
    let segments = split_segments(text);
    if segments.is_empty() {
        return Vec::new();
    }

    // Futures are built up front so the stream holds no borrowing closure.
    let calls: Vec<_> = segments
        .iter()
        .map(|segment| client.detect_language(segment))
        .collect();
    let results: Vec<Result<LanguageInfo>> = stream::iter(calls)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut detections = Vec::with_capacity(results.len());
    for (idx, res) in results.into_iter().enumerate() {
        match res {
            Ok(lang) => detections.push(lang),
            Err(e) => {
                debug!(segment = idx, error = %e, "segment language detection skipped");
                counter!("multilang_segment_skipped_total").increment(1);
            }
        }
    }
    rank_languages(detections)
}

/// Average confidence per ISO code, keep those at or above the threshold,
/// sort descending. Ties keep first-seen order (stable sort).
pub fn rank_languages<I>(detections: I) -> Vec<LanguageInfo>
where
    I: IntoIterator<Item = LanguageInfo>,
{
    struct Stat {
        name: String,
        iso6391: String,
        sum: f64,
        count: u32,
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stats: Vec<Stat> = Vec::new();

    for lang in detections {
        let slot = *index.entry(lang.iso6391.clone()).or_insert_with(|| {
            stats.push(Stat {
                name: lang.name.clone(),
                iso6391: lang.iso6391.clone(),
                sum: 0.0,
                count: 0,
            });
            stats.len() - 1
        });
        stats[slot].sum += lang.confidence;
        stats[slot].count += 1;
    }

    let mut breakdown: Vec<LanguageInfo> = stats
        .into_iter()
        .map(|s| LanguageInfo {
            confidence: s.sum / f64::from(s.count.max(1)),
            name: s.name,
            iso6391: s.iso6391,
        })
        .filter(|l| l.confidence >= MULTI_LANGUAGE_THRESHOLD)
        .collect();

    breakdown.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    breakdown
}
