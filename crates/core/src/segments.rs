use crate::types::{HighlightSegment, Transcript};

/// Containment window past a segment's `end`, in seconds. `t == end` is
/// still inside the window; `t >= end + tolerance` is not.
pub const CONTAINMENT_TOLERANCE: f64 = 0.1;

/// Project a transcript onto its highlighted sentences, ascending by start
/// time. Ties keep traversal order (stable sort). `None` yields an empty
/// list.
pub fn highlight_segments(transcript: Option<&Transcript>) -> Vec<HighlightSegment> {
    let Some(transcript) = transcript else {
        return Vec::new();
    };

    let mut highlighted = Vec::new();
    for section in &transcript.sections {
        for sentence in &section.sentences {
            if sentence.is_highlight {
                highlighted.push(HighlightSegment {
                    sentence_id: sentence.id.clone(),
                    start: sentence.start,
                    end: sentence.end,
                    text: sentence.text.clone(),
                    section_id: section.id.clone(),
                    section_title: section.title.clone(),
                });
            }
        }
    }

    highlighted.sort_by(|a, b| a.start.total_cmp(&b.start));
    highlighted
}

/// First segment starting strictly after `t`. A segment starting exactly at
/// `t` is not "next".
pub fn next_segment_after(segments: &[HighlightSegment], t: f64) -> Option<&HighlightSegment> {
    segments.iter().find(|segment| segment.start > t)
}

/// Last segment starting strictly before `t`.
pub fn previous_segment_before(segments: &[HighlightSegment], t: f64) -> Option<&HighlightSegment> {
    let mut previous = None;
    for segment in segments {
        if segment.start < t {
            previous = Some(segment);
        } else {
            break;
        }
    }
    previous
}

/// Whether `t` falls within `[start, end + tolerance)` of some segment.
pub fn is_inside_any(segments: &[HighlightSegment], t: f64, tolerance: f64) -> bool {
    segments
        .iter()
        .any(|segment| t >= segment.start && t < segment.end + tolerance)
}

/// True when `t` sits in a gap between highlights with more highlights
/// ahead: playback should jump forward rather than play the gap.
pub fn should_advance(segments: &[HighlightSegment], t: f64, tolerance: f64) -> bool {
    if segments.is_empty() {
        return false;
    }
    !is_inside_any(segments, t, tolerance) && next_segment_after(segments, t).is_some()
}
