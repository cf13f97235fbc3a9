use crate::types::Section;

/// Format seconds as a zero-padded MM:SS timestamp, switching to HH:MM:SS
/// at one hour. Negative or non-finite input renders as "00:00".
/// Fractional seconds truncate.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }

    let total = seconds as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Id of the sentence active at `t`: the first sentence, in traversal
/// order, whose `[start, end]` range contains `t` (inclusive both ends).
/// Boundary ties resolve to the first match.
pub fn active_sentence_at(sections: &[Section], t: f64) -> Option<&str> {
    for section in sections {
        for sentence in &section.sentences {
            if t >= sentence.start && t <= sentence.end {
                return Some(&sentence.id);
            }
        }
    }
    None
}

/// Format transcript sections as a timestamped outline
pub fn format_transcript_outline(sections: &[Section]) -> String {
    let mut output = String::new();
    for section in sections {
        output.push_str(&format!("## {}\n", section.title));
        for sentence in &section.sentences {
            let marker = if sentence.is_highlight { "*" } else { " " };
            output.push_str(&format!(
                "{} [{}] {}\n",
                marker,
                format_time(sentence.start),
                sentence.text.trim()
            ));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sentence;

    #[test]
    fn formats_time_boundaries() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(5.0), "00:05");
        assert_eq!(format_time(59.0), "00:59");
        assert_eq!(format_time(65.0), "01:05");
        assert_eq!(format_time(3600.0), "01:00:00");
        assert_eq!(format_time(3661.0), "01:01:01");
        assert_eq!(format_time(-10.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
    }

    #[test]
    fn truncates_fractional_seconds() {
        assert_eq!(format_time(65.9), "01:05");
        assert_eq!(format_time(59.999), "00:59");
    }

    fn sections() -> Vec<Section> {
        vec![Section {
            id: "sec1".to_string(),
            title: "Section 1".to_string(),
            sentences: vec![
                Sentence {
                    id: "s1".to_string(),
                    start: 0.0,
                    end: 5.0,
                    text: "one".to_string(),
                    is_highlight: false,
                },
                Sentence {
                    id: "s2".to_string(),
                    start: 5.0,
                    end: 10.0,
                    text: "two".to_string(),
                    is_highlight: true,
                },
            ],
        }]
    }

    #[test]
    fn finds_active_sentence_inclusive_on_both_ends() {
        let sections = sections();
        assert_eq!(active_sentence_at(&sections, 2.0), Some("s1"));
        assert_eq!(active_sentence_at(&sections, 0.0), Some("s1"));
        // t == s1.end == s2.start: first match in traversal order wins.
        assert_eq!(active_sentence_at(&sections, 5.0), Some("s1"));
        assert_eq!(active_sentence_at(&sections, 10.0), Some("s2"));
        assert_eq!(active_sentence_at(&sections, 11.0), None);
    }

    #[test]
    fn outline_marks_highlights() {
        let outline = format_transcript_outline(&sections());
        assert!(outline.contains("## Section 1"));
        assert!(outline.contains("  [00:00] one"));
        assert!(outline.contains("* [00:05] two"));
    }
}
