//! Reading-order sort for left-to-right scripts.

use super::FilteredWord;

/// Sorts words top-to-bottom, then left-to-right within a line.
///
/// Words are stably ordered by top edge, then swept into lines: a word joins the current line
/// while its top edge is less than `line_tolerance_px` below the line's first word. Each line
/// is then stably ordered by left edge. Two words whose top edges differ by at least the
/// tolerance always end up in different lines, so the higher one comes first.
pub fn sort_reading_order(words: &mut [FilteredWord], line_tolerance_px: f64) {
    words.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));

    let mut start = 0;
    while start < words.len() {
        let anchor = words[start].bbox.y0;
        let end = words[start + 1..]
            .iter()
            .position(|w| w.bbox.y0 - anchor >= line_tolerance_px)
            .map_or(words.len(), |offset| start + 1 + offset);
        words[start..end].sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::BoundingBox;

    fn fw(text: &str, x0: f64, y0: f64) -> FilteredWord {
        FilteredWord {
            text: text.to_string(),
            confidence: 1.0,
            bbox: BoundingBox {
                x0,
                y0,
                x1: x0 + 10.0,
                y1: y0 + 10.0,
            },
        }
    }

    fn texts(words: &[FilteredWord]) -> Vec<&str> {
        words.iter().map(|w| w.text.as_str()).collect()
    }

    #[test]
    fn test_same_line_orders_by_x() {
        let mut words = vec![fw("fox", 200.0, 12.0), fw("The", 0.0, 10.0), fw("quick", 80.0, 15.0)];
        sort_reading_order(&mut words, 10.0);
        assert_eq!(texts(&words), ["The", "quick", "fox"]);
    }

    #[test]
    fn test_lines_order_by_y() {
        let mut words = vec![
            fw("bottom", 0.0, 100.0),
            fw("top", 300.0, 0.0),
            fw("middle", 150.0, 50.0),
        ];
        sort_reading_order(&mut words, 10.0);
        assert_eq!(texts(&words), ["top", "middle", "bottom"]);
    }

    #[test]
    fn test_exact_tolerance_starts_new_line() {
        let mut words = vec![fw("below", 0.0, 10.0), fw("above", 50.0, 0.0)];
        sort_reading_order(&mut words, 10.0);
        assert_eq!(texts(&words), ["above", "below"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let mut words = vec![fw("first", 5.0, 5.0), fw("second", 5.0, 5.0), fw("third", 5.0, 5.0)];
        sort_reading_order(&mut words, 10.0);
        assert_eq!(texts(&words), ["first", "second", "third"]);
    }

    #[test]
    fn test_vertical_order_invariant_holds() {
        // Deterministic scatter with plenty of near-line collisions.
        let mut words: Vec<_> = (0..200)
            .map(|i| {
                let x = ((i * 37) % 97) as f64 * 7.0;
                let y = ((i * 53) % 89) as f64 * 1.7;
                fw(&format!("w{i}"), x, y)
            })
            .collect();
        sort_reading_order(&mut words, 10.0);
        for (i, a) in words.iter().enumerate() {
            for b in &words[i + 1..] {
                if (a.bbox.y0 - b.bbox.y0).abs() >= 10.0 {
                    assert!(a.bbox.y0 < b.bbox.y0, "{} before {}", a.text, b.text);
                }
            }
        }
    }

    #[test]
    fn test_empty_and_single() {
        let mut none: Vec<FilteredWord> = Vec::new();
        sort_reading_order(&mut none, 10.0);
        assert!(none.is_empty());

        let mut one = vec![fw("alone", 3.0, 4.0)];
        sort_reading_order(&mut one, 10.0);
        assert_eq!(texts(&one), ["alone"]);
    }
}
