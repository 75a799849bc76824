//! Hover highlight intensities for the two panels.
//!
//! `matrix` is one head's rows: `matrix[r][c]` is how much the completion
//! token at `prompt_length + r` attends to token `c`. Only index pairs that
//! respect that direction are looked up; everything else is 0.

use crate::state::Panel;

/// Opacity of the hovered token itself
pub const SELF_INTENSITY: f64 = 1.0;

fn weight(matrix: &[Vec<f64>], row: usize, col: usize) -> f64 {
    matrix
        .get(row)
        .and_then(|cols| cols.get(col))
        .copied()
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

/// Intensities when hovering `index` in the Observed panel: which later
/// completion tokens attend back to it.
pub fn observed(matrix: &[Vec<f64>], prompt_length: usize, token_count: usize, index: usize) -> Vec<f64> {
    (0..token_count)
        .map(|i| {
            if i == index {
                SELF_INTENSITY
            } else if i >= prompt_length && index <= i {
                weight(matrix, i - prompt_length, index)
            } else {
                0.0
            }
        })
        .collect()
}

/// Intensities when hovering `index` in the Observer panel: which earlier
/// tokens it attends to. `None` for prompt tokens, which observe nothing.
pub fn observer(
    matrix: &[Vec<f64>],
    prompt_length: usize,
    token_count: usize,
    index: usize,
) -> Option<Vec<f64>> {
    if index < prompt_length {
        return None;
    }

    let row = index - prompt_length;
    Some(
        (0..token_count)
            .map(|i| match i.cmp(&index) {
                std::cmp::Ordering::Equal => SELF_INTENSITY,
                std::cmp::Ordering::Less => weight(matrix, row, i),
                std::cmp::Ordering::Greater => 0.0,
            })
            .collect(),
    )
}

/// Dispatch on the panel kind. `None` means the hover changes nothing.
pub fn intensities(
    panel: Panel,
    matrix: &[Vec<f64>],
    prompt_length: usize,
    token_count: usize,
    index: usize,
) -> Option<Vec<f64>> {
    if index >= token_count {
        return None;
    }
    match panel {
        Panel::Observed => Some(observed(matrix, prompt_length, token_count, index)),
        Panel::Observer => observer(matrix, prompt_length, token_count, index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Prompt of 2 tokens followed by 3 completion tokens.
    fn matrix() -> Vec<Vec<f64>> {
        vec![
            vec![0.1, 0.2],
            vec![0.3, 0.4, 0.5],
            vec![0.6, 0.7, 0.8, 0.9],
        ]
    }

    #[test]
    fn test_cat_example() {
        let m = vec![vec![0.9]];

        assert_eq!(observed(&m, 1, 2, 0), vec![1.0, 0.9]);
        assert_eq!(observer(&m, 1, 2, 1), Some(vec![0.9, 1.0]));
    }

    #[test]
    fn test_observed_prompt_token() {
        // Token 1 is observed by every completion token
        assert_eq!(observed(&matrix(), 2, 5, 1), vec![0.0, 1.0, 0.2, 0.4, 0.7]);
    }

    #[test]
    fn test_observed_completion_token() {
        // Token 3 is only observed by token 4
        assert_eq!(observed(&matrix(), 2, 5, 3), vec![0.0, 0.0, 0.0, 1.0, 0.9]);
    }

    #[test]
    fn test_observed_zero_before_prompt_end_and_index() {
        let m = matrix();
        for index in 0..5 {
            let lit = observed(&m, 2, 5, index);
            for (i, &value) in lit.iter().enumerate() {
                if i == index {
                    assert_eq!(value, SELF_INTENSITY);
                } else if i < 2 || i < index {
                    assert_eq!(value, 0.0, "index {index} row {i}");
                } else {
                    assert_eq!(value, m[i - 2][index]);
                }
            }
        }
    }

    #[test]
    fn test_observer_prompt_token_is_noop() {
        assert_eq!(observer(&matrix(), 2, 5, 0), None);
        assert_eq!(observer(&matrix(), 2, 5, 1), None);
    }

    #[test]
    fn test_observer_completion_token() {
        assert_eq!(observer(&matrix(), 2, 5, 3), Some(vec![0.3, 0.4, 0.5, 1.0, 0.0]));
        assert_eq!(observer(&matrix(), 2, 5, 4), Some(vec![0.6, 0.7, 0.8, 0.9, 1.0]));
    }

    #[test]
    fn test_weights_are_clamped() {
        let m = vec![vec![1.5], vec![-0.2, 0.3]];
        assert_eq!(observer(&m, 1, 3, 1), Some(vec![1.0, 1.0, 0.0]));
        assert_eq!(observer(&m, 1, 3, 2), Some(vec![0.0, 0.3, 1.0]));
    }

    #[test]
    fn test_out_of_range_hover() {
        assert_eq!(intensities(Panel::Observed, &matrix(), 2, 5, 5), None);
        assert_eq!(intensities(Panel::Observer, &matrix(), 2, 5, 9), None);
    }
}
