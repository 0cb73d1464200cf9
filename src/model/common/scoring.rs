use std::collections::HashSet;

/// Decide whether a selection answers a question correctly.
///
/// Single-answer questions (exactly one correct value and exactly one
/// selection) require an exact match. Everything else is compared as sets:
/// same members in both directions, order irrelevant.
pub fn selection_is_correct(correct: &[String], selected: &[String]) -> bool {
    if correct.len() == 1 && selected.len() == 1 {
        return selected[0] == correct[0];
    }
    let correct: HashSet<&str> = correct.iter().map(String::as_str).collect();
    let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
    correct == selected
}

/// Rounded percentage of correct answers. An empty submission is 0%.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(score) * 100.0 / f64::from(total)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn single_answer_requires_exact_match() {
        let correct = values(&["B"]);
        assert!(selection_is_correct(&correct, &values(&["B"])));
        assert!(!selection_is_correct(&correct, &values(&["A"])));
        // Selecting the right answer plus a wrong one is not correct.
        assert!(!selection_is_correct(&correct, &values(&["A", "B"])));
        assert!(!selection_is_correct(&correct, &values(&[])));
    }

    #[test]
    fn multi_answer_compares_as_sets() {
        let correct = values(&["X", "Y"]);
        assert!(selection_is_correct(&correct, &values(&["Y", "X"])));
        assert!(selection_is_correct(&correct, &values(&["X", "Y"])));
        assert!(!selection_is_correct(&correct, &values(&["X"])));
        assert!(!selection_is_correct(&correct, &values(&["X", "Y", "Z"])));
        assert!(!selection_is_correct(&correct, &values(&[])));
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 15), 0);
        assert_eq!(percentage(0, 0), 0);
    }
}
