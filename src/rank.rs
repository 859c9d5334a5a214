use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One `(label, confidence)` entry of a ranked prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLabel {
    pub label: String,
    pub score: f32,
}

/// Zips `labels[i]` with `scores[i]` and sorts descending by score.
///
/// The sort is stable: equal scores keep their label-set order. Scores are
/// used as-is; whether they sum to one is the classifier's concern.
pub fn rank(labels: &[String], scores: &[f32]) -> Result<Vec<RankedLabel>> {
    if labels.len() != scores.len() {
        return Err(Error::InvalidArgument(format!(
            "{} labels for {} scores",
            labels.len(),
            scores.len()
        )));
    }
    let mut ranked: Vec<RankedLabel> = labels
        .iter()
        .zip(scores)
        .map(|(label, &score)| RankedLabel {
            label: label.clone(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(ranked)
}

/// The `k` highest-confidence entries of an already ranked list.
pub fn top(ranked: &[RankedLabel], k: usize) -> &[RankedLabel] {
    &ranked[..ranked.len().min(k)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorts_descending() {
        let ranked = rank(&labels(&["a", "b", "c"]), &[0.1, 0.7, 0.2]).unwrap();
        let order: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_label_set_order() {
        let ranked = rank(&labels(&["a", "b", "c"]), &[0.9, 0.9, 0.1]).unwrap();
        let order: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn scores_are_not_normalized() {
        let ranked = rank(&labels(&["a", "b"]), &[4.0, 2.0]).unwrap();
        assert_eq!(ranked[0].score, 4.0);
        assert_eq!(ranked[1].score, 2.0);
    }

    #[test]
    fn length_mismatch_is_invalid() {
        let err = rank(&labels(&["a", "b"]), &[0.5]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn top_truncates() {
        let ranked = rank(&labels(&["a", "b", "c"]), &[0.3, 0.2, 0.1]).unwrap();
        assert_eq!(top(&ranked, 2).len(), 2);
        assert_eq!(top(&ranked, 9).len(), 3);
    }
}
