use ndarray::Array3;

use crate::classifier::InputShape;
use crate::document::Document;
use crate::embedding::EmbeddingLookup;
use crate::error::{Error, Result};
use crate::scaler::VectorScaler;

/// Assembles one document into the classifier's fixed input shape
/// `(1, sample_length, embedding_size)`.
///
/// The tensor starts zeroed; the first `sample_length` words are looked up,
/// scaled, and written at their word position. Out-of-vocabulary words are
/// skipped, leaving their zero row: missing words contribute no signal
/// rather than erroring. Documents shorter than `sample_length`, or with no
/// vocabulary coverage at all, assemble to a partially or fully zero tensor,
/// which is a valid (if low-signal) input.
pub fn assemble_document(
    doc: &Document,
    shape: InputShape,
    lookup: &dyn EmbeddingLookup,
    scaler: &dyn VectorScaler,
) -> Result<Array3<f32>> {
    let mut tensor = Array3::zeros((1, shape.sample_length, shape.embedding_size));
    write_rows(&mut tensor, 0, doc, shape, lookup, scaler)?;
    Ok(tensor)
}

/// Assembles a batch of documents into `(docs, sample_length,
/// embedding_size)`. Each document's row index is its id, so ids must be
/// unique and within range.
pub fn assemble_batch(
    docs: &[Document],
    shape: InputShape,
    lookup: &dyn EmbeddingLookup,
    scaler: &dyn VectorScaler,
) -> Result<Array3<f32>> {
    let mut tensor = Array3::zeros((docs.len(), shape.sample_length, shape.embedding_size));
    let mut seen = vec![false; docs.len()];
    for doc in docs {
        if doc.id() >= docs.len() {
            return Err(Error::InvalidArgument(format!(
                "document id {} is out of range for a batch of {}",
                doc.id(),
                docs.len()
            )));
        }
        if std::mem::replace(&mut seen[doc.id()], true) {
            return Err(Error::InvalidArgument(format!(
                "duplicate document id {} in batch",
                doc.id()
            )));
        }
        write_rows(&mut tensor, doc.id(), doc, shape, lookup, scaler)?;
    }
    Ok(tensor)
}

fn write_rows(
    tensor: &mut Array3<f32>,
    row: usize,
    doc: &Document,
    shape: InputShape,
    lookup: &dyn EmbeddingLookup,
    scaler: &dyn VectorScaler,
) -> Result<()> {
    // Truncate, never pad: positions past the last word stay zero.
    for (position, word) in doc.words().iter().take(shape.sample_length).enumerate() {
        let Some(raw) = lookup.vector(word) else {
            continue;
        };
        let scaled = scaler.transform(raw);
        if scaled.len() != shape.embedding_size {
            return Err(Error::InvalidArgument(format!(
                "embedding for '{}' scales to dimension {}, classifier expects {}",
                word,
                scaled.len(),
                shape.embedding_size
            )));
        }
        for (component, value) in scaled.into_iter().enumerate() {
            tensor[[row, position, component]] = value;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::WordEmbeddings;
    use crate::scaler::IdentityScaler;

    fn demo_lookup() -> WordEmbeddings {
        WordEmbeddings::from_pairs(
            2,
            [
                ("spam".to_string(), vec![1.0, 2.0]),
                ("ham".to_string(), vec![3.0, 4.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn known_words_fill_their_rows_and_the_rest_stay_zero() {
        let doc = Document::from_text(0, "spam ham").unwrap();
        let tensor =
            assemble_document(&doc, InputShape::new(4, 2), &demo_lookup(), &IdentityScaler)
                .unwrap();
        assert_eq!(tensor.dim(), (1, 4, 2));
        assert_eq!(tensor[[0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 1, 1]], 4.0);
        // Unfilled positions remain exact zero rows.
        assert_eq!(tensor[[0, 2, 0]], 0.0);
        assert_eq!(tensor[[0, 3, 1]], 0.0);
    }

    #[test]
    fn out_of_vocabulary_words_leave_zero_rows() {
        let doc = Document::from_text(0, "spam mystery ham").unwrap();
        let tensor =
            assemble_document(&doc, InputShape::new(3, 2), &demo_lookup(), &IdentityScaler)
                .unwrap();
        assert_ne!(tensor[[0, 0, 0]], 0.0);
        assert_eq!(tensor[[0, 1, 0]], 0.0);
        assert_eq!(tensor[[0, 1, 1]], 0.0);
        assert_ne!(tensor[[0, 2, 0]], 0.0);
    }

    #[test]
    fn fully_out_of_vocabulary_document_is_all_zero() {
        let doc = Document::from_text(0, "completely unknown words here").unwrap();
        let tensor =
            assemble_document(&doc, InputShape::new(3, 2), &demo_lookup(), &IdentityScaler)
                .unwrap();
        assert!(tensor.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn long_documents_are_truncated() {
        let doc = Document::from_text(0, "spam spam spam spam spam").unwrap();
        let tensor =
            assemble_document(&doc, InputShape::new(2, 2), &demo_lookup(), &IdentityScaler)
                .unwrap();
        assert_eq!(tensor.dim(), (1, 2, 2));
    }

    #[test]
    fn batch_rows_follow_document_ids() {
        let docs = vec![
            Document::from_text(1, "ham").unwrap(),
            Document::from_text(0, "spam").unwrap(),
        ];
        let tensor =
            assemble_batch(&docs, InputShape::new(1, 2), &demo_lookup(), &IdentityScaler)
                .unwrap();
        assert_eq!(tensor[[0, 0, 0]], 1.0); // id 0 -> spam
        assert_eq!(tensor[[1, 0, 0]], 3.0); // id 1 -> ham
    }

    #[test]
    fn duplicate_batch_ids_are_rejected() {
        let docs = vec![
            Document::from_text(0, "spam").unwrap(),
            Document::from_text(0, "ham").unwrap(),
        ];
        let err = assemble_batch(&docs, InputShape::new(1, 2), &demo_lookup(), &IdentityScaler)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn scaled_dimension_mismatch_is_invalid() {
        struct Widening;
        impl crate::scaler::VectorScaler for Widening {
            fn transform(&self, vector: &[f32]) -> Vec<f32> {
                let mut out = vector.to_vec();
                out.push(0.0);
                out
            }
        }
        let doc = Document::from_text(0, "spam").unwrap();
        let err = assemble_document(&doc, InputShape::new(1, 2), &demo_lookup(), &Widening)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
