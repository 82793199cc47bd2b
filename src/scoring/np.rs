//! Natural-product likeness (Ertl, Roggo and Schuffenhauer, 2008).

use super::{morgan_fingerprint, NpModel, FINGERPRINT_RADIUS};
use crate::descriptors::{DescriptorError, DescriptorResult, DescriptorValue};
use crate::Molecule;

/// Compress scores beyond +-4 logarithmically.
fn damp(score: f64) -> f64 {
    if score > 4.0 {
        4.0 + (score - 4.0 + 1.0).log10()
    } else if score < -4.0 {
        -4.0 - (-4.0 - score + 1.0).log10()
    } else {
        score
    }
}

/// Sum of model contributions over distinct fragments, per heavy atom.
///
/// Fragments absent from the model contribute nothing. An empty model has no
/// score to give.
pub fn np_score(molecule: &Molecule, model: &NpModel) -> DescriptorResult {
    if model.is_empty() {
        return Err(DescriptorError::undefined("natural-product model is empty"));
    }
    let atoms = molecule.heavy_atom_count();
    if atoms == 0 {
        return Err(DescriptorError::undefined("molecule has no heavy atoms"));
    }
    let fingerprint = morgan_fingerprint(molecule, FINGERPRINT_RADIUS);
    let total: f64 = fingerprint.ids().map(|id| model.score(id).unwrap_or(0.0)).sum();
    Ok(DescriptorValue::Real(damp(total / atoms as f64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;
    use std::collections::HashMap;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_empty_model_is_undefined() {
        let molecule = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert!(matches!(
            np_score(&molecule, &NpModel::default()),
            Err(DescriptorError::Undefined { .. })
        ));
    }

    #[test]
    fn test_unknown_fragments_score_zero() {
        let molecule = parse_smiles("CCO").expect("Failed to parse SMILES");
        let fingerprint = morgan_fingerprint(&molecule, FINGERPRINT_RADIUS);
        let free = (0..).find(|id| !fingerprint.counts().contains_key(id)).expect("no free fragment id");
        let model = NpModel::new(HashMap::from([(free, 2.0)]));
        let score = np_score(&molecule, &model).expect("Failed to score");
        assert_eq!(score, DescriptorValue::Real(0.0));
    }

    #[test]
    fn test_score_is_averaged_over_atoms() {
        let molecule = parse_smiles("CC").expect("Failed to parse SMILES");
        let scores = morgan_fingerprint(&molecule, FINGERPRINT_RADIUS)
            .ids()
            .map(|id| (id, 1.0))
            .collect::<HashMap<_, _>>();
        // Two distinct fragments, two heavy atoms.
        let score = np_score(&molecule, &NpModel::new(scores)).expect("Failed to score");
        assert!((score.as_f64() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_damping() {
        assert!((damp(2.5) - 2.5).abs() < EPS);
        assert!((damp(13.0) - 5.0).abs() < EPS);
        assert!((damp(-13.0) + 5.0).abs() < EPS);
    }
}
