//! Per-molecule descriptor records and the output schema they share.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::*;

use crate::descriptors::{calc_tpsa, DescriptorResult};
use crate::scoring::{np_score, sa_score};
use crate::{
    parse_smiles, DescriptorEntry, DescriptorError, DescriptorValue, ModelError, ModelHandle, Molecule, NpModel,
    SaModel, ValueKind, DESCRIPTOR_TABLE,
};

/// Table entry that is never computed or emitted.
pub const EXCLUDED_DESCRIPTOR: &str = "Ipc";
/// Molecule whose record defines the output schema.
pub const SCHEMA_SMILES: &str = "CCO";

pub const TPSA_INCLUDE_S_AND_P: &str = "TPSA_includeSandP";
pub const SA_SCORE: &str = "SA_score";
pub const NP_SCORE: &str = "NP_Score";

const EXTRAS: [(&str, ValueKind); 3] = [
    (TPSA_INCLUDE_S_AND_P, ValueKind::Real),
    (SA_SCORE, ValueKind::Real),
    (NP_SCORE, ValueKind::Real),
];

/// Descriptor name to value, `None` where the descriptor failed or the
/// molecule was missing.
pub type DescriptorRecord = IndexMap<&'static str, Option<DescriptorValue>>;
/// Descriptor name to output value kind, in output order.
pub type DescriptorSchema = IndexMap<&'static str, ValueKind>;

pub struct DescriptorCalculator {
    table: &'static [DescriptorEntry],
    np_model: Arc<ModelHandle<NpModel>>,
    sa_model: Arc<ModelHandle<SaModel>>,
    schema: OnceCell<DescriptorSchema>,
}

impl DescriptorCalculator {
    pub fn new(np_model: Arc<ModelHandle<NpModel>>, sa_model: Arc<ModelHandle<SaModel>>) -> Self {
        Self {
            table: DESCRIPTOR_TABLE,
            np_model,
            sa_model,
            schema: OnceCell::new(),
        }
    }

    /// Use a different descriptor table. The cached schema is discarded.
    pub fn with_table(mut self, table: &'static [DescriptorEntry]) -> Self {
        self.table = table;
        self.schema = OnceCell::new();
        self
    }

    /// Load both scoring models now instead of on the first molecule.
    pub fn prepare(&self) -> Result<(), ModelError> {
        self.np_model.get()?;
        self.sa_model.get()?;
        Ok(())
    }

    fn entries(&self) -> impl Iterator<Item = &DescriptorEntry> {
        self.table.iter().filter(|entry| entry.name != EXCLUDED_DESCRIPTOR)
    }

    /// Compute every descriptor of the table followed by the three scores.
    ///
    /// A descriptor that fails is logged and recorded as `None`; only a
    /// scoring model that cannot be loaded is an error.
    pub fn compute(&self, molecule: &Molecule) -> Result<DescriptorRecord, ModelError> {
        let np_model = self.np_model.get()?;
        let sa_model = self.sa_model.get()?;

        let mut record = DescriptorRecord::with_capacity(self.table.len() + EXTRAS.len());
        for entry in self.entries() {
            record.insert(entry.name, isolate(entry.name, entry.evaluate(molecule)));
        }

        let tpsa = Ok(DescriptorValue::Real(calc_tpsa(molecule, true)));
        record.insert(TPSA_INCLUDE_S_AND_P, isolate(TPSA_INCLUDE_S_AND_P, tpsa));
        record.insert(SA_SCORE, isolate(SA_SCORE, sa_score(molecule, &sa_model)));
        record.insert(NP_SCORE, isolate(NP_SCORE, np_score(molecule, &np_model)));
        Ok(record)
    }

    /// Record for one table row; a missing molecule gives an all-`None` record.
    pub fn compute_row(&self, molecule: Option<&Molecule>) -> Result<DescriptorRecord, ModelError> {
        match molecule {
            Some(molecule) => self.compute(molecule),
            None => Ok(self.descriptor_names()?.keys().map(|&name| (name, None)).collect()),
        }
    }

    /// Output names and kinds, found once by computing the record of ethanol.
    ///
    /// A descriptor that fails on ethanol falls back to its declared kind.
    pub fn descriptor_names(&self) -> Result<&DescriptorSchema, ModelError> {
        self.schema.get_or_try_init(|| {
            let sample = match parse_smiles(SCHEMA_SMILES) {
                Ok(molecule) => self.compute(&molecule)?,
                Err(e) => {
                    warn!("Schema molecule {SCHEMA_SMILES} failed to parse: {e}");
                    DescriptorRecord::new()
                }
            };
            let declared = self
                .entries()
                .map(|entry| (entry.name, entry.kind))
                .chain(EXTRAS);
            let schema: DescriptorSchema = declared
                .map(|(name, kind)| {
                    let observed = sample.get(name).copied().flatten().map(|value| value.kind());
                    (name, observed.unwrap_or(kind))
                })
                .collect();
            debug!("Descriptor schema has {} columns", schema.len());
            Ok(schema)
        })
    }
}

impl Default for DescriptorCalculator {
    /// Calculator with empty scoring models.
    fn default() -> Self {
        Self::new(
            Arc::new(ModelHandle::preloaded(NpModel::default())),
            Arc::new(ModelHandle::preloaded(SaModel::default())),
        )
    }
}

/// Turn a failed or non-finite result into a missing value.
fn isolate(name: &str, result: DescriptorResult) -> Option<DescriptorValue> {
    match result {
        Ok(value) if value.is_finite() => Some(value),
        Ok(_) => {
            warn!("Descriptor {name} failed: {}", DescriptorError::NotFinite);
            None
        }
        Err(e) => {
            warn!("Descriptor {name} failed: {e}");
            None
        }
    }
}
