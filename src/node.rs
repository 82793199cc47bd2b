//! The descriptor node: settings, output schema and the row loop.

use indexmap::IndexMap;
use tracing::*;

use crate::{
    classify, convert_column, is_convertible_to_molecule, Cell, Column, ColumnSpec, ConfigurationError, DataType,
    DescriptorCalculator, NodeError, ParseOptions, Schema, Table,
};

/// Progress reporting and cancellation, provided by whoever runs the node.
pub trait ExecutionContext {
    /// Fraction of rows done, in `0.0..=1.0`.
    fn set_progress(&mut self, fraction: f64);

    fn is_canceled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSettings {
    /// Name of the column holding molecules.
    pub molecule_column: Option<String>,
}

impl NodeSettings {
    pub fn new(molecule_column: impl Into<String>) -> Self {
        Self {
            molecule_column: Some(molecule_column.into()),
        }
    }
}

pub struct DescriptorNode {
    settings: NodeSettings,
    calculator: DescriptorCalculator,
    parse_options: ParseOptions,
}

impl DescriptorNode {
    pub fn new(settings: NodeSettings, calculator: DescriptorCalculator) -> Self {
        Self {
            settings,
            calculator,
            parse_options: ParseOptions::default(),
        }
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    pub fn calculator(&self) -> &DescriptorCalculator {
        &self.calculator
    }

    /// Columns offered for selection.
    pub fn column_filter(spec: &ColumnSpec) -> bool {
        is_convertible_to_molecule(spec)
    }

    fn selected_column<'a>(&self, schema: &'a Schema) -> Result<&'a ColumnSpec, ConfigurationError> {
        let name = self
            .settings
            .molecule_column
            .as_deref()
            .ok_or(ConfigurationError::NoColumnSelected)?;
        let spec = schema
            .find(name)
            .ok_or_else(|| ConfigurationError::ColumnNotFound(name.to_string()))?;
        if classify(&spec.data_type).is_none() {
            return Err(ConfigurationError::UnrecognizedColumnType(spec.data_type.to_string()));
        }
        Ok(spec)
    }

    /// Output schema: the input columns followed by one column per descriptor.
    pub fn configure(&self, input: &Schema) -> Result<Schema, NodeError> {
        self.selected_column(input)?;
        let mut output = input.clone();
        for (&name, &kind) in self.calculator.descriptor_names()? {
            output.upsert(ColumnSpec::new(name, DataType::from(kind)));
        }
        Ok(output)
    }

    pub fn execute(&self, input: &Table, context: &mut dyn ExecutionContext) -> Result<Table, NodeError> {
        let schema = input.schema();
        let spec = self.selected_column(&schema)?;
        let source = input
            .column(&spec.name)
            .ok_or_else(|| ConfigurationError::ColumnNotFound(spec.name.clone()))?;

        self.calculator.prepare()?;
        let descriptors = self.calculator.descriptor_names()?;
        let molecules = convert_column(source.data_type(), source.cells(), self.parse_options)?;

        let rows = molecules.len();
        info!("Computing {} descriptors for {} rows of '{}'", descriptors.len(), rows, spec.name);

        let mut outputs: IndexMap<&str, Vec<Cell>> = descriptors
            .keys()
            .map(|&name| (name, Vec::with_capacity(rows)))
            .collect();
        for (index, molecule) in molecules.iter().enumerate() {
            if context.is_canceled() {
                return Err(NodeError::Canceled { rows: index });
            }
            let _row = info_span!("row", index).entered();
            let record = self.calculator.compute_row(molecule.as_deref())?;
            for (name, value) in record {
                if let Some(cells) = outputs.get_mut(name) {
                    cells.push(Cell::from(value));
                }
            }
            context.set_progress((index + 1) as f64 / rows as f64);
        }

        let mut output = input.clone();
        for (name, cells) in outputs {
            let kind = descriptors[name];
            output = output.with_column(Column::new(name, DataType::from(kind), cells))?;
        }
        Ok(output)
    }
}
