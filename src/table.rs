//! A small column-oriented table: the input and output of the descriptor node.

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{Read, Write};
use std::sync::Arc;

use csv::{ReaderBuilder, Writer};
use tracing::*;

use crate::{DescriptorValue, Molecule, TableError, ValueKind};

/// Logical type of a column. `Logical` carries a host type identifier such as
/// `smiles` or `sdf`; its cells are text or molecule objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Int64,
    Double,
    String,
    Logical(String),
}

impl DataType {
    pub fn logical(id: impl Into<String>) -> Self {
        DataType::Logical(id.into())
    }

    /// Type identifier as the column classifier sees it.
    pub fn id(&self) -> &str {
        match self {
            DataType::Int64 => "int64",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Logical(id) => id,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.id())
    }
}

impl From<ValueKind> for DataType {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Integer => DataType::Int64,
            ValueKind::Real => DataType::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column specifications of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn find(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|spec| spec.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|spec| spec.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Replace the column with the same name in place, or append.
    pub fn upsert(&mut self, spec: ColumnSpec) {
        match self.columns.iter_mut().find(|c| c.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.columns.push(spec),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Cell {
    Missing,
    Int(i64),
    Real(f64),
    Text(String),
    Molecule(Arc<Molecule>),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Cell::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_molecule(&self) -> Option<&Arc<Molecule>> {
        match self {
            Cell::Molecule(molecule) => Some(molecule),
            _ => None,
        }
    }
}

impl From<Option<DescriptorValue>> for Cell {
    fn from(value: Option<DescriptorValue>) -> Self {
        match value {
            Some(DescriptorValue::Int(n)) => Cell::Int(n),
            Some(DescriptorValue::Real(x)) => Cell::Real(x),
            None => Cell::Missing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    spec: ColumnSpec,
    cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, cells: Vec<Cell>) -> Self {
        Self {
            spec: ColumnSpec::new(name, data_type),
            cells,
        }
    }

    pub fn spec(&self) -> &ColumnSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.spec.data_type
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Equal-length named columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name()) {
                return Err(TableError::DuplicateColumn(column.name().to_string()));
            }
            if column.len() != rows {
                return Err(TableError::LengthMismatch {
                    name: column.name().to_string(),
                    expected: rows,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.columns.iter().map(|c| c.spec.clone()).collect())
    }

    /// Add `column`, replacing a same-named column in place.
    pub fn with_column(mut self, column: Column) -> Result<Self, TableError> {
        if !self.columns.is_empty() && column.len() != self.rows {
            return Err(TableError::LengthMismatch {
                name: column.name().to_string(),
                expected: self.rows,
                found: column.len(),
            });
        }
        self.rows = column.len();
        match self.columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(existing) => {
                debug!("Replacing existing column '{}'", column.name());
                *existing = column;
            }
            None => self.columns.push(column),
        }
        Ok(self)
    }

    /// Read a CSV with a header row. Columns default to [`DataType::String`];
    /// `types` overrides that per column name. Empty fields are missing.
    pub fn read_csv<R: Read>(reader: R, types: &HashMap<String, DataType>) -> Result<Self, TableError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let specs: Vec<ColumnSpec> = headers
            .iter()
            .map(|name| ColumnSpec::new(name, types.get(name).cloned().unwrap_or(DataType::String)))
            .collect();
        let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); specs.len()];

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            for (index, spec) in specs.iter().enumerate() {
                let field = record.get(index).unwrap_or("");
                cells[index].push(parse_cell(field, spec, row)?);
            }
        }

        let columns = specs
            .into_iter()
            .zip(cells)
            .map(|(spec, cells)| Column { spec, cells })
            .collect();
        Self::new(columns)
    }

    /// Write the table as CSV with a header row; missing cells become empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = Writer::from_writer(writer);
        wtr.write_record(self.columns.iter().map(Column::name))?;
        for row in 0..self.rows {
            let mut record = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                record.push(match &column.cells[row] {
                    Cell::Missing => String::new(),
                    Cell::Int(n) => n.to_string(),
                    Cell::Real(x) => x.to_string(),
                    Cell::Text(text) => text.clone(),
                    Cell::Molecule(_) => return Err(TableError::UnwritableCell(column.name().to_string())),
                });
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn parse_cell(field: &str, spec: &ColumnSpec, row: usize) -> Result<Cell, TableError> {
    if field.is_empty() {
        return Ok(Cell::Missing);
    }
    let invalid = |expected| TableError::InvalidCell {
        column: spec.name.clone(),
        row,
        value: field.to_string(),
        expected,
    };
    match spec.data_type {
        DataType::Int64 => field.trim().parse().map(Cell::Int).map_err(|_| invalid("an integer")),
        DataType::Double => field.trim().parse().map(Cell::Real).map_err(|_| invalid("a number")),
        DataType::String | DataType::Logical(_) => Ok(Cell::Text(field.to_string())),
    }
}
