//! Fixed-width record layout of the COTAHIST historical series.
//!
//! Every data line of a COTAHIST file is a 245-byte record. The layout below
//! is the contract between the decoder and the converted Parquet files:
//!
//! - Columns are declared in file order; byte ranges are half-open and
//!   contiguous, starting at 0 and ending at [`RECORD_WIDTH`]
//! - Each column carries the [`Transform`] that turns its raw slice into a
//!   typed value, so layout and conversion rules are versioned together
//! - Prices, strikes, points and volume use two implied decimals
//!   ([`Transform::Cents`])

use chrono::{Datelike, NaiveDate};
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};

/// Length in bytes of one data record.
pub const RECORD_WIDTH: usize = 245;

/// Date values that mean "no date" rather than a calendar day.
pub const NOT_SET_DATE: &str = "00000000";
pub const OPEN_ENDED_DATE: &str = "99991231";

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Semantic type of a column in the converted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Int,
    Float,
    Str,
    Date,
}

impl SemanticType {
    /// Polars dtype the decoder produces for this type.
    pub fn dtype(self) -> DataType {
        match self {
            SemanticType::Int => DataType::Int64,
            SemanticType::Float => DataType::Float64,
            SemanticType::Str => DataType::String,
            SemanticType::Date => DataType::Date,
        }
    }

    /// Inverse of [`SemanticType::dtype`].
    pub fn from_dtype(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Int64 => Some(SemanticType::Int),
            DataType::Float64 => Some(SemanticType::Float),
            DataType::String => Some(SemanticType::Str),
            DataType::Date => Some(SemanticType::Date),
            _ => None,
        }
    }
}

/// Conversion applied to a raw column slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Strip surrounding whitespace.
    Trim,
    /// Integer; `.` is a thousands separator.
    Integer,
    /// Decimal with `,` as decimal and `.` as thousands separator.
    Decimal,
    /// Same as [`Transform::Decimal`], then divided by 100.
    Cents,
    /// `YYYYMMDD`; [`NOT_SET_DATE`] and [`OPEN_ENDED_DATE`] become null.
    Date,
}

impl Transform {
    /// The semantic type this transform produces.
    pub const fn output(self) -> SemanticType {
        match self {
            Transform::Trim => SemanticType::Str,
            Transform::Integer => SemanticType::Int,
            Transform::Decimal | Transform::Cents => SemanticType::Float,
            Transform::Date => SemanticType::Date,
        }
    }
}

/// One column of the fixed-width layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub semantic_type: SemanticType,
    /// Inclusive start byte.
    pub start: usize,
    /// Exclusive end byte.
    pub end: usize,
    pub transform: Transform,
}

impl ColumnDescriptor {
    const fn new(
        name: &'static str,
        description: &'static str,
        start: usize,
        end: usize,
        transform: Transform,
    ) -> Self {
        Self {
            name,
            description,
            semantic_type: transform.output(),
            start,
            end,
            transform,
        }
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }

    /// The raw bytes of this column within a record, or `None` if the
    /// record is too short.
    pub fn slice<'a>(&self, record: &'a [u8]) -> Option<&'a [u8]> {
        record.get(self.start..self.end)
    }
}

use Transform::{Cents, Date, Integer, Trim};

/// The 26 columns of a COTAHIST data record, in file order.
pub const COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("tipo_registro", "Record type", 0, 2, Integer),
    ColumnDescriptor::new("data_pregao", "Trading session date", 2, 10, Date),
    ColumnDescriptor::new("codbdi", "BDI code", 10, 12, Integer),
    ColumnDescriptor::new("sigla_acao", "Ticker", 12, 24, Trim),
    ColumnDescriptor::new("tipo_mercado", "Market type", 24, 27, Trim),
    ColumnDescriptor::new("nome_resumido", "Issuer short name", 27, 39, Trim),
    ColumnDescriptor::new("especificacao_papel", "Security specification", 39, 49, Trim),
    ColumnDescriptor::new("prazo_termo", "Forward market term in days", 49, 52, Integer),
    ColumnDescriptor::new("moeda", "Reference currency", 52, 56, Trim),
    ColumnDescriptor::new("preco_abertura", "Opening price", 56, 69, Cents),
    ColumnDescriptor::new("preco_maximo", "Highest price", 69, 82, Cents),
    ColumnDescriptor::new("preco_minimo", "Lowest price", 82, 95, Cents),
    ColumnDescriptor::new("preco_medio", "Average price", 95, 108, Cents),
    ColumnDescriptor::new("preco_ultimo", "Last trade price", 108, 121, Cents),
    ColumnDescriptor::new("preco_melhor_oferta_compra", "Best bid price", 121, 134, Cents),
    ColumnDescriptor::new("preco_melhor_oferta_venda", "Best ask price", 134, 147, Cents),
    ColumnDescriptor::new("numero_negocios", "Number of trades", 147, 152, Integer),
    ColumnDescriptor::new("quantidade_titulos_negociados", "Quantity traded", 152, 170, Integer),
    ColumnDescriptor::new("volume_titulos_negociados", "Volume traded", 170, 188, Cents),
    ColumnDescriptor::new("preco_exercicio", "Strike price or forward contract value", 188, 201, Cents),
    ColumnDescriptor::new("indicador_correcao_preco", "Strike price correction indicator", 201, 202, Trim),
    ColumnDescriptor::new("data_vencimento", "Expiration date", 202, 210, Date),
    ColumnDescriptor::new("fator_cotacao", "Quotation factor", 210, 217, Integer),
    ColumnDescriptor::new("preco_pontos", "Strike price in points", 217, 230, Cents),
    ColumnDescriptor::new("codigo_isin", "ISIN or internal security code", 230, 242, Trim),
    ColumnDescriptor::new("numero_distribuicao", "Distribution number", 242, 245, Integer),
];

/// The record layout.
pub fn columns() -> &'static [ColumnDescriptor] {
    COLUMNS
}

/// Look up a column by name.
pub fn column(name: &str) -> Option<&'static ColumnDescriptor> {
    COLUMNS.iter().find(|c| c.name == name)
}

// ── Value parsing ───────────────────────────────────────────────────

/// Parse an integer slice. Blank slices are null.
pub fn parse_integer(raw: &str) -> Result<Option<i64>, String> {
    let digits = normalize_number(raw);
    if digits.is_empty() {
        return Ok(None);
    }
    digits
        .parse::<i64>()
        .map(Some)
        .map_err(|e| format!("not an integer: {e}"))
}

/// Parse a decimal slice using the `,` decimal / `.` thousands convention.
/// Blank slices are null.
pub fn parse_decimal(raw: &str) -> Result<Option<f64>, String> {
    let number = normalize_number(raw);
    if number.is_empty() {
        return Ok(None);
    }
    // `f64::from_str` also takes `inf`, `NaN` and exponents.
    let unsigned = number
        .strip_prefix(|c: char| c == '-' || c == '+')
        .unwrap_or(&number);
    if !unsigned.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err("not a decimal: unexpected characters".into());
    }
    number
        .parse::<f64>()
        .map(Some)
        .map_err(|e| format!("not a decimal: {e}"))
}

/// Parse a `YYYYMMDD` slice, mapping the two sentinel values to `None`.
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    let raw = raw.trim();
    if raw == NOT_SET_DATE || raw == OPEN_ENDED_DATE {
        return Ok(None);
    }
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err("expected YYYYMMDD".into());
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(Some)
        .map_err(|e| format!("invalid date: {e}"))
}

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn normalize_number(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|&c| c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

// ── Table validation ────────────────────────────────────────────────

/// Result of validating a table's columns against the layout.
#[derive(Debug, Clone)]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Validate (column name, type) pairs against the layout: every column must
/// be present, in order, with the expected type, and nothing else.
pub fn validate_schema(columns: &[(&str, SemanticType)]) -> SchemaValidation {
    let mut errors = Vec::new();

    for (i, expected) in COLUMNS.iter().enumerate() {
        match columns.iter().position(|(name, _)| *name == expected.name) {
            Some(pos) => {
                let (_, actual) = columns[pos];
                if actual != expected.semantic_type {
                    errors.push(format!(
                        "column '{}': expected {:?}, got {:?}",
                        expected.name, expected.semantic_type, actual
                    ));
                }
                if pos != i {
                    errors.push(format!(
                        "column '{}': expected at position {i}, found at {pos}",
                        expected.name
                    ));
                }
            }
            None => errors.push(format!("missing required column '{}'", expected.name)),
        }
    }

    for (name, _) in columns {
        if column(name).is_none() {
            errors.push(format!("unexpected column '{name}' (not in schema)"));
        }
    }

    SchemaValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
