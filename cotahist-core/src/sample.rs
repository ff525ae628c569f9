//! Sample COTAHIST content for tests and local experiments.
//!
//! Builds well-formed fixed-width records from a handful of field overrides;
//! unspecified numeric fields are zero-filled, dates use the "not set"
//! sentinel and text fields are blank.

use crate::schema::{self, SemanticType, NOT_SET_DATE, RECORD_WIDTH};
use std::io::{Cursor, Write};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;

/// One 245-byte data record. Text overrides are left-aligned, numeric ones
/// right-aligned and zero-padded to the column width.
pub fn record_line(overrides: &[(&str, &str)]) -> String {
    let mut line = String::with_capacity(RECORD_WIDTH);
    for col in schema::columns() {
        let width = col.width();
        let value = overrides
            .iter()
            .find(|(name, _)| *name == col.name)
            .map(|(_, value)| *value);
        let cell = match (value, col.semantic_type) {
            (Some(v), SemanticType::Str) => format!("{v:<width$}"),
            (Some(v), _) => format!("{v:0>width$}"),
            (None, SemanticType::Str) => " ".repeat(width),
            (None, SemanticType::Date) => NOT_SET_DATE.to_string(),
            (None, _) => "0".repeat(width),
        };
        line.push_str(&cell);
    }
    line
}

/// Full file text: header, the given records, trailer, each newline-terminated.
pub fn sample_text(records: &[String]) -> String {
    let header = format!("{:<RECORD_WIDTH$}", "00COTAHIST.2023BOVESPA 20230102");
    let trailer = format!(
        "{:<RECORD_WIDTH$}",
        format!("99COTAHIST.2023BOVESPA 20230102{:011}", records.len() + 2)
    );
    let mut text = String::new();
    for line in std::iter::once(&header).chain(records).chain(std::iter::once(&trailer)) {
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// A zip archive holding one `COTAHIST.TXT` with the given records.
pub fn sample_archive(records: &[String]) -> ZipResult<Vec<u8>> {
    archive_with_entries(&[("COTAHIST.TXT", sample_text(records).as_bytes())])
}

/// A zip archive with arbitrary entries.
pub fn archive_with_entries(entries: &[(&str, &[u8])]) -> ZipResult<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(content)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// The three records of the reference sample: GEPA3, GEPA4, GFSA3.
pub fn reference_records() -> Vec<String> {
    [
        ("GEPA3", "GER PARANAP", "ON", "0000000002960"),
        ("GEPA4", "GER PARANAP", "PN", "0000000003040"),
        ("GFSA3", "GAFISA", "ON NM", "0000000000801"),
    ]
    .into_iter()
    .map(|(ticker, name, spec, price)| {
        record_line(&[
            ("tipo_registro", "01"),
            ("data_pregao", "20230102"),
            ("codbdi", "02"),
            ("sigla_acao", ticker),
            ("tipo_mercado", "010"),
            ("nome_resumido", name),
            ("especificacao_papel", spec),
            ("moeda", "R$"),
            ("preco_abertura", price),
            ("preco_maximo", price),
            ("preco_minimo", price),
            ("preco_medio", price),
            ("preco_ultimo", price),
            ("numero_negocios", "00012"),
            ("quantidade_titulos_negociados", "000000000000001500"),
            ("volume_titulos_negociados", "000000000004440000"),
            ("data_vencimento", "99991231"),
            ("fator_cotacao", "0000001"),
            ("codigo_isin", "BRGEPAACNOR1"),
            ("numero_distribuicao", "120"),
        ])
    })
    .collect()
}
