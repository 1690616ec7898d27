//! Term-bank and term-meta-bank files written from the store and side inputs.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use dde_yomitan::conjugation::{ConjugationSource, conjugation_rows};
use dde_yomitan::frequency::build_frequency_bank;
use dde_yomitan::{CompileOptions, compile};
use serde::Serialize;
use tracing::info;

use crate::store::read_records;

/// Compile every stored record into a term bank. Returns the row count.
pub fn write_term_bank(store: &Path, output: &Path, options: &CompileOptions) -> Result<usize> {
    let records = read_records(store)?;
    info!("loaded {} records from {}", records.len(), store.display());
    let rows = compile(&records, options);
    write_json(output, &rows)?;
    Ok(rows.len())
}

/// Rank a tab-separated lemma listing into a frequency bank.
pub fn write_frequency_bank(input: &Path, output: &Path) -> Result<usize> {
    let text = fs::read_to_string(input).with_context(|| format!("read {}", input.display()))?;
    let bank = build_frequency_bank(text.lines());
    write_json(output, &bank)?;
    Ok(bank.len())
}

/// Render a JSON array of `{word, table}` into verb rows.
pub fn write_conjugation_bank(input: &Path, output: &Path) -> Result<usize> {
    let text = fs::read_to_string(input).with_context(|| format!("read {}", input.display()))?;
    let sources: Vec<ConjugationSource> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of {{word, table}}", input.display()))?;
    let rows = conjugation_rows(&sources);
    write_json(output, &rows)?;
    Ok(rows.len())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn frequency_and_conjugation_files() {
        let dir = tempdir().unwrap();
        let listing = dir.path().join("lemas.txt");
        fs::write(&listing, "de\t1\n.\t2\nla\t3\n").unwrap();
        let freq = dir.path().join("out/term_meta_bank_0.json");
        assert_eq!(write_frequency_bank(&listing, &freq).unwrap(), 2);
        let bank: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&freq).unwrap()).unwrap();
        assert_eq!(bank[1][0], "la");
        assert_eq!(bank[1][2]["value"], 2);

        let tables = dir.path().join("tables.json");
        fs::write(
            &tables,
            r#"[{"word": "cantar",
                 "table": "<table><tbody><tr><td>canto</td></tr></tbody></table>"}]"#,
        )
        .unwrap();
        let conj = dir.path().join("term_bank_1.json");
        assert_eq!(write_conjugation_bank(&tables, &conj).unwrap(), 1);
        let bank: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&conj).unwrap()).unwrap();
        assert_eq!(bank[0][3], "v");
        assert_eq!(bank[0][5][0]["content"][0]["content"][0]["content"][0]["content"], "canto");
    }

    #[test]
    fn term_bank_is_complete_json_on_return() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("store.jsonl");
        let line = r#"{"url":"u/sol","word":"sol","type":"general","timestamp":"t",
            "data":{"lookup_key":"sol","headword":"sol",
                "definitions":[{"text":"Estrella."},{"text":"Luz."}]}}"#;
        fs::write(&store, format!("{}\n", line.replace('\n', ""))).unwrap();
        let output = dir.path().join("term_bank_1.json");
        let rows = write_term_bank(&store, &output, &CompileOptions::default()).unwrap();
        assert_eq!(rows, 2);
        let bank: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank[1][0], "sol");
    }

    #[test]
    fn conjugation_input_must_be_an_array() {
        let dir = tempdir().unwrap();
        let tables = dir.path().join("tables.json");
        fs::write(&tables, r#"{"word": "cantar"}"#).unwrap();
        let err = write_conjugation_bank(&tables, &dir.path().join("out.json")).unwrap_err();
        assert!(format!("{err:#}").contains("not a JSON array"));
    }
}
