use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use reckon_analysis::{
    AnalysisConfig, Categorizer, MappingCategorizer, ReceiptPipeline, RuleCategorizer,
};
use reckon_extract::ExtractionOutput;

use crate::cli::InputFormat;

// ── Input ─────────────────────────────────────────────────────────────────────

/// Read a file, or stdin when `path` is `-`.
async fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Wrap raw input as the extraction output the pipeline expects.
fn to_extraction_output(content: &str, format: InputFormat) -> Result<ExtractionOutput> {
    let output = match format {
        InputFormat::Auto => ExtractionOutput::detect(content),
        InputFormat::Structured => {
            let value: serde_json::Value =
                serde_json::from_str(content).context("Input is not valid JSON")?;
            ExtractionOutput::Structured(value)
        }
        InputFormat::Text => ExtractionOutput::RawText(content.to_string()),
    };
    debug!(kind = output.kind(), "classified input");
    Ok(output)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

// ── Config & categorizer ──────────────────────────────────────────────────────

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "reckon", "Reckon")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// An explicit path must exist; the default path is optional.
async fn resolve_config(explicit: Option<&Path>) -> Result<AnalysisConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if tokio::fs::try_exists(&p).await.unwrap_or(false) => p,
            _ => return Ok(AnalysisConfig::default()),
        },
    };
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = AnalysisConfig::from_toml(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

async fn build_categorizer(
    categories: Option<&Path>,
    rules: Option<&Path>,
) -> Result<Box<dyn Categorizer>> {
    match (categories, rules) {
        (Some(_), Some(_)) => bail!("--categories and --rules cannot be combined"),
        (Some(path), None) => {
            let json = read_input(path).await?;
            let mapping = MappingCategorizer::from_json(&json)
                .with_context(|| format!("Invalid category map {}", path.display()))?;
            Ok(Box::new(mapping))
        }
        (None, Some(path)) => {
            let toml = read_input(path).await?;
            let engine = RuleCategorizer::from_toml(&toml)
                .with_context(|| format!("Invalid rules file {}", path.display()))?;
            info!(rules = engine.len(), "loaded categorization rules");
            Ok(Box::new(engine))
        }
        (None, None) => Ok(Box::new(MappingCategorizer::default())),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_parse(input: &Path, format: InputFormat, pretty: bool) -> Result<()> {
    let content = read_input(input).await?;
    let receipt = to_extraction_output(&content, format)?.parse();
    println!("{}", to_json(&receipt, pretty)?);
    Ok(())
}

pub async fn cmd_analyze(
    input: &Path,
    format: InputFormat,
    categories: Option<&Path>,
    rules: Option<&Path>,
    config: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let config = resolve_config(config).await?;
    let categorizer = build_categorizer(categories, rules).await?;
    let content = read_input(input).await?;
    let output = to_extraction_output(&content, format)?;

    let pipeline = ReceiptPipeline::new(categorizer, config);
    let outcome = pipeline.process(&output);
    println!("{}", to_json(&outcome, pretty)?);
    Ok(())
}

pub async fn cmd_config_show(config: Option<&Path>) -> Result<()> {
    let config = resolve_config(config).await?;
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn cmd_config_path() -> Result<()> {
    match default_config_path() {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => bail!("Could not determine a config directory for this platform"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn auto_format_detects_json_records() {
        let out = to_extraction_output(r#"{"items": []}"#, InputFormat::Auto).unwrap();
        assert_eq!(out.kind(), "structured");
        let out = to_extraction_output("MILK 3.49", InputFormat::Auto).unwrap();
        assert_eq!(out.kind(), "raw_text");
    }

    #[test]
    fn forced_formats() {
        let out = to_extraction_output(r#"{"items": []}"#, InputFormat::Text).unwrap();
        assert_eq!(out.kind(), "raw_text");
        assert!(to_extraction_output("not json", InputFormat::Structured).is_err());
    }

    #[test]
    fn pretty_json_spans_lines() {
        let v = serde_json::json!({"a": 1});
        assert!(!to_json(&v, false).unwrap().contains('\n'));
        assert!(to_json(&v, true).unwrap().contains('\n'));
    }

    #[tokio::test]
    async fn explicit_config_is_loaded() {
        let file = write_temp("overspend_threshold_pct = 45.0\n");
        let config = resolve_config(Some(file.path())).await.unwrap();
        assert_eq!(config.overspend_threshold_pct, 45.0);
    }

    #[tokio::test]
    async fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_config(Some(&dir.path().join("absent.toml"))).await.is_err());
    }

    #[tokio::test]
    async fn invalid_config_is_an_error() {
        let file = write_temp("anomaly_multiplier = -3.0\n");
        assert!(resolve_config(Some(file.path())).await.is_err());
    }

    #[tokio::test]
    async fn categorizer_from_mapping_file() {
        let file = write_temp(r#"{"Bananas": "Fresh Produce"}"#);
        let c = build_categorizer(Some(file.path()), None).await.unwrap();
        assert_eq!(c.categorize_one("Bananas").unwrap(), "Fresh Produce");
    }

    #[tokio::test]
    async fn categorizer_from_rules_file() {
        let file = write_temp("[[rules]]\nname = \"milk\"\npattern = \"milk\"\ncategory = \"Dairy\"\n");
        let c = build_categorizer(None, Some(file.path())).await.unwrap();
        assert_eq!(c.categorize_one("2% Milk").unwrap(), "Dairy");
    }

    #[tokio::test]
    async fn categorizer_sources_are_exclusive() {
        let a = write_temp("{}");
        let b = write_temp("");
        assert!(build_categorizer(Some(a.path()), Some(b.path())).await.is_err());
    }

    #[tokio::test]
    async fn analyze_pipeline_with_boxed_categorizer() {
        let categorizer = build_categorizer(None, None).await.unwrap();
        let pipeline = ReceiptPipeline::new(categorizer, AnalysisConfig::default());
        let output = to_extraction_output("BREAD 2.50\nMILK 3.49\n", InputFormat::Auto).unwrap();
        let outcome = pipeline.process(&output);
        assert_eq!(outcome.receipt.items().len(), 2);
        assert!(outcome
            .receipt
            .items()
            .iter()
            .all(|i| i.category() == "General Items"));
    }
}
