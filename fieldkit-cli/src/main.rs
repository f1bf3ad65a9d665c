use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use fieldkit::validators::{
    DateMode, StatusResolver, format_display, is_valid_slug, is_valid_url, minify,
    normalize_url, slugify_with_limit,
};
use fieldkit::{
    DocumentFormat, FieldKind, FieldOptions, FieldValue, FormOutcome, FormState, Theme,
    UploadCandidate, parse_document_str, parse_field_configs, render_document, validate_form,
};

#[derive(Debug, Parser)]
#[command(
    name = "fieldkit",
    version,
    about = "Normalize and validate admin form field values"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a slug from text, or check an existing slug with --check
    Slug {
        text: String,
        #[arg(long = "max-length", value_name = "N")]
        max_length: Option<usize>,
        #[arg(long)]
        check: bool,
    },
    /// Normalize a URL and optionally require a scheme and host
    Url {
        text: String,
        /// Prepend https:// when no scheme is present
        #[arg(long)]
        normalize: bool,
        #[arg(long)]
        validate: bool,
    },
    /// Validate JSON and print it beautified (2-space indent) or minified
    Json {
        /// JSON text, file path, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,
        #[arg(long)]
        minify: bool,
    },
    /// Render a date for a date/datetime control or a picker pattern
    Date {
        value: String,
        #[arg(long)]
        datetime: bool,
        /// Picker pattern such as "DD/MM/YYYY HH:mm"
        #[arg(long, value_name = "PATTERN")]
        format: Option<String>,
    },
    /// Resolve a status value to its badge category
    Status(StatusArgs),
    /// Validate a values document against field definitions
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct StatusArgs {
    value: String,
    #[arg(long = "loading", value_delimiter = ',', action = ArgAction::Append)]
    loading_when: Vec<String>,
    #[arg(long = "failed", value_delimiter = ',', action = ArgAction::Append)]
    failed_when: Vec<String>,
    #[arg(long = "success", value_delimiter = ',', action = ArgAction::Append)]
    success_when: Vec<String>,
    #[arg(long)]
    dark: bool,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Field definitions: file path, inline payload, or "-" for stdin
    #[arg(short = 'c', long = "config", value_name = "SPEC")]
    config: String,
    /// Values to validate: file path, inline payload, or "-" for stdin
    #[arg(short = 'v', long = "values", value_name = "SPEC")]
    values: String,
    /// Output format for the collected values
    #[arg(long = "output-format", value_name = "FORMAT", default_value = "json")]
    output_format: String,
    /// Emit compact output rather than pretty formatting
    #[arg(long = "no-pretty")]
    no_pretty: bool,
}

#[derive(Debug)]
enum InputSource {
    File(PathBuf),
    Stdin,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Slug {
            text,
            max_length,
            check,
        } => run_slug(&text, max_length, check),
        Command::Url {
            text,
            normalize,
            validate,
        } => run_url(&text, normalize, validate),
        Command::Json { input, minify } => run_json(&input, minify),
        Command::Date {
            value,
            datetime,
            format,
        } => run_date(&value, datetime, format.as_deref()),
        Command::Status(args) => run_status(args),
        Command::Check(args) => run_check(args),
    }
}

fn run_slug(text: &str, max_length: Option<usize>, check: bool) -> Result<()> {
    if check {
        if !is_valid_slug(text, max_length) {
            return Err(eyre!("'{text}' is not a valid slug"));
        }
        println!("{text}");
        return Ok(());
    }
    let slug = slugify_with_limit(text, max_length);
    if slug.is_empty() {
        return Err(eyre!("'{text}' contains no slug characters"));
    }
    println!("{slug}");
    Ok(())
}

fn run_url(text: &str, normalize: bool, validate: bool) -> Result<()> {
    let normalized = normalize_url(text, normalize);
    if validate && !is_valid_url(&normalized) {
        return Err(eyre!("'{normalized}' is not a valid URL"));
    }
    println!("{normalized}");
    Ok(())
}

fn run_json(input: &str, compact: bool) -> Result<()> {
    let contents = load_text(input, "json")?;
    let rendered = if compact {
        minify(&contents).wrap_err("invalid JSON")?
    } else {
        fieldkit::validators::beautify(&contents).wrap_err("invalid JSON")?
    };
    println!("{rendered}");
    Ok(())
}

fn run_date(value: &str, datetime: bool, format: Option<&str>) -> Result<()> {
    let mode = if datetime {
        DateMode::DateTime
    } else {
        DateMode::Date
    };
    let display = format_display(value, mode, format);
    if !display.is_valid() {
        return Err(eyre!("'{value}' is not a valid date"));
    }
    println!("{}", display.as_str());
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<()> {
    let to_values = |items: Vec<String>| items.into_iter().map(Value::String).collect::<Vec<_>>();
    let theme = if args.dark { Theme::Dark } else { Theme::Light };
    let resolver = StatusResolver::new(
        to_values(args.loading_when),
        to_values(args.failed_when),
        to_values(args.success_when),
    )
    .with_theme(theme);
    let display = resolver.display(&Value::String(args.value));
    println!("{}", serde_json::to_string_pretty(&display)?);
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<()> {
    if args.config == "-" && args.values == "-" {
        return Err(eyre!(
            "cannot read config and values from stdin simultaneously; provide inline content or files"
        ));
    }
    let output_format = DocumentFormat::from_str(&args.output_format)
        .map_err(|err| eyre!("{err}"))?;
    let config_doc = load_value(&args.config, "config")?;
    let values_doc = load_value(&args.values, "values")?;
    let configs = parse_field_configs(&config_doc).map_err(|err| eyre!("{err:#}"))?;

    let mut form = FormState::new(configs, &FieldOptions::default());
    let attributes = form
        .fields()
        .map(|field| (field.attribute().to_string(), field.kind()))
        .collect::<Vec<_>>();
    for (attribute, kind) in attributes {
        let pointer = format!("/{}", attribute.replace('.', "/"));
        let Some(raw) = values_doc.pointer(&pointer) else {
            continue;
        };
        debug!(%attribute, "checking value");
        form.input(&attribute, field_value_for(kind, raw));
    }

    match validate_form(&mut form) {
        FormOutcome::Valid(values) => {
            let rendered = render_document(&values, output_format, !args.no_pretty)
                .map_err(|err| eyre!("{err:#}"))?;
            println!("{rendered}");
            Ok(())
        }
        FormOutcome::Invalid { issues, .. } => {
            for field in form.fields() {
                if let Some(error) = field.error() {
                    eprintln!("{}: {}", field.config().display_label(), error.message());
                }
            }
            Err(eyre!("{issues} field(s) failed validation"))
        }
    }
}

/// Upload fields take file descriptors (`{name, type, size}`); everything else
/// is handed over as-is.
fn field_value_for(kind: FieldKind, raw: &Value) -> FieldValue {
    if kind.is_upload() {
        let items = match raw {
            Value::Array(items) => items.clone(),
            Value::Object(_) => vec![raw.clone()],
            _ => return FieldValue::from_json(raw),
        };
        let files = items
            .into_iter()
            .map(serde_json::from_value::<UploadCandidate>)
            .collect::<Result<Vec<_>, _>>();
        if let Ok(files) = files {
            return FieldValue::Files(files);
        }
    }
    FieldValue::from_json(raw)
}

fn load_text(spec: &str, label: &str) -> Result<String> {
    if spec == "-" {
        return read_from_source(&InputSource::Stdin);
    }
    if looks_inline(spec) {
        return Ok(spec.to_string());
    }
    let path = PathBuf::from(spec);
    match read_from_source(&InputSource::File(path.clone())) {
        Ok(contents) => Ok(contents),
        Err(err) if is_not_found(&err) => Ok(spec.to_string()),
        Err(err) => Err(err.wrap_err(format!("failed to load {label} from {}", path.display()))),
    }
}

fn load_value(spec: &str, label: &str) -> Result<Value> {
    let format = if spec == "-" || looks_inline(spec) {
        DocumentFormat::Json
    } else {
        DocumentFormat::from_path(Path::new(spec))
    };
    let contents = load_text(spec, label)?;
    parse_contents(&contents, format, label)
}

fn looks_inline(spec: &str) -> bool {
    let trimmed = spec.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

fn read_from_source(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .wrap_err("failed to read from stdin")?;
            Ok(buffer)
        }
        InputSource::File(path) => fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read file {}", path.display())),
    }
}

fn is_not_found(err: &Report) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|io_err| io_err.kind() == io::ErrorKind::NotFound)
}

fn parse_contents(contents: &str, format: DocumentFormat, label: &str) -> Result<Value> {
    match parse_document_str(contents, format) {
        Ok(value) => Ok(value),
        Err(primary) => {
            for candidate in DocumentFormat::available_formats() {
                if candidate == format {
                    continue;
                }
                if let Ok(value) = parse_document_str(contents, candidate) {
                    return Ok(value);
                }
            }
            Err(Report::msg(format!(
                "failed to parse {label}: tried {} (first error: {primary})",
                format_list()
            )))
        }
    }
}

fn format_list() -> String {
    DocumentFormat::available_formats()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upload_values_become_candidates() {
        let raw = json!([{"name": "a.png", "type": "image/png", "size": 12}]);
        match field_value_for(FieldKind::Image, &raw) {
            FieldValue::Files(files) => {
                assert_eq!(files[0].name, "a.png");
                assert_eq!(files[0].size, 12);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn media_references_stay_json() {
        let raw = json!({"id": 4});
        assert_eq!(
            field_value_for(FieldKind::File, &raw),
            FieldValue::Json(raw.clone())
        );
    }

    #[test]
    fn long_inline_payloads_skip_the_filesystem() {
        let fields = (0..40)
            .map(|index| format!(r#"{{"name":"field{index}","type":"text"}}"#))
            .collect::<Vec<_>>()
            .join(",");
        let spec = format!("[{fields}]");
        assert!(spec.len() > 255);
        let value = load_value(&spec, "config").expect("inline config parses");
        assert_eq!(value.as_array().map(Vec::len), Some(40));
    }

    #[test]
    fn inline_payloads_are_detected() {
        assert!(looks_inline("  [{\"name\": \"a\"}]"));
        assert!(!looks_inline("fields.json"));
    }
}
