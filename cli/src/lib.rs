//! gfdl CLI (made by FontLab https://www.fontlab.com/)

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::{debug, info};
use regex::Regex;

use gfdl_core::catalog::CatalogClient;
use gfdl_core::css::{write_stylesheet, CssOptions};
use gfdl_core::download::{DownloadReport, FontDownloader};
use gfdl_core::errlog::{ErrorLog, ErrorRecord, Failure, FailureSink, LogSink, LOG_PATH_ENV};
use gfdl_core::output::{write_json_pretty, write_ndjson};
use gfdl_core::settings::{self, API_KEY_ENV, SETTINGS_FILE};
use gfdl_core::variant::{family_slug, font_file_name, FontFormat};
use gfdl_core::FontRecord;

/// Overrides the catalog endpoint (mirrors, local test servers).
pub const ENDPOINT_ENV: &str = "GFDL_API_ENDPOINT";

/// CLI entrypoint for gfdl.
#[derive(Debug, Parser)]
#[command(
    name = "gfdl",
    version,
    about = "Google Fonts downloader and @font-face generator (made by FontLab https://www.fontlab.com/)"
)]
pub struct Cli {
    /// Log progress to stderr (RUST_LOG still wins when set)
    #[arg(long = "verbose", global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List families in the Google Fonts catalog
    List(ListArgs),
    /// Show variants, subsets and files of one family
    Show(ShowArgs),
    /// Download font files and write the matching stylesheet
    Download(DownloadArgs),
    /// Write the stylesheet only
    Css(SelectionArgs),
    /// Inspect or clear the error log
    Log(LogArgs),
}

#[derive(Debug, Args)]
struct KeyArgs {
    /// Google Fonts API key (else GOOGLE_FONTS_API_KEY or appsettings.json)
    #[arg(long = "api-key", value_hint = ValueHint::Other)]
    api_key: Option<String>,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    key: KeyArgs,

    /// Ask the catalog for WOFF2 file links
    #[arg(long = "woff2", action = ArgAction::SetTrue)]
    woff2: bool,

    /// Regex patterns; a family is listed when any of them matches its name
    #[arg(short = 'n', long = "name", value_hint = ValueHint::Other)]
    name_patterns: Vec<String>,

    /// Only list this category (serif, sans-serif, monospace, ...)
    #[arg(short = 'c', long = "category", value_hint = ValueHint::Other)]
    category: Option<String>,

    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,

    /// Format output as padded columns
    #[arg(long = "columns", action = ArgAction::SetTrue)]
    columns: bool,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Family name as listed in the catalog (case-insensitive)
    family: String,

    #[command(flatten)]
    key: KeyArgs,

    /// Show WOFF2 file links instead of TTF
    #[arg(long = "format", default_value_t = FormatChoice::Ttf, value_enum)]
    format: FormatChoice,

    /// Emit the catalog record as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct SelectionArgs {
    /// Family name as listed in the catalog (case-insensitive)
    family: String,

    #[command(flatten)]
    key: KeyArgs,

    /// Variants to keep (e.g. regular,700italic); all when omitted
    #[arg(short = 'V', long = "variants", value_delimiter = ',', value_hint = ValueHint::Other)]
    variants: Vec<String>,

    /// Subsets to annotate in the stylesheet (e.g. latin,cyrillic)
    #[arg(short = 's', long = "subsets", value_delimiter = ',', value_hint = ValueHint::Other)]
    subsets: Vec<String>,

    /// File format to fetch and reference
    #[arg(long = "format", default_value_t = FormatChoice::Ttf, value_enum)]
    format: FormatChoice,

    /// Minify the stylesheet (written as <Family>.min.css); subset comments
    /// would be stripped, so this excludes --subsets
    #[arg(long = "minify", action = ArgAction::SetTrue, conflicts_with = "subsets")]
    minify: bool,

    /// Destination folder; a <FamilyNoSpaces> folder is created inside it
    #[arg(short = 'o', long = "output", value_hint = ValueHint::DirPath)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DownloadArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Skip writing the stylesheet
    #[arg(long = "no-css", action = ArgAction::SetTrue)]
    no_css: bool,
}

#[derive(Debug, Args)]
struct LogArgs {
    /// Number of entries to show, newest first
    #[arg(long = "count", default_value_t = 20)]
    count: usize,

    /// Empty the log instead of printing it
    #[arg(long = "clear", action = ArgAction::SetTrue, conflicts_with = "json")]
    clear: bool,

    /// Emit entries as a JSON array
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum FormatChoice {
    Ttf,
    Woff2,
}

impl From<FormatChoice> for FontFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Ttf => FontFormat::Ttf,
            FormatChoice::Woff2 => FontFormat::Woff2,
        }
    }
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Log(args) = &cli.command {
        return run_log(args);
    }

    let sink = failure_sink();
    let runtime = tokio::runtime::Runtime::new().context("starting the async runtime")?;
    let result = runtime.block_on(execute(cli.command, sink.as_ref()));
    if let Err(err) = &result {
        sink.record_failure(Failure::of_type("Command failed", failure_type(err), &**err));
    }
    result
}

/// The library error type when one sits underneath the context chain.
fn failure_type(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<gfdl_core::Error>() {
        Some(_) => std::any::type_name::<gfdl_core::Error>(),
        None => std::any::type_name::<anyhow::Error>(),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// The on-disk error log, or plain logging when no location is known.
fn failure_sink() -> Box<dyn FailureSink> {
    match ErrorLog::default_path() {
        Some(path) => {
            debug!("error log at {}", path.display());
            Box::new(ErrorLog::new(path))
        }
        None => Box::new(LogSink),
    }
}

async fn execute(command: Command, sink: &dyn FailureSink) -> Result<()> {
    match command {
        Command::List(args) => run_list(args).await,
        Command::Show(args) => run_show(args).await,
        Command::Download(args) => run_download(args, sink).await,
        Command::Css(args) => run_css(args).await,
        Command::Log(args) => run_log(&args),
    }
}

async fn run_list(args: ListArgs) -> Result<()> {
    let patterns = compile_patterns(&args.name_patterns)?;
    let fonts = fetch_catalog(&args.key, args.woff2).await?;
    let fonts = filter_fonts(fonts, &patterns, args.category.as_deref());

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let use_color = match args.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => handle.is_terminal(),
    };

    if args.ndjson {
        write_ndjson(&fonts, &mut handle)?;
    } else if args.json {
        write_json_pretty(&fonts, &mut handle)?;
    } else if args.columns {
        write_columns(&fonts, &mut handle, use_color)?;
    } else {
        write_plain(&fonts, &mut handle, use_color)?;
    }

    Ok(())
}

async fn run_show(args: ShowArgs) -> Result<()> {
    let format = FontFormat::from(args.format);
    let fonts = fetch_catalog(&args.key, format.is_compressed()).await?;
    let font = find_family(&fonts, &args.family)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        write_json_pretty(std::slice::from_ref(&font), &mut handle)?;
    } else {
        write_details(&font, format, &mut handle)?;
    }
    Ok(())
}

async fn run_css(args: SelectionArgs) -> Result<()> {
    let format = FontFormat::from(args.format);
    let fonts = fetch_catalog(&args.key, format.is_compressed()).await?;
    let (font, options) = build_selection(&fonts, &args)?;
    let destination = destination(&args);

    match write_stylesheet(&font, &destination, &options).context("writing the stylesheet")? {
        Some(path) => println!("{}", path.display()),
        None => println!("nothing selected, no stylesheet written"),
    }
    Ok(())
}

async fn run_download(args: DownloadArgs, sink: &dyn FailureSink) -> Result<()> {
    let selection = &args.selection;
    let format = FontFormat::from(selection.format);
    let fonts = fetch_catalog(&selection.key, format.is_compressed()).await?;
    let (font, options) = build_selection(&fonts, selection)?;
    let destination = destination(selection);

    let stylesheet = if args.no_css {
        None
    } else {
        write_stylesheet(&font, &destination, &options).context("writing the stylesheet")?
    };

    let report = FontDownloader::new()?
        .download_fonts(&font, &destination, format, sink)
        .await
        .with_context(|| format!("downloading {}", font.family))?;

    write_report(&report, stylesheet.as_deref(), &mut io::stdout().lock())?;
    for failure in &report.failures {
        eprintln!("failed: {failure}");
    }
    Ok(())
}

fn run_log(args: &LogArgs) -> Result<()> {
    let path = ErrorLog::default_path()
        .ok_or_else(|| anyhow!("no location for the error log; set {LOG_PATH_ENV}"))?;
    let log = ErrorLog::new(path);

    if args.clear {
        log.clear()?;
        println!("cleared {}", log.path().display());
        return Ok(());
    }

    let entries = log.recent(args.count)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        write_json_pretty(&entries, &mut handle)?;
    } else {
        write_log_entries(&entries, &mut handle)?;
    }
    Ok(())
}

async fn fetch_catalog(key: &KeyArgs, prefer_woff2: bool) -> Result<Vec<FontRecord>> {
    let api_key = resolve_api_key(
        key.api_key.as_deref(),
        settings::resolve_api_key(),
        prompt_api_key,
    )?;
    let client = catalog_client()?;
    let fonts = client
        .fetch_catalog(&api_key, prefer_woff2)
        .await
        .context("fetching the Google Fonts catalog")?;
    info!("catalog lists {} families", fonts.len());
    Ok(fonts)
}

fn catalog_client() -> Result<CatalogClient> {
    let client = CatalogClient::new()?;
    Ok(match env::var(ENDPOINT_ENV) {
        Ok(endpoint) if !endpoint.trim().is_empty() => client.endpoint(endpoint.trim()),
        _ => client,
    })
}

/// `--api-key` first, then the environment or settings file, then the prompt.
fn resolve_api_key(
    flag: Option<&str>,
    configured: Option<String>,
    prompt: impl FnOnce() -> Result<Option<String>>,
) -> Result<String> {
    if let Some(key) = flag.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    if let Some(key) = configured {
        return Ok(key);
    }
    prompt()?.ok_or_else(|| {
        anyhow!(
            "no Google Fonts API key: pass --api-key, set {API_KEY_ENV} or add \"APIKey\" to {SETTINGS_FILE}"
        )
    })
}

fn prompt_api_key() -> Result<Option<String>> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(None);
    }
    read_api_key(&mut stdin.lock(), &mut io::stderr())
}

fn read_api_key(input: &mut impl BufRead, prompt: &mut impl Write) -> Result<Option<String>> {
    write!(prompt, "Google Fonts API key: ")?;
    prompt.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let key = line.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid regex: {p}")))
        .collect()
}

fn filter_fonts(fonts: Vec<FontRecord>, patterns: &[Regex], category: Option<&str>) -> Vec<FontRecord> {
    fonts
        .into_iter()
        .filter(|font| patterns.is_empty() || patterns.iter().any(|re| re.is_match(&font.family)))
        .filter(|font| match category {
            Some(wanted) => font
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
            None => true,
        })
        .collect()
}

/// Match on the display name or the space-free folder name, ignoring case.
fn find_family(fonts: &[FontRecord], family: &str) -> Result<FontRecord> {
    let wanted = family_slug(family.trim());
    fonts
        .iter()
        .find(|font| family_slug(&font.family).eq_ignore_ascii_case(&wanted))
        .cloned()
        .ok_or_else(|| anyhow!("no family named {:?} in the catalog", family.trim()))
}

fn build_selection(fonts: &[FontRecord], args: &SelectionArgs) -> Result<(FontRecord, CssOptions)> {
    let font = find_family(fonts, &args.family)?;
    let font = if args.variants.is_empty() {
        font
    } else {
        font.select_variants(&args.variants)?
    };
    let subsets = font.check_subsets(&args.subsets)?;

    let options = CssOptions::new(args.format.into())
        .minify(args.minify)
        .with_subsets(subsets);
    Ok((font, options))
}

fn destination(args: &SelectionArgs) -> PathBuf {
    args.output
        .clone()
        .unwrap_or_else(settings::default_destination)
}

fn write_plain(fonts: &[FontRecord], mut w: impl Write, color: bool) -> Result<()> {
    for font in fonts {
        writeln!(w, "{}", apply_color(&font.family, color, AnsiColor::Cyan))?;
    }
    Ok(())
}

fn write_columns(fonts: &[FontRecord], mut w: impl Write, color: bool) -> Result<()> {
    let rows: Vec<(&str, &str, String)> = fonts
        .iter()
        .map(|font| {
            let counts = format!(
                "variants:{:<2} subsets:{:<2}",
                font.variants.len(),
                font.subsets.len()
            );
            (
                font.family.as_str(),
                font.category.as_deref().unwrap_or("-"),
                counts,
            )
        })
        .collect();

    let family_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).min(80);
    let category_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0).min(40);

    for (family, category, counts) in rows {
        let padded_family = format!("{family:<family_width$}");
        let padded_category = format!("{category:<category_width$}");
        let rendered_family = apply_color(&padded_family, color, AnsiColor::Cyan);
        let rendered_category = apply_color(&padded_category, color, AnsiColor::Yellow);
        let rendered_counts = apply_color(&counts, color, AnsiColor::Green);

        writeln!(w, "{rendered_family}  {rendered_category}  {rendered_counts}")?;
    }

    Ok(())
}

fn write_details(font: &FontRecord, format: FontFormat, mut w: impl Write) -> Result<()> {
    match &font.category {
        Some(category) => writeln!(w, "{} ({category})", font.family)?,
        None => writeln!(w, "{}", font.family)?,
    }
    writeln!(w, "variants: {}", font.variants.join(", "))?;
    writeln!(w, "subsets:  {}", font.subsets.join(", "))?;
    writeln!(w, "files:")?;

    let width = font.variants.iter().map(String::len).max().unwrap_or(0);
    for token in &font.variants {
        let status = if font.files.url_for(token).is_some() {
            ""
        } else {
            "  (no source)"
        };
        writeln!(
            w,
            "  {token:<width$}  {}{status}",
            font_file_name(&font.family, token, format)
        )?;
    }
    Ok(())
}

fn write_report(report: &DownloadReport, stylesheet: Option<&Path>, mut w: impl Write) -> Result<()> {
    if let Some(path) = stylesheet {
        writeln!(w, "stylesheet: {}", path.display())?;
    }
    for path in &report.downloaded {
        writeln!(w, "downloaded: {}", path.display())?;
    }
    for path in &report.skipped {
        writeln!(w, "present:    {}", path.display())?;
    }
    writeln!(
        w,
        "{} downloaded, {} already present, {} failed",
        report.downloaded.len(),
        report.skipped.len(),
        report.failures.len()
    )?;
    Ok(())
}

fn write_log_entries(entries: &[ErrorRecord], mut w: impl Write) -> Result<()> {
    for entry in entries {
        let when = entry
            .timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.epoch_ms.to_string());
        writeln!(
            w,
            "{when} [{}] {}: {}",
            entry.level, entry.msg, entry.data.exception_message
        )?;
        if !entry.data.exception_type.is_empty() {
            writeln!(w, "    type: {}", entry.data.exception_type)?;
        }
        for cause in &entry.data.causes {
            writeln!(w, "    caused by: {cause}")?;
        }
    }
    Ok(())
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Cyan,
    Yellow,
    Green,
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Cyan => "36",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}

#[cfg(test)]
mod tests;
