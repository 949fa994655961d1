use super::*;
use clap::CommandFactory;
use gfdl_core::errlog::ErrorData;
use gfdl_core::FontFiles;
use std::io::Cursor;

fn catalog() -> Vec<FontRecord> {
    let mut files = FontFiles::new();
    files.insert("regular", "https://fonts.example/open-400.ttf");
    files.insert("700italic", "https://fonts.example/open-700i.ttf");

    vec![
        FontRecord::new("Open Sans")
            .with_variants(["regular", "italic", "700italic"])
            .with_subsets(["latin", "cyrillic"])
            .with_files(files),
        FontRecord::new("Roboto Mono")
            .with_variants(["regular"])
            .with_subsets(["latin"]),
    ]
}

fn categorized(family: &str, category: &str) -> FontRecord {
    let mut font = FontRecord::new(family).with_variants(["regular"]);
    font.category = Some(category.to_string());
    font
}

#[test]
fn parses_download_selection() {
    let cli = Cli::try_parse_from([
        "gfdl",
        "download",
        "Open Sans",
        "-V",
        "regular,700italic",
        "--format",
        "woff2",
        "--minify",
        "-o",
        "/tmp/fonts",
    ])
    .expect("parse cli");

    let Command::Download(args) = cli.command else {
        panic!("expected download command");
    };
    let selection = &args.selection;
    assert_eq!(selection.family, "Open Sans");
    assert_eq!(selection.variants, ["regular", "700italic"]);
    assert!(selection.subsets.is_empty());
    assert_eq!(selection.format, FormatChoice::Woff2);
    assert!(selection.minify);
    assert!(!args.no_css);
    assert_eq!(destination(selection), PathBuf::from("/tmp/fonts"));
}

#[test]
fn verbose_is_accepted_after_subcommand() {
    let cli = Cli::try_parse_from(["gfdl", "log", "--verbose"]).expect("parse cli");
    assert!(cli.verbose);
}

#[test]
fn json_and_ndjson_conflict() {
    let parse = Cli::try_parse_from(["gfdl", "list", "--json", "--ndjson"]);
    assert!(parse.is_err());
}

#[test]
fn minify_and_subsets_conflict() {
    let parse = Cli::try_parse_from(["gfdl", "css", "Roboto", "--minify", "-s", "latin"]);
    assert!(parse.is_err());

    let parse = Cli::try_parse_from(["gfdl", "download", "Roboto", "-s", "latin,greek"]);
    assert!(parse.is_ok());
}

#[test]
fn unknown_format_is_rejected() {
    let parse = Cli::try_parse_from(["gfdl", "css", "Roboto", "--format", "otf"]);
    assert!(parse.is_err());
}

#[test]
fn invalid_regex_returns_error() {
    let built = compile_patterns(&["(".to_string()]);
    assert!(built.is_err());
}

#[test]
fn flag_key_wins_over_configuration() {
    let key = resolve_api_key(Some("  from-flag "), Some("configured".into()), || {
        panic!("prompt must not run")
    })
    .expect("key");
    assert_eq!(key, "from-flag");
}

#[test]
fn configured_key_is_used_before_prompting() {
    let key = resolve_api_key(Some(""), Some("configured".into()), || {
        panic!("prompt must not run")
    })
    .expect("key");
    assert_eq!(key, "configured");
}

#[test]
fn prompt_is_last_resort() {
    let key = resolve_api_key(None, None, || Ok(Some("typed".into()))).expect("key");
    assert_eq!(key, "typed");

    let err = resolve_api_key(None, None, || Ok(None)).unwrap_err();
    assert!(err.to_string().contains(API_KEY_ENV), "{err}");
}

#[test]
fn reads_key_from_prompt_input() {
    let mut prompt = Vec::new();
    let key = read_api_key(&mut Cursor::new("  abc123\n"), &mut prompt).expect("read");
    assert_eq!(key.as_deref(), Some("abc123"));
    assert!(String::from_utf8(prompt).expect("utf8").contains("API key"));

    let blank = read_api_key(&mut Cursor::new("\n"), &mut Vec::new()).expect("read");
    assert!(blank.is_none());
}

#[test]
fn finds_family_ignoring_case_and_spaces() {
    let fonts = catalog();
    assert_eq!(find_family(&fonts, "open sans").expect("found").family, "Open Sans");
    assert_eq!(find_family(&fonts, "RobotoMono").expect("found").family, "Roboto Mono");
    assert!(find_family(&fonts, "Comic Sans").is_err());
}

#[test]
fn filters_by_pattern_and_category() {
    let fonts = vec![
        categorized("Open Sans", "sans-serif"),
        categorized("Roboto Mono", "monospace"),
        categorized("Roboto Slab", "serif"),
    ];

    let patterns = compile_patterns(&["^Roboto".to_string()]).expect("regex");
    let names: Vec<String> = filter_fonts(fonts.clone(), &patterns, None)
        .into_iter()
        .map(|f| f.family)
        .collect();
    assert_eq!(names, ["Roboto Mono", "Roboto Slab"]);

    let serif = filter_fonts(fonts, &[], Some("SERIF"));
    assert_eq!(serif.len(), 1);
    assert_eq!(serif[0].family, "Roboto Slab");
}

#[test]
fn selection_narrows_variants_and_checks_subsets() {
    let fonts = catalog();
    let cli = Cli::try_parse_from(["gfdl", "css", "open sans", "-V", "700italic", "-s", "cyrillic"])
        .expect("parse cli");
    let Command::Css(args) = cli.command else {
        panic!("expected css command");
    };

    let (font, options) = build_selection(&fonts, &args).expect("selection");
    assert_eq!(font.variants, ["700italic"]);
    assert_eq!(options.subsets, ["cyrillic"]);

    let cli = Cli::try_parse_from(["gfdl", "css", "Open Sans", "-s", "greek"]).expect("parse cli");
    let Command::Css(args) = cli.command else {
        panic!("expected css command");
    };
    assert!(build_selection(&fonts, &args).is_err());
}

#[test]
fn omitted_variants_select_everything() {
    let fonts = catalog();
    let cli = Cli::try_parse_from(["gfdl", "css", "Open Sans"]).expect("parse cli");
    let Command::Css(args) = cli.command else {
        panic!("expected css command");
    };

    let (font, _) = build_selection(&fonts, &args).expect("selection");
    assert_eq!(font.variants, ["regular", "italic", "700italic"]);
}

#[test]
fn columns_align_family_names() {
    let fonts = vec![categorized("Lato", "sans-serif"), categorized("Roboto Slab", "serif")];
    let mut out = Vec::new();
    write_columns(&fonts, &mut out, false).expect("write");

    let text = String::from_utf8(out).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Lato         sans-serif"), "{text}");
    assert!(lines[1].starts_with("Roboto Slab  serif     "), "{text}");
    assert!(!text.contains('\u{1b}'));
}

#[test]
fn plain_output_colors_on_request() {
    let fonts = vec![categorized("Lato", "sans-serif")];
    let mut out = Vec::new();
    write_plain(&fonts, &mut out, true).expect("write");
    assert_eq!(String::from_utf8(out).expect("utf8"), "\u{1b}[36mLato\u{1b}[0m\n");
}

#[test]
fn details_flag_variants_without_source() {
    let fonts = catalog();
    let mut out = Vec::new();
    write_details(&fonts[0], FontFormat::Ttf, &mut out).expect("write");

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("OpenSans-BoldItalic.ttf"), "{text}");
    assert!(text.contains("OpenSans-RegularItalic.ttf  (no source)"), "{text}");
    assert!(text.contains("subsets:  latin, cyrillic"), "{text}");
}

#[test]
fn report_summarizes_counts() {
    let report = DownloadReport {
        downloaded: vec![PathBuf::from("/fonts/Lato/Lato-Bold.ttf")],
        skipped: vec![PathBuf::from("/fonts/Lato/Lato-Regular.ttf")],
        failures: Vec::new(),
    };
    let mut out = Vec::new();
    write_report(&report, Some(Path::new("/fonts/Lato/Lato.css")), &mut out).expect("write");

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.starts_with("stylesheet: /fonts/Lato/Lato.css\n"), "{text}");
    assert!(text.ends_with("1 downloaded, 1 already present, 0 failed\n"), "{text}");
}

#[test]
fn log_entries_show_message_and_causes() {
    let entry = ErrorRecord {
        msg: "Error downloading variant regular".into(),
        data: ErrorData {
            exception_message: "HTTP status 404".into(),
            exception_type: "gfdl_core::error::VariantDownloadError".into(),
            causes: vec!["not found".into()],
        },
        epoch_ms: 0,
        level: "ERROR".into(),
        id: "x".into(),
    };
    let mut out = Vec::new();
    write_log_entries(&[entry], &mut out).expect("write");

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.starts_with("1970-01-01 00:00:00 [ERROR] Error downloading variant regular: HTTP status 404"));
    assert!(text.contains("type: gfdl_core::error::VariantDownloadError"));
    assert!(text.contains("caused by: not found"));
}

#[test]
fn help_lists_subcommands() {
    let help = Cli::command().render_long_help().to_string();
    for name in ["list", "show", "download", "css", "log"] {
        assert!(help.contains(name), "missing {name} in help:\n{help}");
    }
}
