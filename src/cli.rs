use crate::config::{Config, load_config};
use crate::export::{DEFAULT_DOCUMENT_NAME, ImageFormat, export_document, export_image};
use crate::layout::{FamilyLayout, layout_snapshot};
use crate::layout_dump::write_layout_dump;
use crate::render::{render_surface, write_output_svg};
use crate::session::Session;
use crate::store::{GraphSource, SnapshotFile};
use crate::theme::{Theme, ThemeMode};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "ftree", version, about = "Family tree renderer")]
pub struct Args {
    /// Snapshot file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and to family-tree.<ext>
    /// for the other formats.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, layout, export)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Theme mode; overrides the config file's `theme`
    #[arg(long = "theme", value_enum)]
    pub theme: Option<ThemeArg>,

    /// Resolve `--theme system` to dark
    #[arg(long = "prefersDark")]
    pub prefers_dark: bool,

    /// Signed-in user the snapshot is read for
    #[arg(long = "user", default_value = "local")]
    pub user: String,

    /// Write node positions and levels as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    #[value(alias = "jpeg")]
    Jpg,
    Pdf,
}

impl OutputFormat {
    fn default_file_name(self) -> Option<&'static str> {
        match self {
            Self::Svg => None,
            Self::Png => Some(ImageFormat::Png.default_file_name()),
            Self::Jpg => Some(ImageFormat::Jpeg.default_file_name()),
            Self::Pdf => Some(DEFAULT_DOCUMENT_NAME),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    Light,
    Dark,
    System,
}

impl From<ThemeArg> for ThemeMode {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => ThemeMode::Light,
            ThemeArg::Dark => ThemeMode::Dark,
            ThemeArg::System => ThemeMode::System,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    execute(&args)
}

/// `RUST_LOG` filter for the binary, `warn` when unset.
pub fn log_filter() -> EnvFilter {
    log_filter_from(std::env::var("RUST_LOG").ok().as_deref())
}

fn log_filter_from(spec: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(spec.unwrap_or_default())
}

pub fn execute(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mode = args.theme.map(ThemeMode::from).unwrap_or(config.theme_mode);

    let source = read_snapshot(args.input.as_deref())?;
    let session = Session::sign_in(args.user.as_str(), mode);
    let theme = config.overlay_theme(session.theme(args.prefers_dark));
    let result = render_to_output(args, &config, &theme, &source, &session);
    session.sign_out();
    result
}

fn render_to_output(
    args: &Args,
    config: &Config,
    theme: &Theme,
    source: &dyn GraphSource,
    session: &Session,
) -> Result<()> {
    let layout = load_layout(source, session, config)?;
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &layout)
            .with_context(|| format!("failed to write layout dump {}", path.display()))?;
    }

    let surface = render_surface(&layout, theme);
    match args.output_format {
        OutputFormat::Svg => {
            let svg = surface.to_svg(config.export.padding);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png | OutputFormat::Jpg => {
            let output = output_path(&args.output, args.output_format);
            let format = if args.output_format == OutputFormat::Png {
                ImageFormat::Png
            } else {
                ImageFormat::Jpeg
            };
            let bytes = export_image(Some(&surface), &layout, format, &config.export)?;
            write_artifact(bytes, &output)?;
        }
        OutputFormat::Pdf => {
            let output = output_path(&args.output, OutputFormat::Pdf);
            let bytes = export_document(Some(&surface), &layout, &config.export)?;
            write_artifact(bytes, &output)?;
        }
    }
    Ok(())
}

/// Fetches the root and its graph, then lays it out.
pub fn load_layout(
    source: &dyn GraphSource,
    session: &Session,
    config: &Config,
) -> Result<FamilyLayout> {
    let snapshot = source.fetch_root_and_graph(session)?;
    Ok(layout_snapshot(&snapshot, &config.layout))
}

fn read_snapshot(path: Option<&Path>) -> Result<SnapshotFile> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return SnapshotFile::load(path)
                .with_context(|| format!("failed to read snapshot {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(SnapshotFile::parse(&buf)?)
}

fn output_path(output: &Option<PathBuf>, format: OutputFormat) -> PathBuf {
    match (output, format.default_file_name()) {
        (Some(path), _) => path.clone(),
        (None, Some(name)) => PathBuf::from(name),
        (None, None) => PathBuf::from("family-tree.svg"),
    }
}

fn write_artifact(bytes: Option<Vec<u8>>, output: &Path) -> Result<()> {
    match bytes {
        Some(bytes) => {
            std::fs::write(output, bytes)?;
            tracing::info!(path = %output.display(), "wrote export");
        }
        None => tracing::warn!("tree is empty, nothing exported"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "root": {"id": "R", "first_name": "Sara", "last_name": "Amini"},
        "relationships": [
            {"id": "e1", "from_person_id": "R", "to_person_id": "F", "relation_type": "FATHER"}
        ],
        "relatedPersons": [{"id": "F", "first_name": "Reza", "last_name": "Amini"}]
    }"#;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["ftree"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn parses_flags() {
        let parsed = args(&["-i", "tree.json", "-e", "jpeg", "--theme", "system", "--prefersDark"]);
        assert_eq!(parsed.output_format, OutputFormat::Jpg);
        assert_eq!(parsed.theme, Some(ThemeArg::System));
        assert!(parsed.prefers_dark);
        assert_eq!(parsed.user, "local");
    }

    #[test]
    fn artifacts_default_to_download_names() {
        assert_eq!(output_path(&None, OutputFormat::Jpg), PathBuf::from("family-tree.jpg"));
        assert_eq!(output_path(&None, OutputFormat::Pdf), PathBuf::from("family-tree.pdf"));
        assert_eq!(output_path(&None, OutputFormat::Png), PathBuf::from("family-tree.png"));
        let path = PathBuf::from("out.png");
        assert_eq!(output_path(&Some(path.clone()), OutputFormat::Png), path);
    }

    #[test]
    fn log_filter_honours_rust_log_level() {
        assert_eq!(log_filter_from(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter_from(Some("")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter_from(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter_from(Some("family_tree_renderer=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn config_file_theme_reaches_session_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tree.json");
        let config = dir.path().join("config.json");
        let output = dir.path().join("tree.svg");
        std::fs::write(&input, SNAPSHOT).unwrap();
        std::fs::write(&config, r##"{"theme": "dark", "themeVariables": {"lineColor": "#123456"}}"##)
            .unwrap();

        let parsed = args(&[
            "-i",
            input.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        execute(&parsed).unwrap();
        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.contains(&format!("fill=\"{}\"", Theme::dark().card_fill)));
        assert!(svg.contains("#123456"));

        // The flag wins over the file, and the overrides still apply.
        let parsed = args(&[
            "-i",
            input.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--theme",
            "system",
        ]);
        execute(&parsed).unwrap();
        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.contains(&format!("fill=\"{}\"", Theme::light().background)));
        assert!(svg.contains("#123456"));
    }

    #[test]
    fn writes_svg_and_dump() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tree.json");
        let output = dir.path().join("tree.svg");
        let dump = dir.path().join("layout.json");
        std::fs::write(&input, SNAPSHOT).unwrap();
        let parsed = args(&[
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--dumpLayout",
            dump.to_str().unwrap(),
        ]);
        execute(&parsed).unwrap();
        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.contains("Reza Amini"));
        let dumped = std::fs::read_to_string(&dump).unwrap();
        assert!(dumped.contains("\"F\""));
    }

    #[test]
    fn loads_layout_from_source() {
        let source = SnapshotFile::parse(SNAPSHOT).unwrap();
        let session = Session::sign_in("u1", ThemeMode::Light);
        let layout = load_layout(&source, &session, &Config::default()).unwrap();
        assert_eq!(layout.node("F").unwrap().level, -1);
        assert_eq!(layout.edges.len(), 1);
    }
}
