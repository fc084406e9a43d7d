use futures::executor::block_on;
use merrow::config::ConfigError;
use merrow::dom::DomError;
use merrow::{DiagramRenderer, Document, MermanEngine, Outcome, PassReport, RendererOptions};
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Config(ConfigError),
    Dom(DomError),
    Cancelled,
    DiagramsFailed(usize),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Dom(err) => write!(f, "{err}"),
            CliError::Cancelled => write!(f, "render pass was cancelled"),
            CliError::DiagramsFailed(n) => write!(f, "{n} diagram(s) failed to render"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DomError> for CliError {
    fn from(value: DomError) -> Self {
        Self::Dom(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Render,
    Check,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    theme: Option<String>,
    font_family: Option<String>,
    config: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "merrow-cli\n\
\n\
USAGE:\n\
  merrow-cli [render] [--theme <name>] [--font-family <css>] [--config <json>] [--out <path>] [<page>|-]\n\
  merrow-cli check [--theme <name>] [--font-family <css>] [--config <json>] [<page>|-]\n\
\n\
NOTES:\n\
  - If <page> is omitted or '-', the page is read from stdin. Pages must be well-formed XHTML.\n\
  - --theme sets the root theme attribute before rendering ('dark' selects the dark theme).\n\
  - --font-family sets the base font custom property on <body>.\n\
  - render prints the page to stdout by default; use --out to write a file.\n\
  - check prints one line per diagram and exits with status 3 if any diagram failed.\n\
  - Set MERROW_LOG (e.g. MERROW_LOG=debug) to see render logs on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "check" => args.command = Command::Check,
            "--theme" => {
                let Some(theme) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.theme = Some(theme.clone());
            }
            "--font-family" => {
                let Some(font) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.font_family = Some(font.clone());
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

/// Loads the page and applies the theme/font overrides the way page scripts would.
fn load_page(args: &Args, options: &RendererOptions) -> Result<Document, CliError> {
    let text = read_input(args.input.as_deref())?;
    let mut doc = Document::parse_xml(&text)?;
    let body = doc.body().ok_or(DomError::NoBody)?;
    if let Some(theme) = &args.theme {
        let root = doc.root();
        doc.set_attribute(root, &options.theme_attribute, theme);
    }
    if let Some(font) = &args.font_family {
        doc.set_style_property(body, &options.font_family_property, font);
    }
    Ok(doc)
}

fn check_lines(report: &PassReport) -> Vec<String> {
    report
        .attempts
        .iter()
        .map(|attempt| match &attempt.outcome {
            Outcome::Rendered => format!("ok {}", attempt.render_id),
            Outcome::Diagnostic {
                render_error,
                message,
            } => {
                let text = message.as_deref().unwrap_or(render_error);
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                format!("error {}: {text}", attempt.render_id)
            }
            Outcome::Detached => format!("skipped {}: placeholder removed", attempt.render_id),
        })
        .collect()
}

fn run(args: Args) -> Result<(), CliError> {
    let options = match &args.config {
        Some(path) => RendererOptions::from_path(path)?,
        None => RendererOptions::default(),
    };
    let doc = load_page(&args, &options)?.into_shared();
    let renderer = DiagramRenderer::with_options(doc.clone(), MermanEngine::new(), options);
    let report = block_on(renderer.render_pass()).map_err(|_| CliError::Cancelled)?;
    tracing::info!(
        theme = %report.config.theme,
        rendered = report.rendered(),
        failed = report.failed(),
        "page rendered"
    );

    match args.command {
        Command::Render => {
            let html = doc.borrow().to_html();
            write_text(&html, args.out.as_deref())
        }
        Command::Check => {
            for line in check_lines(&report) {
                println!("{line}");
            }
            match report.failed() {
                0 => Ok(()),
                n => Err(CliError::DiagramsFailed(n)),
            }
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MERROW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(err @ CliError::DiagramsFailed(_)) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
