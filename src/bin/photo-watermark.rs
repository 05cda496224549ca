use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use photo_watermark::{
    list_images, supported_files, Anchor, Color, ExportOptions, ImageWatermarkParams,
    ProcessResult, TemplateParams, TemplateStore, TextWatermarkParams, WatermarkEngine,
    WatermarkKind, DEFAULT_CONFIG_FILE, DEFAULT_JPEG_QUALITY, DEFAULT_SUFFIX,
};

#[derive(Parser)]
#[command(
    name = "photo-watermark",
    about = "Add text or image watermarks to photos, with reusable templates",
    version,
    after_help = "Simple usage: photo-watermark apply <images or folders> -o <output folder> --text \"© me\""
)]
struct Cli {
    /// Config file holding defaults and saved templates
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watermark images into an output folder
    Apply(Box<ApplyArgs>),
    /// Inspect or remove saved templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
struct ApplyArgs {
    /// Input image files or folders
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output folder
    #[arg(short, long)]
    output: PathBuf,

    /// Watermark text (selects a text watermark)
    #[arg(long, conflicts_with = "image")]
    text: Option<String>,

    /// Watermark image file (selects an image watermark)
    #[arg(long)]
    image: Option<PathBuf>,

    /// Start from a saved template of the selected kind
    #[arg(long)]
    template: Option<String>,

    /// Font family or font file path ("default" for the built-in font)
    #[arg(long)]
    font: Option<String>,

    /// Font size in pixels
    #[arg(long)]
    size: Option<u32>,

    /// Text color as #RGB or #RRGGBB
    #[arg(long, value_parser = parse_color)]
    color: Option<Color>,

    /// Opacity (0-255)
    #[arg(long, allow_negative_numbers = true)]
    opacity: Option<i32>,

    /// Rotation in degrees, counter-clockwise
    #[arg(long, allow_negative_numbers = true)]
    rotation: Option<i32>,

    /// Prefer the bold variant of the font
    #[arg(long)]
    bold: bool,

    /// Prefer the italic variant of the font
    #[arg(long)]
    italic: bool,

    /// Draw a drop shadow behind the text
    #[arg(long)]
    shadow: bool,

    /// Shadow color as #RGB or #RRGGBB
    #[arg(long, value_parser = parse_color)]
    shadow_color: Option<Color>,

    /// Shadow offset as DX,DY
    #[arg(long, value_delimiter = ',', num_args = 2, allow_negative_numbers = true)]
    shadow_offset: Option<Vec<i32>>,

    /// Draw an outline around the text
    #[arg(long)]
    stroke: bool,

    /// Outline color as #RGB or #RRGGBB
    #[arg(long, value_parser = parse_color)]
    stroke_color: Option<Color>,

    /// Outline width in pixels
    #[arg(long)]
    stroke_width: Option<i32>,

    /// Image watermark scale factor
    #[arg(long)]
    scale: Option<f32>,

    /// Place the watermark at an anchor of each image (e.g. bottom-right)
    #[arg(long, conflicts_with_all = ["x", "y"])]
    anchor: Option<Anchor>,

    /// Left edge of the watermark in pixels
    #[arg(long, allow_negative_numbers = true)]
    x: Option<i32>,

    /// Top edge of the watermark in pixels
    #[arg(long, allow_negative_numbers = true)]
    y: Option<i32>,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Appended to each output file name
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// Save the resulting settings as a template
    #[arg(long)]
    save_template: Option<String>,
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List template names
    List {
        /// Only list templates of this kind
        #[arg(long)]
        kind: Option<KindArg>,
    },
    /// Print a template as JSON
    Show {
        /// Template kind
        #[arg(long)]
        kind: KindArg,
        /// Template name
        name: String,
    },
    /// Delete a template
    Delete {
        /// Template kind
        #[arg(long)]
        kind: KindArg,
        /// Template name
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Text,
    Image,
}

impl From<KindArg> for WatermarkKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Text => WatermarkKind::Text,
            KindArg::Image => WatermarkKind::Image,
        }
    }
}

fn parse_color(s: &str) -> Result<Color, String> {
    Color::parse_hex(s).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let store = TemplateStore::new(&cli.config);
    let code = match cli.command {
        Command::Apply(args) => run_apply(&store, &args, cli.quiet),
        Command::Templates { action } => run_templates(&store, action, cli.quiet),
    };
    process::exit(code);
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_apply(store: &TemplateStore, args: &ApplyArgs, quiet: bool) -> i32 {
    let kind = if args.image.is_some() {
        WatermarkKind::Image
    } else if args.text.is_some() {
        WatermarkKind::Text
    } else {
        store.last_used_kind()
    };

    let mut engine = WatermarkEngine::new();
    engine.kind = kind;
    engine.text = store.default_text_params();
    engine.image.params = store.default_image_params();

    if let Some(name) = &args.template {
        let found = match kind {
            WatermarkKind::Text => store.load(name).map(|p| engine.text = p),
            WatermarkKind::Image => store.load(name).map(|p| engine.image.params = p),
        };
        if found.is_none() {
            eprintln!("Error: No {kind} template named {name:?}");
            return 1;
        }
    }

    apply_text_style(&mut engine.text, args);
    apply_image_style(&mut engine.image.params, args);

    if kind == WatermarkKind::Image {
        let Some(path) = &args.image else {
            eprintln!("Error: --image <FILE> is required for an image watermark");
            return 1;
        };
        if let Err(e) = engine.image.load_watermark(path) {
            eprintln!("Error: {e}");
            return 1;
        }
    }

    engine.anchor = args.anchor;

    if let Some(name) = &args.save_template {
        let saved = match kind {
            WatermarkKind::Text => store.save(name, &engine.text),
            WatermarkKind::Image => store.save(name, &engine.image.params),
        };
        if let Err(e) = saved {
            eprintln!("Error: Failed to save template: {e}");
            return 1;
        }
        if !quiet {
            eprintln!("Saved {kind} template {name:?}");
        }
    }

    let (inputs, mut failures) = collect_inputs(&args.inputs);
    if inputs.is_empty() {
        eprintln!("Error: No supported images found");
        return 1;
    }

    let opts = ExportOptions {
        quality: args.quality,
        suffix: args.suffix.clone(),
    };
    let report = engine.export_batch(&inputs, &args.output, &opts);
    for r in &report.results {
        print_result(r, quiet);
    }

    if let Err(e) = store.set_last_used_kind(kind) {
        tracing::warn!(error = %e, "could not record last used watermark kind");
    }

    failures += report.failed();
    if report.results.len() > 1 && !quiet {
        eprintln!();
        eprint!("[Summary] Processed: {}", report.succeeded());
        if failures > 0 {
            eprint!(", Failed: {failures}");
        }
        eprintln!(" (Total: {})", report.results.len());
    }

    i32::from(failures > 0)
}

fn apply_text_style(text: &mut TextWatermarkParams, args: &ApplyArgs) {
    if let Some(t) = &args.text {
        text.set_text(t.as_str());
    }
    if args.font.is_some() || args.size.is_some() {
        let family = args.font.clone().unwrap_or_else(|| text.font_family().to_string());
        text.set_font(family, args.size.unwrap_or(text.font_size()));
    }
    if let Some(color) = args.color {
        text.set_color(color);
    }
    if let Some(opacity) = args.opacity {
        text.set_opacity(opacity);
    }
    if let Some(rotation) = args.rotation {
        text.set_rotation(rotation);
    }
    if args.bold {
        text.set_bold(true);
    }
    if args.italic {
        text.set_italic(true);
    }
    if args.shadow {
        text.set_shadow(true);
    }
    if let Some(color) = args.shadow_color {
        text.set_shadow_color(color);
    }
    if let Some([dx, dy]) = args.shadow_offset.as_deref() {
        text.set_shadow_offset(*dx, *dy);
    }
    if args.stroke {
        text.set_stroke(true);
    }
    if let Some(color) = args.stroke_color {
        text.set_stroke_color(color);
    }
    if let Some(width) = args.stroke_width {
        text.set_stroke_width(width);
    }
    if let Some((x, y)) = position(args, text.position()) {
        text.set_position(x, y);
    }
}

fn apply_image_style(image: &mut ImageWatermarkParams, args: &ApplyArgs) {
    if let Some(opacity) = args.opacity {
        image.set_opacity(opacity);
    }
    if let Some(rotation) = args.rotation {
        image.set_rotation(rotation);
    }
    if let Some(scale) = args.scale {
        image.set_scale(scale);
    }
    if let Some((x, y)) = position(args, image.position()) {
        image.set_position(x, y);
    }
}

fn position(args: &ApplyArgs, current: (i32, i32)) -> Option<(i32, i32)> {
    match (args.x, args.y) {
        (None, None) => None,
        (x, y) => Some((x.unwrap_or(current.0), y.unwrap_or(current.1))),
    }
}

/// Expand folders and drop unsupported files. Unreadable folders count as failures.
fn collect_inputs(paths: &[PathBuf]) -> (Vec<PathBuf>, usize) {
    let mut inputs = Vec::new();
    let mut failures = 0;
    for path in paths {
        if path.is_dir() {
            match list_images(path) {
                Ok(found) => inputs.extend(found),
                Err(e) => {
                    eprintln!("[FAIL] {}: {e}", path.display());
                    failures += 1;
                }
            }
        } else {
            let kept = supported_files(std::slice::from_ref(path));
            if kept.is_empty() {
                eprintln!("[SKIP] {}: not a supported image", path.display());
            }
            inputs.extend(kept);
        }
    }
    (inputs, failures)
}

fn print_result(result: &ProcessResult, quiet: bool) {
    if quiet && result.success {
        return;
    }

    let filename = display_name(&result.path);
    if result.success {
        eprintln!("[OK] {filename} -> {}", result.output.display());
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

fn run_templates(store: &TemplateStore, action: TemplateAction, quiet: bool) -> i32 {
    match action {
        TemplateAction::List { kind: only } => {
            for kind in [WatermarkKind::Text, WatermarkKind::Image] {
                if only.is_some_and(|k| WatermarkKind::from(k) != kind) {
                    continue;
                }
                for name in store.list(kind) {
                    println!("{kind}\t{name}");
                }
            }
            0
        }
        TemplateAction::Show { kind, name } => {
            let json = match WatermarkKind::from(kind) {
                WatermarkKind::Text => show::<TextWatermarkParams>(store, &name),
                WatermarkKind::Image => show::<ImageWatermarkParams>(store, &name),
            };
            match json {
                Some(json) => {
                    println!("{json}");
                    0
                }
                None => {
                    eprintln!("Error: No {} template named {name:?}", WatermarkKind::from(kind));
                    1
                }
            }
        }
        TemplateAction::Delete { kind, name } => match store.delete(kind.into(), &name) {
            Ok(true) => {
                if !quiet {
                    println!("Deleted {} template {name:?}", WatermarkKind::from(kind));
                }
                0
            }
            Ok(false) => {
                eprintln!("Error: No {} template named {name:?}", WatermarkKind::from(kind));
                1
            }
            Err(e) => {
                eprintln!("Error: {e}");
                1
            }
        },
    }
}

fn show<T: TemplateParams>(store: &TemplateStore, name: &str) -> Option<String> {
    let params: T = store.load(name)?;
    serde_json::to_string_pretty(&params).ok()
}
