use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use instagen_core::decode::{self, SourceImage};
use instagen_core::optimize::{self, OptimizationPolicy, OptimizationResult, PolicyPreset};
use instagen_core::palette;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Shrink an image until its JPEG encoding fits under an upload size limit.
#[derive(Parser, Debug)]
#[command(name = "instagen", version)]
#[command(about = "Export images as JPEGs that fit a byte budget")]
#[command(long_about = "Export images as JPEGs that fit a byte budget.
Quality is stepped down (and with --rescale, dimensions too) until the encoded
file is under the target. If the target cannot be reached, the smallest attempt
is written anyway and a warning is logged.")]
struct Args {
    /// Input image (JPEG, PNG or WebP)
    input: PathBuf,

    #[arg(short, long, help = "Output path (default: <input>_optimized.jpg)")]
    output: Option<PathBuf>,

    #[arg(short, long, default_value = "retail",
          help = "Starting policy: retail, export or export-rescale")]
    preset: PolicyPreset,

    #[arg(long, value_name = "JSON",
          help = "Policy overrides as inline JSON or a path to a JSON file (camelCase fields)")]
    policy: Option<String>,

    #[arg(long, value_name = "KB", help = "Byte budget in KiB")]
    target_kb: Option<u64>,

    #[arg(long, value_name = "BYTES", conflicts_with = "target_kb", help = "Byte budget in bytes")]
    target_bytes: Option<u64>,

    #[arg(long, help = "Quality of the first attempt (1-100)")]
    start_quality: Option<u8>,

    #[arg(long, help = "Lowest quality tried in quality-only mode")]
    min_quality: Option<u8>,

    #[arg(long, help = "Quality decrement per attempt")]
    quality_step: Option<u8>,

    #[arg(long, help = "Maximum number of encode attempts")]
    max_iterations: Option<u32>,

    #[arg(long, value_name = "FACTOR", help = "Also shrink dimensions by FACTOR per attempt, e.g. 0.95")]
    rescale: Option<f64>,

    #[arg(long, value_name = "PX", help = "Smallest width/height allowed while rescaling")]
    min_dimension: Option<u32>,

    #[arg(long, conflicts_with = "rescale", help = "Only step quality, even on the export-rescale preset")]
    no_rescale: bool,

    #[arg(long, value_name = "PX", help = "Downscale to this width before optimizing (feed images use 1080)")]
    max_width: Option<u32>,

    #[arg(long, value_name = "N", help = "Also print the N dominant colors")]
    palette: Option<usize>,

    #[arg(long, help = "Exit with an error if the budget cannot be met")]
    strict: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More logging (-v info, -vv debug)")]
    verbose: u8,
}

/// What one export produced.
struct Outcome {
    output: PathBuf,
    result: OptimizationResult,
    palette: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let outcome = run(&args)?;

    println!(
        "{} -> {} ({:.1} KB, quality {}, {}x{}, {} attempt{})",
        args.input.display(),
        outcome.output.display(),
        outcome.result.size_kb(),
        outcome.result.quality,
        outcome.result.width,
        outcome.result.height,
        outcome.result.attempts,
        if outcome.result.attempts == 1 { "" } else { "s" },
    );
    if !outcome.palette.is_empty() {
        println!("palette: {}", outcome.palette.join(" "));
    }

    if args.strict && !outcome.result.met_budget {
        return Err(anyhow!(
            "{} bytes is over the budget; best effort written to {}",
            outcome.result.len(),
            outcome.output.display()
        ));
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(args: &Args) -> Result<Outcome> {
    let policy = build_policy(args)?;
    debug!(?policy, "resolved policy");

    let bytes = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let mut image = decode::decode_image(&bytes)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;
    info!(width = image.width, height = image.height, alpha = image.has_alpha, "decoded");

    if let Some(max_width) = args.max_width {
        image = decode::resize_for_web(&image, max_width).context("Failed to resize for web")?;
    }

    let result = optimize::optimize(&image, &policy)?;
    if !result.met_budget {
        warn!(
            size = result.len(),
            target = policy.target_bytes,
            "output is over budget"
        );
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));
    fs::write(&output, &result.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let palette = match args.palette {
        Some(count) => palette_for(&image, count),
        None => Vec::new(),
    };

    Ok(Outcome {
        output,
        result,
        palette,
    })
}

/// Preset first, then `--policy` JSON merged over it, then individual flags.
fn build_policy(args: &Args) -> Result<OptimizationPolicy> {
    let mut policy = OptimizationPolicy::preset(args.preset);

    if let Some(source) = &args.policy {
        policy = merge_json(policy, &load_policy_json(source)?)?;
    }

    if let Some(kb) = args.target_kb {
        policy = policy.with_target_kb(kb);
    }
    if let Some(bytes) = args.target_bytes {
        policy.target_bytes = bytes;
    }
    if let Some(q) = args.start_quality {
        policy.start_quality = q;
    }
    if let Some(q) = args.min_quality {
        policy.min_quality = q;
    }
    if let Some(step) = args.quality_step {
        policy.quality_step = step;
    }
    if let Some(n) = args.max_iterations {
        policy.max_iterations = n;
    }
    if let Some(factor) = args.rescale {
        policy.rescale_factor = Some(factor);
    }
    if let Some(px) = args.min_dimension {
        policy.min_dimension = px;
    }
    if args.no_rescale {
        policy = policy.without_rescale();
    }

    policy.validate()?;
    Ok(policy)
}

fn load_policy_json(source: &str) -> Result<serde_json::Value> {
    let text = if source.trim_start().starts_with('{') {
        source.to_string()
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read policy file {source}"))?
    };
    serde_json::from_str(&text).context("Policy is not valid JSON")
}

/// Overlay the keys of a JSON object onto a policy.
fn merge_json(policy: OptimizationPolicy, overrides: &serde_json::Value) -> Result<OptimizationPolicy> {
    let serde_json::Value::Object(fields) = overrides else {
        return Err(anyhow!("Policy JSON must be an object"));
    };

    let mut merged = serde_json::to_value(&policy)?;
    if let serde_json::Value::Object(base) = &mut merged {
        for (key, value) in fields {
            if !base.contains_key(key) {
                let known: Vec<&str> = base.keys().map(String::as_str).collect();
                return Err(anyhow!(
                    "Unknown policy field `{key}` (expected one of: {})",
                    known.join(", ")
                ));
            }
            base.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(merged).context("Policy JSON has invalid fields")
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}_optimized.jpg"))
}

fn palette_for(image: &SourceImage, count: usize) -> Vec<String> {
    palette::hex_palette(image, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["instagen"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 3) as u8, (y * 3) as u8, ((x * y) % 251) as u8])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_build_policy_from_preset() {
        let args = parse(&["in.png", "--preset", "export-rescale"]);
        assert_eq!(build_policy(&args).unwrap(), OptimizationPolicy::export_rescale());
    }

    #[test]
    fn test_flags_override_preset() {
        let args = parse(&[
            "in.png",
            "--preset",
            "export",
            "--target-kb",
            "200",
            "--quality-step",
            "10",
            "--rescale",
            "0.9",
        ]);
        let policy = build_policy(&args).unwrap();
        assert_eq!(policy.target_bytes, 204_800);
        assert_eq!(policy.min_quality, 65);
        assert_eq!(policy.quality_step, 10);
        assert_eq!(policy.rescale_factor, Some(0.9));
    }

    #[test]
    fn test_json_merges_over_preset_and_flags_win() {
        let args = parse(&[
            "in.png",
            "--preset",
            "export",
            "--policy",
            r#"{"targetBytes": 1000, "maxIterations": 3}"#,
            "--max-iterations",
            "4",
        ]);
        let policy = build_policy(&args).unwrap();
        assert_eq!(policy.target_bytes, 1000);
        assert_eq!(policy.min_quality, 65);
        assert_eq!(policy.max_iterations, 4);
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let args = parse(&["in.png", "--min-quality", "99"]);
        assert!(build_policy(&args).is_err());

        let args = parse(&["in.png", "--policy", "[1, 2]"]);
        assert!(build_policy(&args).is_err());

        let args = parse(&["in.png", "--policy", r#"{"startQuality": "high"}"#]);
        assert!(build_policy(&args).is_err());
    }

    #[test]
    fn test_unknown_policy_field_is_rejected() {
        let args = parse(&["in.png", "--policy", r#"{"target_bytes": 1000}"#]);
        let err = build_policy(&args).unwrap_err();
        assert!(err.to_string().contains("target_bytes"), "{err}");
    }

    #[test]
    fn test_no_rescale_turns_off_preset_rescaling() {
        let args = parse(&["in.png", "--preset", "export-rescale", "--no-rescale"]);
        let policy = build_policy(&args).unwrap();
        assert_eq!(policy.rescale_factor, None);
        assert_eq!(policy.start_quality, 85);

        assert!(Args::try_parse_from(["instagen", "in.png", "--no-rescale", "--rescale", "0.9"]).is_err());
    }

    #[test]
    fn test_unknown_preset_fails_to_parse() {
        assert!(Args::try_parse_from(["instagen", "in.png", "--preset", "webp"]).is_err());
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/tmp/shots/hero.png")),
            PathBuf::from("/tmp/shots/hero_optimized.jpg")
        );
    }

    #[test]
    fn test_run_writes_jpeg_under_budget() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("product.png");
        let output = dir.path().join("out.jpg");
        write_png(&input, 80, 60);

        let args = parse(&[
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--palette",
            "3",
        ]);
        let outcome = run(&args).unwrap();

        assert!(outcome.result.met_budget);
        assert_eq!(outcome.result.quality, 95);
        assert_eq!(outcome.output, output);
        assert!(!outcome.palette.is_empty() && outcome.palette.len() <= 3);

        let written = fs::read(&output).unwrap();
        assert_eq!(&written[0..2], &[0xFF, 0xD8]);
        assert_eq!(written, outcome.result.bytes);
    }

    #[test]
    fn test_run_best_effort_when_budget_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("big.png");
        write_png(&input, 64, 64);

        let args = parse(&[input.to_str().unwrap(), "--preset", "export", "--target-bytes", "50"]);
        let outcome = run(&args).unwrap();

        assert!(!outcome.result.met_budget);
        assert_eq!(outcome.result.quality, 65);
        assert_eq!(outcome.output, dir.path().join("big_optimized.jpg"));
        assert!(outcome.output.exists());
    }

    #[test]
    fn test_run_with_max_width() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.png");
        write_png(&input, 200, 100);

        let args = parse(&[input.to_str().unwrap(), "--max-width", "100"]);
        let outcome = run(&args).unwrap();
        assert_eq!((outcome.result.width, outcome.result.height), (100, 50));
    }

    #[test]
    fn test_run_reports_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.jpg");
        fs::write(&input, b"definitely not an image").unwrap();

        let args = parse(&[input.to_str().unwrap()]);
        let err = run(&args).err().unwrap();
        assert!(err.to_string().starts_with("Failed to decode"));
    }

    #[test]
    fn test_run_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.png");
        let args = parse(&[input.to_str().unwrap()]);
        assert!(run(&args).is_err());
    }
}
