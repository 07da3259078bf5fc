use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use faceswap_core::compositing::domain::face_compositor::FaceCompositor;
use faceswap_core::compositing::infrastructure::onnx_inswapper::OnnxInswapper;
use faceswap_core::detection::domain::face_detector::FaceDetector;
use faceswap_core::detection::infrastructure::model_resolver;
use faceswap_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use faceswap_core::pipeline::face_selector::TargetSelection;
use faceswap_core::pipeline::inspect_faces_use_case::InspectFacesUseCase;
use faceswap_core::pipeline::swap_image_use_case::SwapImageUseCase;
use faceswap_core::pipeline::swap_video_use_case::SwapVideoUseCase;
use faceswap_core::shared::constants::{
    ATTRIBUTE_MODEL_NAME, ATTRIBUTE_MODEL_URL, DEFAULT_CONFIDENCE, DETECTION_MODEL_NAME,
    DETECTION_MODEL_URL, IMAGE_EXTENSIONS, RECOGNITION_MODEL_NAME, RECOGNITION_MODEL_URL,
    SWAPPER_MODEL_NAME, SWAPPER_MODEL_URL,
};
use faceswap_core::shared::frame::Frame;
use faceswap_core::video::domain::image_writer::ImageWriter;
use faceswap_core::video::domain::video_reader::VideoReader;
use faceswap_core::video::domain::video_writer::VideoWriter;
use faceswap_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use faceswap_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use faceswap_core::video::infrastructure::image_file_reader::ImageFileReader;
use faceswap_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Face swapping for videos and images.
#[derive(Parser)]
#[command(name = "faceswap")]
struct Cli {
    /// Target video or image file.
    input: PathBuf,

    /// Output file (required unless --info is used).
    output: Option<PathBuf>,

    /// Reference image providing the source face (required unless --info).
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Index of the face to take from the reference image.
    #[arg(long, default_value = "0")]
    source_index: usize,

    /// Swap only the target face at this index instead of all faces.
    #[arg(long)]
    target_index: Option<usize>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f32,

    /// Print face metadata for the input as JSON instead of swapping.
    #[arg(long)]
    info: bool,

    /// With --info: also write an annotated copy showing detected faces.
    #[arg(long)]
    annotate: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let detector = build_analyzer(cli.confidence)?;

    if cli.info {
        return run_info(&cli.input, cli.annotate.as_deref(), detector);
    }

    let compositor = build_swapper()?;
    let reference = load_reference(cli.reference.as_ref().unwrap())?;
    let selection = match cli.target_index {
        Some(index) => TargetSelection::Single(index),
        None => TargetSelection::All,
    };
    let output = cli.output.as_ref().unwrap();

    if is_image(&cli.input) {
        run_image_swap(
            &cli.input,
            output,
            &reference,
            detector,
            compositor,
            cli.source_index,
            selection,
        )
    } else {
        run_video_swap(
            &cli.input,
            output,
            &reference,
            detector,
            compositor,
            cli.source_index,
            selection,
        )
    }
}

fn run_info(
    input: &Path,
    annotate: Option<&Path>,
    detector: Box<dyn FaceDetector>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Works for videos too: inspection reads the first frame.
    let reader = open_reader(input);
    let image_writer: Box<dyn ImageWriter> = Box::new(ImageFileWriter::new());

    let mut use_case = InspectFacesUseCase::new(reader, detector, image_writer);
    let infos = use_case.execute(input, annotate)?;
    println!("{}", serde_json::to_string_pretty(&infos)?);
    if let Some(path) = annotate {
        log::info!("Annotated copy written to {}", path.display());
    }
    Ok(())
}

fn run_image_swap(
    input: &Path,
    output: &Path,
    reference: &Frame,
    detector: Box<dyn FaceDetector>,
    compositor: Box<dyn FaceCompositor>,
    source_index: usize,
    selection: TargetSelection,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn VideoReader> = Box::new(ImageFileReader::new());
    let image_writer: Box<dyn ImageWriter> = Box::new(ImageFileWriter::new());

    let mut use_case = SwapImageUseCase::new(
        reader,
        image_writer,
        detector,
        compositor,
        source_index,
        selection,
    );
    use_case.execute(reference, input, output)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_video_swap(
    input: &Path,
    output: &Path,
    reference: &Frame,
    detector: Box<dyn FaceDetector>,
    compositor: Box<dyn FaceCompositor>,
    source_index: usize,
    selection: TargetSelection,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let writer: Box<dyn VideoWriter> = Box::new(FfmpegWriter::new());

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rProcessing frame {current}/{total}");
        true
    });

    let mut use_case = SwapVideoUseCase::new(
        reader,
        writer,
        detector,
        compositor,
        source_index,
        selection,
        Some(progress),
        None,
    );
    use_case.execute(reference, input, output)?;
    eprintln!();
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn load_reference(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let mut reader = ImageFileReader::new();
    reader.open(path)?;
    let frame = reader
        .frames()
        .next()
        .ok_or_else(|| format!("No image data in {}", path.display()))??;
    reader.close();
    Ok(frame)
}

fn build_analyzer(confidence: f32) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let detection_path = resolve_model(DETECTION_MODEL_NAME, DETECTION_MODEL_URL)?;
    let recognition_path = resolve_model(RECOGNITION_MODEL_NAME, RECOGNITION_MODEL_URL)?;
    // Attribute model failures are tolerable: ages and genders are
    // diagnostics, not swap inputs.
    let attribute_path = resolve_model(ATTRIBUTE_MODEL_NAME, ATTRIBUTE_MODEL_URL)
        .map_err(|e| log::warn!("Attribute model unavailable: {e}"))
        .ok();

    let analyzer = OnnxFaceAnalyzer::new(
        &detection_path,
        &recognition_path,
        attribute_path.as_deref(),
        confidence,
    )?;
    Ok(Box::new(analyzer))
}

fn build_swapper() -> Result<Box<dyn FaceCompositor>, Box<dyn std::error::Error>> {
    let swapper_path = resolve_model(SWAPPER_MODEL_NAME, SWAPPER_MODEL_URL)?;
    Ok(Box::new(OnnxInswapper::new(&swapper_path)?))
}

fn resolve_model(name: &str, url: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let path = model_resolver::resolve(name, url, None, Some(Box::new(download_progress)))?;
    eprintln!();
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.info {
        if cli.reference.is_some() {
            return Err("--reference is not used with --info".into());
        }
        return Ok(());
    }
    if cli.annotate.is_some() {
        return Err("--annotate requires --info".into());
    }
    let reference = cli
        .reference
        .as_ref()
        .ok_or("A reference image is required (--reference)")?;
    if !reference.exists() {
        return Err(format!("Reference image not found: {}", reference.display()).into());
    }
    if cli.output.is_none() {
        return Err("Output file is required unless --info is used".into());
    }
    Ok(())
}

fn open_reader(input: &Path) -> Box<dyn VideoReader> {
    if is_image(input) {
        Box::new(ImageFileReader::new())
    } else {
        Box::new(FfmpegReader::new())
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
