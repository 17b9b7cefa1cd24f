use std::path::PathBuf;
use std::time::Instant;

use silk_tts::{
    engines::onnx::{OnnxEngine, OnnxModelParams},
    StitchConfig, Stitcher, SynthesisEngine,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let model_path = PathBuf::from(args.next().unwrap_or_else(|| "models/ferrari".to_string()));
    let config = match args.next() {
        Some(path) => StitchConfig::from_json_file(&PathBuf::from(path))?,
        None => StitchConfig::default(),
    };

    let mut engine = OnnxEngine::new();
    let load_start = Instant::now();
    engine.load_model_with_params(&model_path, OnnxModelParams::default())?;
    println!("Model loaded in {:.2?}", load_start.elapsed());

    let text = "[warm] Hello. [pause:0.5] I mean... [soft] I am so glad we are doing this. \
                [pause:0.3] It feels... [gentle] real, doesn't it?";
    println!("Input: {text}");

    let stitcher = Stitcher::new(config);
    let output = stitcher.render(&mut engine, text)?;

    println!(
        "Stitched {} segments: {:.2}s audio in {:.2?} (RTF {:.3})",
        output.segments.len(),
        output.audio.duration_secs(),
        output.elapsed,
        output.real_time_factor()
    );
    for failure in &output.failures {
        println!("  skipped: {failure}");
    }

    output.audio.write_wav(&PathBuf::from("stitched.wav"))?;
    println!("Saved to stitched.wav");

    engine.unload_model();
    Ok(())
}
