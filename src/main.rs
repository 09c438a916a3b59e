use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info, warn};
use pianoroll::{
    Args, EncodeOptions, decode, encode_with, encoded_path, import_midi_file, sample_path,
    write_midi_file,
};
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(dir) = args.out_dir.as_ref() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut failed = 0usize;
    for input in args.inputs.iter() {
        info!("Processing MIDI file: '{}'...", input.display());
        if let Err(e) = process(input, &args) {
            warn!("Skipping '{}': {:#}", input.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed..!", failed, args.inputs.len());
    }

    info!("Processed {} file(s), exiting..!", args.inputs.len());
    Ok(())
}

fn process(input: &Path, args: &Args) -> Result<()> {
    let performance = import_midi_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut encoding = encode_with(
        &performance,
        EncodeOptions {
            compress: args.compress,
            sample: args.sample,
            max_frames: args.max_frames,
        },
    )?;

    debug!(
        "Encoded '{}' into {:?} frames with attributes {:?}",
        input.display(),
        encoding.hold.shape(),
        encoding.attributes
    );

    if encoding.attributes.bpm.is_none()
        && let Some(bpm) = args.fallback_bpm
    {
        warn!(
            "No tempo event in '{}', using fallback of {} bpm..!",
            input.display(),
            bpm
        );
        encoding.attributes.bpm = Some(bpm);
    }

    let out_dir = args.out_dir.as_deref();

    if args.dump {
        let path = encoded_path(input, out_dir);
        let json = serde_json::to_string(&encoding)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote matrices to '{}'", path.display());
    }

    let hit = if args.hold_only {
        None
    } else {
        Some(&encoding.hit)
    };
    let track = decode(&encoding.hold, hit, &encoding.attributes)?;

    let path = sample_path(input, out_dir);
    write_midi_file(&path, &track, args.resolution)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote '{}'", path.display());

    Ok(())
}
