//! phrasekit CLI: headless playback and WAV export.
//!
//! Usage:
//!   pk-cli [bank.pkb] [--demo] [--bpm N] [--seconds N] [--edit]
//!          [--wav output.wav] [--save bank.pkb]
//!
//! Without a bank (or with `--demo`) the built-in demo song is used.
//! Set `RUST_LOG=debug` for engine logging.

use pk_master::{demo_edits, Controller, ControllerConfig};
use std::io::Write;
use std::{env, fs};

const SAMPLE_RATE: u32 = 48_000;

struct Args {
    bank: Option<String>,
    demo: bool,
    bpm: f64,
    seconds: u32,
    editing: bool,
    wav: Option<String>,
    save: Option<String>,
}

fn usage() -> ! {
    eprintln!(
        "Usage: pk-cli [bank.pkb] [--demo] [--bpm N] [--seconds N] [--edit] \
         [--wav output.wav] [--save bank.pkb]"
    );
    std::process::exit(1);
}

fn parse_args() -> Args {
    let mut args = Args {
        bank: None,
        demo: false,
        bpm: 120.0,
        seconds: 30,
        editing: false,
        wav: None,
        save: None,
    };
    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--demo" => args.demo = true,
            "--edit" => args.editing = true,
            "--bpm" => args.bpm = it.next().and_then(|v| v.parse().ok()).unwrap_or_else(|| usage()),
            "--seconds" => {
                args.seconds = it.next().and_then(|v| v.parse().ok()).unwrap_or_else(|| usage())
            }
            "--wav" => args.wav = Some(it.next().unwrap_or_else(|| usage())),
            "--save" => args.save = Some(it.next().unwrap_or_else(|| usage())),
            "-h" | "--help" => usage(),
            s if s.starts_with('-') => usage(),
            _ => args.bank = Some(arg),
        }
    }
    args
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let mut ctrl = Controller::new(ControllerConfig {
        bpm: args.bpm,
        editing: args.editing,
        ..Default::default()
    });

    match (&args.bank, args.demo) {
        (Some(path), false) => {
            let data = fs::read(path).unwrap_or_else(|e| {
                eprintln!("Failed to read {}: {}", path, e);
                std::process::exit(1);
            });
            ctrl.load_bank(&data).unwrap_or_else(|e| {
                eprintln!("Failed to load bank: {}", e);
                std::process::exit(1);
            });
        }
        _ => {
            log::info!("building demo song");
            for edit in demo_edits() {
                ctrl.apply_edit(edit);
            }
        }
    }

    print_summary(&ctrl);

    if let Some(path) = &args.save {
        let bytes = ctrl.save_bank().unwrap_or_else(|e| {
            eprintln!("Failed to encode bank: {}", e);
            std::process::exit(1);
        });
        write_file(path, &bytes);
        println!("Saved bank to {}", path);
    }

    match &args.wav {
        Some(path) => render_to_wav(&ctrl, path, args.seconds),
        None => play_audio(&mut ctrl, args.seconds),
    }
}

fn print_summary(ctrl: &Controller) {
    let seq = ctrl.sequencer();
    println!("Tracks:   {}", seq.num_tracks());
    println!("Tempo:    {} BPM", ctrl.config().bpm);
    println!("Mode:     {}", if ctrl.config().editing { "sequence" } else { "song" });
    for (t, k) in seq.kernels().iter().enumerate() {
        let track = (b'A' + t as u8) as char;
        println!(
            "  {}: song {:>2}..{:<2} {:<4} | {} ppqn | delay {}",
            track,
            k.song_begin() + 1,
            k.song_end() + 1,
            k.run_mode_song().short_name(),
            k.pulses_per_step(),
            k.delay(),
        );
    }
    println!();
}

fn play_audio(ctrl: &mut Controller, seconds: u32) {
    ctrl.play();
    println!("Playing...");
    println!();

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(seconds as u64);
    while ctrl.is_playing() && std::time::Instant::now() < deadline {
        let positions: Vec<String> = (0..ctrl.sequencer().num_tracks())
            .filter_map(|t| ctrl.position(t))
            .map(|p| format!("Phr {:02} Seq {:02} Stp {:02}", p.phrase + 1, p.seq + 1, p.step + 1))
            .collect();
        if !positions.is_empty() {
            print!("\r{}", positions.join(" | "));
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    ctrl.stop();

    println!("\rDone.          ");
}

fn render_to_wav(ctrl: &Controller, path: &str, seconds: u32) {
    println!("Rendering {} s to {} at {} Hz...", seconds, path, SAMPLE_RATE);

    let wav = ctrl.render_to_wav(SAMPLE_RATE, seconds).unwrap_or_else(|e| {
        eprintln!("Failed to encode WAV: {}", e);
        std::process::exit(1);
    });
    println!("Rendered {} bytes", wav.len());
    write_file(path, &wav);

    println!("Done.");
}

fn write_file(path: &str, bytes: &[u8]) {
    fs::write(path, bytes).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        std::process::exit(1);
    });
}
