//! gesture_galaxy — interactive entry point.

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use gesture_galaxy::app::run;
use gesture_galaxy::config::Args;
use gesture_galaxy::visualizer::INSTRUCTIONS;

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing subscriber failed");

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Gesture Galaxy — Hand-Controlled Photo Space        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "webcam")]
    println!("  Mode: Webcam + MediaPipe hand landmarker");
    #[cfg(not(feature = "webcam"))]
    println!("  Mode: Keyboard simulation  (hold O / F / P; use --features webcam for a camera)");
    println!("  {}", INSTRUCTIONS);
    println!("  R restarts, Q quits.");
    println!();

    let cfg = args.into_config();

    println!("  Opening galaxy window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
