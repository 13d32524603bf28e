//! mechtrace CLI - Render figures and animations from simulation artifacts.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};
use std::time::Instant;

use mechtrace::{
    animation::{AnimationPlayer, DEFAULT_ANIMATION_SIZE, GifEncoder},
    scene::Scene,
    schema::Preset,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--example" => {
            let preset = args.get(2).map(|s| parse_preset(s)).unwrap_or(Preset::Chain);
            print_example_config(preset);
        }
        "--list" => {
            for preset in Preset::ALL {
                println!("{}", preset);
            }
        }
        "--preset" => {
            let Some(name) = args.get(2) else {
                print_usage(&args[0]);
                std::process::exit(1);
            };
            let dir = args.get(3).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            let scene = Scene::from_preset(parse_preset(name), dir).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            run_scene(&scene);
        }
        "--replay" => {
            let (Some(archive), Some(output)) = (args.get(2), args.get(3)) else {
                print_usage(&args[0]);
                std::process::exit(1);
            };
            replay(Path::new(archive), Path::new(output));
        }
        path => {
            let scene = Scene::from_file(path).unwrap_or_else(|e| {
                eprintln!("Error loading scene: {}", e);
                std::process::exit(1);
            });
            run_scene(&scene);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <scene.json>", program);
    eprintln!("       {} --preset <name> [dir]", program);
    eprintln!("       {} --replay <archive.mtra> <out.gif>", program);
    eprintln!();
    eprintln!("Render figures and animations from precomputed simulation output.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  scene.json  Scene configuration; paths resolve against its directory");
    eprintln!("  --preset    Built-in scene, reading artifacts from dir (default: .)");
    eprintln!("  --replay    Rasterize a recorded .mtra archive into a GIF");
    eprintln!("  --list      List built-in presets");
    eprintln!();
    eprintln!("Example configuration is generated with --example [preset].");
}

fn parse_preset(name: &str) -> Preset {
    Preset::from_name(name).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Available presets: {}", Preset::ALL.map(|p| p.name()).join(", "));
        std::process::exit(1);
    })
}

fn run_scene(scene: &Scene) {
    let config = scene.config();
    println!("mechtrace: {}", config.name);
    println!("==========={}", "=".repeat(config.name.len()));
    println!("Artifacts: {}", scene.base_dir().display());
    println!("Views: {}", config.views.len());
    if let Some(animation) = &config.animation {
        println!(
            "Animation: {} (stride {}, {} fps)",
            animation.output.display(),
            animation.settings.stride,
            animation.settings.fps
        );
    }
    println!();

    let start = Instant::now();
    match scene.run() {
        Ok(report) => {
            print!("{}", report);
            println!();
            println!("Time: {:.2}s", start.elapsed().as_secs_f32());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn replay(archive: &Path, output: &Path) {
    let mut player = AnimationPlayer::open(archive).unwrap_or_else(|e| {
        eprintln!("Error opening archive: {}", e);
        std::process::exit(1);
    });
    println!(
        "Replaying {} frames at {} fps from {}",
        player.frame_count(),
        player.fps(),
        archive.display()
    );

    let mut encoder = GifEncoder::new(output, DEFAULT_ANIMATION_SIZE);
    match player.replay(&mut encoder) {
        Ok(stats) => println!("{}", stats),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_example_config(preset: Preset) {
    println!("Example configuration ({}.json):", preset);
    match serde_json::to_string_pretty(&preset.scene()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        }
    }
}
