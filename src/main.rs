use clap::Parser;
use pathtracer::{config, renderer::Renderer};
use std::process::ExitCode;

/// An offline Monte Carlo path tracer: reads a scene description and writes
/// a sequence of progressively-refined PNG frames.
#[derive(Parser, Debug)]
#[command(name = "pathtracer", version, about)]
struct Cli {
    /// Path to the scene configuration file.
    config_path: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let scene = match config::load(&cli.config_path) {
        Ok(scene) => scene,
        Err(err) => {
            println!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut renderer = Renderer::new(&scene);
    if let Err(err) = renderer.render(".") {
        println!("error: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
