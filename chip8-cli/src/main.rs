//! Entrypoint for CLI
mod app;
mod clock;
mod config;
mod error;

use std::{env, error::Error};

use chip8::IMPL_VERSION;
use log::{error, info};

use self::{app::Runner, config::RunConfig, error::AppError};

static USAGE: &str = r#"
usage: chip8 run ROM [CONFIG]

commands:
    run     Run the target ROM file headless, printing the display when it stops

config:
    Optional YAML file with run settings:
        ticks_per_frame, frame_rate, max_frames, seed,
        on_error (halt|ignore), bell, show_display,
        keys: [{ frame, key, pressed }]

examples:
    chip8 run maze.rom
    chip8 run breakout.rom breakout.yaml
"#;

fn run_rom(filepath: &str, config_path: Option<&str>) -> Result<(), AppError> {
    let config = match config_path {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    let show_display = config.show_display;

    let mut runner = Runner::new(config);
    runner.load_rom(filepath)?;

    info!("running {filepath}");
    let result = runner.run();

    if show_display {
        println!("{}", runner.vm().dump_display()?);
    }

    if result.is_err() {
        info!("halted at frame {}", runner.frame());
    }

    result
}

/// Logs a failed run once and maps it to the process exit code.
fn exit_code(result: Result<(), AppError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("{err}");
            1
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    match parse_args() {
        Some(Cmd::Run { filepath, config }) => {
            let code = exit_code(run_rom(&filepath, config.as_deref()));
            if code != 0 {
                std::process::exit(code)
            }
        }
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next() {
        Some(cmd) => match cmd.as_str() {
            "run" => Some(Cmd::Run {
                filepath: consume_arg(&mut args)?,
                config: consume_arg(&mut args),
            }),
            _ => None,
        },
        None => None,
    }
}

/// Consumes the next argument, if there is one.
fn consume_arg(mut args: impl Iterator<Item = String>) -> Option<String> {
    args.next()
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run {
        filepath: String,
        config: Option<String>,
    },
}
