#!/usr/bin/env run-cargo-script
//! ```cargo
//! [dependencies]
//! yansi = "1.0"
//! ```
extern crate yansi;
use std::{process::Command, time::Instant};

fn main() {
    let mut simulate = false;
    let mut run_tests = true;

    for arg in std::env::args() {
        if &arg == "--simulate" {
            simulate = true;
        }
        if &arg == "--no-test" {
            run_tests = false;
        }
    }

    macro_rules! run_command {
        ($cmd:expr) => {
            let mut command = command!($cmd);
            if simulate {
            } else {
                let mut child = command.spawn().unwrap();
                let status = child.wait().unwrap();
                if !status.success() {
                    print!("> {}", yansi::Paint::red("qualify terminates due to error"));
                    std::process::exit(-1);
                }
            }
        };
    }

    macro_rules! command {
        ($cmd:expr) => {{
            if simulate {
                println!("{}", yansi::Paint::red($cmd));
            } else {
                print!("\n> {}\n", yansi::Paint::yellow($cmd));
            }
            let mut chips = $cmd.split(' ');
            let mut command = Command::new(chips.next().unwrap());
            for chip in chips {
                command.arg(chip);
            }
            command
        }};
    }

    if simulate {
        println!("Qualify hsmsconnect  -- SIMULATION --");
    } else {
        println!("Qualify hsmsconnect");
    }

    // Format
    run_command!("cargo fmt");

    // Build in important variants
    run_command!("cargo build");
    run_command!("cargo build --release");

    // Clippy
    run_command!("cargo +nightly clippy --all-targets -- -D warnings");

    // doc
    run_command!("cargo +nightly doc --no-deps --open");

    if run_tests {
        // Run tests in important variants
        let start = Instant::now();
        run_command!("cargo test --release");
        run_command!("cargo test");

        if !simulate {
            println!(
                "Two test runs together took {:?}",
                Instant::now().duration_since(start)
            );
        }

        // check git status
        if !simulate {
            let mut cmd = command!("git status -s");
            let child = cmd.stdout(std::process::Stdio::piped()).spawn().unwrap();
            let output = child.wait_with_output().unwrap();
            if output.stdout.len() > 0 {
                print!("> {}", yansi::Paint::red("there are unsubmitted files"));
                std::process::exit(-1);
            }

            println!("\n> all done 😀  Looks like you're ready to cargo publish?");
        }
    }
}
