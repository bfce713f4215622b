/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Main executable for simex-rs

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    log::debug!("simex-rs v{}", simex_rs::VERSION);
    let status = simex_rs::cli::run(std::env::args().skip(1))?;
    std::process::exit(status)
}
