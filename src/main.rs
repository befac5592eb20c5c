// src/main.rs

use kobo_dash::{cli, runner};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let params = cli::parse()?;
    runner::run(&params)
}
