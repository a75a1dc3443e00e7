mod anim;
mod app;
mod burst;
mod config;
mod director;
mod input;
mod model;
mod render;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
