use bevy::prelude::*;
use clap::Parser;

use neon_survivor::game::{self, cli::Cli};

fn main() -> AppExit {
    game::run(Cli::parse())
}
