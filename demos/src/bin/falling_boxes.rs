//! Headless stack of falling boxes and circles landing on a floor.
//!
//! Usage:
//!   cargo run -p physprite-demos --bin falling_boxes
//!   cargo run -p physprite-demos --bin falling_boxes -- --count 12 --frames 240

use std::path::PathBuf;
use std::process::ExitCode;

use bevy::prelude::*;
use clap::Parser;

use physprite_demos::{headless_app, load_config, node_position, spawn_floor, spawn_sprite};
use physprite_physics::prelude::*;

#[derive(Parser)]
#[command(about = "Drop boxes and circles onto a static floor")]
struct Args {
    /// Number of falling bodies
    #[arg(long, default_value_t = 6)]
    count: u32,

    /// Frames to simulate
    #[arg(long, default_value_t = 180)]
    frames: u32,

    /// Physics config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("=== Falling Boxes ===\n");

    let mut app = headless_app(config);
    let Ok(floor) = spawn_floor(&mut app, -200.0) else {
        return ExitCode::FAILURE;
    };

    let mut bodies = Vec::new();
    for i in 0..args.count {
        let at = Vec2::new((i as f32 - args.count as f32 / 2.0) * 40.0, 40.0 * i as f32);
        let spawned = spawn_sprite(&mut app, at, |world, node| {
            let fixture = FixtureDef::new(1.0, 0.4, 0.2, true);
            if i % 2 == 0 {
                BodyBinding::create_box(world, node, Vec2::splat(24.0), BodyKind::Dynamic, fixture)
            } else {
                BodyBinding::create_circle(world, node, 12.0, BodyKind::Dynamic, fixture)
            }
        });
        match spawned {
            Ok(node) => bodies.push(node),
            Err(err) => eprintln!("skipping body {i}: {err}"),
        }
    }

    for frame in 0..args.frames {
        app.update();
        if frame % 30 == 0 {
            let world = app.world().resource::<PhysicsWorld>();
            let mut touching = 0;
            if let Some(b) = app.world().get::<BodyBinding>(floor) {
                b.contact(world, |_| touching += 1);
            }
            println!("  frame {frame:4}: {touching} bodies on the floor");
        }
    }

    println!("\n=== Final positions ===");
    for node in &bodies {
        if let Some(p) = node_position(&app, *node) {
            println!("  {node}: ({:+8.2}, {:+8.2})", p.x, p.y);
        }
    }
    ExitCode::SUCCESS
}
