//! Headless pulley: two weights on one rope, with a configurable ratio.
//!
//! Usage:
//!   cargo run -p physprite-demos --bin pulley -- --ratio 2.0

use std::process::ExitCode;

use bevy::prelude::*;
use clap::Parser;

use physprite_demos::{headless_app, spawn_joint, spawn_sprite};
use physprite_physics::prelude::*;

#[derive(Parser)]
#[command(about = "Two bodies hanging from a pulley")]
struct Args {
    /// Rope ratio: length_a + ratio * length_b stays constant
    #[arg(long, default_value_t = 1.0)]
    ratio: f32,

    /// Density of the right-hand weight
    #[arg(long, default_value_t = 2.0)]
    density: f32,

    /// Frames to simulate
    #[arg(long, default_value_t = 120)]
    frames: u32,
}

fn main() -> ExitCode {
    let args = Args::parse();
    println!("=== Pulley (ratio {}) ===\n", args.ratio);

    let mut app = headless_app(PhysicsConfig::default());
    let left = spawn_sprite(&mut app, Vec2::new(-96.0, 0.0), |world, node| {
        BodyBinding::create_box(
            world,
            node,
            Vec2::splat(32.0),
            BodyKind::Dynamic,
            FixtureDef::default(),
        )
    });
    let right = spawn_sprite(&mut app, Vec2::new(96.0, 0.0), |world, node| {
        let fixture = FixtureDef {
            density: args.density,
            ..FixtureDef::default()
        };
        BodyBinding::create_box(world, node, Vec2::splat(32.0), BodyKind::Dynamic, fixture)
    });
    let (Ok(left), Ok(right)) = (left, right) else {
        return ExitCode::FAILURE;
    };

    let ratio = args.ratio;
    let pulley = spawn_joint(&mut app, left, right, |world, e, a, b| {
        PulleyJoint::new(
            world,
            e,
            a,
            b,
            Vec2::new(-96.0, 160.0),
            Vec2::new(96.0, 160.0),
            ratio,
        )
    });
    let pulley = match pulley {
        Ok(pulley) => pulley,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    for frame in 0..args.frames {
        app.update();
        if frame % 20 != 0 {
            continue;
        }
        let world = app.world().resource::<PhysicsWorld>();
        let Some(joint) = app.world().get::<PulleyJoint>(pulley) else {
            break;
        };
        if let (Some(la), Some(lb)) = (joint.length_a(world), joint.length_b(world)) {
            println!(
                "  frame {frame:4}: length_a={la:7.2} length_b={lb:7.2} rope={:7.2}",
                la + ratio * lb
            );
        }
    }

    let world = app.world().resource::<PhysicsWorld>();
    for segment in world.joint_segments() {
        println!("\n{:?} polyline: {:?}", segment.kind, segment.points);
    }
    ExitCode::SUCCESS
}
