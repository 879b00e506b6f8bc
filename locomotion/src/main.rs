//! Headless locomotion run: one avatar on a ground plane walks, sprints, jumps, sits down
//! in a chair, stands up again and waves. Set `RUST_LOG=debug` to follow state changes.

use std::process::ExitCode;

use locomotion::{
    Action, AvatarConfig, AvatarEvent, ClipLibrary, ColliderShapeDef, Iso, ManualClock,
    RapierWorld, Seat, SeatKind, Vec3, World, WorldConfig, WorldStaticDef,
};

const FRAME_DT: f32 = 1.0 / 60.0;
const FRAMES: u32 = 900;
const SNAPSHOT_EVERY: u32 = 60;

/// (frame, action name, pressed)
const SCRIPT: &[(u32, &str, bool)] = &[
    (10, "up", true),
    (70, "run", true),
    (130, "run", false),
    (150, "up", false),
    (200, "jump", true),
    (201, "jump", false),
    (300, "enter", true),
    (301, "enter", false),
    (600, "enter", true),
    (601, "enter", false),
    (720, "wave", true),
    (721, "wave", false),
    (840, "quit-emote", true),
    (841, "quit-emote", false),
];

fn level() -> Vec<WorldStaticDef> {
    vec![
        WorldStaticDef::new(
            0,
            Vec3::zeros(),
            ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        ),
        WorldStaticDef::new(
            1,
            Vec3::new(4.0, 0.5, 10.0),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(1.0, 0.5, 1.0),
            },
        ),
    ]
}

fn chair() -> Seat {
    Seat::new(
        SeatKind::Primary,
        Iso::translation(0.0, 0.0, 9.0),
        Iso::translation(0.0, 0.45, 0.0),
        vec![
            Iso::translation(0.0, 0.0, -1.0),
            Iso::translation(1.0, 0.0, 0.0),
        ],
    )
}

fn main() -> ExitCode {
    env_logger::init();

    let config = WorldConfig::default();
    let physics = RapierWorld::build(config.gravity, level());
    let mut world = match World::new(physics, config) {
        Ok(world) => world,
        Err(err) => {
            log::error!("invalid world config: {err}");
            return ExitCode::FAILURE;
        }
    };
    world.add_seat(chair());

    let spawn = Vec3::new(0.0, AvatarConfig::default().ray_cast_length, 0.0);
    let avatar = match world.spawn_avatar(
        AvatarConfig::default(),
        Box::new(ClipLibrary::standard()),
        spawn,
    ) {
        Ok(id) => id,
        Err(err) => {
            log::error!("failed to spawn avatar: {err}");
            return ExitCode::FAILURE;
        }
    };
    world.set_view_vector(avatar, Vec3::z());

    let mut clock = ManualClock::new(FRAME_DT);
    for frame in 0..FRAMES {
        for &(_, name, pressed) in SCRIPT.iter().filter(|(at, _, _)| *at == frame) {
            match name.parse::<Action>() {
                Ok(action) => world.trigger_action(avatar, action, pressed),
                Err(err) => log::error!("script frame {frame}: {err}"),
            }
        }

        world.tick(&mut clock);

        for event in world.drain_events() {
            match event.event {
                AvatarEvent::SeatOccupancyChanged { seat, occupant } => {
                    log::info!("frame {frame}: {seat:?} occupant {occupant:?}");
                }
                AvatarEvent::Camera(request) => {
                    log::info!("frame {frame}: camera {request:?} for {}", event.avatar);
                }
                AvatarEvent::Respawned { position } => {
                    log::info!("frame {frame}: {} respawned at {position:?}", event.avatar);
                }
            }
        }

        if frame % SNAPSHOT_EVERY == 0 {
            for snapshot in world.snapshot() {
                log::info!(
                    "t={:.2}s {} {:?} pos=({:.2}, {:.2}, {:.2}) clip={}",
                    clock.elapsed,
                    snapshot.id,
                    snapshot.state,
                    snapshot.position.x,
                    snapshot.position.y,
                    snapshot.position.z,
                    snapshot.animation.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    ExitCode::SUCCESS
}
