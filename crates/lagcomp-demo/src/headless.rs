use std::thread;
use std::time::Duration;

use anyhow::Result;

use lagcomp::MoveKeys;

use crate::scene::DemoScene;

/// Player 1 walks right and player 2 walks left for the first 40% of the
/// session, then both stand still while the views settle.
pub fn run(scene: &mut DemoScene, duration: Duration) -> Result<()> {
    let walk_until = duration.as_secs_f64() * 0.4;
    let end = duration.as_secs_f64();
    let mut walking = true;

    scene.hold(0, MoveKeys::POSITIVE);
    scene.hold(1, MoveKeys::NEGATIVE);
    log::info!("scripted session for {:.1}s", end);

    while scene.elapsed_secs() < end {
        if walking && scene.elapsed_secs() >= walk_until {
            scene.hold(0, MoveKeys::empty());
            scene.hold(1, MoveKeys::empty());
            walking = false;
            log::info!("players released their keys");
        }

        if scene.tick()? {
            log_positions(scene);
        }
        thread::sleep(Duration::from_millis(1));
    }

    for (index, player) in scene.players.iter().enumerate() {
        log::info!(
            "player {} finished with {} unacknowledged inputs",
            index + 1,
            player.client.pending_input_count()
        );
    }
    Ok(())
}

fn log_positions(scene: &DemoScene) {
    let view = scene.view();
    let tracks: Vec<String> = (0..view.viewers() as u32)
        .map(|viewer| {
            let positions: Vec<String> = view
                .track(viewer)
                .iter()
                .map(|p| p.map_or_else(|| "  -  ".to_string(), |p| format!("{:+.2}", p)))
                .collect();
            format!("{}[{}]", viewer_label(viewer), positions.join(" "))
        })
        .collect();
    log::info!("t={:.2}s {}", scene.elapsed_secs(), tracks.join(" | "));
}

pub fn viewer_label(viewer: u32) -> String {
    match viewer {
        0 => "server".to_string(),
        n => format!("player {}", n),
    }
}
