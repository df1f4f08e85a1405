//! # Two-Thread Demo
//!
//! A control thread animates a node and an image while an execution thread
//! applies the writes once per frame and "renders" what it sees.
//!
//! ```bash
//! RUST_LOG=info ./two_thread_demo
//! RUST_LOG=tandem_core=trace ./two_thread_demo tandem.toml
//! ```

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tandem::core::{TandemConfig, Vec3};
use tandem::{ImageAttributes, NodeAttributes, Runtime, ALL_RENDER_SETS};

/// Frames the control thread animates.
const FRAMES: u16 = 120;

/// Simulated frame time of the execution thread.
const FRAME_TIME: Duration = Duration::from_millis(2);

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => TandemConfig::load(&path)?,
        None => TandemConfig::default(),
    };

    let runtime = Runtime::start(&config);
    let node = NodeAttributes::new(runtime.link());
    let image = ImageAttributes::new(runtime.link(), "textures/token.png");
    let frame_sets = vec![ALL_RENDER_SETS.to_owned()];
    let done = AtomicBool::new(false);

    let (frames, drawn) = thread::scope(|scope| -> Result<(u32, u32), Box<dyn Error>> {
        let executor = runtime.executor();
        let (node, image, done, frame_sets) = (&node, &image, &done, &frame_sets);

        let worker = scope.spawn(move || -> Result<(u32, u32), tandem::core::PoolError> {
            let (mut frames, mut drawn) = (0, 0);
            loop {
                let finished = done.load(Ordering::Acquire);
                executor.drain()?;
                frames += 1;

                if image.collectable(frame_sets) {
                    drawn += 1;
                }
                if node.rotation.changed() {
                    tracing::trace!(rotation = node.rotation.execute_get(), "rebuild transform");
                    node.rotation.clear_changed();
                }

                if finished && executor.pending() == 0 {
                    return Ok((frames, drawn));
                }
                thread::sleep(FRAME_TIME);
            }
        });

        for frame in 0..FRAMES {
            let t = f32::from(frame) / f32::from(FRAMES);
            node.rotation.set(t * 360.0)?;
            node.position.set(Vec3::new(t * 100.0, 0.0, 0.0))?;
            image.base.alpha.set(1.0 - t)?;

            if frame == FRAMES / 2 {
                image.base.render_set.remove(&ALL_RENDER_SETS.to_owned())?;
                image.base.render_set.push("minimap".to_owned())?;
                image.base.visible_state.set("hidden".to_owned())?;
            }
            thread::sleep(FRAME_TIME / 2);
        }
        done.store(true, Ordering::Release);

        let counts = worker
            .join()
            .map_err(|_| "execution thread panicked")??;
        Ok(counts)
    })?;

    tracing::info!(frames, drawn, "execution loop finished");
    println!("{}", node.describe());
    println!(
        "image: alpha={:.2} render_set={:?} state={:?}",
        image.base.alpha.execute_get(),
        image.base.render_set.execute_get(),
        image.base.visible_state.execute_get()
    );

    let stats = runtime.stats()?;
    let report = runtime.shutdown()?;
    println!(
        "pool: allocated={} reused={} peak={} flushed_at_shutdown={}",
        stats.allocated, stats.reused, stats.peak_outstanding, report.dispatched
    );
    Ok(())
}
