//! Stand-in collaborators: a texture loader with frame latency and a scene
//! that only counts.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crossbeam_channel::Sender;
use rustc_hash::{FxHashMap, FxHashSet};
use skycube_pyramid::{
    TextureEvent, TextureHandle, TextureOutcome, TextureStatus, TextureStore, Tile, TileAddress,
    TileScene,
};
use tracing::{debug, trace};

#[derive(Default)]
struct Requests {
    queue: VecDeque<(u64, TileAddress)>,
    in_flight: FxHashSet<TileAddress>,
    verdicts: FxHashMap<TileAddress, TextureOutcome>,
    frame: u64,
}

/// Store half: records requests and answers repeated queries from the
/// verdicts already sent.
pub struct SimulatedTextureStore {
    requests: Rc<RefCell<Requests>>,
    latency: u64,
}

/// Loader half: answers requests once they are `latency` frames old.
pub struct SimulatedLoader {
    requests: Rc<RefCell<Requests>>,
    events: Sender<TextureEvent>,
    failure_every: u32,
    answered: u64,
}

/// Build a linked store and loader. Verdicts are sent on `events`.
pub fn simulated_textures(
    latency_frames: u32,
    failure_every: u32,
    events: Sender<TextureEvent>,
) -> (SimulatedTextureStore, SimulatedLoader) {
    let requests = Rc::new(RefCell::new(Requests::default()));
    (
        SimulatedTextureStore {
            requests: Rc::clone(&requests),
            latency: u64::from(latency_frames),
        },
        SimulatedLoader {
            requests,
            events,
            failure_every,
            answered: 0,
        },
    )
}

impl TextureStore for SimulatedTextureStore {
    fn query(&mut self, address: TileAddress) -> TextureStatus {
        let mut requests = self.requests.borrow_mut();
        match requests.verdicts.get(&address) {
            Some(TextureOutcome::Ready(handle)) => return TextureStatus::Ready(*handle),
            Some(TextureOutcome::Failed(_)) => return TextureStatus::Failed,
            None => {}
        }
        if requests.in_flight.insert(address) {
            let due = requests.frame + self.latency;
            requests.queue.push_back((due, address));
            trace!("Queued texture {address} for frame {due}");
        }
        TextureStatus::Pending
    }
}

impl SimulatedLoader {
    /// Advance to `frame` and send every verdict that is due.
    pub fn tick(&mut self, frame: u64) -> usize {
        let mut requests = self.requests.borrow_mut();
        requests.frame = frame;
        let mut sent = 0;
        while let Some(&(due, address)) = requests.queue.front() {
            if due > frame {
                break;
            }
            requests.queue.pop_front();
            requests.in_flight.remove(&address);
            self.answered += 1;
            let outcome = if self.failure_every > 0 && self.answered % u64::from(self.failure_every) == 0 {
                TextureOutcome::Failed(format!("simulated failure #{}", self.answered))
            } else {
                TextureOutcome::Ready(TextureHandle(self.answered))
            };
            requests.verdicts.insert(address, outcome.clone());
            if self.events.send(TextureEvent { address, outcome }).is_err() {
                debug!("Texture receiver gone, dropping verdicts");
                requests.queue.clear();
                requests.in_flight.clear();
                break;
            }
            sent += 1;
        }
        sent
    }

    /// Requests not answered yet.
    pub fn outstanding(&self) -> usize {
        self.requests.borrow().queue.len()
    }
}

/// Scene that tracks the draw set size and logs changes.
#[derive(Default)]
pub struct CountingScene {
    pub registered: usize,
    pub drawn: usize,
    pub presented: u64,
}

impl TileScene for CountingScene {
    fn register(&mut self, tile: &Tile) {
        self.registered += 1;
        trace!("Registered tile {}", tile.name());
    }

    fn add(&mut self, tile: &Tile) {
        self.drawn += 1;
        debug!("Drawing tile {} (order {})", tile.name(), tile.draw_order());
    }

    fn remove(&mut self, tile: &Tile) {
        self.drawn = self.drawn.saturating_sub(1);
        debug!("Hiding tile {}", tile.name());
    }

    fn present(&mut self, _view_projection: &glam::Mat4) {
        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycube_pyramid::{CubeFace, texture_channel};

    #[test]
    fn test_verdicts_arrive_after_latency() {
        let (sender, receiver) = texture_channel();
        let (mut store, mut loader) = simulated_textures(2, 0, sender);
        let address = TileAddress::new(0, CubeFace::Up, 0, 0);

        assert_eq!(store.query(address), TextureStatus::Pending);
        assert_eq!(loader.tick(1), 0);
        assert_eq!(loader.tick(2), 1);
        assert_eq!(loader.outstanding(), 0);

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.address, address);
        assert_eq!(event.outcome, TextureOutcome::Ready(TextureHandle(1)));
    }

    #[test]
    fn test_repeated_queries_return_the_sent_verdict() {
        let (sender, receiver) = texture_channel();
        let (mut store, mut loader) = simulated_textures(0, 2, sender);
        let address = TileAddress::new(1, CubeFace::Left, 1, 1);

        assert_eq!(store.query(address), TextureStatus::Pending);
        assert_eq!(store.query(address), TextureStatus::Pending);
        assert_eq!(loader.outstanding(), 1);
        assert_eq!(loader.tick(0), 1);

        assert_eq!(store.query(address), TextureStatus::Ready(TextureHandle(1)));
        assert_eq!(loader.tick(1), 0);
        assert_eq!(receiver.try_iter().count(), 1);

        let failing = TileAddress::new(1, CubeFace::Left, 0, 0);
        store.query(failing);
        loader.tick(2);
        assert_eq!(store.query(failing), TextureStatus::Failed);
        assert_eq!(loader.outstanding(), 0);
    }

    #[test]
    fn test_every_nth_verdict_fails() {
        let (sender, receiver) = texture_channel();
        let (mut store, mut loader) = simulated_textures(0, 2, sender);
        for face in CubeFace::ALL {
            store.query(TileAddress::new(0, face, 0, 0));
        }
        assert_eq!(loader.tick(0), 6);
        let failures = receiver
            .try_iter()
            .filter(|e| matches!(e.outcome, TextureOutcome::Failed(_)))
            .count();
        assert_eq!(failures, 3);
    }
}
