use std::cell::RefCell;
use std::rc::Rc;

use lagcomp::{
    Client, ClientConfig, Clock, HeldKeys, MoveKeys, Server, ServerConfig, SharedSink,
    SystemClock,
};

use crate::view::TrackView;

pub const PLAYERS: usize = 2;

pub struct Player {
    pub client: Client,
    pub keys: HeldKeys,
}

/// One server and two clients sharing a wall clock and a track view.
pub struct DemoScene {
    clock: Rc<SystemClock>,
    pub server: Server,
    pub players: Vec<Player>,
    view: Rc<RefCell<TrackView>>,
}

impl DemoScene {
    pub fn new(server_config: ServerConfig, configs: [ClientConfig; PLAYERS]) -> lagcomp::Result<Self> {
        let clock = Rc::new(SystemClock::new());
        let view = Rc::new(RefCell::new(TrackView::new(PLAYERS)));
        let sink: SharedSink = view.clone();

        let mut server = Server::new(server_config, clock.clone(), sink.clone())?;

        let mut players = Vec::with_capacity(PLAYERS);
        for config in configs {
            let keys = HeldKeys::new();
            let mut client = Client::new(config, clock.clone(), keys.clone(), sink.clone())?;
            client.connect(&mut server);
            players.push(Player { client, keys });
        }

        Ok(Self {
            clock,
            server,
            players,
            view,
        })
    }

    /// Ticks everyone once. Returns whether the server ran an update.
    pub fn tick(&mut self) -> lagcomp::Result<bool> {
        let server_ran = self.server.tick()?;
        for player in &mut self.players {
            player.client.tick()?;
        }
        Ok(server_ran)
    }

    pub fn hold(&self, player: usize, keys: MoveKeys) {
        if let Some(player) = self.players.get(player) {
            player.keys.set(keys);
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.clock.now().as_secs_f64()
    }

    pub fn view(&self) -> std::cell::Ref<'_, TrackView> {
        self.view.borrow()
    }
}
