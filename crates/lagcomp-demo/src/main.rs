mod headless;
mod scene;
mod tui;
mod view;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use lagcomp::{ClientConfig, ServerConfig};
use scene::DemoScene;

#[derive(Parser)]
#[command(name = "lagcomp-demo")]
#[command(about = "Client-side prediction, reconciliation and interpolation under simulated lag")]
struct Args {
    #[arg(long, default_value_t = 10, help = "Server updates per second")]
    server_rate: u32,

    #[arg(long, default_value_t = 50, help = "Client updates per second")]
    client_rate: u32,

    #[arg(long, default_value_t = 250, help = "Player 1 one-way lag in ms")]
    lag1: u64,

    #[arg(long, default_value_t = 250, help = "Player 2 one-way lag in ms")]
    lag2: u64,

    #[arg(long)]
    prediction1: bool,

    #[arg(long)]
    reconciliation1: bool,

    #[arg(long)]
    interpolation1: bool,

    #[arg(long)]
    prediction2: bool,

    #[arg(long)]
    reconciliation2: bool,

    #[arg(long)]
    interpolation2: bool,

    #[arg(long, help = "Run a scripted session and log positions instead of the TUI")]
    headless: bool,

    #[arg(long, default_value_t = 5.0, help = "Length of the headless session")]
    duration_secs: f64,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            tick_rate: self.server_rate,
            ..Default::default()
        }
    }

    fn client_configs(&self) -> [ClientConfig; 2] {
        [
            ClientConfig {
                tick_rate: self.client_rate,
                lag: Duration::from_millis(self.lag1),
                prediction: self.prediction1,
                reconciliation: self.reconciliation1,
                interpolation: self.interpolation1,
            },
            ClientConfig {
                tick_rate: self.client_rate,
                lag: Duration::from_millis(self.lag2),
                prediction: self.prediction2,
                reconciliation: self.reconciliation2,
                interpolation: self.interpolation2,
            },
        ]
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut scene = DemoScene::new(args.server_config(), args.client_configs())?;

    if args.headless {
        let duration = Duration::try_from_secs_f64(args.duration_secs)?;
        headless::run(&mut scene, duration)?;
    } else {
        tui::run(&mut scene)?;
    }

    Ok(())
}
