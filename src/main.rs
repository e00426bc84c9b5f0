use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use log::{LevelFilter, error, info};
use tokio::io::{AsyncBufRead, BufReader};

use nearable_rs::config::AppConfig;
use nearable_rs::input::{advertisements, parse_hex};
use nearable_rs::manager::{self, Manager};
use nearable_rs::mqtt::MqttClient;
use nearable_rs::Decoder;

#[derive(Parser, Debug)]
#[command(version, about = "Decode nearable BLE advertisements")]
struct Cli {
    /// TOML file with decoder calibration, filters and MQTT settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode one manufacturer data payload and print it as JSON
    Decode {
        /// Payload as hex, company ID included
        payload: String,
        #[arg(long, allow_negative_numbers = true)]
        rssi: i16,
    },
    /// Feed a capture of `<hex payload> <rssi>` lines through the manager
    Replay {
        /// Capture file; stdin when omitted
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Command::Decode { payload, rssi } => decode_one(&config, &payload, rssi),
        Command::Replay { input: Some(path) } => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("opening capture {}", path.display()))?;
            replay(config, BufReader::new(file)).await
        }
        Command::Replay { input: None } => replay(config, BufReader::new(tokio::io::stdin())).await,
    }
}

fn decode_one(config: &AppConfig, payload: &str, rssi: i16) -> anyhow::Result<()> {
    let payload = parse_hex(payload).context("invalid payload")?;
    let nearable = Decoder::try_new(config.decoder.clone())?
        .decode(&payload, rssi)
        .context("decoding payload")?;
    println!("{}", serde_json::to_string_pretty(&nearable)?);
    Ok(())
}

async fn replay<R>(config: AppConfig, reader: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let manager_config = config.manager.clone().unwrap_or_default();
    let (tx, mut rx) = manager::event_channel(&manager_config);
    let mut manager = Manager::new(
        Decoder::try_new(config.decoder.clone())?,
        &manager_config,
        config.nearables.as_deref().unwrap_or_default(),
        tx,
    );

    let mqtt = config.mqtt.as_ref().map(|mqtt_config| {
        let (client, mut eventloop) = MqttClient::new(mqtt_config);
        let handle = tokio::spawn(async move {
            MqttClient::event_loop(&mut eventloop).await;
        });
        (client, handle)
    });
    let sink = mqtt.as_ref().map(|(client, _)| client.clone());

    // The manager owns the event sender, so the receiver closes once it is dropped.
    let scan = async move {
        let stats = manager.run_loop(advertisements(reader)).await;
        drop(manager);
        Ok::<_, anyhow::Error>(stats)
    };

    let report = async move {
        while let Some(event) = rx.recv().await {
            println!("{}", serde_json::to_string(&event)?);
            if let Some(client) = &sink {
                if let Err(err) = client.publish(&event) {
                    error!("{:#}", err);
                }
            }
        }
        Ok::<_, anyhow::Error>(())
    };

    let (stats, ()) = futures::try_join!(scan, report)?;
    info!("Replay finished: {}", serde_json::to_string(&stats)?);

    if let Some((client, handle)) = mqtt {
        if let Err(err) = client.disconnect() {
            error!("Error disconnecting from MQTT: {:?}", err);
        }
        handle.abort();
    }

    Ok(())
}
