use clap::{App, Arg};
use colored::*;
use groundlink::alarm::AlarmEvent;
use groundlink::{GroundEvent, GroundStation};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{error, info, warn};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "5760";
const READ_CHUNK_SIZE: usize = 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("groundlink")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🛰️  Ground station console - live event monitor for the model-satellite downlink")
        .arg(
            Arg::with_name("host")
                .short("h")
                .long("host")
                .value_name("HOST")
                .help("Serial-bridge host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Serial-bridge TCP port")
                .takes_value(true)
                .default_value(DEFAULT_PORT),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["pretty", "json"])
                .default_value("pretty"),
        )
        .get_matches();

    let host = matches.value_of("host").unwrap_or(DEFAULT_HOST);
    let port = matches.value_of("port").unwrap_or(DEFAULT_PORT);
    let json_output = matches.value_of("format") == Some("json");

    let addr = format!("{host}:{port}");
    println!("{}", "🛰️  Ground Station Console".bold());
    println!("==========================");

    let mut stream = TcpStream::connect(&addr).await?;
    info!("connected to serial bridge at {}", addr);

    let mut station = GroundStation::new();
    let started = Instant::now();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let now_ms = started.elapsed().as_millis() as u64;
        match stream.read(&mut chunk).await {
            Ok(0) => {
                warn!("serial bridge closed the connection");
                break;
            }
            Ok(n) => {
                for event in station.ingest(&chunk[..n]) {
                    print_event(&event, json_output);
                }
            }
            Err(e) => {
                error!("read error: {}", e);
                if let Some(diag) = station.record_comm_error(now_ms) {
                    print_event(&diag, json_output);
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }
    }

    for event in station.close() {
        print_event(&event, json_output);
    }
    let stats = station.demux_stats();
    println!(
        "session: {} packets, {} frames, {} rejected lines, {} resyncs",
        stats.packets_forwarded, stats.frames_extracted, stats.lines_rejected, stats.resyncs
    );
    Ok(())
}

fn print_event(event: &GroundEvent, json_output: bool) {
    if json_output {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("failed to serialize event: {}", e),
        }
        return;
    }

    match event {
        GroundEvent::Telemetry(packet) => {
            println!(
                "{} #{} status={} alarms={}",
                "📡 TELEMETRY".green(),
                packet.packet_number().unwrap_or(0),
                packet.satellite_status().unwrap_or(0),
                packet.alarm_code()
            );
        }
        GroundEvent::Video(frame) => {
            println!("{} {} bytes ({:?})", "🎥 FRAME".cyan(), frame.len(), frame.source);
        }
        GroundEvent::Control(reply) => {
            println!("{} {:?}", "📨 CONTROL".blue(), reply);
        }
        GroundEvent::Alarm(AlarmEvent::NewFault { bit, audio_cued }) => {
            let cue = if *audio_cued { " 🔊" } else { "" };
            println!("{} {}{}", "🚨 FAULT".red().bold(), bit.label(), cue);
        }
        GroundEvent::Alarm(AlarmEvent::Cleared { bit }) => {
            println!("{} {}", "✅ CLEARED".green(), bit.label());
        }
        GroundEvent::LineRejected { reason, .. } => {
            println!("{} {}", "⚠️  REJECTED".yellow(), reason);
        }
        GroundEvent::Resync { discarded_bytes } => {
            println!("{} discarded {} bytes", "🔁 RESYNC".yellow(), discarded_bytes);
        }
        GroundEvent::BufferOverflow { dropped_bytes } => {
            println!("{} dropped {} bytes", "🗑️  OVERFLOW".red(), dropped_bytes);
        }
        GroundEvent::SeparationLatched => {
            println!("{}", "🪂 SEPARATION CONFIRMED".magenta().bold());
        }
        GroundEvent::SequenceComplete { command } => {
            println!("{} {}", "🎯 SEQUENCE COMPLETE".magenta(), command);
        }
        GroundEvent::Diagnostic(bundle) => {
            println!(
                "{} {} errors, probable causes:",
                "🩺 DIAGNOSTIC".red(),
                bundle.error_count
            );
            for cause in bundle.probable_causes {
                println!("   - {cause}");
            }
        }
    }
}
