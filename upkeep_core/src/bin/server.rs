use std::io::{BufRead, BufReader};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::thread;
use std::time::Duration;

use bevy::app::Startup;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{info, warn};

use upkeep_core::network::{start_push_server, PushServer};
use upkeep_core::sync::SyncOutbox;
use upkeep_core::{
    build_headless_app, item_upkeep, population, refuel, start_all_services, vehicle_repair,
    wire_service_directory, ItemUpkeepMonitor, PlayerId, RefuelMonitor, ServiceDirectory,
    ServiceKind, UpkeepTelemetry, VehicleRepairMonitor, WorldTick,
};

const PUSH_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 42010);
const COMMAND_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 42011);

/// World update cadence while no command is pending.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut app = build_headless_app();
    app.add_systems(Startup, population::spawn_demo_population);

    let directory = wire_service_directory(&app.world);
    start_all_services(&mut app.world);

    let push_server = start_push_server(PUSH_BIND);
    let command_rx = spawn_command_listener(COMMAND_BIND, directory);

    info!(
        target: "ashfall::server",
        command_bind = %COMMAND_BIND,
        push_bind = %PUSH_BIND,
        "Ashfall upkeep server ready"
    );

    loop {
        match command_rx.recv_timeout(TICK_INTERVAL) {
            Ok(command) => {
                apply_command(&mut app, command);
                app.update();
                flush_pushes(&mut app, push_server.as_ref());
            }
            Err(RecvTimeoutError::Timeout) => {
                app.update();
                flush_pushes(&mut app, push_server.as_ref());
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Commands that touch world state and must run on the main loop.
#[derive(Debug)]
enum Command {
    Force { kind: ServiceKind, player: PlayerId },
    Service { kind: ServiceKind, start: bool },
    Tick(u32),
}

/// Commands resolved on the bridge thread against the service directory.
#[derive(Debug)]
enum LocalAction {
    Toggle {
        kind: ServiceKind,
        player: PlayerId,
        enable: bool,
    },
    ToggleAll {
        player: PlayerId,
        enable: bool,
    },
    Status {
        player: PlayerId,
    },
}

#[derive(Debug)]
enum ParsedCommand {
    Local(LocalAction),
    World(Command),
}

fn spawn_command_listener(
    bind_addr: SocketAddr,
    directory: ServiceDirectory,
) -> Receiver<Command> {
    let listener = TcpListener::bind(bind_addr).expect("command listener bind failed");
    listener
        .set_nonblocking(true)
        .expect("set_nonblocking failed");

    let (sender, receiver) = unbounded::<Command>();
    thread::spawn(move || loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!(target: "ashfall::server", %addr, "command client connected");
                let sender = sender.clone();
                let directory = directory.clone();
                thread::spawn(move || handle_client(stream, sender, directory));
            }
            Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                warn!(target: "ashfall::server", error = %err, "error accepting command client");
                thread::sleep(Duration::from_millis(200));
            }
        }
    });

    receiver
}

fn handle_client(stream: std::net::TcpStream, sender: Sender<Command>, directory: ServiceDirectory) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_command(trimmed) {
                    Some(ParsedCommand::World(command)) => {
                        if sender.send(command).is_err() {
                            break;
                        }
                    }
                    Some(ParsedCommand::Local(action)) => apply_local_action(action, &directory),
                    None => warn!(target: "ashfall::server", command = trimmed, "invalid command"),
                }
            }
            Err(err) => {
                warn!(target: "ashfall::server", error = %err, "command read error");
                break;
            }
        }
    }
}

fn parse_command(input: &str) -> Option<ParsedCommand> {
    let mut parts = input.split_whitespace();
    match parts.next()? {
        "auto" => {
            let target = parts.next()?;
            let enable = match parts.next()? {
                "on" | "enable" => true,
                "off" | "disable" => false,
                _ => return None,
            };
            let player = PlayerId(parts.next()?.parse().ok()?);
            match target {
                "all" => Some(ParsedCommand::Local(LocalAction::ToggleAll { player, enable })),
                other => Some(ParsedCommand::Local(LocalAction::Toggle {
                    kind: parse_kind(other)?,
                    player,
                    enable,
                })),
            }
        }
        "status" => {
            let player = PlayerId(parts.next()?.parse().ok()?);
            Some(ParsedCommand::Local(LocalAction::Status { player }))
        }
        "refuel" => {
            let player = PlayerId(parts.next()?.parse().ok()?);
            Some(ParsedCommand::World(Command::Force {
                kind: ServiceKind::Refuel,
                player,
            }))
        }
        "repair" => {
            let player = PlayerId(parts.next()?.parse().ok()?);
            Some(ParsedCommand::World(Command::Force {
                kind: ServiceKind::VehicleRepair,
                player,
            }))
        }
        "restock" => {
            let player = PlayerId(parts.next()?.parse().ok()?);
            Some(ParsedCommand::World(Command::Force {
                kind: ServiceKind::ItemUpkeep,
                player,
            }))
        }
        "service" => {
            let kind = parse_kind(parts.next()?)?;
            let start = match parts.next()? {
                "start" => true,
                "stop" => false,
                _ => return None,
            };
            Some(ParsedCommand::World(Command::Service { kind, start }))
        }
        "tick" => {
            let amount = parts.next().unwrap_or("1").parse().ok()?;
            Some(ParsedCommand::World(Command::Tick(amount)))
        }
        _ => None,
    }
}

fn parse_kind(input: &str) -> Option<ServiceKind> {
    match input {
        "refuel" => Some(ServiceKind::Refuel),
        "repair" => Some(ServiceKind::VehicleRepair),
        "items" => Some(ServiceKind::ItemUpkeep),
        _ => None,
    }
}

fn apply_local_action(action: LocalAction, directory: &ServiceDirectory) {
    match action {
        LocalAction::Toggle {
            kind,
            player,
            enable,
        } => toggle_service(directory, kind, player, enable),
        LocalAction::ToggleAll { player, enable } => {
            toggle_service(directory, ServiceKind::VehicleRepair, player, enable);
            toggle_service(directory, ServiceKind::ItemUpkeep, player, enable);
        }
        LocalAction::Status { player } => {
            for kind in [
                ServiceKind::Refuel,
                ServiceKind::VehicleRepair,
                ServiceKind::ItemUpkeep,
            ] {
                match directory.get(kind) {
                    Ok(handle) => info!(
                        target: "ashfall::server",
                        %player,
                        service = %kind,
                        enabled = handle.registry().is_enabled(player),
                        opted_in = handle.registry().enabled_count(),
                        "status"
                    ),
                    Err(err) => warn!(
                        target: "ashfall::server",
                        %player,
                        error = %err,
                        "status.unavailable"
                    ),
                }
            }
        }
    }
}

fn toggle_service(
    directory: &ServiceDirectory,
    kind: ServiceKind,
    player: PlayerId,
    enable: bool,
) {
    match directory.get(kind) {
        Ok(handle) => {
            if enable {
                handle.registry().enable(player);
            } else {
                handle.registry().disable(player);
            }
            info!(
                target: "ashfall::server",
                %player,
                service = %kind,
                enable,
                "toggle.applied"
            );
        }
        Err(err) => warn!(
            target: "ashfall::server",
            %player,
            error = %err,
            "toggle.rejected=unavailable"
        ),
    }
}

fn apply_command(app: &mut bevy::prelude::App, command: Command) {
    match command {
        Command::Force { kind, player } => apply_force(app, kind, player),
        Command::Service { kind, start } => apply_service_transition(app, kind, start),
        Command::Tick(amount) => {
            for _ in 0..amount {
                app.update();
            }
            let tick = app.world.resource::<WorldTick>().0;
            let telemetry = app.world.resource::<UpkeepTelemetry>();
            info!(
                target: "ashfall::server",
                tick,
                pushes = telemetry.total(),
                "tick.completed"
            );
        }
    }
}

fn apply_force(app: &mut bevy::prelude::App, kind: ServiceKind, player: PlayerId) {
    match kind {
        ServiceKind::Refuel => match refuel::force_refuel(&mut app.world, player) {
            Ok(applied) => info!(
                target: "ashfall::server",
                %player,
                applied,
                "force.refuel"
            ),
            Err(err) => warn!(
                target: "ashfall::server",
                %player,
                error = %err,
                "force.refuel=rejected"
            ),
        },
        ServiceKind::VehicleRepair => {
            match vehicle_repair::force_repair_vehicle(&mut app.world, player) {
                Ok(applied) => info!(
                    target: "ashfall::server",
                    %player,
                    applied,
                    "force.repair"
                ),
                Err(err) => warn!(
                    target: "ashfall::server",
                    %player,
                    error = %err,
                    "force.repair=rejected"
                ),
            }
        }
        ServiceKind::ItemUpkeep => match item_upkeep::force_restock(&mut app.world, player) {
            Ok(report) => info!(
                target: "ashfall::server",
                %player,
                quality = report.quality_fixes,
                barrels = report.barrel_fixes,
                ammo = report.ammo_refills,
                magazines = report.magazine_refills,
                guns = report.gun_refills,
                "force.restock"
            ),
            Err(err) => warn!(
                target: "ashfall::server",
                %player,
                error = %err,
                "force.restock=rejected"
            ),
        },
    }
}

fn apply_service_transition(app: &mut bevy::prelude::App, kind: ServiceKind, start: bool) {
    let transitioned = match kind {
        ServiceKind::Refuel => {
            let mut monitor = app.world.resource_mut::<RefuelMonitor>();
            if start {
                monitor.0.start()
            } else {
                monitor.0.stop()
            }
        }
        ServiceKind::VehicleRepair => {
            let mut monitor = app.world.resource_mut::<VehicleRepairMonitor>();
            if start {
                monitor.0.start()
            } else {
                monitor.0.stop()
            }
        }
        ServiceKind::ItemUpkeep => {
            let mut monitor = app.world.resource_mut::<ItemUpkeepMonitor>();
            if start {
                monitor.0.start()
            } else {
                monitor.0.stop()
            }
        }
    };
    info!(
        target: "ashfall::server",
        service = %kind,
        start,
        transitioned,
        "service.transition"
    );
}

fn flush_pushes(app: &mut bevy::prelude::App, push_server: Option<&PushServer>) {
    let records = app.world.resource_mut::<SyncOutbox>().drain();
    if records.is_empty() {
        return;
    }
    if let Some(server) = push_server {
        for record in &records {
            match serde_json::to_string(record) {
                Ok(line) => server.broadcast(&line),
                Err(err) => warn!(
                    target: "ashfall::sync",
                    error = %err,
                    "push.encode_failed"
                ),
            }
        }
    }
    let telemetry = app.world.resource::<UpkeepTelemetry>();
    info!(
        target: "ashfall::sync",
        count = records.len(),
        total = telemetry.total(),
        "sync.flushed"
    );
}
