//! Line-oriented operator console
//!
//! Parses one command per line and runs it against a `ControllerHandle`.

use std::fmt::Write as _;
use std::str::FromStr;

use shared::{ConfigField, OperatingMode, RouteStepKind, StepId};

use crate::controller_impl::ControllerHandle;
use crate::error::{ControllerError, ControllerResult};
use crate::types::{StatusSnapshot, StickId};

pub const HELP: &str = "\
Commands:
  connect <host>            open the vehicle socket (port 81)
  disconnect                close it and stop auto-reconnect
  stop-reconnect            cancel any pending reconnect
  mode <connect|route|manual|config>
  step <left|right|straight|u-turn|pick|drop|stop>
  undo                      remove the last route step
  remove <id>               remove one route step
  clear                     remove every route step
  send-route                send the encoded route
  start | reset             route execution control
  set <field> <value>       sensor, stop, turn, referent_line_width
  send-config               push the desired configuration
  joy <1|2> <dx> <dy>       drag a stick (pixels from centre, y down)
  release <1|2>             let go of a stick
  status                    show everything
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Connect(String),
    Disconnect,
    StopReconnect,
    Mode(OperatingMode),
    Step(RouteStepKind),
    Undo,
    Remove(StepId),
    Clear,
    SendRoute,
    Start,
    Reset,
    Set(ConfigField, String),
    SendConfig,
    Joy(StickId, f64, f64),
    Release(StickId),
    Status,
    Help,
    Quit,
}

fn expect_arg<'a>(args: &[&'a str], index: usize, usage: &str) -> ControllerResult<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| ControllerError::invalid_command(format!("usage: {usage}")))
}

fn parse_pixels(raw: &str) -> ControllerResult<f64> {
    raw.parse::<f64>()
        .map_err(|_| ControllerError::invalid_command(format!("not a number: {raw:?}")))
}

impl FromStr for ConsoleCommand {
    type Err = ControllerError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((verb, args)) = words.split_first() else {
            return Err(ControllerError::invalid_command("empty line"));
        };

        let command = match verb.to_lowercase().as_str() {
            "connect" => ConsoleCommand::Connect(expect_arg(args, 0, "connect <host>")?.to_string()),
            "disconnect" => ConsoleCommand::Disconnect,
            "stop-reconnect" => ConsoleCommand::StopReconnect,
            "mode" => ConsoleCommand::Mode(expect_arg(args, 0, "mode <name>")?.parse()?),
            "step" => ConsoleCommand::Step(expect_arg(args, 0, "step <kind>")?.parse()?),
            "undo" => ConsoleCommand::Undo,
            "remove" => ConsoleCommand::Remove(expect_arg(args, 0, "remove <id>")?.parse()?),
            "clear" => ConsoleCommand::Clear,
            "send-route" => ConsoleCommand::SendRoute,
            "start" => ConsoleCommand::Start,
            "reset" => ConsoleCommand::Reset,
            "set" => {
                let field = expect_arg(args, 0, "set <field> <value>")?.parse()?;
                // Raw text; sanitizing happens in config sync
                let value = args.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
                ConsoleCommand::Set(field, value)
            }
            "send-config" => ConsoleCommand::SendConfig,
            "joy" => {
                let usage = "joy <1|2> <dx> <dy>";
                let stick = expect_arg(args, 0, usage)?.parse()?;
                let dx = parse_pixels(expect_arg(args, 1, usage)?)?;
                let dy = parse_pixels(expect_arg(args, 2, usage)?)?;
                ConsoleCommand::Joy(stick, dx, dy)
            }
            "release" => ConsoleCommand::Release(expect_arg(args, 0, "release <1|2>")?.parse()?),
            "status" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(ControllerError::invalid_command(format!("unknown command {other:?}; try help"))),
        };

        Ok(command)
    }
}

/// Run one command; `Some` text is for the operator
pub async fn execute(handle: &ControllerHandle, command: ConsoleCommand) -> ControllerResult<Option<String>> {
    let output = match command {
        ConsoleCommand::Connect(host) => {
            handle.connect(&host).await?;
            None
        }
        ConsoleCommand::Disconnect => {
            handle.disconnect().await?;
            None
        }
        ConsoleCommand::StopReconnect => {
            handle.stop_auto_reconnect().await?;
            None
        }
        ConsoleCommand::Mode(mode) => {
            let announced = handle.activate_mode(mode).await?;
            Some(if announced {
                format!("mode {mode} announced")
            } else {
                format!("mode {mode} active")
            })
        }
        ConsoleCommand::Step(kind) => {
            let id = handle.append_step(kind).await?;
            Some(format!("+ {kind} [{id}]"))
        }
        ConsoleCommand::Undo => Some(match handle.remove_last_step().await? {
            Some(step) => format!("- {}", step.kind),
            None => "route is empty".to_string(),
        }),
        ConsoleCommand::Remove(id) => Some(match handle.remove_step(id).await? {
            Some(step) => format!("- {}", step.kind),
            None => format!("no step {id}"),
        }),
        ConsoleCommand::Clear => Some(format!("removed {} steps", handle.clear_route().await?)),
        ConsoleCommand::SendRoute => {
            handle.send_route().await?;
            None
        }
        ConsoleCommand::Start => {
            handle.start_route().await?;
            None
        }
        ConsoleCommand::Reset => {
            handle.reset_route().await?;
            None
        }
        ConsoleCommand::Set(field, raw) => {
            let value = handle.set_config_input(field, &raw).await?;
            Some(format!("{} = {}", field.label(), value))
        }
        ConsoleCommand::SendConfig => {
            handle.send_config().await?;
            None
        }
        ConsoleCommand::Joy(stick, dx, dy) => {
            let vector = handle.move_joystick(stick, dx, dy).await?;
            Some(format!("x={:.4} y={:.4}", vector.x, vector.y))
        }
        ConsoleCommand::Release(stick) => {
            handle.release_joystick(stick).await?;
            None
        }
        ConsoleCommand::Status => Some(render_snapshot(&handle.snapshot().await?)),
        ConsoleCommand::Help => Some(HELP.to_string()),
        ConsoleCommand::Quit => None,
    };

    Ok(output)
}

pub fn render_snapshot(snapshot: &StatusSnapshot) -> String {
    let mut out = String::new();
    let endpoint = snapshot.endpoint.as_ref().map(ToString::to_string).unwrap_or_else(|| "-".to_string());
    let mode = snapshot.mode.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string());

    let _ = writeln!(out, "connection: {} ({})", snapshot.connection, endpoint);
    let _ = writeln!(
        out,
        "reconnect:  {} attempts, auto {}{}",
        snapshot.reconnect_attempts,
        if snapshot.auto_reconnect { "on" } else { "off" },
        if snapshot.retry_pending { ", retry pending" } else { "" }
    );
    let _ = writeln!(out, "mode:       {mode}");
    let _ = writeln!(out, "route:      {:?}", snapshot.encoded_route);
    for (index, step) in snapshot.route.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {:<12} {}", index + 1, step.kind.label(), step.id);
    }
    for field in ConfigField::ALL {
        let _ = writeln!(
            out,
            "{:<20} desired {:>6}  observed {:>6}",
            field.wire_name(),
            snapshot.desired_config.get(field),
            snapshot.observed_config.get(field)
        );
    }
    let _ = write!(
        out,
        "joy1: ({:.4}, {:.4})  joy2: ({:.4}, {:.4})",
        snapshot.joy1.x, snapshot.joy1.y, snapshot.joy2.x, snapshot.joy2.y
    );
    out
}
