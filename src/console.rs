//! Line-oriented operator console.

use std::io::{stdin, stdout, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use itertools::Itertools;
use log::error;

use crate::controller::ConnectionController;
use crate::fixture::{FixtureId, PropertyValue};
use crate::transport::DeviceInfo;
use crate::util::prompt_parse;

const HELP: &str = "\
types                     list fixture types
add <type> <addr>         patch a fixture
rm <id>                   unpatch a fixture
set <id> name=value...    set fixture properties, eg. color=[255,0,0] dimmer=0.5
override <[r,g,b]|off>    replace every color set from now on
clear                     zero the universe
list                      show patched fixtures
universe                  show non-zero channels
connect                   pair with a DMX bridge
disconnect                close the bridge connection
state                     show the connection state
quit";

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Types,
    Add { fixture_type: String, addr: usize },
    Remove(FixtureId),
    Set(FixtureId, Vec<(String, PropertyValue)>),
    Override(Option<[u8; 3]>),
    Clear,
    List,
    Universe,
    Connect,
    Disconnect,
    State,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>> {
        let mut tokens = line.split_whitespace();
        let Some(cmd) = tokens.next() else {
            return Ok(None);
        };
        let mut arg = |name: &str| {
            tokens
                .next()
                .ok_or_else(|| anyhow!("{cmd}: missing argument <{name}>"))
        };
        let command = match cmd {
            "help" | "?" => Self::Help,
            "types" => Self::Types,
            "add" => {
                let fixture_type = arg("type")?.to_string();
                let addr = arg("addr")?
                    .parse()
                    .context("DMX address must be a number")?;
                Self::Add { fixture_type, addr }
            }
            "rm" => Self::Remove(arg("id")?.parse()?),
            "set" => {
                let id = arg("id")?.parse()?;
                let properties = tokens.map(parse_assignment).collect::<Result<Vec<_>>>()?;
                Self::Set(id, properties)
            }
            "override" => match arg("color")? {
                "off" => Self::Override(None),
                rgb => Self::Override(Some(
                    serde_yaml::from_str(rgb).with_context(|| format!("invalid color \"{rgb}\""))?,
                )),
            },
            "clear" => Self::Clear,
            "list" => Self::List,
            "universe" => Self::Universe,
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "state" => Self::State,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command \"{other}\"; try help"),
        };
        Ok(Some(command))
    }
}

/// Parse name=value, where the value is written as YAML.
fn parse_assignment(token: &str) -> Result<(String, PropertyValue)> {
    let (name, value) = token
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got \"{token}\""))?;
    let value = serde_yaml::from_str(value)
        .with_context(|| format!("invalid value for {name}: \"{value}\""))?;
    Ok((name.to_string(), value))
}

/// Read commands from stdin until quit or end of input.
pub fn run(controller: &mut ConnectionController) -> Result<()> {
    run_with(controller, &mut stdin().lock())
}

fn run_with<R: BufRead>(controller: &mut ConnectionController, input: &mut R) -> Result<()> {
    println!("Type help for a list of commands.");
    loop {
        print!("> ");
        stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err:#}");
                continue;
            }
        };
        if command == Command::Quit {
            return Ok(());
        }
        if let Err(err) = execute(controller, command, input) {
            error!("{err:#}");
        }
    }
}

/// Pair with the only approved bridge, or ask which one when there are several.
///
/// Selection happens here on the console rather than in the pairing thread,
/// which must never read the terminal.
fn connect<R: BufRead>(controller: &ConnectionController, input: &mut R) -> Result<()> {
    let mut candidates = controller.approved_devices()?;
    if candidates.len() < 2 {
        controller.request_connect()?;
        return Ok(());
    }
    let device = choose_device(input, &mut candidates)?;
    controller.request_connect_to(device)?;
    Ok(())
}

fn choose_device<R: BufRead>(input: &mut R, candidates: &mut Vec<DeviceInfo>) -> Result<DeviceInfo> {
    println!("Available DMX bridges:");
    for (i, device) in candidates.iter().enumerate() {
        println!("{i}: {device}");
    }
    let count = candidates.len();
    let index = prompt_parse(input, "Select a bridge", |s| {
        let i: usize = s.parse()?;
        if i >= count {
            bail!("{i} is not one of the listed bridges");
        }
        Ok(i)
    })
    .context("bridge selection cancelled")?;
    Ok(candidates.swap_remove(index))
}

fn execute<R: BufRead>(
    controller: &mut ConnectionController,
    command: Command,
    input: &mut R,
) -> Result<()> {
    match command {
        Command::Help => println!("{HELP}"),
        Command::Types => {
            println!(
                "{}",
                controller.fixtures().registry().fixture_types().iter().join("\n")
            );
        }
        Command::Add { fixture_type, addr } => {
            let universe = controller.universe().idx();
            let id = controller.create_fixture(&fixture_type, addr, universe)?;
            println!("{id}");
        }
        Command::Remove(id) => {
            if !controller.remove_fixture(id) {
                bail!("fixture {id} not found");
            }
        }
        Command::Set(id, properties) => controller.update_fixture_properties(id, properties)?,
        Command::Override(color) => controller.set_color_override(color),
        Command::Clear => controller.clear_universe(),
        Command::List => print!("{}", serde_yaml::to_string(&controller.fixtures_metadata())?),
        Command::Universe => {
            let universe = controller.universe();
            let active = universe
                .channels()
                .iter()
                .enumerate()
                .filter(|(_, v)| **v > 0)
                .map(|(i, v)| format!("{}={v}", i + 1))
                .join(" ");
            println!("universe {}: {active}", universe.idx());
        }
        Command::Connect => connect(controller, input)?,
        Command::Disconnect => controller.request_disconnect(),
        Command::State => {
            let state = controller.connection_state();
            match controller.device() {
                Some(device) => println!("{state} ({device})"),
                None => println!("{state}"),
            }
            if let Some(t) = controller.last_transmission() {
                println!("last frame sent {:.1?} ago", t.elapsed());
            }
        }
        Command::Quit => (),
    }
    Ok(())
}
