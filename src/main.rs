use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
    thread,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clockwatch::{
    communication::{ClearReason, Notification},
    config::{watch as watch_config, Config},
    overlay::{self, OverlayAction},
    ticker::{self, MonitorHandle},
    AlarmId, AlarmMonitor,
};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// config file to use instead of the platform default
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write a default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// add an alarm at a 24-hour HH:MM time
    Add {
        time: String,
        #[clap(long, short)]
        name: Option<String>,
    },
    /// show every alarm with its id
    List,
    /// turn an alarm back on
    Enable {
        id: AlarmId,
    },
    /// keep an alarm but stop it from going off
    Disable {
        id: AlarmId,
    },
    /// delete an alarm
    Remove {
        id: AlarmId,
    },
    /// watch the clock and show alarms as they go off (the default)
    Run,
}

fn main() -> Result<()> {
    // initilize the logger
    simple_file_logger::init_logger!("clockwatch")
        .map_err(|e| anyhow::anyhow!("couldn't initialize logger: {e}"))?;

    let args = Args::parse();
    let path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match args.command.unwrap_or(Command::Run) {
        Command::Init { force } => {
            if force || !path.exists() {
                Config::new().save(&path)?;
                println!("wrote default config to {}", path.display());
            } else {
                println!(
                    "config already exists at {}, use --force to overwrite it",
                    path.display()
                );
            }
        }
        Command::Add { time, name } => {
            let mut config = Config::load_or_default(&path)?;
            let id = config.add_alarm(&time, name)?;
            config.save(&path)?;
            println!("added alarm {id} at {time}");
        }
        Command::List => {
            let config = Config::load_or_default(&path)?;
            if config.alarms.is_empty() {
                println!("no alarms");
            }
            for alarm in &config.alarms {
                println!("{:>3}  {alarm}", alarm.id);
            }
        }
        Command::Enable { id } => edit(&path, |config| config.set_active(id, true))?,
        Command::Disable { id } => edit(&path, |config| config.set_active(id, false))?,
        Command::Remove { id } => edit(&path, |config| config.remove_alarm(id).map(|_| ()))?,
        Command::Run => run(&path)?,
    }
    Ok(())
}

fn edit(
    path: &Path,
    change: impl FnOnce(&mut Config) -> Result<(), clockwatch::ConfigError>,
) -> Result<()> {
    let mut config =
        Config::load(path).context("couldn't load alarms, run `clockwatch init` first")?;
    change(&mut config)?;
    config.save(path)?;
    Ok(())
}

fn run(path: &Path) -> Result<()> {
    let config = Config::load_or_default(path)?;
    let alarm_count = config.alarms.len();
    let interval = config.tick_interval();
    let handle = MonitorHandle::start(
        AlarmMonitor::new(config.trigger_policy),
        config.alarms,
        interval,
        ticker::local_now,
    )
    .context("couldn't start the alarm monitor")?;

    // keep the watcher alive for as long as we run
    let _watcher = watch_config(path, handle.remote())
        .map_err(|e| warn!("not watching {} for changes: {e}", path.display()))
        .ok();

    let remote = handle.remote();
    thread::Builder::new()
        .name("overlay-input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match overlay::parse_action(&line) {
                    Some(OverlayAction::Dismiss) => {
                        remote.dismiss();
                    }
                    Some(OverlayAction::Snooze) => {
                        remote.snooze();
                    }
                    Some(OverlayAction::Quit) => break,
                    None => eprintln!("unknown action {line:?}, use d, s or q"),
                }
            }
            remote.shutdown();
        })
        .context("couldn't read input")?;

    info!("watching {alarm_count} alarms from {}", path.display());
    println!("clockwatch is watching {alarm_count} alarms, type q to quit");
    // ends once the monitor thread has shut down
    for notification in handle.notifications() {
        match notification {
            Notification::AlarmTriggered(alarm) => println!(
                "{}",
                overlay::render(
                    &alarm,
                    &config.settings,
                    ticker::local_now(),
                    &config.time_format
                )
            ),
            Notification::AlarmCleared { alarm, reason } => match reason {
                ClearReason::Dismissed => println!("{alarm} dismissed"),
                ClearReason::Snoozed => println!("{alarm} snoozed"),
            },
        }
    }
    handle.stop();
    Ok(())
}
